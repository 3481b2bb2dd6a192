//! Grid output and reload.
//!
//! This module provides:
//! - **Export dispatch**: [`export`] picks the single-body or composite writer
//!   of a [`MeshExporter`] from the grid's topology metadata
//! - **Text meshes**: a plain section-based dump that can be read back
//! - **VTK output**: XML StructuredGrid (`.vts`) for ParaView
//! - **SU2 meshes**: native SU2 format with `airfoil` and `farfield` markers
//!
//! # File Formats
//!
//! ## Text Mesh
//!
//! ```text
//! # ogrid-rs structured grid
//! $Grid
//! 41 31 100
//! $EndGrid
//! $Markers
//! 0 0 1 1 ... 1 1 0 0
//! $EndMarkers
//! $Nodes
//! 0 0 5e-1 0e0
//! 1 0 4.9e-1 -1.2e-2
//! ...
//! $EndNodes
//! ```
//!
//! `$Grid` holds `M N R`. `$Markers` is only present for composite bodies
//! (`1` = seam). `$Nodes` lists `i j x y` with `i` varying fastest.
//!
//! # Example
//!
//! ```no_run
//! use ogrid_rs::grid::{BoundaryAssembler, BoundaryContour};
//! use ogrid_rs::io::{export, TextMeshExporter};
//!
//! let contour = BoundaryContour::circle(1.0, 41).unwrap();
//! let grid = BoundaryAssembler::assemble(&contour, 10.0, 21).unwrap();
//! export(&grid, &TextMeshExporter, "circle.grid").unwrap();
//! ```

mod su2;
mod text;
mod vtk;

pub use su2::Su2Exporter;
pub use text::{TextMeshExporter, read_text_mesh, write_text_mesh};
pub use vtk::{VtkExporter, write_vts};

use std::path::Path;

use log::info;
use thiserror::Error;

use crate::grid::StructuredGrid;

/// Error type for grid I/O.
#[derive(Debug, Error)]
pub enum ExportError {
    /// File could not be opened or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line in an input file.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Required section absent.
    #[error("Missing section: {0}")]
    MissingSection(&'static str),

    /// File content does not describe a valid grid.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
}

/// Writer for a finished grid.
///
/// Single bodies and composite bodies are written by separate methods so a
/// format can attach seam information only where it exists.
pub trait MeshExporter {
    /// Format name for logging.
    fn name(&self) -> &'static str;

    /// Write a grid around a single body.
    fn write_single_body(&self, grid: &StructuredGrid, path: &Path) -> Result<(), ExportError>;

    /// Write a grid around a composite body with seam markers.
    fn write_composite(&self, grid: &StructuredGrid, path: &Path) -> Result<(), ExportError>;
}

/// Write `grid` with the exporter method that matches its topology.
pub fn export<E>(grid: &StructuredGrid, exporter: &E, path: impl AsRef<Path>) -> Result<(), ExportError>
where
    E: MeshExporter + ?Sized,
{
    let path = path.as_ref();
    if grid.is_airfoil_alone() {
        exporter.write_single_body(grid, path)?;
    } else {
        exporter.write_composite(grid, path)?;
    }
    info!(
        "Exported {}x{} grid ({}) to {}",
        grid.m,
        grid.n,
        exporter.name(),
        path.display()
    );
    Ok(())
}
