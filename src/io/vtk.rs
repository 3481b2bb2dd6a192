//! VTK output for structured grids.
//!
//! Writes VTS (XML StructuredGrid) files for inspection in ParaView. Points
//! are ordered with ξ varying fastest, matching the `(i, j)` node layout, so
//! the whole extent is `0 M-1 0 N-1 0 0`. The periodic cut is written as two
//! coincident point columns.
//!
//! Point data always carries the transformation Jacobian; composite grids add
//! a `seam` flag on the body row.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{ExportError, MeshExporter};
use crate::grid::{StructuredGrid, SurfaceMarker};
use crate::metrics::MetricTensor;

/// [`MeshExporter`] for VTK XML StructuredGrid files.
#[derive(Clone, Copy, Debug, Default)]
pub struct VtkExporter {
    /// Also write the covariant metric components.
    pub include_metrics: bool,
}

impl VtkExporter {
    /// Exporter that writes the metric tensor alongside the Jacobian.
    pub fn with_metrics() -> Self {
        Self {
            include_metrics: true,
        }
    }
}

impl MeshExporter for VtkExporter {
    fn name(&self) -> &'static str {
        "vts"
    }

    fn write_single_body(&self, grid: &StructuredGrid, path: &Path) -> Result<(), ExportError> {
        write_structured(grid, path, self.include_metrics, false)
    }

    fn write_composite(&self, grid: &StructuredGrid, path: &Path) -> Result<(), ExportError> {
        write_structured(grid, path, self.include_metrics, true)
    }
}

/// Write `grid` to a `.vts` file with Jacobian point data.
pub fn write_vts(grid: &StructuredGrid, path: impl AsRef<Path>) -> Result<(), ExportError> {
    write_structured(grid, path.as_ref(), false, !grid.is_airfoil_alone())
}

fn write_structured(
    grid: &StructuredGrid,
    path: &Path,
    include_metrics: bool,
    with_seam: bool,
) -> Result<(), ExportError> {
    let metrics = MetricTensor::compute(grid);
    let file = File::create(path)?;
    let mut writer = VtkWriter::new(file);

    let extent = format!("0 {} 0 {} 0 0", grid.m - 1, grid.n - 1);

    writer.write_header()?;
    writer.start_element("StructuredGrid", &[("WholeExtent", extent.as_str())])?;
    writer.start_element("Piece", &[("Extent", extent.as_str())])?;

    let points: Vec<(f64, f64)> = (0..grid.n)
        .flat_map(|j| (0..grid.m).map(move |i| (i, j)))
        .map(|(i, j)| grid.point(i, j))
        .collect();
    writer.write_points(&points)?;

    writer.start_element("PointData", &[("Scalars", "jacobian")])?;
    writer.write_data_array_f64("jacobian", &flatten(grid, &metrics.jacobian))?;
    if include_metrics {
        writer.write_data_array_f64("g11", &flatten(grid, &metrics.g11_cov))?;
        writer.write_data_array_f64("g12", &flatten(grid, &metrics.g12_cov))?;
        writer.write_data_array_f64("g22", &flatten(grid, &metrics.g22_cov))?;
    }
    if with_seam && let Some(markers) = grid.markers() {
        let seam: Vec<u8> = (0..grid.n)
            .flat_map(|j| (0..grid.m).map(move |i| (i, j)))
            .map(|(i, j)| u8::from(j == 0 && markers[i] == SurfaceMarker::Seam))
            .collect();
        writer.write_data_array_u8("seam", &seam)?;
    }
    writer.end_element("PointData")?;

    writer.end_element("Piece")?;
    writer.end_element("StructuredGrid")?;
    writer.write_footer()?;

    Ok(())
}

/// Node field in VTK point order.
fn flatten(grid: &StructuredGrid, field: &faer::Mat<f64>) -> Vec<f64> {
    (0..grid.n)
        .flat_map(|j| (0..grid.m).map(move |i| field[(i, j)]))
        .collect()
}

/// VTK XML writer helper.
struct VtkWriter<W: Write> {
    writer: BufWriter<W>,
    indent: usize,
}

impl<W: Write> VtkWriter<W> {
    fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            indent: 0,
        }
    }

    fn write_indent(&mut self) -> std::io::Result<()> {
        for _ in 0..self.indent {
            write!(self.writer, "  ")?;
        }
        Ok(())
    }

    fn write_header(&mut self) -> std::io::Result<()> {
        writeln!(self.writer, "<?xml version=\"1.0\"?>")?;
        writeln!(
            self.writer,
            "<VTKFile type=\"StructuredGrid\" version=\"0.1\" byte_order=\"LittleEndian\">"
        )?;
        self.indent += 1;
        Ok(())
    }

    fn write_footer(&mut self) -> std::io::Result<()> {
        self.indent -= 1;
        writeln!(self.writer, "</VTKFile>")?;
        self.writer.flush()?;
        Ok(())
    }

    fn start_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> std::io::Result<()> {
        self.write_indent()?;
        write!(self.writer, "<{}", name)?;
        for (key, value) in attrs {
            write!(self.writer, " {}=\"{}\"", key, value)?;
        }
        writeln!(self.writer, ">")?;
        self.indent += 1;
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> std::io::Result<()> {
        self.indent -= 1;
        self.write_indent()?;
        writeln!(self.writer, "</{}>", name)?;
        Ok(())
    }

    fn write_data_array_f64(&mut self, name: &str, data: &[f64]) -> std::io::Result<()> {
        self.write_indent()?;
        writeln!(
            self.writer,
            "<DataArray type=\"Float64\" Name=\"{}\" format=\"ascii\">",
            name
        )?;

        self.indent += 1;
        self.write_indent()?;
        for (i, &v) in data.iter().enumerate() {
            write!(self.writer, "{:.10e}", v)?;
            if i < data.len() - 1 {
                write!(self.writer, " ")?;
            }
            if (i + 1) % 6 == 0 && i < data.len() - 1 {
                writeln!(self.writer)?;
                self.write_indent()?;
            }
        }
        writeln!(self.writer)?;
        self.indent -= 1;

        self.write_indent()?;
        writeln!(self.writer, "</DataArray>")?;
        Ok(())
    }

    fn write_data_array_u8(&mut self, name: &str, data: &[u8]) -> std::io::Result<()> {
        self.write_indent()?;
        writeln!(
            self.writer,
            "<DataArray type=\"UInt8\" Name=\"{}\" format=\"ascii\">",
            name
        )?;

        self.indent += 1;
        self.write_indent()?;
        for (i, &v) in data.iter().enumerate() {
            write!(self.writer, "{}", v)?;
            if i < data.len() - 1 {
                write!(self.writer, " ")?;
            }
            if (i + 1) % 20 == 0 && i < data.len() - 1 {
                writeln!(self.writer)?;
                self.write_indent()?;
            }
        }
        writeln!(self.writer)?;
        self.indent -= 1;

        self.write_indent()?;
        writeln!(self.writer, "</DataArray>")?;
        Ok(())
    }

    fn write_points(&mut self, points: &[(f64, f64)]) -> std::io::Result<()> {
        self.start_element("Points", &[])?;

        self.write_indent()?;
        writeln!(
            self.writer,
            "<DataArray type=\"Float64\" NumberOfComponents=\"3\" format=\"ascii\">"
        )?;

        self.indent += 1;
        self.write_indent()?;
        for (i, &(x, y)) in points.iter().enumerate() {
            write!(self.writer, "{:.10e} {:.10e} 0.0", x, y)?;
            if i < points.len() - 1 {
                write!(self.writer, " ")?;
            }
            if (i + 1) % 2 == 0 && i < points.len() - 1 {
                writeln!(self.writer)?;
                self.write_indent()?;
            }
        }
        writeln!(self.writer)?;
        self.indent -= 1;

        self.write_indent()?;
        writeln!(self.writer, "</DataArray>")?;

        self.end_element("Points")?;
        Ok(())
    }
}
