//! Plain-text grid dump and reload.
//!
//! Coordinates are written with Rust's shortest round-trip float formatting,
//! so a grid read back is bitwise identical to the one written.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::{ExportError, MeshExporter};
use crate::grid::{StructuredGrid, SurfaceMarker};

/// Largest accepted gap across the periodic cut, relative to the outer radius.
const CUT_TOL: f64 = 1e-9;

/// [`MeshExporter`] for the text format.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextMeshExporter;

impl MeshExporter for TextMeshExporter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn write_single_body(&self, grid: &StructuredGrid, path: &Path) -> Result<(), ExportError> {
        write_grid(grid, path, false)
    }

    fn write_composite(&self, grid: &StructuredGrid, path: &Path) -> Result<(), ExportError> {
        write_grid(grid, path, true)
    }
}

/// Write a grid, including seam markers when it has them.
pub fn write_text_mesh(grid: &StructuredGrid, path: impl AsRef<Path>) -> Result<(), ExportError> {
    write_grid(grid, path.as_ref(), !grid.is_airfoil_alone())
}

fn write_grid(grid: &StructuredGrid, path: &Path, with_markers: bool) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "# ogrid-rs structured grid")?;
    writeln!(writer, "$Grid")?;
    writeln!(writer, "{} {} {:e}", grid.m, grid.n, grid.radius)?;
    writeln!(writer, "$EndGrid")?;

    if with_markers && let Some(markers) = grid.markers() {
        writeln!(writer, "$Markers")?;
        let flags: Vec<&str> = markers
            .iter()
            .map(|mk| match mk {
                SurfaceMarker::Surface => "0",
                SurfaceMarker::Seam => "1",
            })
            .collect();
        writeln!(writer, "{}", flags.join(" "))?;
        writeln!(writer, "$EndMarkers")?;
    }

    writeln!(writer, "$Nodes")?;
    for j in 0..grid.n {
        for i in 0..grid.m {
            let (x, y) = grid.point(i, j);
            writeln!(writer, "{} {} {:e} {:e}", i, j, x, y)?;
        }
    }
    writeln!(writer, "$EndNodes")?;
    writer.flush()?;

    Ok(())
}

/// Numbered, trimmed, non-empty lines that are not comments.
type Lines<'a> = Box<dyn Iterator<Item = Result<(usize, String), ExportError>> + 'a>;

/// Read a grid written by [`write_text_mesh`].
///
/// The periodic cut and seam markers are validated on load.
pub fn read_text_mesh(path: impl AsRef<Path>) -> Result<StructuredGrid, ExportError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut lines: Lines<'_> = Box::new(
        reader
            .lines()
            .enumerate()
            .map(|(k, line)| line.map(|l| (k + 1, l.trim().to_string())).map_err(ExportError::from))
            .filter(|res| !matches!(res, Ok((_, l)) if l.is_empty() || l.starts_with('#'))),
    );

    let mut header: Option<(usize, usize, f64)> = None;
    let mut markers: Option<Vec<SurfaceMarker>> = None;
    let mut nodes: Option<Vec<(usize, usize, f64, f64)>> = None;

    while let Some(next) = lines.next() {
        let (number, line) = next?;
        match line.as_str() {
            "$Grid" => header = Some(parse_header(&mut lines)?),
            "$Markers" => markers = Some(parse_markers(&mut lines)?),
            "$Nodes" => nodes = Some(parse_nodes(&mut lines)?),
            other => {
                return Err(ExportError::Parse {
                    line: number,
                    message: format!("unexpected line '{}'", other),
                });
            }
        }
    }

    let (m, n, radius) = header.ok_or(ExportError::MissingSection("Grid"))?;
    let nodes = nodes.ok_or(ExportError::MissingSection("Nodes"))?;

    let mut grid =
        StructuredGrid::new(m, n, radius).map_err(|e| ExportError::InvalidGrid(e.to_string()))?;
    if nodes.len() != m * n {
        return Err(ExportError::InvalidGrid(format!(
            "expected {} nodes, found {}",
            m * n,
            nodes.len()
        )));
    }
    for (i, j, x, y) in nodes {
        if i >= m || j >= n {
            return Err(ExportError::InvalidGrid(format!(
                "node ({}, {}) outside {}x{}",
                i, j, m, n
            )));
        }
        grid.set_point(i, j, (x, y));
    }

    let gap = grid.periodic_mismatch();
    if !(gap <= CUT_TOL * radius.max(1.0)) {
        return Err(ExportError::InvalidGrid(format!("periodic cut open by {:.3e}", gap)));
    }
    if let Some(markers) = markers {
        grid.set_markers(markers)
            .map_err(|e| ExportError::InvalidGrid(e.to_string()))?;
    }

    Ok(grid)
}

/// Parse the body of the `$Grid` section.
fn parse_header(lines: &mut Lines<'_>) -> Result<(usize, usize, f64), ExportError> {
    let (number, line) = next_line(lines, "Grid")?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(ExportError::Parse {
            line: number,
            message: format!("expected 'M N R', got '{}'", line),
        });
    }
    let m = parse_field(parts[0], number, "M")?;
    let n = parse_field(parts[1], number, "N")?;
    let radius = parse_field(parts[2], number, "R")?;
    expect_end(lines, "$EndGrid")?;
    Ok((m, n, radius))
}

/// Parse the body of the `$Markers` section.
fn parse_markers(lines: &mut Lines<'_>) -> Result<Vec<SurfaceMarker>, ExportError> {
    let (number, line) = next_line(lines, "Markers")?;
    let markers = line
        .split_whitespace()
        .map(|flag| match flag {
            "0" => Ok(SurfaceMarker::Surface),
            "1" => Ok(SurfaceMarker::Seam),
            other => Err(ExportError::Parse {
                line: number,
                message: format!("invalid marker '{}'", other),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    expect_end(lines, "$EndMarkers")?;
    Ok(markers)
}

/// Parse node lines up to `$EndNodes`.
fn parse_nodes(lines: &mut Lines<'_>) -> Result<Vec<(usize, usize, f64, f64)>, ExportError> {
    let mut nodes = Vec::new();
    loop {
        let (number, line) = next_line(lines, "Nodes")?;
        if line == "$EndNodes" {
            return Ok(nodes);
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 4 {
            return Err(ExportError::Parse {
                line: number,
                message: format!("invalid node line '{}'", line),
            });
        }
        nodes.push((
            parse_field(parts[0], number, "i")?,
            parse_field(parts[1], number, "j")?,
            parse_field(parts[2], number, "x")?,
            parse_field(parts[3], number, "y")?,
        ));
    }
}

fn next_line(lines: &mut Lines<'_>, section: &'static str) -> Result<(usize, String), ExportError> {
    lines.next().ok_or(ExportError::MissingSection(section))?
}

fn expect_end(lines: &mut Lines<'_>, tag: &'static str) -> Result<(), ExportError> {
    let (number, line) = next_line(lines, tag)?;
    if line != tag {
        return Err(ExportError::Parse {
            line: number,
            message: format!("expected {}, got '{}'", tag, line),
        });
    }
    Ok(())
}

fn parse_field<T: std::str::FromStr>(
    token: &str,
    line: usize,
    name: &str,
) -> Result<T, ExportError> {
    token.parse().map_err(|_| ExportError::Parse {
        line,
        message: format!("invalid {} '{}'", name, token),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{
        BoundaryAssembler, BoundaryContour, InteriorInitializer, JoinSpec, Naca4,
        TransfiniteInterpolation,
    };
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    #[test]
    fn test_roundtrip_single_body() {
        let contour = BoundaryContour::naca4(Naca4::from_digits(2, 4, 12, 1.0), 41).unwrap();
        let mut grid = BoundaryAssembler::assemble(&contour, 20.0, 9).unwrap();
        TransfiniteInterpolation::default().initialize(&mut grid);

        let file = NamedTempFile::new().unwrap();
        write_text_mesh(&grid, file.path()).unwrap();
        let back = read_text_mesh(file.path()).unwrap();

        assert_eq!((back.m, back.n), (41, 9));
        assert_eq!(back.radius, 20.0);
        assert!(back.is_airfoil_alone());
        assert_eq!(back.max_change(&grid), (0.0, 0.0));
    }

    #[test]
    fn test_roundtrip_keeps_seam() {
        let main = BoundaryContour::naca4(Naca4::from_digits(0, 0, 12, 1.0), 41).unwrap();
        let flap = BoundaryContour::naca4(Naca4::from_digits(0, 0, 12, 0.3), 21).unwrap();
        let contour = BoundaryContour::join(&main, &flap, JoinSpec::default()).unwrap();
        let grid = BoundaryAssembler::assemble(&contour, 10.0, 5).unwrap();

        let file = NamedTempFile::new().unwrap();
        TextMeshExporter.write_composite(&grid, file.path()).unwrap();
        let back = read_text_mesh(file.path()).unwrap();

        assert!(!back.is_airfoil_alone());
        assert_eq!(back.seam_indices(), grid.seam_indices());
    }

    #[test]
    fn test_missing_nodes_section() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "$Grid\n3 3 1.0\n$EndGrid").unwrap();

        let result = read_text_mesh(file.path());
        assert!(matches!(result, Err(ExportError::MissingSection("Nodes"))));
    }

    #[test]
    fn test_bad_coordinate_reports_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment\n$Grid\n3 3 1.0\n$EndGrid\n$Nodes\n0 0 abc 0.0\n$EndNodes").unwrap();

        match read_text_mesh(file.path()) {
            Err(ExportError::Parse { line, message }) => {
                assert_eq!(line, 6);
                assert!(message.contains("abc"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_open_cut_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "$Grid\n3 3 1.0\n$EndGrid\n$Nodes\n").unwrap();
        for j in 0..3 {
            for i in 0..3 {
                writeln!(file, "{} {} {} {}", i, j, i as f64, j as f64).unwrap();
            }
        }
        writeln!(file, "$EndNodes").unwrap();

        let result = read_text_mesh(file.path());
        assert!(matches!(result, Err(ExportError::InvalidGrid(msg)) if msg.contains("periodic")));
    }

    #[test]
    fn test_node_count_mismatch() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "$Grid\n3 3 1.0\n$EndGrid\n$Nodes\n0 0 1.0 0.0\n$EndNodes").unwrap();

        let result = read_text_mesh(file.path());
        assert!(matches!(result, Err(ExportError::InvalidGrid(_))));
    }
}
