//! SU2 native mesh output.
//!
//! Writes the grid as 2D quadrilaterals (`NDIME= 2`, element type 9) with two
//! boundary markers, `airfoil` on the body row and `farfield` on the outer
//! row (line type 3).
//!
//! The periodic cut is merged: column `M - 1` reuses the point indices of
//! column `0`. For composite bodies the mirrored seam nodes of the body row
//! are merged as well, together with the two nodes where the seam meets the
//! bodies (flap leading edge and main trailing edge). The seam becomes an
//! interior line and its edges are left out of the `airfoil` marker.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{ExportError, MeshExporter};
use crate::grid::{SEAM_MATCH_TOL, StructuredGrid, SurfaceMarker};

/// VTK/SU2 quadrilateral element type.
const SU2_QUAD: u8 = 9;
/// VTK/SU2 line element type.
const SU2_LINE: u8 = 3;

/// [`MeshExporter`] for the SU2 native format.
#[derive(Clone, Copy, Debug, Default)]
pub struct Su2Exporter;

impl MeshExporter for Su2Exporter {
    fn name(&self) -> &'static str {
        "su2"
    }

    fn write_single_body(&self, grid: &StructuredGrid, path: &Path) -> Result<(), ExportError> {
        write_su2(grid, path, &PointNumbering::single_body(grid))
    }

    fn write_composite(&self, grid: &StructuredGrid, path: &Path) -> Result<(), ExportError> {
        let markers = grid
            .markers()
            .ok_or_else(|| ExportError::InvalidGrid("composite export needs seam markers".to_string()))?;
        write_su2(grid, path, &PointNumbering::composite(grid, markers))
    }
}

/// Map from grid node to SU2 point index.
struct PointNumbering {
    /// `index[i + j * m]`, already resolved for merged nodes.
    index: Vec<usize>,
    /// Nodes that own a point, in point order.
    owners: Vec<(usize, usize)>,
    /// Body edges `(i, i + 1)` that are interior after merging.
    interior_body_edge: Vec<bool>,
}

impl PointNumbering {
    fn single_body(grid: &StructuredGrid) -> Self {
        Self::build(grid, |_| None, vec![false; grid.m - 1])
    }

    fn composite(grid: &StructuredGrid, markers: &[SurfaceMarker]) -> Self {
        let m = grid.m;
        let seam = grid.seam_indices().unwrap_or(0..0);
        let scale = (0..m)
            .map(|i| grid.point(i, 0))
            .fold(1.0_f64, |acc, (x, y)| acc.max(x.abs()).max(y.abs()));
        let coincides = |k: usize| {
            let (xa, ya) = grid.point(k, 0);
            let (xb, yb) = grid.point(m - 1 - k, 0);
            (xa - xb).hypot(ya - yb) <= SEAM_MATCH_TOL * scale
        };

        // Widen the run by the body nodes at either end of the seam
        let mut folded = seam.clone();
        if !seam.is_empty() {
            if seam.start > 0 && coincides(seam.start - 1) {
                folded.start -= 1;
            }
            if seam.end < m && coincides(seam.end) {
                folded.end += 1;
            }
        }
        let merged = |i: usize| {
            let k = m - 1 - i;
            (k < i && folded.contains(&k)).then_some(k)
        };
        let interior = (0..m - 1)
            .map(|i| markers[i] == SurfaceMarker::Seam || markers[i + 1] == SurfaceMarker::Seam)
            .collect();
        Self::build(grid, merged, interior)
    }

    /// `merged(i)` names the body node that body node `i` is folded into.
    fn build<F>(grid: &StructuredGrid, merged: F, interior_body_edge: Vec<bool>) -> Self
    where
        F: Fn(usize) -> Option<usize>,
    {
        let (m, n) = (grid.m, grid.n);
        let mut index = vec![usize::MAX; m * n];
        let mut owners = Vec::with_capacity((m - 1) * n);

        for j in 0..n {
            for i in 0..m - 1 {
                if j == 0 && merged(i).is_some() {
                    continue;
                }
                index[i + j * m] = owners.len();
                owners.push((i, j));
            }
        }
        for j in 0..n {
            index[(m - 1) + j * m] = index[j * m];
        }
        for i in 0..m - 1 {
            if let Some(k) = merged(i) {
                index[i] = index[k];
            }
        }

        Self {
            index,
            owners,
            interior_body_edge,
        }
    }
}

fn write_su2(grid: &StructuredGrid, path: &Path, numbering: &PointNumbering) -> Result<(), ExportError> {
    let (m, n) = (grid.m, grid.n);
    let id = |i: usize, j: usize| numbering.index[i + j * m];

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "NDIME= 2")?;
    writeln!(writer, "NELEM= {}", (m - 1) * (n - 1))?;
    let mut element = 0;
    for j in 0..n - 1 {
        for i in 0..m - 1 {
            writeln!(
                writer,
                "{} {} {} {} {} {}",
                SU2_QUAD,
                id(i, j),
                id(i + 1, j),
                id(i + 1, j + 1),
                id(i, j + 1),
                element
            )?;
            element += 1;
        }
    }

    writeln!(writer, "NPOIN= {}", numbering.owners.len())?;
    for (k, &(i, j)) in numbering.owners.iter().enumerate() {
        let (x, y) = grid.point(i, j);
        writeln!(writer, "{:.15e} {:.15e} {}", x, y, k)?;
    }

    let wall: Vec<usize> = (0..m - 1).filter(|&i| !numbering.interior_body_edge[i]).collect();
    writeln!(writer, "NMARK= 2")?;
    writeln!(writer, "MARKER_TAG= airfoil")?;
    writeln!(writer, "MARKER_ELEMS= {}", wall.len())?;
    for i in wall {
        writeln!(writer, "{} {} {}", SU2_LINE, id(i, 0), id(i + 1, 0))?;
    }
    writeln!(writer, "MARKER_TAG= farfield")?;
    writeln!(writer, "MARKER_ELEMS= {}", m - 1)?;
    for i in 0..m - 1 {
        writeln!(writer, "{} {} {}", SU2_LINE, id(i, n - 1), id(i + 1, n - 1))?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{
        BoundaryAssembler, BoundaryContour, InteriorInitializer, JoinSpec, Naca4, TransfiniteInterpolation,
    };
    use crate::io::export;
    use std::fs;
    use tempfile::tempdir;

    fn value_after(content: &str, key: &str) -> usize {
        content
            .lines()
            .find_map(|l| l.strip_prefix(key))
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }

    #[test]
    fn test_single_body_counts() {
        let contour = BoundaryContour::circle(1.0, 21).unwrap();
        let grid = BoundaryAssembler::assemble(&contour, 5.0, 6).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("circle.su2");

        export(&grid, &Su2Exporter, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(value_after(&content, "NELEM="), 20 * 5);
        assert_eq!(value_after(&content, "NPOIN="), 20 * 6);
        let markers: Vec<usize> = content
            .lines()
            .filter_map(|l| l.strip_prefix("MARKER_ELEMS="))
            .map(|v| v.trim().parse().unwrap())
            .collect();
        assert_eq!(markers, vec![20, 20]);
    }

    #[test]
    fn test_cut_is_merged() {
        let contour = BoundaryContour::circle(1.0, 9).unwrap();
        let grid = BoundaryAssembler::assemble(&contour, 5.0, 3).unwrap();
        let numbering = PointNumbering::single_body(&grid);

        for j in 0..3 {
            assert_eq!(numbering.index[8 + j * 9], numbering.index[j * 9]);
        }
        assert!(numbering.index.iter().all(|&k| k < numbering.owners.len()));
    }

    #[test]
    fn test_composite_merges_seam() {
        let main = BoundaryContour::naca4(Naca4::from_digits(0, 0, 12, 1.0), 41).unwrap();
        let flap = BoundaryContour::naca4(Naca4::from_digits(0, 0, 12, 0.3), 21).unwrap();
        let layout = JoinSpec::default();
        let contour = BoundaryContour::join(&main, &flap, layout).unwrap();
        let grid = BoundaryAssembler::assemble(&contour, 10.0, 4).unwrap();
        let m = grid.m;
        let seam = grid.seam_indices().unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("composite.su2");
        export(&grid, &Su2Exporter, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        // Seam nodes plus flap leading edge and main trailing edge
        assert_eq!(value_after(&content, "NPOIN="), (m - 1) * 4 - (seam.len() + 2));
        let wall = content
            .lines()
            .skip_while(|l| !l.starts_with("MARKER_TAG= airfoil"))
            .nth(1)
            .and_then(|l| l.strip_prefix("MARKER_ELEMS="))
            .map(|v| v.trim().parse::<usize>().unwrap())
            .unwrap();
        // Each traversal of the seam covers seam_points + 1 edges
        assert_eq!(wall, (m - 1) - 2 * (layout.seam_points + 1));

        let numbering = PointNumbering::composite(&grid, grid.markers().unwrap());
        for i in seam.start - 1..=seam.end {
            assert_eq!(numbering.index[i], numbering.index[m - 1 - i]);
        }
    }

    #[test]
    fn test_composite_points_are_distinct() {
        let main = BoundaryContour::naca4(Naca4::from_digits(2, 4, 12, 1.0), 31).unwrap();
        let flap = BoundaryContour::naca4(Naca4::from_digits(0, 0, 12, 0.3), 15).unwrap();
        let contour = BoundaryContour::join(&main, &flap, JoinSpec::default()).unwrap();
        let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 3).unwrap();
        TransfiniteInterpolation::default().initialize(&mut grid);

        let dir = tempdir().unwrap();
        let path = dir.path().join("distinct.su2");
        export(&grid, &Su2Exporter, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        let npoin = value_after(&content, "NPOIN=");
        let points: Vec<(f64, f64)> = content
            .lines()
            .skip_while(|l| !l.starts_with("NPOIN="))
            .skip(1)
            .take(npoin)
            .map(|l| {
                let mut it = l.split_whitespace().map(|v| v.parse::<f64>().unwrap());
                (it.next().unwrap(), it.next().unwrap())
            })
            .collect();
        assert_eq!(points.len(), npoin);

        for a in 0..npoin {
            for b in a + 1..npoin {
                let gap = (points[a].0 - points[b].0).hypot(points[a].1 - points[b].1);
                assert!(gap > 1e-9, "points {} and {} coincide at {:?}", a, b, points[a]);
            }
        }
    }
}
