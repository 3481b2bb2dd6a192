//! Closed body contours.
//!
//! A contour is the ordered, closed sequence of points that becomes row
//! `j = 0` of an O-grid. Contours run clockwise and start at the trailing
//! edge / lower-surface junction; the first and last points coincide so that
//! the periodic cut of the grid is a single physical line.
//!
//! Composite bodies (main element plus flap) are represented as one contour
//! whose inter-body seam points are tagged with [`SurfaceMarker::Seam`]. The
//! seam is traversed twice, once in each direction, so seam node `i` and node
//! `M - 1 - i` sit at the same location.
//!
//! # Example
//!
//! ```
//! use ogrid_rs::grid::{BoundaryContour, Naca4};
//!
//! let contour = BoundaryContour::naca4(Naca4::from_digits(0, 0, 12, 1.0), 41).unwrap();
//! assert_eq!(contour.len(), 41);
//! assert!(contour.is_single_body());
//! ```

use std::f64::consts::PI;
use std::ops::Range;

use crate::error::GeometryError;

/// Relative distance below which two seam nodes are considered coincident.
pub(crate) const SEAM_MATCH_TOL: f64 = 1e-9;

/// Classification of a contour point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceMarker {
    /// Genuine body surface (fixed during elliptic relaxation).
    Surface,
    /// Inter-body seam (solved specially and mirrored).
    Seam,
}

/// Ordered closed body contour, clockwise.
#[derive(Clone, Debug)]
pub struct BoundaryContour {
    points: Vec<(f64, f64)>,
    markers: Option<Vec<SurfaceMarker>>,
}

/// NACA 4-digit section parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Naca4 {
    /// Maximum camber as a fraction of chord.
    pub camber: f64,
    /// Chordwise position of maximum camber as a fraction of chord.
    pub camber_position: f64,
    /// Maximum thickness as a fraction of chord.
    pub thickness: f64,
    /// Chord length.
    pub chord: f64,
}

impl Naca4 {
    /// Build from the designation digits, e.g. `(2, 4, 12)` for NACA 2412.
    pub fn from_digits(camber: u32, position: u32, thickness: u32, chord: f64) -> Self {
        Self {
            camber: camber as f64 / 100.0,
            camber_position: position as f64 / 10.0,
            thickness: thickness as f64 / 100.0,
            chord,
        }
    }

    /// Zero camber section.
    pub fn is_symmetric(&self) -> bool {
        self.camber == 0.0 && self.camber_position == 0.0
    }

    /// Half thickness at chord fraction `xc`.
    fn half_thickness(&self, xc: f64) -> f64 {
        const A0: f64 = 0.2969;
        const A1: f64 = -0.126;
        const A2: f64 = -0.3516;
        const A3: f64 = 0.2843;
        const A4: f64 = -0.1015;

        5.0 * self.thickness
            * (A0 * xc.sqrt() + A1 * xc + A2 * xc * xc + A3 * xc.powi(3) + A4 * xc.powi(4))
    }

    /// Mean camber line height and slope at chord fraction `xc`.
    fn camber_line(&self, xc: f64) -> (f64, f64) {
        let m = self.camber;
        let p = self.camber_position;
        if xc <= p {
            (
                m / (p * p) * (2.0 * p * xc - xc * xc),
                2.0 * m / (p * p) * (p - xc),
            )
        } else {
            let q = (1.0 - p) * (1.0 - p);
            (
                m / q * ((1.0 - 2.0 * p) + 2.0 * p * xc - xc * xc),
                2.0 * m / q * (p - xc),
            )
        }
    }
}

/// Placement of a flap relative to the main element for [`BoundaryContour::join`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JoinSpec {
    /// Gap in x between the main trailing edge and the flap leading edge.
    pub dx: f64,
    /// Offset in y applied to the main element.
    pub dy: f64,
    /// Number of seam points strictly between the two bodies.
    pub seam_points: usize,
}

impl Default for JoinSpec {
    fn default() -> Self {
        Self {
            dx: 0.05,
            dy: 0.0,
            seam_points: 4,
        }
    }
}

/// Angles for `m` clockwise samples of a full circle starting at angle 0.
///
/// The circle is split into two halves, `2π → π` then `π → 0`, sharing the
/// node at `π`. For odd `m` both halves have the same number of nodes.
pub(crate) fn clockwise_angles(m: usize) -> Vec<f64> {
    let first = m.div_ceil(2);
    let second = m + 1 - first;
    let mut theta = Vec::with_capacity(m);

    for k in 0..first {
        let t = if first > 1 {
            k as f64 / (first - 1) as f64
        } else {
            0.0
        };
        theta.push(2.0 * PI - PI * t);
    }
    for k in 1..second {
        let t = k as f64 / (second - 1) as f64;
        theta.push(PI - PI * t);
    }

    theta
}

impl BoundaryContour {
    /// Single-body contour from raw points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self {
            points,
            markers: None,
        }
    }

    /// Attach seam markers (turns the contour into a composite body).
    pub fn with_markers(mut self, markers: Vec<SurfaceMarker>) -> Self {
        self.markers = Some(markers);
        self
    }

    /// Clockwise circle of `radius` centred at the origin, starting at `(radius, 0)`.
    pub fn circle(radius: f64, m: usize) -> Result<Self, GeometryError> {
        if m < 3 {
            return Err(GeometryError::TooFewPoints(m));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(GeometryError::InvalidContour(format!(
                "circle radius must be positive, got {}",
                radius
            )));
        }

        let mut points: Vec<(f64, f64)> = clockwise_angles(m)
            .into_iter()
            .map(|t| (radius * t.cos(), radius * t.sin()))
            .collect();
        // Exact closure: cos(2π) and sin(2π) are not exactly 1 and 0.
        points[0] = (radius, 0.0);
        points[m - 1] = (radius, 0.0);

        Ok(Self::new(points))
    }

    /// NACA 4-digit section with `m` points (odd), clustered at both edges.
    ///
    /// Starts at the trailing edge, runs along the lower surface to the
    /// leading edge and back along the upper surface. The origin sits at the
    /// quarter chord and the trailing edge is closed at `(0.75 c, 0)`.
    pub fn naca4(profile: Naca4, m: usize) -> Result<Self, GeometryError> {
        if m < 5 || m % 2 == 0 {
            return Err(GeometryError::InvalidContour(format!(
                "NACA contour needs an odd point count >= 5, got {}",
                m
            )));
        }
        if !profile.is_symmetric() && (profile.camber_position <= 0.0 || profile.camber_position >= 1.0) {
            return Err(GeometryError::InvalidContour(format!(
                "camber position {} must lie in (0, 1)",
                profile.camber_position
            )));
        }

        let half = m.div_ceil(2);
        let c = profile.chord;

        let mut upper = Vec::with_capacity(half);
        let mut lower = Vec::with_capacity(half);
        for k in 0..half {
            let beta = PI * k as f64 / (half - 1) as f64;
            let xc = (1.0 - beta.cos()) / 2.0;
            let yt = profile.half_thickness(xc);

            let (xu, yu, xl, yl) = if profile.is_symmetric() {
                (xc, yt, xc, -yt)
            } else {
                let (yc, slope) = profile.camber_line(xc);
                let theta = slope.atan();
                (
                    xc - yt * theta.sin(),
                    yc + yt * theta.cos(),
                    xc + yt * theta.sin(),
                    yc - yt * theta.cos(),
                )
            };

            upper.push((c * xu - c / 4.0, c * yu));
            lower.push((c * xl - c / 4.0, c * yl));
        }

        let mut points = Vec::with_capacity(m);
        points.extend(lower[1..].iter().rev());
        points.extend(upper.iter());

        let trailing_edge = (0.75 * c, 0.0);
        points[0] = trailing_edge;
        points[m - 1] = trailing_edge;

        Ok(Self::new(points))
    }

    /// Join a main element and a flap into one composite contour.
    ///
    /// The flap leading edge (its middle point) is placed `layout.dx` behind the
    /// main trailing edge and the main element is lifted by the flap leading
    /// edge height plus `layout.dy`. The seam runs from the flap leading edge to
    /// the main trailing edge and back. The flap must have an odd point count
    /// so that the seam is mirrored about the contour midpoint.
    pub fn join(main: &Self, flap: &Self, layout: JoinSpec) -> Result<Self, GeometryError> {
        let sf = flap.len();
        if sf < 3 || sf % 2 == 0 {
            return Err(GeometryError::InvalidContour(format!(
                "flap contour needs an odd point count >= 3, got {}",
                sf
            )));
        }
        if main.len() < 3 {
            return Err(GeometryError::TooFewPoints(main.len()));
        }
        if layout.seam_points == 0 {
            return Err(GeometryError::InvalidContour(
                "seam needs at least one point".to_string(),
            ));
        }

        let half = sf / 2;
        let flap_le = flap.points[half];
        let lift = flap_le.1 + layout.dy;
        let shift = main.points[0].0 - flap_le.0 + layout.dx;

        let main_pts: Vec<(f64, f64)> = main.points.iter().map(|&(x, y)| (x, y + lift)).collect();
        let flap_pts: Vec<(f64, f64)> = flap.points.iter().map(|&(x, y)| (x + shift, y)).collect();

        let start = flap_pts[half];
        let end = main_pts[0];
        let n_seam = layout.seam_points;
        let seam: Vec<(f64, f64)> = (1..=n_seam)
            .map(|k| {
                let t = k as f64 / (n_seam + 1) as f64;
                (start.0 + t * (end.0 - start.0), start.1 + t * (end.1 - start.1))
            })
            .collect();

        let total = sf + 1 + 2 * n_seam + main_pts.len();
        let mut points = Vec::with_capacity(total);
        let mut markers = Vec::with_capacity(total);

        points.extend_from_slice(&flap_pts[..=half]);
        markers.extend(std::iter::repeat_n(SurfaceMarker::Surface, half + 1));
        points.extend_from_slice(&seam);
        markers.extend(std::iter::repeat_n(SurfaceMarker::Seam, n_seam));
        points.extend_from_slice(&main_pts);
        markers.extend(std::iter::repeat_n(SurfaceMarker::Surface, main_pts.len()));
        points.extend(seam.iter().rev());
        markers.extend(std::iter::repeat_n(SurfaceMarker::Seam, n_seam));
        points.extend_from_slice(&flap_pts[half..]);
        markers.extend(std::iter::repeat_n(SurfaceMarker::Surface, sf - half));

        Ok(Self::new(points).with_markers(markers))
    }

    /// Rotate about the origin by `degrees`, clockwise positive (airfoil convention).
    pub fn rotate(&mut self, degrees: f64) {
        let rads = -degrees.to_radians();
        let (s, c) = rads.sin_cos();
        for p in &mut self.points {
            let (x, y) = *p;
            *p = (c * x - s * y, s * x + c * y);
        }
    }

    /// Translate every point.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.0 += dx;
            p.1 += dy;
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the contour has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Contour points in order.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Seam markers, if this is a composite body.
    pub fn markers(&self) -> Option<&[SurfaceMarker]> {
        self.markers.as_deref()
    }

    /// True when the contour has no seam.
    pub fn is_single_body(&self) -> bool {
        self.markers.is_none()
    }

    /// Check point count, finiteness and seam consistency.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let m = self.points.len();
        if m < 3 {
            return Err(GeometryError::TooFewPoints(m));
        }
        for (index, &(x, y)) in self.points.iter().enumerate() {
            if !(x.is_finite() && y.is_finite()) {
                return Err(GeometryError::NonFinite { index, x, y });
            }
        }
        if let Some(markers) = &self.markers {
            seam_run(markers, &self.points)?;
        }
        Ok(())
    }

    /// Index range of the first seam run, if any.
    pub fn seam_run(&self) -> Result<Option<Range<usize>>, GeometryError> {
        match &self.markers {
            Some(markers) => seam_run(markers, &self.points),
            None => Ok(None),
        }
    }
}

/// Locate and validate the seam run of a marker sequence.
///
/// Returns the first contiguous run of seam markers. Every seam node of the
/// run must have its mirror `M - 1 - i` marked as seam and at the same
/// location, and there may be no other seam nodes.
pub(crate) fn seam_run(
    markers: &[SurfaceMarker],
    points: &[(f64, f64)],
) -> Result<Option<Range<usize>>, GeometryError> {
    let m = points.len();
    if markers.len() != m {
        return Err(GeometryError::MarkerMismatch {
            markers: markers.len(),
            points: m,
        });
    }

    let Some(start) = markers.iter().position(|&mk| mk == SurfaceMarker::Seam) else {
        return Ok(None);
    };
    let end = markers[start..]
        .iter()
        .position(|&mk| mk != SurfaceMarker::Seam)
        .map_or(m, |len| start + len);

    // The stencil needs i - 1 and the mirror M - 1 - i strictly beyond i.
    if start == 0 || 2 * end > m {
        return Err(GeometryError::SeamOutOfRange { start, end });
    }

    let scale = points
        .iter()
        .fold(0.0_f64, |acc, &(x, y)| acc.max(x.abs()).max(y.abs()))
        .max(1.0);

    for index in start..end {
        let mirror = m - 1 - index;
        if markers[mirror] != SurfaceMarker::Seam {
            return Err(GeometryError::UnmirroredSeam { index, mirror });
        }
        let (xa, ya) = points[index];
        let (xb, yb) = points[mirror];
        let gap = ((xa - xb).powi(2) + (ya - yb).powi(2)).sqrt();
        if gap > SEAM_MATCH_TOL * scale {
            return Err(GeometryError::SeamGap { index, mirror, gap });
        }
    }

    let total_seam = markers.iter().filter(|&&mk| mk == SurfaceMarker::Seam).count();
    if total_seam != 2 * (end - start) {
        return Err(GeometryError::InvalidContour(format!(
            "found {} seam markers, expected {} for a single mirrored seam",
            total_seam,
            2 * (end - start)
        )));
    }

    Ok(Some(start..end))
}
