//! 2×2 blocks and block-tridiagonal elimination.
//!
//! Both marching generators solve, per radial layer, a system
//!
//! ```text
//! L_i r_{i-1} + D_i r_i + U_i r_{i+1} = b_i,    i = 0 .. n-1
//! ```
//!
//! with 2×2 blocks acting on `r = (x, y)`. The block LU factorisation is
//!
//! ```text
//! Λ_0 = D_0,                  W_0 = Λ_0⁻¹ U_0
//! Λ_i = D_i − L_i W_{i-1},    W_i = Λ_i⁻¹ U_i
//! z_0 = Λ_0⁻¹ b_0,            z_i = Λ_i⁻¹ (b_i − L_i z_{i-1})
//! r_{n-1} = z_{n-1},          r_i = z_i − W_i r_{i+1}
//! ```
//!
//! The periodic variant couples row 0 to `r_{n-1}` and row `n-1` to `r_0`.
//! It eliminates `r_0` last: rows `1..n` are solved as an open system for a
//! particular solution `y` and a 2×2 influence `Z_k = ∂r_k/∂r_0`, after which
//! row 0 closes the system for `r_0` and `r_k = y_k + Z_k r_0`.

use std::ops::{Add, Mul, Neg, Sub};

/// Relative singularity threshold for [`Block2::inverse`].
///
/// A block is singular when `|det| <= SINGULAR_TOL · s²`, with `s` its largest
/// absolute entry. The test is invariant under scaling the block, so uniformly
/// tiny blocks such as `1e-20 · I` still invert.
const SINGULAR_TOL: f64 = 1e-14;

// =============================================================================
// Vec2
// =============================================================================

/// Point or right-hand side `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Rotated +90°: `(-y, x)`.
    #[inline]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Unit vector in the same direction, `None` for zero or non-finite length.
    #[inline]
    pub fn normalized(self) -> Option<Self> {
        let n = self.norm();
        (n > 0.0 && n.is_finite()).then(|| self * (1.0 / n))
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Vec2> for (f64, f64) {
    fn from(v: Vec2) -> Self {
        (v.x, v.y)
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }
}

// =============================================================================
// Block2
// =============================================================================

/// Row-major 2×2 block `[[a, b], [c, d]]`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Block2 {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Block2 {
    pub const fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// `s · I`.
    pub const fn diagonal(s: f64) -> Self {
        Self::new(s, 0.0, 0.0, s)
    }

    #[inline]
    pub fn det(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Largest absolute entry.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.a.abs().max(self.b.abs()).max(self.c.abs()).max(self.d.abs())
    }

    /// True if the determinant vanishes relative to the entry scale.
    #[inline]
    pub fn is_singular(&self) -> bool {
        let det = self.det();
        let s = self.scale();
        !det.is_finite() || det.abs() <= SINGULAR_TOL * s * s
    }

    /// Inverse, or `None` if singular.
    pub fn inverse(&self) -> Option<Self> {
        if self.is_singular() {
            return None;
        }
        let inv = 1.0 / self.det();
        Some(Self::new(self.d * inv, -self.b * inv, -self.c * inv, self.a * inv))
    }
}

impl Add for Block2 {
    type Output = Self;
    #[inline]
    fn add(self, o: Self) -> Self {
        Self::new(self.a + o.a, self.b + o.b, self.c + o.c, self.d + o.d)
    }
}

impl Sub for Block2 {
    type Output = Self;
    #[inline]
    fn sub(self, o: Self) -> Self {
        Self::new(self.a - o.a, self.b - o.b, self.c - o.c, self.d - o.d)
    }
}

impl Neg for Block2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.a, -self.b, -self.c, -self.d)
    }
}

impl Mul<f64> for Block2 {
    type Output = Self;
    #[inline]
    fn mul(self, s: f64) -> Self {
        Self::new(self.a * s, self.b * s, self.c * s, self.d * s)
    }
}

impl Mul for Block2 {
    type Output = Self;
    #[inline]
    fn mul(self, o: Self) -> Self {
        Self::new(
            self.a * o.a + self.b * o.c,
            self.a * o.b + self.b * o.d,
            self.c * o.a + self.d * o.c,
            self.c * o.b + self.d * o.d,
        )
    }
}

impl Mul<Vec2> for Block2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, v: Vec2) -> Vec2 {
        Vec2::new(self.a * v.x + self.b * v.y, self.c * v.x + self.d * v.y)
    }
}

// =============================================================================
// Block-tridiagonal system
// =============================================================================

/// Pivot block that could not be inverted during elimination.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SingularPivot {
    /// Row of the failing pivot.
    pub row: usize,
    /// Its determinant.
    pub determinant: f64,
}

/// Block-tridiagonal system with one row per unknown.
///
/// `lower[0]` and `upper[n - 1]` are ignored; known neighbours outside the
/// system must be moved into the right-hand side by the caller.
#[derive(Clone, Debug)]
pub struct BlockTridiagonal {
    pub lower: Vec<Block2>,
    pub diag: Vec<Block2>,
    pub upper: Vec<Block2>,
    pub rhs: Vec<Vec2>,
}

impl BlockTridiagonal {
    /// Zeroed system of `n` rows.
    pub fn new(n: usize) -> Self {
        Self {
            lower: vec![Block2::zero(); n],
            diag: vec![Block2::zero(); n],
            upper: vec![Block2::zero(); n],
            rhs: vec![Vec2::default(); n],
        }
    }

    pub fn len(&self) -> usize {
        self.diag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diag.is_empty()
    }

    /// Set all three blocks and the right-hand side of row `i`.
    #[inline]
    pub fn set_row(&mut self, i: usize, lower: Block2, diag: Block2, upper: Block2, rhs: Vec2) {
        self.lower[i] = lower;
        self.diag[i] = diag;
        self.upper[i] = upper;
        self.rhs[i] = rhs;
    }

    /// `S · r` for a candidate solution.
    pub fn apply(&self, r: &[Vec2]) -> Vec<Vec2> {
        let n = self.len();
        (0..n)
            .map(|i| {
                let mut v = self.diag[i] * r[i];
                if i > 0 {
                    v = v + self.lower[i] * r[i - 1];
                }
                if i + 1 < n {
                    v = v + self.upper[i] * r[i + 1];
                }
                v
            })
            .collect()
    }

    /// Solve by block LU elimination.
    pub fn solve(&self) -> Result<Vec<Vec2>, SingularPivot> {
        let n = self.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut w = vec![Block2::zero(); n];
        let mut z = vec![Vec2::default(); n];

        let mut pivot = self.diag[0];
        for i in 0..n {
            if i > 0 {
                pivot = self.diag[i] - self.lower[i] * w[i - 1];
            }
            let inv = pivot.inverse().ok_or(SingularPivot {
                row: i,
                determinant: pivot.det(),
            })?;

            let b = if i > 0 {
                self.rhs[i] - self.lower[i] * z[i - 1]
            } else {
                self.rhs[0]
            };
            z[i] = inv * b;
            if i + 1 < n {
                w[i] = inv * self.upper[i];
            }
        }

        let mut r = z;
        for i in (0..n - 1).rev() {
            r[i] = r[i] - w[i] * r[i + 1];
        }
        Ok(r)
    }

    /// `S · r` with the periodic wrap: row 0 reads `r[n-1]`, row `n-1` reads `r[0]`.
    pub fn apply_periodic(&self, r: &[Vec2]) -> Vec<Vec2> {
        let n = self.len();
        (0..n)
            .map(|i| {
                let west = r[(i + n - 1) % n];
                let east = r[(i + 1) % n];
                self.lower[i] * west + self.diag[i] * r[i] + self.upper[i] * east
            })
            .collect()
    }

    /// Solve the periodic system where `lower[0]` multiplies `r[n-1]` and
    /// `upper[n-1]` multiplies `r[0]`.
    pub fn solve_periodic(&self) -> Result<Vec<Vec2>, SingularPivot> {
        let n = self.len();
        match n {
            0 => return Ok(Vec::new()),
            1 => {
                let block = self.lower[0] + self.diag[0] + self.upper[0];
                let inv = block.inverse().ok_or(SingularPivot {
                    row: 0,
                    determinant: block.det(),
                })?;
                return Ok(vec![inv * self.rhs[0]]);
            }
            2 => {
                // Both neighbours of each row are the other row
                let mut open = self.clone();
                open.upper[0] = self.lower[0] + self.upper[0];
                open.lower[1] = self.lower[1] + self.upper[1];
                return open.solve();
            }
            _ => {}
        }

        let shifted = |p: SingularPivot| SingularPivot {
            row: p.row + 1,
            determinant: p.determinant,
        };
        let mut open = Self {
            lower: self.lower[1..].to_vec(),
            diag: self.diag[1..].to_vec(),
            upper: self.upper[1..].to_vec(),
            rhs: self.rhs[1..].to_vec(),
        };
        let last = n - 2;
        let particular = open.solve().map_err(shifted)?;

        // One open solve per component of r_0
        let mut columns = [Vec::new(), Vec::new()];
        for (column, unit) in columns.iter_mut().zip([Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)]) {
            open.rhs.iter_mut().for_each(|v| *v = Vec2::default());
            open.rhs[0] = -(self.lower[1] * unit);
            open.rhs[last] = open.rhs[last] - self.upper[n - 1] * unit;
            *column = open.solve().map_err(shifted)?;
        }
        let influence: Vec<Block2> = (0..n - 1)
            .map(|k| Block2::new(columns[0][k].x, columns[1][k].x, columns[0][k].y, columns[1][k].y))
            .collect();

        let closing = self.diag[0] + self.lower[0] * influence[last] + self.upper[0] * influence[0];
        let inv = closing.inverse().ok_or(SingularPivot {
            row: 0,
            determinant: closing.det(),
        })?;
        let r0 = inv * (self.rhs[0] - self.lower[0] * particular[last] - self.upper[0] * particular[0]);

        let mut r = Vec::with_capacity(n);
        r.push(r0);
        r.extend(particular.iter().zip(&influence).map(|(&y, &z)| y + z * r0));
        Ok(r)
    }
}
