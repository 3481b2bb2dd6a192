//! Radial stretching functions.
//!
//! A stretching function distributes `n` nodes over the normalised interval
//! `[0, 1]` from the body (0) to the far field (1). It is used to seed the
//! algebraic interior grid and, in geometric form, by the parabolic marching
//! generator for its radial node distribution.
//!
//! # Available Stretching Functions
//!
//! - [`UniformStretching`]: equal spacing
//! - [`GeometricStretching`]: each interval is `ratio` times the previous one
//!
//! # Example
//!
//! ```
//! use ogrid_rs::grid::{GeometricStretching, Stretching};
//!
//! let s = GeometricStretching::new(1.2).distribution(11);
//! assert_eq!(s.len(), 11);
//! assert_eq!(s[0], 0.0);
//! assert_eq!(s[10], 1.0);
//! // Intervals grow away from the body
//! assert!(s[10] - s[9] > s[1] - s[0]);
//! ```

/// Trait for radial stretching functions.
///
/// # Implementation Notes
///
/// - The returned vector has length `n`
/// - `s[0] = 0.0` and `s[n - 1] = 1.0` exactly
/// - Values are strictly increasing
pub trait Stretching: Send + Sync {
    /// Normalised node positions in `[0, 1]`.
    fn distribution(&self, n: usize) -> Vec<f64>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Description of parameters (for diagnostics).
    fn description(&self) -> String {
        self.name().to_string()
    }
}

// =============================================================================
// Uniform Stretching
// =============================================================================

/// Equal spacing from body to far field.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformStretching;

impl Stretching for UniformStretching {
    fn distribution(&self, n: usize) -> Vec<f64> {
        if n < 2 {
            return vec![0.0; n];
        }
        let mut s: Vec<f64> = (0..n).map(|k| k as f64 / (n - 1) as f64).collect();
        s[n - 1] = 1.0;
        s
    }

    fn name(&self) -> &'static str {
        "uniform"
    }
}

// =============================================================================
// Geometric Stretching
// =============================================================================

/// Geometric progression of intervals.
///
/// Interval `k` has length `h * ratio^k` with `h = (1 - ratio) / (1 - ratio^(n-1))`
/// so the intervals sum to one. `ratio > 1` clusters nodes at the body,
/// `ratio < 1` at the far field, `ratio = 1` is uniform.
#[derive(Clone, Copy, Debug)]
pub struct GeometricStretching {
    /// Ratio between consecutive intervals.
    pub ratio: f64,
}

impl Default for GeometricStretching {
    fn default() -> Self {
        Self { ratio: 1.1 }
    }
}

impl GeometricStretching {
    /// Create stretching with the given interval ratio.
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    /// First interval length of the normalised distribution.
    pub fn first_interval(&self, intervals: usize) -> f64 {
        if intervals == 0 {
            return 0.0;
        }
        if (self.ratio - 1.0).abs() < 1e-12 {
            return 1.0 / intervals as f64;
        }
        (1.0 - self.ratio) / (1.0 - self.ratio.powi(intervals as i32))
    }

    /// Ratio whose `intervals` geometric steps starting at `first` sum to `total`.
    ///
    /// Returns `None` when no positive ratio exists (`first <= 0` or
    /// `first * intervals` overshooting in a way bisection cannot bracket).
    pub fn ratio_for(first: f64, total: f64, intervals: usize) -> Option<f64> {
        if !(first > 0.0 && total > 0.0) || intervals == 0 {
            return None;
        }
        if intervals == 1 {
            return ((first - total).abs() <= 1e-12 * total).then_some(1.0);
        }

        let sum = |q: f64| -> f64 {
            if (q - 1.0).abs() < 1e-12 {
                first * intervals as f64
            } else {
                first * (q.powi(intervals as i32) - 1.0) / (q - 1.0)
            }
        };

        let (mut lo, mut hi) = (1e-6_f64, 1.0_f64);
        if sum(1.0) < total {
            lo = 1.0;
            hi = 2.0;
            while sum(hi) < total {
                hi *= 2.0;
                if hi > 1e6 {
                    return None;
                }
            }
        } else if sum(lo) > total {
            return None;
        }

        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if sum(mid) < total {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo < 1e-15 * hi {
                break;
            }
        }
        Some(0.5 * (lo + hi))
    }
}

impl Stretching for GeometricStretching {
    fn distribution(&self, n: usize) -> Vec<f64> {
        if n < 2 {
            return vec![0.0; n];
        }

        let h = self.first_interval(n - 1);
        let mut s = Vec::with_capacity(n);
        let mut acc = 0.0;
        let mut step = h;
        for _ in 0..n - 1 {
            s.push(acc);
            acc += step;
            step *= self.ratio;
        }
        s.push(1.0);
        s
    }

    fn name(&self) -> &'static str {
        "geometric"
    }

    fn description(&self) -> String {
        format!("Geometric (ratio={:.4})", self.ratio)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_uniform_bounds_and_spacing() {
        let s = UniformStretching.distribution(11);
        assert_eq!(s.len(), 11);
        assert_eq!(s[0], 0.0);
        assert_eq!(s[10], 1.0);
        for k in 1..11 {
            assert!((s[k] - s[k - 1] - 0.1).abs() < TOL, "Spacing should be uniform");
        }
    }

    #[test]
    fn test_geometric_intervals_ratio() {
        let g = GeometricStretching::new(1.3);
        let s = g.distribution(8);
        assert_eq!(s[0], 0.0);
        assert_eq!(s[7], 1.0);
        for k in 2..8 {
            let ratio = (s[k] - s[k - 1]) / (s[k - 1] - s[k - 2]);
            assert!((ratio - 1.3).abs() < 1e-9, "Interval ratio {} at {}", ratio, k);
        }
    }

    #[test]
    fn test_geometric_unit_ratio_is_uniform() {
        let s = GeometricStretching::new(1.0).distribution(5);
        for k in 0..5 {
            assert!((s[k] - k as f64 / 4.0).abs() < TOL);
        }
    }

    #[test]
    fn test_geometric_below_one_clusters_far_field() {
        let s = GeometricStretching::new(0.8).distribution(10);
        assert!(s[1] - s[0] > s[9] - s[8]);
        for k in 1..10 {
            assert!(s[k] > s[k - 1], "Must be strictly increasing");
        }
    }

    #[test]
    fn test_ratio_for_recovers_growth() {
        let first = 0.01;
        let ratio = 1.15;
        let intervals = 20;
        let total = first * (ratio_pow(ratio, intervals) - 1.0) / (ratio - 1.0);

        let q = GeometricStretching::ratio_for(first, total, intervals).unwrap();
        assert!((q - ratio).abs() < 1e-10, "Recovered ratio {}", q);
    }

    #[test]
    fn test_ratio_for_shrinking() {
        let q = GeometricStretching::ratio_for(1.0, 5.0, 10).unwrap();
        assert!(q < 1.0);
    }

    #[test]
    fn test_ratio_for_invalid() {
        assert!(GeometricStretching::ratio_for(0.0, 1.0, 5).is_none());
        assert!(GeometricStretching::ratio_for(0.1, 1.0, 0).is_none());
    }

    fn ratio_pow(q: f64, n: usize) -> f64 {
        q.powi(n as i32)
    }
}
