//! Poisson forcing functions.
//!
//! The forcing terms pull coordinate lines toward a target line:
//!
//! `P(s) = -a · sign(s - line) · exp(-c · |s - line|)`
//!
//! where `s = i / (M - 1)` for `P` and `s = j / (N - 1)` for `Q`. The sign
//! makes lines on both sides move toward `line`; `a` sets the strength and `c`
//! the decay away from it. A node lying exactly on the target line gets zero
//! forcing.

/// One forcing term `(a, c, line)`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ForcingTerm {
    /// Attraction strength `a`.
    pub amplitude: f64,
    /// Exponential decay rate `c`.
    pub decay: f64,
    /// Target line in normalised parametric coordinates, `[0, 1]`.
    pub line: f64,
}

impl ForcingTerm {
    /// Forcing toward the normalised line `line`.
    pub fn new(amplitude: f64, decay: f64, line: f64) -> Self {
        Self {
            amplitude,
            decay,
            line,
        }
    }

    /// Forcing toward grid line `index` out of `count` nodes.
    pub fn toward_index(amplitude: f64, decay: f64, index: usize, count: usize) -> Self {
        Self::new(amplitude, decay, index as f64 / (count - 1) as f64)
    }

    /// No forcing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Evaluate at normalised coordinate `s`.
    #[inline]
    pub fn value(&self, s: f64) -> f64 {
        let d = s - self.line;
        if d == 0.0 || self.amplitude == 0.0 {
            return 0.0;
        }
        -self.amplitude * d.signum() * (-self.decay * d.abs()).exp()
    }

    /// Values at every node of a line with `count` nodes.
    pub fn sample(&self, count: usize) -> Vec<f64> {
        let denom = (count.max(2) - 1) as f64;
        (0..count).map(|k| self.value(k as f64 / denom)).collect()
    }
}

/// Forcing pair `(P(ξ), Q(η))` for Poisson mode.
///
/// The tuple `(a, c, linea_xi)` drives `P` and `(aa, cc, linea_eta)` drives `Q`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PoissonForcing {
    /// ξ-direction forcing `P`.
    pub xi: ForcingTerm,
    /// η-direction forcing `Q`.
    pub eta: ForcingTerm,
}

impl PoissonForcing {
    /// Forcing in both directions.
    pub fn new(xi: ForcingTerm, eta: ForcingTerm) -> Self {
        Self { xi, eta }
    }

    /// Clustering toward the body only (`Q` toward `η = 0`).
    pub fn wall_clustering(amplitude: f64, decay: f64) -> Self {
        Self {
            xi: ForcingTerm::none(),
            eta: ForcingTerm::new(amplitude, decay, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_on_target_line() {
        let f = ForcingTerm::new(10.0, 2.0, 0.5);
        assert_eq!(f.value(0.5), 0.0);
    }

    #[test]
    fn test_sign_pulls_toward_line() {
        let f = ForcingTerm::new(10.0, 2.0, 0.5);
        assert!(f.value(0.75) < 0.0);
        assert!(f.value(0.25) > 0.0);
        assert!((f.value(0.75) + f.value(0.25)).abs() < 1e-14);
    }

    #[test]
    fn test_decay() {
        let f = ForcingTerm::new(1.0, 3.0, 0.0);
        let expected = -(-3.0_f64 * 0.5).exp();
        assert!((f.value(0.5) - expected).abs() < 1e-14);
        assert!(f.value(0.9).abs() < f.value(0.1).abs());
    }

    #[test]
    fn test_sample_hits_line_exactly() {
        let f = ForcingTerm::toward_index(5.0, 1.0, 4, 9);
        let p = f.sample(9);
        assert_eq!(p.len(), 9);
        assert_eq!(p[4], 0.0);
        assert!(p.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_wall_clustering_q_at_body() {
        let forcing = PoissonForcing::wall_clustering(190.0, 8.4);
        let q = forcing.eta.sample(11);
        assert_eq!(q[0], 0.0);
        assert!(q[1] < 0.0);
        assert!(forcing.xi.sample(5).iter().all(|&v| v == 0.0));
    }
}
