//! Elliptic solver configuration.

use crate::error::ConfigError;

/// Point-iterative update discipline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IterationMethod {
    /// Every read comes from the previous full iterate.
    Jacobi,
    /// Reads see values already updated in the same sweep (`j` outer, `i` inner).
    GaussSeidel,
    /// Gauss-Seidel sweep blended with the previous iterate by `omega`.
    #[default]
    Sor,
}

impl IterationMethod {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jacobi => "J",
            Self::GaussSeidel => "GS",
            Self::Sor => "SOR",
        }
    }
}

/// Iteration control for elliptic relaxation.
///
/// # Example
///
/// ```
/// use ogrid_rs::elliptic::{EllipticConfig, IterationMethod};
///
/// let config = EllipticConfig::default()
///     .with_method(IterationMethod::Sor)
///     .with_omega(0.15)
///     .with_tolerance(1e-8)
///     .with_max_iterations(20_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EllipticConfig {
    /// Update discipline.
    pub method: IterationMethod,
    /// SOR relaxation factor, `0 < omega < 2`. Ignored by Jacobi and Gauss-Seidel.
    pub omega: f64,
    /// Maximum number of sweeps.
    pub max_iterations: usize,
    /// Absolute tolerance on the largest per-sweep coordinate change.
    pub tolerance: f64,
    /// Invoke the checkpoint hook every this many sweeps.
    pub checkpoint_interval: Option<usize>,
}

impl Default for EllipticConfig {
    fn default() -> Self {
        Self {
            method: IterationMethod::Sor,
            omega: 1.0,
            max_iterations: 55_000,
            tolerance: 1e-6,
            checkpoint_interval: None,
        }
    }
}

impl EllipticConfig {
    /// Set the update discipline.
    pub fn with_method(mut self, method: IterationMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the SOR relaxation factor.
    pub fn with_omega(mut self, omega: f64) -> Self {
        self.omega = omega;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Invoke the checkpoint hook every `interval` sweeps.
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = Some(interval);
        self
    }

    /// Relaxation factor actually applied in the blend step.
    pub fn effective_omega(&self) -> f64 {
        match self.method {
            IterationMethod::Sor => self.omega,
            _ => 1.0,
        }
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.method == IterationMethod::Sor && !(self.omega > 0.0 && self.omega < 2.0) {
            return Err(ConfigError::InvalidOmega(self.omega));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.checkpoint_interval == Some(0) {
            return Err(ConfigError::ZeroCheckpointInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EllipticConfig::default().validate().is_ok());
    }

    #[test]
    fn test_omega_range() {
        let c = EllipticConfig::default().with_omega(2.0);
        assert_eq!(c.validate(), Err(ConfigError::InvalidOmega(2.0)));
        let c = EllipticConfig::default().with_omega(0.0);
        assert_eq!(c.validate(), Err(ConfigError::InvalidOmega(0.0)));
        let c = EllipticConfig::default().with_omega(1.9);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_omega_ignored_outside_sor() {
        let c = EllipticConfig::default()
            .with_method(IterationMethod::GaussSeidel)
            .with_omega(5.0);
        assert!(c.validate().is_ok());
        assert_eq!(c.effective_omega(), 1.0);
    }

    #[test]
    fn test_rejects_zero_interval_and_tolerance() {
        let c = EllipticConfig::default().with_checkpoint_interval(0);
        assert_eq!(c.validate(), Err(ConfigError::ZeroCheckpointInterval));
        let c = EllipticConfig::default().with_tolerance(0.0);
        assert_eq!(c.validate(), Err(ConfigError::InvalidTolerance(0.0)));
        let c = EllipticConfig::default().with_max_iterations(0);
        assert_eq!(c.validate(), Err(ConfigError::ZeroIterations));
    }
}
