//! Grid transformation metrics.
//!
//! Read-only post-processing of a finished grid: finite-difference
//! derivatives, the Jacobian and covariant/contravariant metric tensors, and a
//! fold check on the Jacobian sign.

mod tensor;

pub use tensor::{JacobianSign, MetricError, MetricTensor};
