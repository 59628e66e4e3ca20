//! Numerical tolerances for the group kernel.

use serde::{Deserialize, Serialize};

use crate::error::{LieError, Result};

/// Accuracy of group elements produced by the kernel (double precision).
///
/// Every element returned by [`crate::exp`], [`crate::group::Group::random`]
/// or stored by a lattice field is unitary with unit determinant to within
/// this bound.
pub const EPSILON: f64 = 1e-10;

/// Tolerances governing validation, projection and eigenvalue clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Largest accepted unitarity deviation ‖U†U − I‖_F + |det U − 1|
    /// for inputs to the logarithm and to `set_link`.
    pub unitarity: f64,
    /// Deviation above which outputs and stored links are re-unitarized.
    pub reunitarize: f64,
    /// Chord distance on the unit circle below which eigenvalues are
    /// treated as one degenerate cluster by the logarithm.
    pub degeneracy: f64,
    /// Convergence threshold of the complex Schur iteration.
    pub schur_epsilon: f64,
    /// Iteration cap of the complex Schur iteration (0 = unbounded).
    pub schur_max_iter: usize,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            unitarity: 1e-8,
            reunitarize: 1e-12,
            degeneracy: 1e-6,
            schur_epsilon: f64::EPSILON,
            schur_max_iter: 10_000,
        }
    }
}

impl Tolerances {
    /// Validate tolerance parameters.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("unitarity", self.unitarity),
            ("reunitarize", self.reunitarize),
            ("degeneracy", self.degeneracy),
            ("schur_epsilon", self.schur_epsilon),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LieError::InvalidTolerance(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        if self.reunitarize > self.unitarity {
            return Err(LieError::InvalidTolerance(format!(
                "reunitarize ({:.1e}) must not exceed unitarity ({:.1e})",
                self.reunitarize, self.unitarity
            )));
        }
        if self.degeneracy >= 1.0 {
            return Err(LieError::InvalidTolerance(format!(
                "degeneracy must be < 1, got {}",
                self.degeneracy
            )));
        }
        Ok(())
    }
}
