//! Error type shared by the Lie kernel and the lattice crates.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LieError {
    #[error("invalid group order {order}: {detail}")]
    InvalidGroupOrder { order: usize, detail: String },

    #[error("non-unitary input: deviation {deviation:.3e} exceeds tolerance {tolerance:.1e}")]
    NonUnitaryInput { deviation: f64, tolerance: f64 },

    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("non-finite value in {context}")]
    NonFiniteInput { context: &'static str },

    #[error("{routine} did not converge")]
    NoConvergence { routine: &'static str },

    #[error("invalid tolerance: {0}")]
    InvalidTolerance(String),
}

impl LieError {
    pub(crate) fn order_too_small(order: usize) -> Self {
        Self::InvalidGroupOrder {
            order,
            detail: "SU(N) requires N >= 2".into(),
        }
    }

    pub(crate) fn order_mismatch(expected: usize, found: usize) -> Self {
        Self::InvalidGroupOrder {
            order: found,
            detail: format!("element is {found}x{found}, group expects {expected}x{expected}"),
        }
    }
}

/// Unitarity gate. A NaN deviation fails it.
pub(crate) fn check_unitarity(deviation: f64, tolerance: f64) -> Result<()> {
    if deviation <= tolerance {
        return Ok(());
    }
    Err(LieError::NonUnitaryInput {
        deviation,
        tolerance,
    })
}

pub(crate) fn check_finite(context: &'static str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        return Ok(());
    }
    Err(LieError::NonFiniteInput { context })
}

pub type Result<T> = std::result::Result<T, LieError>;
