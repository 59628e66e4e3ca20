//! Exponential map su(N) → SU(N) and u(1) → U(1).
//!
//! U = exp(i H) with H = Σₖ cₖ Gₖ. H is Hermitian, so
//! H = V diag(λ) V† and U = V diag(e^{iλ}) V†. Because Tr H = 0 the
//! determinant is e^{i Σλ} = 1 up to rounding.

use tracing::trace;

use crate::backend::Backend;
use crate::basis::GeneratorBasis;
use crate::config::Tolerances;
use crate::error::{check_finite, Result};
use crate::unitary::{reunitarize, special_unitarity_deviation};
use crate::{CMat, Complex64, Coords};

/// exp(i H) of a Hermitian matrix.
pub fn exp_hermitian<B: Backend>(backend: &B, h: &CMat) -> CMat {
    let (lambda, v) = backend.hermitian_eigen(h);
    let phases = CMat::from_diagonal(&lambda.map(|l| Complex64::from_polar(1.0, l)));
    backend.matmul(&backend.matmul(&v, &phases), &v.adjoint())
}

/// exp(i Σₖ cₖ Gₖ) for one coordinate vector.
pub fn exp_su<B: Backend>(
    backend: &B,
    basis: &GeneratorBasis,
    coords: &[f64],
    tol: &Tolerances,
) -> Result<CMat> {
    let h = basis.combine(coords)?;
    check_finite("algebra coordinates", coords)?;
    let u = exp_hermitian(backend, &h);

    let deviation = special_unitarity_deviation(&u);
    if deviation > tol.reunitarize {
        trace!(deviation, "exp output re-unitarized");
        return Ok(reunitarize(&u));
    }
    Ok(u)
}

/// Batched exponential map, one group element per coordinate vector.
pub fn exp<B: Backend>(
    backend: &B,
    basis: &GeneratorBasis,
    coords: &[Coords],
    tol: &Tolerances,
) -> Result<Vec<CMat>> {
    backend
        .map(coords, |c| exp_su(backend, basis, c.as_slice(), tol))
        .into_iter()
        .collect()
}

/// e^{iθ}.
#[inline]
pub fn exp_u1(theta: f64) -> Complex64 {
    Complex64::from_polar(1.0, theta)
}
