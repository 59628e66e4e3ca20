//! Unitarity checks, projection back onto the group, and Haar sampling.

use std::f64::consts::FRAC_1_SQRT_2;

use rand::Rng;

use crate::backend::Backend;
use crate::{CMat, Complex64};

/// Guard against division by vanishing norms during projection.
pub const DIVISION_GUARD: f64 = 1e-30;

/// ‖U†U − I‖_F.
pub fn unitarity_deviation(u: &CMat) -> f64 {
    let n = u.nrows();
    (u.adjoint() * u - CMat::identity(n, n)).norm()
}

/// ‖U†U − I‖_F + |det U − 1|.
pub fn special_unitarity_deviation(u: &CMat) -> f64 {
    unitarity_deviation(u) + (u.determinant() - Complex64::new(1.0, 0.0)).norm()
}

/// Project a near-unitary matrix back onto SU(N).
///
/// Modified Gram-Schmidt on the columns, then the last column absorbs the
/// phase of the determinant so that det = 1.
pub fn reunitarize(m: &CMat) -> CMat {
    let n = m.ncols();
    let mut u = m.clone();

    for j in 0..n {
        for i in 0..j {
            let proj = u.column(i).dotc(&u.column(j));
            let qi = u.column(i).into_owned();
            let mut cj = u.column_mut(j);
            cj -= qi * proj;
        }
        let norm = u.column(j).norm();
        if norm > DIVISION_GUARD {
            let mut cj = u.column_mut(j);
            cj /= Complex64::new(norm, 0.0);
        }
    }

    let det = u.determinant();
    let modulus = det.norm();
    if modulus > DIVISION_GUARD {
        let phase = (det / modulus).conj();
        let mut last = u.column_mut(n - 1);
        last *= phase;
    }
    u
}

/// Haar-distributed SU(N) element.
///
/// QR of a complex Ginibre matrix with the phases of diag(R) moved into Q
/// (Mezzadri, Notices AMS 54, 592 (2007)) gives Haar U(N); dividing by the
/// N-th root of the determinant lands in SU(N) and keeps left invariance.
pub fn haar_su<B: Backend, R: Rng + ?Sized>(backend: &B, rng: &mut R, n: usize) -> CMat {
    let g = backend.standard_normal(rng, 2 * n * n);
    let z = CMat::from_fn(n, n, |i, j| {
        let k = 2 * (i * n + j);
        Complex64::new(g[k], g[k + 1]) * FRAC_1_SQRT_2
    });

    let (mut q, r) = backend.qr(&z);
    for j in 0..n {
        let d = r[(j, j)];
        let modulus = d.norm();
        if modulus > DIVISION_GUARD {
            let mut col = q.column_mut(j);
            col *= d / modulus;
        }
    }

    let det_phase = q.determinant().arg();
    q * Complex64::from_polar(1.0, -det_phase / n as f64)
}
