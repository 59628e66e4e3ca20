//! Group logarithm SU(N) → su(N) and U(1) → u(1).
//!
//! For unitary U the complex Schur form U = Q T Q† is diagonal, so
//! H = −i log U = Q diag(θ) Q† once every eigenvalue λₖ = t_kk has been given
//! an angle θₖ. The angle assignment is where the branch ambiguity lives:
//!
//! 1. Isolated eigenvalues take the principal angle in (−π, π]; an eigenvalue
//!    exactly on the cut maps to +π.
//! 2. Eigenvalues closer than `Tolerances::degeneracy` on the unit circle form
//!    a cluster. The Schur vectors inside a cluster are only defined up to a
//!    rotation of the cluster subspace, so the cluster gets one center angle
//!    and each member the small offset arg(λₖ e^{−iθ_c}). Offsets never cross
//!    the cut, even when the cluster straddles it.
//! 3. Σθ must vanish for H to be traceless. The principal angles can wind to
//!    2πm instead; the m largest angles are lowered by 2π (or the |m| smallest
//!    raised) which leaves exp(iH) unchanged.
//!
//! The reconstructed H is Hermitized and made traceless before projection.

use std::f64::consts::{PI, TAU};

use nalgebra::DVector;
use tracing::{trace, warn};

use crate::backend::Backend;
use crate::basis::GeneratorBasis;
use crate::config::Tolerances;
use crate::error::{check_unitarity, LieError, Result};
use crate::unitary::{special_unitarity_deviation, DIVISION_GUARD};
use crate::{CMat, Complex64, Coords};

/// Phase applied to U before retrying a Schur decomposition that did not
/// converge. Irrational multiple of π so the shifted spectrum cannot
/// coincide with the original.
const SCHUR_RETRY_PHASE: f64 = 0.5 * std::f64::consts::SQRT_2;

/// Principal angle of a complex number in (−π, π], with −π mapped to +π.
#[inline]
pub fn principal_angle(z: Complex64) -> f64 {
    let a = z.im.atan2(z.re);
    if a <= -PI {
        PI
    } else {
        a
    }
}

/// arg(z · conj(reference)), small when z ≈ reference.
#[inline]
fn relative_angle(z: Complex64, reference: Complex64) -> f64 {
    (z * reference.conj()).arg()
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Angles of unit-circle eigenvalues with degenerate clusters resolved.
///
/// Returned angles are principal for isolated eigenvalues; members of a
/// cluster straddling the cut may exceed π by at most the cluster width.
pub fn eigen_phases(eigenvalues: &[Complex64], radius: f64) -> Vec<f64> {
    let n = eigenvalues.len();
    let unit: Vec<Complex64> = eigenvalues
        .iter()
        .map(|&z| {
            let r = z.norm();
            if r > DIVISION_GUARD {
                z / r
            } else {
                Complex64::new(1.0, 0.0)
            }
        })
        .collect();

    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if (unit[i] - unit[j]).norm() < radius {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj.max(ri)] = ri.min(rj);
                }
            }
        }
    }

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut slot = vec![usize::MAX; n];
    for k in 0..n {
        let root = find(&mut parent, k);
        if slot[root] == usize::MAX {
            slot[root] = clusters.len();
            clusters.push(Vec::new());
        }
        clusters[slot[root]].push(k);
    }

    let mut angles = vec![0.0; n];
    for members in &clusters {
        if let [k] = members[..] {
            angles[k] = principal_angle(unit[k]);
            continue;
        }

        let reference = unit[members[0]];
        let mean_offset = members
            .iter()
            .map(|&k| relative_angle(unit[k], reference))
            .sum::<f64>()
            / members.len() as f64;
        let center = principal_angle(reference * Complex64::from_polar(1.0, mean_offset));
        let center_z = Complex64::from_polar(1.0, center);
        for &k in members {
            angles[k] = center + relative_angle(unit[k], center_z);
        }
        trace!(size = members.len(), center, "degenerate eigenvalue cluster");
    }
    angles
}

/// Shift angles by multiples of 2π until they sum to zero.
///
/// Returns the winding number m that was removed.
pub fn remove_winding(angles: &mut [f64]) -> i64 {
    let total: f64 = angles.iter().sum();
    let m = (total / TAU).round() as i64;
    if m == 0 {
        return 0;
    }

    let mut order: Vec<usize> = (0..angles.len()).collect();
    order.sort_by(|&a, &b| angles[b].total_cmp(&angles[a]));
    if m > 0 {
        for &k in order.iter().take(m as usize) {
            angles[k] -= TAU;
        }
    } else {
        for &k in order.iter().rev().take(m.unsigned_abs() as usize) {
            angles[k] += TAU;
        }
    }
    m
}

/// (H + H†)/2 with the trace removed.
fn hermitize_traceless(h: &CMat) -> CMat {
    let n = h.nrows();
    let mut s = (h + h.adjoint()) * Complex64::new(0.5, 0.0);
    let mean = s.trace() / n as f64;
    for i in 0..n {
        s[(i, i)] -= mean;
    }
    s
}

/// Schur decomposition of a unitary matrix, retrying once on a
/// phase-rotated copy. Returns `(Q, T, phase)` with U = e^{−i phase} Q T Q†.
fn schur_unitary<B: Backend>(backend: &B, u: &CMat, tol: &Tolerances) -> Result<(CMat, CMat, f64)> {
    if let Some((q, t)) = backend.schur(u, tol.schur_epsilon, tol.schur_max_iter) {
        return Ok((q, t, 0.0));
    }

    warn!(backend = backend.name(), "Schur iteration stalled, retrying on rotated spectrum");
    let rotated = u * Complex64::from_polar(1.0, SCHUR_RETRY_PHASE);
    backend
        .schur(&rotated, tol.schur_epsilon, tol.schur_max_iter)
        .map(|(q, t)| (q, t, SCHUR_RETRY_PHASE))
        .ok_or(LieError::NoConvergence {
            routine: "complex Schur decomposition",
        })
}

/// Traceless Hermitian H with exp(iH) = U for a special unitary U.
///
/// The input is not validated; see [`log_su`].
pub fn hermitian_log<B: Backend>(backend: &B, u: &CMat, tol: &Tolerances) -> Result<CMat> {
    let n = u.nrows();
    let (q, t, phase) = schur_unitary(backend, u, tol)?;
    let unshift = Complex64::from_polar(1.0, -phase);
    let eigenvalues: Vec<Complex64> = (0..n).map(|k| t[(k, k)] * unshift).collect();

    let mut angles = eigen_phases(&eigenvalues, tol.degeneracy);
    let winding = remove_winding(&mut angles);
    if winding != 0 {
        trace!(winding, "eigen-phase winding removed");
    }

    let theta = CMat::from_diagonal(&DVector::from_iterator(
        n,
        angles.iter().map(|&a| Complex64::new(a, 0.0)),
    ));
    let h = backend.matmul(&backend.matmul(&q, &theta), &q.adjoint());
    Ok(hermitize_traceless(&h))
}

/// Algebra coordinates of one SU(N) element.
pub fn log_su<B: Backend>(
    backend: &B,
    basis: &GeneratorBasis,
    u: &CMat,
    tol: &Tolerances,
) -> Result<Coords> {
    let n = basis.order();
    if u.nrows() != n || u.ncols() != n {
        return Err(LieError::order_mismatch(n, u.nrows()));
    }
    check_unitarity(special_unitarity_deviation(u), tol.unitarity)?;

    let h = hermitian_log(backend, u, tol)?;
    basis.project(&h)
}

/// Batched logarithm, one coordinate vector per group element.
pub fn log<B: Backend>(
    backend: &B,
    basis: &GeneratorBasis,
    us: &[CMat],
    tol: &Tolerances,
) -> Result<Vec<Coords>> {
    backend
        .map(us, |u| log_su(backend, basis, u, tol))
        .into_iter()
        .collect()
}

/// Angle of a U(1) element: atan2(Im z, Re z) in (−π, π], with the cut at +π.
pub fn log_u1(z: Complex64, tol: &Tolerances) -> Result<f64> {
    check_unitarity((z.norm() - 1.0).abs(), tol.unitarity)?;
    Ok(principal_angle(z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{RayonBackend, SerialBackend};
    use crate::exp::{exp_hermitian, exp_su};
    use crate::unitary::haar_su;
    use crate::EPSILON;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// V diag(e^{iθ}) V† with Haar V.
    fn with_phases(rng: &mut StdRng, angles: &[f64]) -> (CMat, CMat) {
        let n = angles.len();
        let v = haar_su(&SerialBackend, rng, n);
        let d = CMat::from_diagonal(&DVector::from_iterator(
            n,
            angles.iter().map(|&a| Complex64::from_polar(1.0, a)),
        ));
        let h = CMat::from_diagonal(&DVector::from_iterator(
            n,
            angles.iter().map(|&a| Complex64::new(a, 0.0)),
        ));
        (&v * d * v.adjoint(), &v * h * v.adjoint())
    }

    #[test]
    fn test_principal_angle_tie_break() {
        assert_eq!(principal_angle(Complex64::new(-1.0, 0.0)), PI);
        assert_eq!(principal_angle(Complex64::new(-1.0, -0.0)), PI);
        assert_relative_eq!(principal_angle(Complex64::new(0.0, -1.0)), -PI / 2.0);
    }

    #[test]
    fn test_u1_log() {
        let tol = Tolerances::default();
        assert_eq!(log_u1(Complex64::new(-1.0, -0.0), &tol).unwrap(), PI);
        assert_relative_eq!(log_u1(Complex64::from_polar(1.0, -3.0), &tol).unwrap(), -3.0, epsilon = 1e-15);
        assert!(matches!(
            log_u1(Complex64::new(1.1, 0.0), &tol),
            Err(LieError::NonUnitaryInput { .. })
        ));
    }

    #[test]
    fn test_roundtrip_coords() {
        let mut rng = StdRng::seed_from_u64(17);
        let tol = Tolerances::default();
        let margin = 0.05;
        for n in 2..=5 {
            let basis = GeneratorBasis::new(n).unwrap();
            for _ in 0..50 {
                let mut coords = Coords::from_fn(basis.dim(), |_, _| 3.0 * (2.0 * rng.r#gen::<f64>() - 1.0));
                let h = basis.combine(coords.as_slice()).unwrap();
                let (lambda, _) = SerialBackend.hermitian_eigen(&h);
                let max_angle = lambda.amax();
                if max_angle > PI - margin {
                    coords *= (PI - margin) / max_angle * 0.99;
                }
                let u = exp_su(&SerialBackend, &basis, coords.as_slice(), &tol).unwrap();
                let back = log_su(&SerialBackend, &basis, &u, &tol).unwrap();
                assert!((&back - &coords).norm() < EPSILON, "n = {n}: {:.3e}", (&back - &coords).norm());
            }
        }
    }

    #[test]
    fn test_roundtrip_haar() {
        let mut rng = StdRng::seed_from_u64(23);
        let tol = Tolerances::default();
        for n in 2..=5 {
            let basis = GeneratorBasis::new(n).unwrap();
            for _ in 0..50 {
                let u = haar_su(&SerialBackend, &mut rng, n);
                let coords = log_su(&SerialBackend, &basis, &u, &tol).unwrap();
                let back = exp_su(&SerialBackend, &basis, coords.as_slice(), &tol).unwrap();
                assert!((back - &u).norm() < EPSILON);
            }
        }
    }

    #[test]
    fn test_near_degenerate_eigenvalues() {
        let mut rng = StdRng::seed_from_u64(31);
        let tol = Tolerances::default();
        let basis = GeneratorBasis::new(3).unwrap();
        let alpha = 0.7;
        for delta in [0.0, 1e-12, 1e-9, 1e-8] {
            let (u, h) = with_phases(&mut rng, &[alpha, alpha + delta, -2.0 * alpha - delta]);
            let expected = basis.project(&h).unwrap();
            let coords = log_su(&SerialBackend, &basis, &u, &tol).unwrap();
            assert!(coords.iter().all(|c| c.is_finite()));
            assert!((&coords - &expected).norm() < 1e-8, "delta = {delta}");

            let h_back = basis.combine(coords.as_slice()).unwrap();
            assert!((&h_back - h_back.adjoint()).norm() < 1e-14);
        }
    }

    #[test]
    fn test_cluster_straddling_cut() {
        // SU(2) eigen-angles ±(π − δ): the pair sits on both sides of the cut.
        let mut rng = StdRng::seed_from_u64(37);
        let tol = Tolerances::default();
        let basis = GeneratorBasis::new(2).unwrap();
        for delta in [1e-3, 1e-7, 1e-10, 0.0] {
            let (u, _) = with_phases(&mut rng, &[PI - delta, -(PI - delta)]);
            let coords = log_su(&SerialBackend, &basis, &u, &tol).unwrap();
            // |c| / 2 is the largest eigen-angle of H.
            assert_relative_eq!(coords.norm(), 2.0 * (PI - delta), epsilon = 1e-9);
            let back = exp_su(&SerialBackend, &basis, coords.as_slice(), &tol).unwrap();
            assert!((back - &u).norm() < EPSILON, "delta = {delta}");
        }
    }

    #[test]
    fn test_minus_identity_even_n() {
        let tol = Tolerances::default();
        for n in [2, 4] {
            let basis = GeneratorBasis::new(n).unwrap();
            let u = -CMat::identity(n, n);
            let coords = log_su(&SerialBackend, &basis, &u, &tol).unwrap();
            // Half the eigen-angles at +π, half at −π.
            assert_relative_eq!(coords.norm(), PI * (2.0 * n as f64).sqrt(), epsilon = 1e-12);
            let back = exp_su(&SerialBackend, &basis, coords.as_slice(), &tol).unwrap();
            assert!((back - &u).norm() < EPSILON);
        }
    }

    #[test]
    fn test_minus_identity_odd_n_is_not_special() {
        let basis = GeneratorBasis::new(3).unwrap();
        let u = -CMat::identity(3, 3);
        let err = log_su(&SerialBackend, &basis, &u, &Tolerances::default()).unwrap_err();
        assert!(matches!(err, LieError::NonUnitaryInput { .. }));
    }

    #[test]
    fn test_winding_removed() {
        // Principal angles (2.5, 2.5, 2π − 5) sum to 2π.
        let basis = GeneratorBasis::new(3).unwrap();
        let tol = Tolerances::default();
        let u = CMat::from_diagonal(&DVector::from_vec(vec![
            Complex64::from_polar(1.0, 2.5),
            Complex64::from_polar(1.0, 2.5),
            Complex64::from_polar(1.0, -5.0),
        ]));
        let h = hermitian_log(&SerialBackend, &u, &tol).unwrap();
        assert_relative_eq!(h.trace().norm(), 0.0, epsilon = 1e-13);
        let back = exp_hermitian(&SerialBackend, &h);
        assert!((back - &u).norm() < EPSILON);
        assert!(log_su(&SerialBackend, &basis, &u, &tol).is_ok());
    }

    #[test]
    fn test_remove_winding_direction() {
        let mut up = vec![3.0, 3.0, 0.283_185_307_179_586_2];
        assert_eq!(remove_winding(&mut up), 1);
        assert_relative_eq!(up[0], 3.0 - TAU);
        assert_relative_eq!(up.iter().sum::<f64>(), 0.0, epsilon = 1e-12);

        let mut down = vec![-3.0, -3.0, -0.283_185_307_179_586_2];
        assert_eq!(remove_winding(&mut down), -1);
        assert_relative_eq!(down.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eigen_phases_cluster_offsets() {
        let d = 1e-9;
        let eig = [
            Complex64::from_polar(1.0, PI - d),
            Complex64::from_polar(1.0, -PI + d),
            Complex64::from_polar(1.0, 0.3),
        ];
        let angles = eigen_phases(&eig, 1e-6);
        // Cluster members differ by their true separation, not by ~2π.
        assert_relative_eq!((angles[1] - angles[0]).abs(), 2.0 * d, epsilon = 1e-14);
        assert_relative_eq!(angles[2], 0.3, epsilon = 1e-15);
    }

    #[test]
    fn test_rejects_non_unitary() {
        let basis = GeneratorBasis::new(3).unwrap();
        let u = CMat::identity(3, 3) * Complex64::new(1.1, 0.0);
        assert!(matches!(
            log_su(&SerialBackend, &basis, &u, &Tolerances::default()),
            Err(LieError::NonUnitaryInput { .. })
        ));
    }

    #[test]
    fn test_rejects_non_finite() {
        let basis = GeneratorBasis::new(3).unwrap();
        let tol = Tolerances::default();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut u = CMat::identity(3, 3);
            u[(0, 0)] = Complex64::new(bad, 0.0);
            assert!(matches!(
                log_su(&SerialBackend, &basis, &u, &tol),
                Err(LieError::NonUnitaryInput { .. })
            ));
            assert!(matches!(
                log_u1(Complex64::new(bad, 0.0), &tol),
                Err(LieError::NonUnitaryInput { .. })
            ));
            assert!(matches!(
                log_u1(Complex64::new(0.0, bad), &tol),
                Err(LieError::NonUnitaryInput { .. })
            ));
        }
    }

    /// Serial backend whose Schur routine fails a fixed number of times.
    #[derive(Debug, Clone, Default)]
    struct StallingBackend {
        failures: usize,
        calls: Arc<AtomicUsize>,
    }

    impl Backend for StallingBackend {
        fn name(&self) -> &'static str {
            "stalling"
        }

        fn map<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
        where
            T: Sync,
            U: Send,
            F: Fn(&T) -> U + Sync + Send,
        {
            SerialBackend.map(items, f)
        }

        fn zip_map<T, S, U, F>(&self, a: &[T], b: &[S], f: F) -> Vec<U>
        where
            T: Sync,
            S: Sync,
            U: Send,
            F: Fn(&T, &S) -> U + Sync + Send,
        {
            SerialBackend.zip_map(a, b, f)
        }

        fn schur(&self, u: &CMat, eps: f64, max_iter: usize) -> Option<(CMat, CMat)> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return None;
            }
            SerialBackend.schur(u, eps, max_iter)
        }
    }

    #[test]
    fn test_schur_retry_on_rotated_spectrum() {
        let mut rng = StdRng::seed_from_u64(43);
        let tol = Tolerances::default();
        let backend = StallingBackend {
            failures: 1,
            ..Default::default()
        };
        for n in [2, 3, 4] {
            backend.calls.store(0, Ordering::SeqCst);
            let u = haar_su(&SerialBackend, &mut rng, n);
            let h = hermitian_log(&backend, &u, &tol).unwrap();
            assert_eq!(backend.calls.load(Ordering::SeqCst), 2);

            let reference = hermitian_log(&SerialBackend, &u, &tol).unwrap();
            assert!((&h - &reference).norm() < 1e-10, "n = {n}");
            assert_relative_eq!(h.trace().norm(), 0.0, epsilon = 1e-13);
            let back = exp_hermitian(&SerialBackend, &h);
            assert!((back - &u).norm() < EPSILON);
        }
    }

    #[test]
    fn test_schur_gives_up_after_retry() {
        let backend = StallingBackend {
            failures: usize::MAX,
            ..Default::default()
        };
        let basis = GeneratorBasis::new(3).unwrap();
        let u = haar_su(&SerialBackend, &mut StdRng::seed_from_u64(47), 3);
        let err = log_su(&backend, &basis, &u, &Tolerances::default()).unwrap_err();
        assert!(matches!(err, LieError::NoConvergence { .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rejects_wrong_order() {
        let basis = GeneratorBasis::new(3).unwrap();
        let u = CMat::identity(2, 2);
        assert!(matches!(
            log_su(&SerialBackend, &basis, &u, &Tolerances::default()),
            Err(LieError::InvalidGroupOrder { .. })
        ));
    }

    #[test]
    fn test_batch_backends_agree() {
        let mut rng = StdRng::seed_from_u64(41);
        let basis = GeneratorBasis::new(3).unwrap();
        let tol = Tolerances::default();
        let us: Vec<CMat> = (0..64).map(|_| haar_su(&SerialBackend, &mut rng, 3)).collect();
        let serial = log(&SerialBackend, &basis, &us, &tol).unwrap();
        let parallel = log(&RayonBackend::with_min_len(4), &basis, &us, &tol).unwrap();
        for (s, p) in serial.iter().zip(&parallel) {
            assert!((s - p).norm() < 1e-12);
        }
    }
}
