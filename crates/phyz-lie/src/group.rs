//! Gauge groups as seen by a lattice field.
//!
//! A [`Group`] value carries everything an element operation needs: the
//! backend batches run on, the tolerances, and for SU(N) the shared
//! generator basis. Elements themselves are plain data (`Complex64` for
//! U(1), `CMat` for SU(N)).

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use tracing::trace;

use crate::backend::{Backend, SerialBackend};
use crate::basis::{BasisCache, GeneratorBasis};
use crate::config::Tolerances;
use crate::error::{check_finite, check_unitarity, LieError, Result};
use crate::exp::{exp_su, exp_u1};
use crate::log::{log_su, log_u1};
use crate::unitary::{haar_su, reunitarize, special_unitarity_deviation};
use crate::{CMat, Complex64, Coords};

/// Trait for gauge groups on the lattice.
pub trait Group: Clone + fmt::Debug + Send + Sync {
    /// Group element stored on a link.
    type Element: Clone + fmt::Debug + Send + Sync;

    /// Execution backend for batched operations.
    type Backend: Backend;

    /// Backend batched operations run on.
    fn backend(&self) -> &Self::Backend;

    /// Tolerances used by validation and the exp/log maps.
    fn tolerances(&self) -> &Tolerances;

    /// N for SU(N); 1 for U(1).
    fn n_colors(&self) -> usize;

    /// Number of algebra coordinates.
    fn algebra_dim(&self) -> usize;

    /// Group identity.
    fn identity(&self) -> Self::Element;

    /// Additive zero, used to accumulate staple sums.
    fn zero(&self) -> Self::Element;

    /// Group product a · b.
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Inverse of a unitary element.
    fn adjoint(&self, a: &Self::Element) -> Self::Element;

    /// Matrix sum (staples leave the group).
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Trace of an element.
    fn trace(&self, a: &Self::Element) -> Complex64;

    /// Real part of the trace.
    fn re_trace(&self, a: &Self::Element) -> f64 {
        self.trace(a).re
    }

    /// Distance from the group manifold.
    fn deviation(&self, a: &Self::Element) -> f64;

    /// Shape check only.
    fn check_shape(&self, a: &Self::Element) -> Result<()>;

    /// Nearest group element.
    fn reunitarize(&self, a: &Self::Element) -> Self::Element;

    /// exp(i Σ cₖ Gₖ).
    fn exp(&self, coords: &[f64]) -> Result<Self::Element>;

    /// Principal-branch algebra coordinates.
    fn log(&self, a: &Self::Element) -> Result<Coords>;

    /// Haar-random element.
    fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element;

    /// Im Tr(Gₖ W) for every generator.
    ///
    /// With W = U Σ (link times staple) this is the derivative of
    /// Re Tr(U Σ) along U → e^{iεGₖ} U, up to sign.
    fn algebra_projection(&self, w: &Self::Element) -> Coords;

    /// Number of complex entries in one element.
    fn element_len(&self) -> usize;

    /// Append the entries of `a` as interleaved (re, im), row-major.
    fn write_flat(&self, a: &Self::Element, out: &mut Vec<f64>);

    /// Inverse of [`Group::write_flat`]; `data` holds exactly one element.
    fn read_flat(&self, data: &[f64]) -> Result<Self::Element>;

    /// Check an element for storage: shape, then unitarity within
    /// `Tolerances::unitarity`, then projection if the drift exceeds
    /// `Tolerances::reunitarize`.
    fn validate(&self, a: &Self::Element) -> Result<Self::Element> {
        self.check_shape(a)?;
        let tol = self.tolerances();
        let deviation = self.deviation(a);
        check_unitarity(deviation, tol.unitarity)?;
        if deviation > tol.reunitarize {
            trace!(deviation, "element re-unitarized");
            return Ok(self.reunitarize(a));
        }
        Ok(a.clone())
    }

    // Batched forms, executed on the group's backend.

    /// Elementwise product of two batches.
    fn mul_batch(&self, a: &[Self::Element], b: &[Self::Element]) -> Vec<Self::Element> {
        self.backend().zip_map(a, b, |x, y| self.mul(x, y))
    }

    /// Elementwise inverse.
    fn adjoint_batch(&self, a: &[Self::Element]) -> Vec<Self::Element> {
        self.backend().map(a, |x| self.adjoint(x))
    }

    /// Elementwise sum.
    fn add_batch(&self, a: &[Self::Element], b: &[Self::Element]) -> Vec<Self::Element> {
        self.backend().zip_map(a, b, |x, y| self.add(x, y))
    }

    /// Re Tr of every element.
    fn re_trace_batch(&self, a: &[Self::Element]) -> Vec<f64> {
        self.backend().map(a, |x| self.re_trace(x))
    }

    /// Exponential map over a batch; fails on the first bad vector.
    fn exp_batch(&self, coords: &[Coords]) -> Result<Vec<Self::Element>> {
        self.backend()
            .map(coords, |c| self.exp(c.as_slice()))
            .into_iter()
            .collect()
    }

    /// Logarithm over a batch; fails on the first bad element.
    fn log_batch(&self, a: &[Self::Element]) -> Result<Vec<Coords>> {
        self.backend().map(a, |x| self.log(x)).into_iter().collect()
    }
}

fn coords_len_check(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(LieError::DimensionMismatch {
            context: "algebra coordinates",
            expected,
            found,
        });
    }
    Ok(())
}

fn flat_len_check(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(LieError::DimensionMismatch {
            context: "flattened element",
            expected,
            found,
        });
    }
    Ok(())
}

// ============================================================================
// U(1) Group
// ============================================================================

/// U(1): unit-modulus complex phases.
#[derive(Debug, Clone, Default)]
pub struct U1<B: Backend = SerialBackend> {
    backend: B,
    tol: Tolerances,
}

impl U1<SerialBackend> {
    /// U(1) on the serial backend with default tolerances.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: Backend> U1<B> {
    /// Same group on another backend.
    pub fn with_backend<C: Backend>(self, backend: C) -> U1<C> {
        U1 {
            backend,
            tol: self.tol,
        }
    }

    /// Replace the tolerances after validating them.
    pub fn with_tolerances(self, tol: Tolerances) -> Result<Self> {
        tol.validate()?;
        Ok(Self { tol, ..self })
    }
}

impl<B: Backend> Group for U1<B> {
    type Element = Complex64;
    type Backend = B;

    fn backend(&self) -> &B {
        &self.backend
    }

    fn tolerances(&self) -> &Tolerances {
        &self.tol
    }

    fn n_colors(&self) -> usize {
        1
    }

    fn algebra_dim(&self) -> usize {
        1
    }

    fn identity(&self) -> Complex64 {
        Complex64::new(1.0, 0.0)
    }

    fn zero(&self) -> Complex64 {
        Complex64::new(0.0, 0.0)
    }

    fn mul(&self, a: &Complex64, b: &Complex64) -> Complex64 {
        a * b
    }

    fn adjoint(&self, a: &Complex64) -> Complex64 {
        a.conj()
    }

    fn add(&self, a: &Complex64, b: &Complex64) -> Complex64 {
        a + b
    }

    fn trace(&self, a: &Complex64) -> Complex64 {
        *a
    }

    fn deviation(&self, a: &Complex64) -> f64 {
        (a.norm() - 1.0).abs()
    }

    fn check_shape(&self, _a: &Complex64) -> Result<()> {
        Ok(())
    }

    fn reunitarize(&self, a: &Complex64) -> Complex64 {
        let r = a.norm();
        if r > crate::unitary::DIVISION_GUARD {
            a / r
        } else {
            self.identity()
        }
    }

    fn exp(&self, coords: &[f64]) -> Result<Complex64> {
        coords_len_check(1, coords.len())?;
        check_finite("algebra coordinates", coords)?;
        Ok(exp_u1(coords[0]))
    }

    fn log(&self, a: &Complex64) -> Result<Coords> {
        Ok(Coords::from_element(1, log_u1(*a, &self.tol)?))
    }

    fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Complex64 {
        exp_u1(TAU * rng.r#gen::<f64>())
    }

    fn algebra_projection(&self, w: &Complex64) -> Coords {
        Coords::from_element(1, w.im)
    }

    fn element_len(&self) -> usize {
        1
    }

    fn write_flat(&self, a: &Complex64, out: &mut Vec<f64>) {
        out.extend_from_slice(&[a.re, a.im]);
    }

    fn read_flat(&self, data: &[f64]) -> Result<Complex64> {
        flat_len_check(2, data.len())?;
        Ok(Complex64::new(data[0], data[1]))
    }
}

// ============================================================================
// SU(N) Group
// ============================================================================

/// SU(N) for any N ≥ 2, elements as dense N×N complex matrices.
#[derive(Debug, Clone)]
pub struct SpecialUnitary<B: Backend = SerialBackend> {
    basis: Arc<GeneratorBasis>,
    backend: B,
    tol: Tolerances,
}

impl SpecialUnitary<SerialBackend> {
    /// SU(n) with a private generator basis.
    pub fn new(n: usize) -> Result<Self> {
        Ok(Self::from_basis(Arc::new(GeneratorBasis::new(n)?)))
    }

    /// SU(n) sharing the basis held by `cache`.
    pub fn with_cache(n: usize, cache: &BasisCache) -> Result<Self> {
        Ok(Self::from_basis(cache.get(n)?))
    }

    /// SU(N) over an existing basis.
    pub fn from_basis(basis: Arc<GeneratorBasis>) -> Self {
        Self {
            basis,
            backend: SerialBackend,
            tol: Tolerances::default(),
        }
    }
}

impl<B: Backend> SpecialUnitary<B> {
    /// Same group on another backend.
    pub fn with_backend<C: Backend>(self, backend: C) -> SpecialUnitary<C> {
        SpecialUnitary {
            basis: self.basis,
            backend,
            tol: self.tol,
        }
    }

    /// Replace the tolerances after validating them.
    pub fn with_tolerances(self, tol: Tolerances) -> Result<Self> {
        tol.validate()?;
        Ok(Self { tol, ..self })
    }

    /// Generator basis shared by this group.
    pub fn basis(&self) -> &GeneratorBasis {
        &self.basis
    }
}

impl<B: Backend> Group for SpecialUnitary<B> {
    type Element = CMat;
    type Backend = B;

    fn backend(&self) -> &B {
        &self.backend
    }

    fn tolerances(&self) -> &Tolerances {
        &self.tol
    }

    fn n_colors(&self) -> usize {
        self.basis.order()
    }

    fn algebra_dim(&self) -> usize {
        self.basis.dim()
    }

    fn identity(&self) -> CMat {
        let n = self.n_colors();
        CMat::identity(n, n)
    }

    fn zero(&self) -> CMat {
        let n = self.n_colors();
        CMat::zeros(n, n)
    }

    fn mul(&self, a: &CMat, b: &CMat) -> CMat {
        self.backend.matmul(a, b)
    }

    fn adjoint(&self, a: &CMat) -> CMat {
        a.adjoint()
    }

    fn add(&self, a: &CMat, b: &CMat) -> CMat {
        a + b
    }

    fn trace(&self, a: &CMat) -> Complex64 {
        a.trace()
    }

    fn deviation(&self, a: &CMat) -> f64 {
        special_unitarity_deviation(a)
    }

    fn check_shape(&self, a: &CMat) -> Result<()> {
        let n = self.n_colors();
        if a.nrows() != n || a.ncols() != n {
            return Err(LieError::order_mismatch(n, a.nrows()));
        }
        Ok(())
    }

    fn reunitarize(&self, a: &CMat) -> CMat {
        reunitarize(a)
    }

    fn exp(&self, coords: &[f64]) -> Result<CMat> {
        exp_su(&self.backend, &self.basis, coords, &self.tol)
    }

    fn log(&self, a: &CMat) -> Result<Coords> {
        log_su(&self.backend, &self.basis, a, &self.tol)
    }

    fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> CMat {
        haar_su(&self.backend, rng, self.n_colors())
    }

    fn algebra_projection(&self, w: &CMat) -> Coords {
        Coords::from_iterator(
            self.basis.dim(),
            self.basis.generators().iter().map(|g| g.trace_with(w).im),
        )
    }

    fn element_len(&self) -> usize {
        let n = self.n_colors();
        n * n
    }

    fn write_flat(&self, a: &CMat, out: &mut Vec<f64>) {
        for row in a.row_iter() {
            for z in row.iter() {
                out.extend_from_slice(&[z.re, z.im]);
            }
        }
    }

    fn read_flat(&self, data: &[f64]) -> Result<CMat> {
        let n = self.n_colors();
        flat_len_check(2 * n * n, data.len())?;
        Ok(CMat::from_fn(n, n, |i, j| {
            let k = 2 * (i * n + j);
            Complex64::new(data[k], data[k + 1])
        }))
    }
}
