//! Batched tensor primitives the group kernel is written against.
//!
//! Every algorithm in this crate (exponential map, logarithm, Haar sampling,
//! lattice products) is expressed as a per-element kernel applied over a
//! batch through [`Backend::map`] / [`Backend::zip_map`], plus a handful of
//! dense linear-algebra primitives. Swapping the backend changes how a batch
//! is executed, never the math.
//!
//! | Backend | Execution |
//! |---------|-----------|
//! | [`SerialBackend`] | one thread, in order |
//! | [`RayonBackend`] | work-stealing data parallelism over the batch |

use std::fmt;

use nalgebra::DVector;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;

use crate::CMat;

/// Capability set consumed by the group kernel.
pub trait Backend: Clone + fmt::Debug + Default + Send + Sync {
    /// Short identifier used in log output.
    fn name(&self) -> &'static str;

    /// Apply `f` to every element of a batch.
    fn map<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send;

    /// Apply `f` pairwise to two batches of equal length.
    fn zip_map<T, S, U, F>(&self, a: &[T], b: &[S], f: F) -> Vec<U>
    where
        T: Sync,
        S: Sync,
        U: Send,
        F: Fn(&T, &S) -> U + Sync + Send;

    /// Complex matrix product.
    fn matmul(&self, a: &CMat, b: &CMat) -> CMat {
        a * b
    }

    /// Batched complex matrix product.
    fn batch_matmul(&self, a: &[CMat], b: &[CMat]) -> Vec<CMat> {
        self.zip_map(a, b, |x, y| self.matmul(x, y))
    }

    /// Eigendecomposition of a Hermitian matrix: `h = V diag(λ) V†`.
    ///
    /// Only the lower triangle of `h` is read.
    fn hermitian_eigen(&self, h: &CMat) -> (DVector<f64>, CMat) {
        let eig = h.clone().symmetric_eigen();
        (eig.eigenvalues, eig.eigenvectors)
    }

    /// Complex Schur decomposition `u = Q T Q†`, returned as `(Q, T)`.
    ///
    /// `None` when the QR iteration does not converge within `max_iter`
    /// sweeps (0 = unbounded).
    fn schur(&self, u: &CMat, eps: f64, max_iter: usize) -> Option<(CMat, CMat)> {
        u.clone().try_schur(eps, max_iter).map(|s| s.unpack())
    }

    /// QR decomposition `m = Q R`, returned as `(Q, R)`.
    fn qr(&self, m: &CMat) -> (CMat, CMat) {
        let qr = m.clone().qr();
        (qr.q(), qr.r())
    }

    /// `n` independent N(0, 1) deviates.
    fn standard_normal<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n)
            .map(|_| {
                let x: f64 = StandardNormal.sample(&mut *rng);
                x
            })
            .collect()
    }
}

/// Sequential reference backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl Backend for SerialBackend {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn map<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        items.iter().map(f).collect()
    }

    fn zip_map<T, S, U, F>(&self, a: &[T], b: &[S], f: F) -> Vec<U>
    where
        T: Sync,
        S: Sync,
        U: Send,
        F: Fn(&T, &S) -> U + Sync + Send,
    {
        debug_assert_eq!(a.len(), b.len(), "zip_map batch lengths differ");
        a.iter().zip(b).map(|(x, y)| f(x, y)).collect()
    }
}

/// Data-parallel backend on the global rayon pool.
#[derive(Debug, Clone, Copy)]
pub struct RayonBackend {
    /// Smallest number of elements handed to one rayon task.
    pub min_len: usize,
}

impl Default for RayonBackend {
    fn default() -> Self {
        Self { min_len: 32 }
    }
}

impl RayonBackend {
    pub fn with_min_len(min_len: usize) -> Self {
        Self {
            min_len: min_len.max(1),
        }
    }
}

impl Backend for RayonBackend {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn map<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        items.par_iter().with_min_len(self.min_len).map(f).collect()
    }

    fn zip_map<T, S, U, F>(&self, a: &[T], b: &[S], f: F) -> Vec<U>
    where
        T: Sync,
        S: Sync,
        U: Send,
        F: Fn(&T, &S) -> U + Sync + Send,
    {
        debug_assert_eq!(a.len(), b.len(), "zip_map batch lengths differ");
        a.par_iter()
            .zip(b.par_iter())
            .with_min_len(self.min_len)
            .map(|(x, y)| f(x, y))
            .collect()
    }
}
