//! Generator basis of su(N).
//!
//! Generalized Gell-Mann matrices normalized to Tr(Gₐ G_b) = δ_ab / 2, so that
//! the coordinates of a Hermitian traceless H are cₐ = 2 Tr(H Gₐ).
//!
//! Ordering, for k = 1..N-1:
//!   symmetric(0,k), antisymmetric(0,k), …, symmetric(k-1,k), antisymmetric(k-1,k), diagonal(k)
//!
//! which reproduces σ/2 for N = 2 and λ₁…λ₈ / 2 for N = 3.
//!
//! Each generator has at most N non-zero entries and is stored sparsely;
//! building the whole basis touches O(N²) entries.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{LieError, Result};
use crate::{CMat, Complex64, Coords};

/// Shape of a generator within the generalized Gell-Mann family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    /// (E_jk + E_kj) / 2.
    Symmetric { row: usize, col: usize },
    /// (−i E_jk + i E_kj) / 2.
    Antisymmetric { row: usize, col: usize },
    /// diag(1, …, 1, −level, 0, …) / √(2 level (level+1)).
    Diagonal { level: usize },
}

/// One basis generator, stored as its non-zero entries.
#[derive(Debug, Clone)]
pub struct Generator {
    kind: GeneratorKind,
    entries: Vec<(usize, usize, Complex64)>,
}

impl Generator {
    fn symmetric(row: usize, col: usize) -> Self {
        let half = Complex64::new(0.5, 0.0);
        Self {
            kind: GeneratorKind::Symmetric { row, col },
            entries: vec![(row, col, half), (col, row, half)],
        }
    }

    fn antisymmetric(row: usize, col: usize) -> Self {
        Self {
            kind: GeneratorKind::Antisymmetric { row, col },
            entries: vec![
                (row, col, Complex64::new(0.0, -0.5)),
                (col, row, Complex64::new(0.0, 0.5)),
            ],
        }
    }

    fn diagonal(level: usize) -> Self {
        let l = level as f64;
        let norm = 1.0 / (2.0 * l * (l + 1.0)).sqrt();
        let mut entries: Vec<_> = (0..level)
            .map(|i| (i, i, Complex64::new(norm, 0.0)))
            .collect();
        entries.push((level, level, Complex64::new(-l * norm, 0.0)));
        Self {
            kind: GeneratorKind::Diagonal { level },
            entries,
        }
    }

    /// Off-diagonal pair or diagonal level this generator belongs to.
    pub fn kind(&self) -> GeneratorKind {
        self.kind
    }

    /// Non-zero entries as `(row, col, value)`.
    pub fn entries(&self) -> &[(usize, usize, Complex64)] {
        &self.entries
    }

    /// Dense N×N matrix.
    pub fn to_dense(&self, n: usize) -> CMat {
        let mut m = CMat::zeros(n, n);
        for &(r, c, v) in &self.entries {
            m[(r, c)] = v;
        }
        m
    }

    /// Tr(H G) for a dense N×N matrix `h`.
    #[inline]
    pub fn trace_with(&self, h: &CMat) -> Complex64 {
        self.entries
            .iter()
            .fold(Complex64::new(0.0, 0.0), |acc, &(r, c, v)| acc + h[(c, r)] * v)
    }
}

/// Ordered generator basis of su(N).
#[derive(Debug, Clone)]
pub struct GeneratorBasis {
    order: usize,
    generators: Vec<Generator>,
}

impl GeneratorBasis {
    /// Build the N²−1 generators of su(N).
    pub fn new(n: usize) -> Result<Self> {
        if n < 2 {
            return Err(LieError::order_too_small(n));
        }

        let mut generators = Vec::with_capacity(n * n - 1);
        for k in 1..n {
            for j in 0..k {
                generators.push(Generator::symmetric(j, k));
                generators.push(Generator::antisymmetric(j, k));
            }
            generators.push(Generator::diagonal(k));
        }

        Ok(Self {
            order: n,
            generators,
        })
    }

    /// Matrix size N.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Algebra dimension N²−1.
    pub fn dim(&self) -> usize {
        self.generators.len()
    }

    /// All generators in Gell-Mann order.
    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    /// Generator k, or `None` past N²−1.
    pub fn generator(&self, k: usize) -> Option<&Generator> {
        self.generators.get(k)
    }

    /// H = Σₖ cₖ Gₖ.
    pub fn combine(&self, coords: &[f64]) -> Result<CMat> {
        if coords.len() != self.dim() {
            return Err(LieError::DimensionMismatch {
                context: "algebra coordinates",
                expected: self.dim(),
                found: coords.len(),
            });
        }
        let mut h = CMat::zeros(self.order, self.order);
        for (g, &c) in self.generators.iter().zip(coords) {
            if c == 0.0 {
                continue;
            }
            for &(r, col, v) in &g.entries {
                h[(r, col)] += v * c;
            }
        }
        Ok(h)
    }

    /// Coordinates cₖ = 2 Re Tr(H Gₖ) of a Hermitian matrix.
    ///
    /// The trace part of `h` is orthogonal to every generator and is dropped.
    pub fn project(&self, h: &CMat) -> Result<Coords> {
        if h.nrows() != self.order || h.ncols() != self.order {
            return Err(LieError::order_mismatch(self.order, h.nrows()));
        }
        Ok(Coords::from_iterator(
            self.dim(),
            self.generators.iter().map(|g| 2.0 * g.trace_with(h).re),
        ))
    }
}

/// Process- or context-owned cache of generator bases keyed by N.
///
/// Populated on first use of a given N and never invalidated.
#[derive(Debug, Default)]
pub struct BasisCache {
    inner: RwLock<HashMap<usize, Arc<GeneratorBasis>>>,
}

impl BasisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared basis for SU(n), built on first request.
    pub fn get(&self, n: usize) -> Result<Arc<GeneratorBasis>> {
        if let Some(basis) = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&n)
        {
            return Ok(Arc::clone(basis));
        }

        let built = Arc::new(GeneratorBasis::new(n)?);
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let basis = map.entry(n).or_insert_with(|| {
            debug!(n, dim = built.dim(), "generator basis cached");
            built
        });
        Ok(Arc::clone(basis))
    }

    /// Number of cached bases.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
