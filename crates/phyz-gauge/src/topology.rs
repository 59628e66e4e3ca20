//! Periodic hypercubic lattice geometry.

use phyz_lie::{LieError, Result};
use serde::{Deserialize, Serialize};

/// Extents of a periodic lattice, first dimension fastest in site order.
///
/// Site index of (x₀, x₁, …) is x₀ + L₀ (x₁ + L₁ (x₂ + …)).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Topology {
    extents: Vec<usize>,
}

impl Topology {
    /// Lattice with the given extents; needs at least two dimensions, each
    /// of extent ≥ 1.
    pub fn new(extents: impl Into<Vec<usize>>) -> Result<Self> {
        let extents = extents.into();
        if extents.len() < 2 {
            return Err(LieError::DimensionMismatch {
                context: "lattice dimensions",
                expected: 2,
                found: extents.len(),
            });
        }
        if let Some(&bad) = extents.iter().find(|&&l| l == 0) {
            return Err(LieError::DimensionMismatch {
                context: "lattice extent",
                expected: 1,
                found: bad,
            });
        }
        Ok(Self { extents })
    }

    /// Lᵈ hypercube.
    pub fn hypercubic(ndim: usize, extent: usize) -> Result<Self> {
        Self::new(vec![extent; ndim])
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Number of dimensions d.
    pub fn ndim(&self) -> usize {
        self.extents.len()
    }

    pub fn n_sites(&self) -> usize {
        self.extents.iter().product()
    }

    /// d links per site.
    pub fn n_links(&self) -> usize {
        self.ndim() * self.n_sites()
    }

    /// d(d−1)/2 plaquettes per site.
    pub fn n_plaquettes(&self) -> usize {
        self.n_sites() * self.ndim() * (self.ndim() - 1) / 2
    }

    /// Linear index of integer coordinates, wrapped periodically.
    pub fn site_index(&self, coords: &[isize]) -> Result<usize> {
        if coords.len() != self.ndim() {
            return Err(LieError::DimensionMismatch {
                context: "site coordinates",
                expected: self.ndim(),
                found: coords.len(),
            });
        }
        let mut index = 0;
        for (&x, &l) in coords.iter().zip(&self.extents).rev() {
            index = index * l + x.rem_euclid(l as isize) as usize;
        }
        Ok(index)
    }

    /// Coordinates of a linear site index.
    pub fn site_coords(&self, site: usize) -> Vec<usize> {
        let mut rest = site;
        self.extents
            .iter()
            .map(|&l| {
                let x = rest % l;
                rest /= l;
                x
            })
            .collect()
    }

    /// Site reached from `site` by `step` hops along `mu`.
    #[inline]
    pub fn shift(&self, site: usize, mu: usize, step: isize) -> usize {
        let stride: usize = self.extents[..mu].iter().product();
        let l = self.extents[mu];
        let x = (site / stride) % l;
        let moved = (x as isize + step).rem_euclid(l as isize) as usize;
        site - x * stride + moved * stride
    }

    #[inline]
    pub fn neighbor(&self, site: usize, mu: usize) -> usize {
        self.shift(site, mu, 1)
    }

    #[inline]
    pub fn neighbor_back(&self, site: usize, mu: usize) -> usize {
        self.shift(site, mu, -1)
    }

    /// Gather table `t[x] = x + μ̂` over all sites.
    pub fn forward_table(&self, mu: usize) -> Vec<usize> {
        (0..self.n_sites()).map(|s| self.neighbor(s, mu)).collect()
    }

    /// Gather table `t[x] = x − μ̂` over all sites.
    pub fn backward_table(&self, mu: usize) -> Vec<usize> {
        (0..self.n_sites()).map(|s| self.neighbor_back(s, mu)).collect()
    }

    pub fn check_direction(&self, mu: usize) -> Result<()> {
        if mu >= self.ndim() {
            return Err(LieError::DimensionMismatch {
                context: "link direction",
                expected: self.ndim(),
                found: mu,
            });
        }
        Ok(())
    }

    /// Both directions valid and distinct.
    pub fn check_plane(&self, mu: usize, nu: usize) -> Result<()> {
        self.check_direction(mu)?;
        self.check_direction(nu)?;
        if mu == nu {
            return Err(LieError::DimensionMismatch {
                context: "plaquette plane (mu == nu)",
                expected: 2,
                found: 1,
            });
        }
        Ok(())
    }

    /// All planes μ < ν.
    pub fn planes(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let d = self.ndim();
        (0..d).flat_map(move |mu| ((mu + 1)..d).map(move |nu| (mu, nu)))
    }
}

impl TryFrom<Vec<usize>> for Topology {
    type Error = LieError;

    fn try_from(extents: Vec<usize>) -> Result<Self> {
        Self::new(extents)
    }
}

impl From<Topology> for Vec<usize> {
    fn from(t: Topology) -> Self {
        t.extents
    }
}
