//! Link field on a periodic lattice.

use phyz_lie::{Group, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::topology::Topology;

/// Gauge links U_μ(x) on a periodic lattice.
///
/// U_μ(x) lives on the edge from x to x+μ̂. Storage is
/// `links[direction][site]`, with sites in [`Topology`] order. Neighbor
/// gather tables are built once so that whole-lattice products are a
/// gather followed by a batched multiply on the group's backend.
#[derive(Debug, Clone)]
pub struct LatticeField<G: Group> {
    group: G,
    topology: Topology,
    links: Vec<Vec<G::Element>>,
    forward: Vec<Vec<usize>>,
    backward: Vec<Vec<usize>>,
}

/// `out[x] = field[table[x]]`.
pub(crate) fn gather<E: Clone>(field: &[E], table: &[usize]) -> Vec<E> {
    table.iter().map(|&s| field[s].clone()).collect()
}

impl<G: Group> LatticeField<G> {
    /// Cold start: every link is the identity.
    pub fn identity(topology: Topology, group: G) -> Self {
        let one = group.identity();
        let links = vec![vec![one; topology.n_sites()]; topology.ndim()];
        Self::from_links(topology, group, links)
    }

    /// Hot start: independent Haar-random links.
    pub fn random<R: Rng + ?Sized>(topology: Topology, group: G, rng: &mut R) -> Self {
        let mut links = Vec::with_capacity(topology.ndim());
        for _ in 0..topology.ndim() {
            let mut dir = Vec::with_capacity(topology.n_sites());
            for _ in 0..topology.n_sites() {
                dir.push(group.random(rng));
            }
            links.push(dir);
        }
        debug!(
            extents = ?topology.extents(),
            n_colors = group.n_colors(),
            "random link field"
        );
        Self::from_links(topology, group, links)
    }

    /// Hot start from a fixed seed.
    pub fn random_seeded(topology: Topology, group: G, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random(topology, group, &mut rng)
    }

    pub(crate) fn from_links(topology: Topology, group: G, links: Vec<Vec<G::Element>>) -> Self {
        let forward = (0..topology.ndim()).map(|mu| topology.forward_table(mu)).collect();
        let backward = (0..topology.ndim()).map(|mu| topology.backward_table(mu)).collect();
        Self {
            group,
            topology,
            links,
            forward,
            backward,
        }
    }

    pub fn group(&self) -> &G {
        &self.group
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn ndim(&self) -> usize {
        self.topology.ndim()
    }

    pub fn n_sites(&self) -> usize {
        self.topology.n_sites()
    }

    /// All links in direction μ, in site order.
    pub fn links(&self, mu: usize) -> Result<&[G::Element]> {
        self.topology.check_direction(mu)?;
        Ok(&self.links[mu])
    }

    /// U_μ at a linear site index.
    #[inline]
    pub fn get_link(&self, mu: usize, site: usize) -> &G::Element {
        &self.links[mu][site]
    }

    /// U_μ(x) for integer coordinates, wrapped periodically.
    pub fn link(&self, site: &[isize], mu: usize) -> Result<&G::Element> {
        self.topology.check_direction(mu)?;
        let idx = self.topology.site_index(site)?;
        Ok(&self.links[mu][idx])
    }

    /// Replace U_μ(x).
    ///
    /// The element must be in the group within `Tolerances::unitarity`;
    /// drift above `Tolerances::reunitarize` is projected away before it
    /// is stored.
    pub fn set_link(&mut self, site: &[isize], mu: usize, element: G::Element) -> Result<()> {
        self.topology.check_direction(mu)?;
        let idx = self.topology.site_index(site)?;
        self.links[mu][idx] = self.group.validate(&element)?;
        Ok(())
    }

    pub(crate) fn direction(&self, mu: usize) -> &[G::Element] {
        &self.links[mu]
    }

    pub(crate) fn forward(&self, mu: usize) -> &[usize] {
        &self.forward[mu]
    }

    pub(crate) fn backward(&self, mu: usize) -> &[usize] {
        &self.backward[mu]
    }

    /// Re Tr(U) / N.
    #[inline]
    pub(crate) fn normalized_re_trace(&self, u: &G::Element) -> f64 {
        self.group.re_trace(u) / self.group.n_colors() as f64
    }

    // ------------------------------------------------------------------
    // Plaquettes
    // ------------------------------------------------------------------

    /// U_μν(x) = U_μ(x) U_ν(x+μ) U_μ†(x+ν) U_ν†(x).
    pub fn plaquette(&self, site: &[isize], (mu, nu): (usize, usize)) -> Result<G::Element> {
        self.topology.check_plane(mu, nu)?;
        let idx = self.topology.site_index(site)?;
        Ok(self.plaquette_at(idx, mu, nu))
    }

    /// Plaquette at a linear site index; directions are not checked.
    pub fn plaquette_at(&self, site: usize, mu: usize, nu: usize) -> G::Element {
        let g = &self.group;
        let x_mu = self.forward[mu][site];
        let x_nu = self.forward[nu][site];

        let a = g.mul(&self.links[mu][site], &self.links[nu][x_mu]);
        let b = g.mul(&a, &g.adjoint(&self.links[mu][x_nu]));
        g.mul(&b, &g.adjoint(&self.links[nu][site]))
    }

    /// Plaquettes U_μν(x) for every site, batched on the group's backend.
    pub fn plaquette_field(&self, mu: usize, nu: usize) -> Result<Vec<G::Element>> {
        self.topology.check_plane(mu, nu)?;
        Ok(self.plaquette_batch(mu, nu))
    }

    fn plaquette_batch(&self, mu: usize, nu: usize) -> Vec<G::Element> {
        let g = &self.group;
        // U_μ(x) U_ν(x+μ) and U_ν(x) U_μ(x+ν)
        let yuv = g.mul_batch(&self.links[mu], &gather(&self.links[nu], &self.forward[mu]));
        let yvu = g.mul_batch(&self.links[nu], &gather(&self.links[mu], &self.forward[nu]));
        g.mul_batch(&yuv, &g.adjoint_batch(&yvu))
    }

    /// Σₓ Re Tr U_μν(x) / N over all planes μ < ν.
    pub fn plaquette_sum(&self) -> f64 {
        let mut sum = 0.0;
        for (mu, nu) in self.topology.planes() {
            let field = self.plaquette_batch(mu, nu);
            sum += self
                .group
                .re_trace_batch(&field)
                .iter()
                .sum::<f64>();
        }
        sum / self.group.n_colors() as f64
    }

    /// ⟨Re Tr U_μν / N⟩ over every plaquette, each counted once.
    pub fn average_plaquette(&self) -> f64 {
        self.plaquette_sum() / self.topology.n_plaquettes() as f64
    }

    // ------------------------------------------------------------------
    // Staples and action
    // ------------------------------------------------------------------

    /// Staple sum Σ_ν≠μ of
    ///   upper: U_ν(x+μ) U_μ†(x+ν) U_ν†(x)
    ///   lower: U_ν†(x+μ−ν) U_μ†(x−ν) U_ν(x−ν)
    ///
    /// Not projected onto the group. Re Tr(U_μ(x) Σ) is the sum of
    /// Re Tr over the 2(d−1) plaquettes containing the link.
    pub fn staple(&self, site: &[isize], mu: usize) -> Result<G::Element> {
        self.topology.check_direction(mu)?;
        let idx = self.topology.site_index(site)?;
        Ok(self.staple_at(idx, mu))
    }

    /// Staple sum at a linear site index; the direction is not checked.
    pub fn staple_at(&self, site: usize, mu: usize) -> G::Element {
        let g = &self.group;
        let x_mu = self.forward[mu][site];
        let mut staple = g.zero();

        for nu in 0..self.ndim() {
            if nu == mu {
                continue;
            }
            let x_nu = self.forward[nu][site];
            let upper = g.mul(
                &g.mul(&self.links[nu][x_mu], &g.adjoint(&self.links[mu][x_nu])),
                &g.adjoint(&self.links[nu][site]),
            );

            let x_back = self.backward[nu][site];
            let x_mu_back = self.backward[nu][x_mu];
            let lower = g.mul(
                &g.mul(&g.adjoint(&self.links[nu][x_mu_back]), &g.adjoint(&self.links[mu][x_back])),
                &self.links[nu][x_back],
            );

            staple = g.add(&g.add(&staple, &upper), &lower);
        }
        staple
    }

    /// Staple sums for every link in direction μ, batched.
    pub fn staple_field(&self, mu: usize) -> Result<Vec<G::Element>> {
        self.topology.check_direction(mu)?;
        Ok(self.staple_batch(mu))
    }

    pub(crate) fn staple_batch(&self, mu: usize) -> Vec<G::Element> {
        let g = &self.group;
        let mut staple = vec![g.zero(); self.n_sites()];

        for nu in 0..self.ndim() {
            if nu == mu {
                continue;
            }
            // U_ν(x+μ), shared by both halves
            let nu_fwd = gather(&self.links[nu], &self.forward[mu]);

            let upper = g.mul_batch(
                &g.mul_batch(&nu_fwd, &g.adjoint_batch(&gather(&self.links[mu], &self.forward[nu]))),
                &g.adjoint_batch(&self.links[nu]),
            );

            // U_ν†(y+μ) U_μ†(y) U_ν(y), evaluated at y = x−ν
            let lower_at_y = g.mul_batch(
                &g.mul_batch(&g.adjoint_batch(&nu_fwd), &g.adjoint_batch(&self.links[mu])),
                &self.links[nu],
            );
            let lower = gather(&lower_at_y, &self.backward[nu]);

            staple = g.add_batch(&g.add_batch(&staple, &upper), &lower);
        }
        staple
    }

    /// Wilson action S = β Σ_{x, μ<ν} (1 − Re Tr U_μν(x) / N).
    pub fn action(&self, beta: f64) -> f64 {
        let n = self.group.n_colors() as f64;
        let mut s = 0.0;
        for (mu, nu) in self.topology.planes() {
            let field = self.plaquette_batch(mu, nu);
            s += self
                .group
                .re_trace_batch(&field)
                .iter()
                .map(|re| 1.0 - re / n)
                .sum::<f64>();
        }
        beta * s
    }
}
