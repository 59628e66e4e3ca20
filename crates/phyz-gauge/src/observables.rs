//! Gauge-invariant loop observables.

use phyz_lie::{Complex64, Group, LieError, Result};

use crate::lattice::{LatticeField, gather};

fn check_extent(len: usize) -> Result<()> {
    if len == 0 {
        return Err(LieError::DimensionMismatch {
            context: "loop extent",
            expected: 1,
            found: 0,
        });
    }
    Ok(())
}

impl<G: Group> LatticeField<G> {
    /// Straight line of `len` links along μ starting at every site:
    /// U_μ(x) U_μ(x+μ) … U_μ(x+(len−1)μ).
    pub(crate) fn line_batch(&self, mu: usize, len: usize) -> Vec<G::Element> {
        let g = self.group();
        let links = self.direction(mu);
        let mut line = links.to_vec();
        let mut table = self.forward(mu).to_vec();
        for _ in 1..len {
            line = g.mul_batch(&line, &gather(links, &table));
            table = gather(self.forward(mu), &table);
        }
        line
    }

    /// r×t rectangular loops in the (μ, ν) plane at every site; r links
    /// along μ, t along ν.
    pub(crate) fn loop_batch(&self, mu: usize, nu: usize, r: usize, t: usize) -> Vec<G::Element> {
        let g = self.group();
        let topo = self.topology();
        let shift_mu: Vec<usize> = (0..self.n_sites()).map(|s| topo.shift(s, mu, r as isize)).collect();
        let shift_nu: Vec<usize> = (0..self.n_sites()).map(|s| topo.shift(s, nu, t as isize)).collect();

        let along_mu = self.line_batch(mu, r);
        let along_nu = self.line_batch(nu, t);
        let lower = g.mul_batch(&along_mu, &gather(&along_nu, &shift_mu));
        let upper = g.mul_batch(&along_nu, &gather(&along_mu, &shift_nu));
        g.mul_batch(&lower, &g.adjoint_batch(&upper))
    }

    /// Rectangular Wilson loop W(r, t) with corner at `site`, r links along
    /// μ then t along ν, closed counter-clockwise.
    pub fn wilson_loop(
        &self,
        site: &[isize],
        (mu, nu): (usize, usize),
        r: usize,
        t: usize,
    ) -> Result<G::Element> {
        self.topology().check_plane(mu, nu)?;
        check_extent(r)?;
        check_extent(t)?;
        let g = self.group();
        let mut x = self.topology().site_index(site)?;
        let mut w = g.identity();

        for _ in 0..r {
            w = g.mul(&w, self.get_link(mu, x));
            x = self.forward(mu)[x];
        }
        for _ in 0..t {
            w = g.mul(&w, self.get_link(nu, x));
            x = self.forward(nu)[x];
        }
        for _ in 0..r {
            x = self.backward(mu)[x];
            w = g.mul(&w, &g.adjoint(self.get_link(mu, x)));
        }
        for _ in 0..t {
            x = self.backward(nu)[x];
            w = g.mul(&w, &g.adjoint(self.get_link(nu, x)));
        }
        Ok(w)
    }

    /// Whole-lattice W(r, t) in one plane, batched.
    pub fn wilson_loop_field(&self, mu: usize, nu: usize, r: usize, t: usize) -> Result<Vec<G::Element>> {
        self.topology().check_plane(mu, nu)?;
        check_extent(r)?;
        check_extent(t)?;
        Ok(self.loop_batch(mu, nu, r, t))
    }

    /// ⟨Re Tr W(r, t) / N⟩ over all sites and planes μ < ν.
    pub fn average_wilson_loop(&self, r: usize, t: usize) -> Result<f64> {
        check_extent(r)?;
        check_extent(t)?;
        let mut sum = 0.0;
        let mut count = 0;
        for (mu, nu) in self.topology().planes() {
            for w in self.loop_batch(mu, nu, r, t) {
                sum += self.normalized_re_trace(&w);
                count += 1;
            }
        }
        Ok(sum / count as f64)
    }

    /// Polyakov loop Tr(Π_k U_μ(x + kμ)) / N, the product winding once
    /// around direction μ.
    pub fn polyakov_loop(&self, site: &[isize], mu: usize) -> Result<Complex64> {
        self.topology().check_direction(mu)?;
        let g = self.group();
        let mut x = self.topology().site_index(site)?;
        let mut p = g.identity();
        for _ in 0..self.topology().extents()[mu] {
            p = g.mul(&p, self.get_link(mu, x));
            x = self.forward(mu)[x];
        }
        Ok(g.trace(&p) / g.n_colors() as f64)
    }

    /// ⟨|L|⟩ over the hyperplane x_μ = 0.
    pub fn average_polyakov_loop(&self, mu: usize) -> Result<f64> {
        self.topology().check_direction(mu)?;
        let topo = self.topology();
        let stride: usize = topo.extents()[..mu].iter().product();
        let extent = topo.extents()[mu];

        let mut sum = 0.0;
        let mut count = 0;
        for site in (0..self.n_sites()).filter(|s| (s / stride) % extent == 0) {
            let coords: Vec<isize> = topo.site_coords(site).iter().map(|&c| c as isize).collect();
            sum += self.polyakov_loop(&coords, mu)?.norm();
            count += 1;
        }
        Ok(sum / count as f64)
    }
}
