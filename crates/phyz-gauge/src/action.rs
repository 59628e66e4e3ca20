//! Improved gauge action and the gauge force.

use phyz_lie::{Backend, Coords, Group, Result};

use crate::lattice::LatticeField;

/// Weights of the plaquette and rectangle terms of the improved action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionCoeffs {
    pub plaquette: f64,
    pub rectangle: f64,
}

impl ActionCoeffs {
    /// β_plaq = β (1 − 8 c₁), β_rect = β c₁.
    pub fn new(beta: f64, c1: f64) -> Self {
        Self {
            plaquette: beta * (1.0 - 8.0 * c1),
            rectangle: beta * c1,
        }
    }
}

impl<G: Group> LatticeField<G> {
    /// Plaquette plus rectangle action
    ///
    /// S = β_plaq Σ (1 − Re Tr P / N) + β_rect Σ (1 − Re Tr R / N)
    ///
    /// with both 2×1 and 1×2 rectangles in every plane. c₁ = 0 is the
    /// Wilson action; c₁ = −1/12 is the tree-level Symanzik action.
    pub fn improved_action(&self, beta: f64, c1: f64) -> f64 {
        let coeffs = ActionCoeffs::new(beta, c1);
        let mut s = self.action(coeffs.plaquette);
        if c1 == 0.0 {
            return s;
        }

        let mut rect = 0.0;
        for (mu, nu) in self.topology().planes() {
            for (r, t) in [(2, 1), (1, 2)] {
                rect += self
                    .loop_batch(mu, nu, r, t)
                    .iter()
                    .map(|w| 1.0 - self.normalized_re_trace(w))
                    .sum::<f64>();
            }
        }
        s += coeffs.rectangle * rect;
        s
    }

    /// Derivative of the Wilson action with respect to the algebra
    /// coordinates of U_μ(x) under U → e^{iεGₖ} U:
    ///
    /// Fₖ = (β / N) Im Tr(Gₖ U Σ)
    ///
    /// where Σ is the staple sum.
    pub fn force(&self, site: &[isize], mu: usize, beta: f64) -> Result<Coords> {
        let staple = self.staple(site, mu)?;
        let g = self.group();
        let w = g.mul(self.link(site, mu)?, &staple);
        Ok(g.algebra_projection(&w) * (beta / g.n_colors() as f64))
    }

    /// Gauge force on every link, `forces[μ][site]`.
    pub fn force_field(&self, beta: f64) -> Vec<Vec<Coords>> {
        let g = self.group();
        let scale = beta / g.n_colors() as f64;
        (0..self.ndim())
            .map(|mu| {
                let staples = self.staple_batch(mu);
                let w = g.mul_batch(self.direction(mu), &staples);
                g.backend().map(&w, |x| g.algebra_projection(x) * scale)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Topology;
    use approx::assert_relative_eq;
    use phyz_lie::{Complex64, SpecialUnitary, U1};

    #[test]
    fn test_coeffs() {
        let c = ActionCoeffs::new(6.0, -1.0 / 12.0);
        assert_relative_eq!(c.plaquette, 6.0 * 5.0 / 3.0);
        assert_relative_eq!(c.rectangle, -0.5);
    }

    #[test]
    fn test_improved_reduces_to_wilson() {
        let lattice = LatticeField::random_seeded(
            Topology::new([3, 3, 2, 2]).unwrap(),
            SpecialUnitary::new(3).unwrap(),
            21,
        );
        assert_eq!(lattice.improved_action(5.0, 0.0), lattice.action(5.0));
        assert_ne!(lattice.improved_action(5.0, -1.0 / 12.0), lattice.action(5.0));
    }

    #[test]
    fn test_improved_cold_is_zero() {
        let lattice = LatticeField::identity(Topology::hypercubic(4, 3).unwrap(), U1::new());
        assert_relative_eq!(lattice.improved_action(2.0, -0.331), 0.0);
    }

    #[test]
    fn test_force_matches_finite_difference() {
        let beta = 5.5;
        let eps = 1e-5;
        let lattice = LatticeField::random_seeded(
            Topology::new([3, 2, 2, 3]).unwrap(),
            SpecialUnitary::new(3).unwrap(),
            22,
        );
        let g = lattice.group().clone();
        let site = [1, 0, 1, 2];

        for mu in [0, 3] {
            let force = lattice.force(&site, mu, beta).unwrap();
            let u = lattice.link(&site, mu).unwrap().clone();
            for k in 0..g.algebra_dim() {
                let shifted = |sign: f64| {
                    let mut c = vec![0.0; g.algebra_dim()];
                    c[k] = sign * eps;
                    let mut moved = lattice.clone();
                    moved.set_link(&site, mu, g.mul(&g.exp(&c).unwrap(), &u)).unwrap();
                    moved.action(beta)
                };
                let fd = (shifted(1.0) - shifted(-1.0)) / (2.0 * eps);
                assert_relative_eq!(force[k], fd, epsilon = 1e-6, max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn test_u1_force() {
        // One link rotated by θ on a 2d lattice: two plaquettes see e^{±iθ}.
        let theta = 0.4_f64;
        let mut lattice = LatticeField::identity(Topology::new([3, 3]).unwrap(), U1::new());
        lattice.set_link(&[0, 0], 0, Complex64::from_polar(1.0, theta)).unwrap();
        let f = lattice.force(&[0, 0], 0, 2.0).unwrap();
        assert_relative_eq!(f[0], 2.0 * 2.0 * theta.sin(), epsilon = 1e-14);
    }

    #[test]
    fn test_force_field_matches_single() {
        let lattice = LatticeField::random_seeded(
            Topology::new([2, 3, 2]).unwrap(),
            SpecialUnitary::new(2).unwrap(),
            23,
        );
        let forces = lattice.force_field(3.0);
        assert_eq!(forces.len(), 3);
        let topo = lattice.topology();
        for site in 0..lattice.n_sites() {
            let coords: Vec<isize> = topo.site_coords(site).iter().map(|&c| c as isize).collect();
            for mu in 0..3 {
                let single = lattice.force(&coords, mu, 3.0).unwrap();
                assert!((&forces[mu][site] - single).norm() < 1e-12);
            }
        }
        assert_eq!(lattice.group().backend().name(), "serial");
    }
}
