//! Serializable copy of a link field.

use phyz_lie::{Group, LieError, Result};
use serde::{Deserialize, Serialize};

use crate::lattice::LatticeField;
use crate::topology::Topology;

/// Flat, serde-friendly image of a [`LatticeField`].
///
/// `links` holds every element as interleaved (re, im) entries, row-major,
/// ordered by direction and then site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    pub topology: Topology,
    /// N of SU(N); 1 for U(1).
    pub n_colors: usize,
    pub links: Vec<f64>,
}

impl<G: Group> LatticeField<G> {
    pub fn snapshot(&self) -> LinkSnapshot {
        let g = self.group();
        let mut links = Vec::with_capacity(2 * g.element_len() * self.topology().n_links());
        for mu in 0..self.ndim() {
            for u in self.direction(mu) {
                g.write_flat(u, &mut links);
            }
        }
        LinkSnapshot {
            topology: self.topology().clone(),
            n_colors: g.n_colors(),
            links,
        }
    }

    /// Rebuild a field; every element passes the same validation as
    /// [`LatticeField::set_link`].
    pub fn from_snapshot(snapshot: &LinkSnapshot, group: G) -> Result<Self> {
        if snapshot.n_colors != group.n_colors() {
            return Err(LieError::InvalidGroupOrder {
                order: snapshot.n_colors,
                detail: format!("snapshot holds N = {}, group has N = {}", snapshot.n_colors, group.n_colors()),
            });
        }

        let topology = snapshot.topology.clone();
        let chunk = 2 * group.element_len();
        let expected = chunk * topology.n_links();
        if snapshot.links.len() != expected {
            return Err(LieError::DimensionMismatch {
                context: "snapshot link data",
                expected,
                found: snapshot.links.len(),
            });
        }

        let mut elements = snapshot.links.chunks_exact(chunk);
        let mut links = Vec::with_capacity(topology.ndim());
        for _ in 0..topology.ndim() {
            let mut dir = Vec::with_capacity(topology.n_sites());
            for data in elements.by_ref().take(topology.n_sites()) {
                dir.push(group.validate(&group.read_flat(data)?)?);
            }
            links.push(dir);
        }
        Ok(Self::from_links(topology, group, links))
    }
}
