//! Lattice gauge fields over U(1) and SU(N).
//!
//! Links live on the edges of a periodic hypercubic lattice of any
//! dimension ≥ 2. Group operations come from [`phyz_lie::Group`], so the same
//! field code runs for U(1) phases and SU(N) matrices on either backend.
//!
//! - Plaquettes, staples, Wilson action
//! - Improved (plaquette + rectangle) action and the gauge force
//! - Observables: average plaquette, Wilson loops, Polyakov loops
//! - Serializable snapshots of the link tensor
//!
//! # Example
//!
//! ```
//! use phyz_gauge::{LatticeField, Topology};
//! use phyz_lie::SpecialUnitary;
//!
//! let topology = Topology::hypercubic(4, 4).unwrap();
//! let cold = LatticeField::identity(topology.clone(), SpecialUnitary::new(3).unwrap());
//! assert_eq!(cold.action(6.0), 0.0);
//!
//! let hot = LatticeField::random_seeded(topology, SpecialUnitary::new(3).unwrap(), 42);
//! println!("<P> = {:.4}", hot.average_plaquette());
//! ```

pub mod action;
pub mod lattice;
pub mod observables;
pub mod snapshot;
pub mod topology;

pub use action::ActionCoeffs;
pub use lattice::LatticeField;
pub use snapshot::LinkSnapshot;
pub use topology::Topology;
