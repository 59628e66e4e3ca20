//! Lie group kernel for lattice gauge theory.
//!
//! Provides the algebra and group primitives a lattice simulation needs for
//! U(1) and SU(N), any N ≥ 2:
//! - Generator basis of su(N), normalized Tr(Gₐ G_b) = δ_ab / 2
//! - Exponential map from algebra coordinates to group elements
//! - Group logarithm on the principal branch, stable at degenerate
//!   eigenvalues and across the branch cut
//! - Haar sampling and re-unitarization
//! - A [`Backend`] abstraction over batched execution (serial or rayon)
//!
//! # Example
//!
//! ```
//! use phyz_lie::{Group, SpecialUnitary};
//! use rand::SeedableRng;
//!
//! let su3 = SpecialUnitary::new(3).unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!
//! let u = su3.random(&mut rng);
//! let coords = su3.log(&u).unwrap();
//! let back = su3.exp(coords.as_slice()).unwrap();
//! assert!((back - &u).norm() < phyz_lie::EPSILON);
//! ```

pub mod backend;
pub mod basis;
pub mod config;
pub mod error;
pub mod exp;
pub mod group;
pub mod log;
pub mod unitary;

/// Complex scalar.
pub type Complex64 = nalgebra::Complex<f64>;

/// Dense complex matrix; SU(N) elements and algebra matrices.
pub type CMat = nalgebra::DMatrix<Complex64>;

/// Real algebra coordinates, length N²−1.
pub type Coords = nalgebra::DVector<f64>;

pub use backend::{Backend, RayonBackend, SerialBackend};
pub use basis::{BasisCache, Generator, GeneratorBasis, GeneratorKind};
pub use config::{EPSILON, Tolerances};
pub use error::{LieError, Result};
pub use exp::{exp, exp_hermitian, exp_su, exp_u1};
pub use group::{Group, SpecialUnitary, U1};
pub use log::{hermitian_log, log, log_su, log_u1, principal_angle};
pub use unitary::{haar_su, reunitarize, special_unitarity_deviation, unitarity_deviation};
