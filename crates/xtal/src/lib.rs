//! Crystallographic building blocks shared by the CASTEP readers: atoms,
//! lattices, fraction labels for wavevectors, and diagonal supercells.

pub use atom::*;
pub use fraction::{fcoord, is_int, twelfths_of};
pub use lattice::Lattice;
pub use supercell::Supercell;

#[cfg(test)]
mod tests;

pub mod atom;
pub mod fraction;
pub mod lattice;
pub mod supercell;

use nalgebra as na;

pub type Vec3 = na::Vector3<f64>;
pub type Mat3 = na::Matrix3<f64>;
pub type Mat4 = na::Matrix4<f64>;

/// vibration vectors are stored in single precision
pub type Vib = na::Vector3<f32>;

/// Å per bohr, as used by CASTEP's io module
pub const ANGBOHR: f64 = 0.5291772;
