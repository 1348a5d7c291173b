//! Pole material and the structural members built from it.

pub mod catalog;
pub mod pole;
pub mod scaffold;

pub use catalog::{CompoundLength, PoleCatalog, ScaffoldLength};
pub use pole::{Pole, DEFAULT_OVERLAP_FACTOR, PARALLEL_ANGLE};
pub use scaffold::{leg, Scaffold};
