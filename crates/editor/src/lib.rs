// Library crate: the headless editor core, exposed for integration tests
// and the scripted command interface. The binary only wires up logging
// and runs scripts against it.

pub mod command;
pub mod error;
pub mod fixtures;
pub mod geometry;
pub mod harness;
pub mod lashing;
pub mod model;
pub mod solver;
pub mod state;
pub mod tools;
