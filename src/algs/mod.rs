//! Re-export public algorithms.

pub mod classify;
pub mod coloring_exchange;
pub mod communicator;
pub mod dcrs;
pub mod equal_split;
pub mod meshgen;
pub mod offsets;
pub mod region_algebra;
pub mod verify;
pub mod wire;

pub use classify::{EntitySets, VertexOwners};
pub use dcrs::{Dcrs, make_dcrs, make_global_dcrs};
pub use equal_split::ColorPartition;
pub use meshgen::structured_quad;
