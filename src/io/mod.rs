//! Mesh input for the partitioning pipeline.
//!
//! Only serial mesh definitions are read here; distributed data never
//! touches disk.

pub mod simple;

pub use simple::{MeshDefinition, SimpleDefinition};
