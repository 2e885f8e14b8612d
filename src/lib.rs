#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-dp
//!
//! mesh-dp partitions an unstructured mesh across a fixed number of colors
//! (workers) and classifies, per color, which cells and vertices it owns
//! (*primary*), which of those other colors need (*shared*), which it keeps to
//! itself (*exclusive*), and which foreign entities it must mirror (*ghost*).
//! The result is the coloring metadata later halo-exchange planning consumes.
//!
//! ## Features
//! - Distributed cell adjacency (DCRS) built from a serial mesh definition
//! - Pluggable graph partitioners (block, explicit labels, METIS)
//! - Eager region algebra (image, preimage, difference, intersection)
//! - Vertex ownership by atomic minimum-color reduction
//! - Must-epoch phase barriers over a dedicated per-color worker pool
//! - All-to-all coloring exchange over in-process (Rayon) communicators; an
//!   MPI communicator serves per-rank calls to `exchange_coloring`
//!
//! ## Pipeline
//!
//! ```text
//! mesh ─▶ DCRS ─▶ partitioner ─▶ init_mesh ─▶ init_adjacency
//!      ─▶ classify cells ─▶ reduce vertex owners ─▶ classify vertices
//!      ─▶ offsets + verification ─▶ coloring exchange ─▶ ColoringStore
//! ```
//!
//! Every arrow is a collective barrier: no phase observes partially written
//! state from the one before it.
//!
//! ## Usage
//!
//! ```no_run
//! use mesh_dp::prelude::*;
//!
//! let mesh = structured_quad(8, 8)?;
//! let out = dependent_partition(&mesh, &BlockPartitioner, &PartitionConfig::with_colors(4))?;
//! let cells = out.store.get(CELL_INDEX_SPACE).expect("cells are colored");
//! assert_eq!(cells.total_primary(), 64);
//! # Ok::<(), MeshDpError>(())
//! ```
//!
//! Optional features: `mpi-support` (MPI communicator for
//! [`algs::coloring_exchange::exchange_coloring`]), `metis-support`
//! (METIS partitioner), `check-invariants` (invariant checks in release
//! builds).

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod io;
pub mod mesh_error;
pub mod partitioning;
pub mod pipeline;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use mesh_error::MeshDpError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::classify::EntitySets;
    pub use crate::algs::communicator::{Communicator, NoComm, RayonComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::dcrs::{Dcrs, make_dcrs, make_global_dcrs};
    pub use crate::algs::equal_split::ColorPartition;
    pub use crate::algs::meshgen::structured_quad;
    pub use crate::config::{AdjacencyOpts, PartitionConfig};
    pub use crate::data::region::{
        AdjacencyRecord, CellRecord, ConnectivityRegions, MeshRegions, VertexRecord,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::io::{MeshDefinition, SimpleDefinition};
    pub use crate::mesh_error::MeshDpError;
    #[cfg(feature = "metis-support")]
    pub use crate::partitioning::MetisPartitioner;
    pub use crate::partitioning::{BlockPartitioner, LabelPartitioner, Partitioner};
    pub use crate::pipeline::{Partitioned, dependent_partition, dependent_partition_with};
    pub use crate::topology::coloring::{
        CELL_INDEX_SPACE, ColoringInfo, ColoringStore, EntityInfo, IndexColoring,
        VERTEX_INDEX_SPACE,
    };
}
