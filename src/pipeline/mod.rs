//! Phase orchestration: the must-epoch launcher, the topology populators,
//! the per-run context and the driver tying them together.

pub mod context;
pub mod driver;
pub mod epoch;
pub mod populate;

pub use context::{PartitionContext, Partitioned};
pub use driver::{dependent_partition, dependent_partition_with, load_mesh};
pub use epoch::{EpochResults, MustEpoch};
pub use populate::{AdjacencyArgs, InitMeshCounts, init_adjacency_task, init_mesh_task};
