//! Coloring metadata produced by a partitioning pass.

pub mod coloring;

pub use coloring::{
    CELL_INDEX_SPACE, ColoringInfo, ColoringStore, EntityInfo, IndexColoring, SpaceColoring,
    VERTEX_INDEX_SPACE,
};
