//! Data module: index spaces and logical regions

pub mod region;

pub use region::{
    AdjacencyRecord, CellRecord, ConnectivityRegions, EntityRecord, FieldId, IndexSpace,
    Interval, MeshRegions, Region, SpaceKind, VertexRecord,
};
