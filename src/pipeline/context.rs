//! Per-run state of one partitioning pass.
//!
//! A [`PartitionContext`] is created at the start of a pass, threaded by
//! `&mut` through every phase of the driver, and consumed by
//! [`PartitionContext::finish`] once the colorings are aggregated.

use crate::algs::classify::EntitySets;
use crate::algs::dcrs::Dcrs;
use crate::algs::equal_split::ColorPartition;
use crate::config::PartitionConfig;
use crate::data::region::{ConnectivityRegions, MeshRegions};
use crate::io::MeshDefinition;
use crate::mesh_error::MeshDpError;
use crate::pipeline::epoch::MustEpoch;
use crate::pipeline::populate::AdjacencyArgs;
use crate::topology::coloring::ColoringStore;

#[derive(Debug)]
pub struct PartitionContext {
    pub(crate) config: PartitionConfig,
    pub(crate) dimension: usize,
    pub(crate) epoch: MustEpoch,
    pub(crate) cells: ColorPartition,
    pub(crate) vertices: ColorPartition,
    pub(crate) dcrs: Vec<Dcrs>,
    pub(crate) labels: Vec<Vec<usize>>,
    pub(crate) mesh: MeshRegions,
    pub(crate) adjacency: Option<AdjacencyArgs>,
    pub(crate) connectivity: Option<ConnectivityRegions>,
    pub(crate) cell_sets: Vec<EntitySets>,
    pub(crate) vertex_sets: Vec<EntitySets>,
    pub(crate) store: ColoringStore,
}

impl PartitionContext {
    /// Validate the configuration against the mesh, compute the equal
    /// splits and allocate the cell and vertex regions.
    pub fn new<M>(config: &PartitionConfig, md: &M) -> Result<Self, MeshDpError>
    where
        M: MeshDefinition + ?Sized,
    {
        config.validate()?;
        let dimension = md.dimension();
        if dimension == 0 {
            return Err(MeshDpError::InvalidDimension(dimension));
        }
        let num_cells = md.num_entities(dimension);
        let num_vertices = md.num_entities(0);
        let n = config.num_colors;

        let cells = ColorPartition::equal("cells", num_cells, n)?;
        let vertices = ColorPartition::equal("vertices", num_vertices, n)?;
        let mesh = MeshRegions::allocate(num_cells, num_vertices)?;
        let epoch = MustEpoch::new(n)?;
        log::info!(
            "partition context: {n} colors, dimension {dimension}, {num_cells} cells, {num_vertices} vertices"
        );
        Ok(Self {
            config: config.clone(),
            dimension,
            epoch,
            cells,
            vertices,
            dcrs: Vec::new(),
            labels: Vec::new(),
            mesh,
            adjacency: None,
            connectivity: None,
            cell_sets: Vec::new(),
            vertex_sets: Vec::new(),
            store: ColoringStore::new(),
        })
    }

    pub fn num_colors(&self) -> usize {
        self.config.num_colors
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    pub(crate) fn connectivity(&self) -> Result<&ConnectivityRegions, MeshDpError> {
        self.connectivity
            .as_ref()
            .ok_or_else(|| MeshDpError::Runtime("connectivity regions not allocated".into()))
    }

    /// Tear down the pass: stop the worker pool and hand out the results.
    pub fn finish(self) -> Result<Partitioned, MeshDpError> {
        let connectivity = self
            .connectivity
            .ok_or_else(|| MeshDpError::Runtime("pass finished before population".into()))?;
        log::info!(
            "partition pass finished: {} index spaces colored",
            self.store.len()
        );
        Ok(Partitioned {
            num_colors: self.config.num_colors,
            dimension: self.dimension,
            cells: self.cells,
            vertices: self.vertices,
            dcrs: self.dcrs,
            labels: self.labels,
            mesh: self.mesh,
            connectivity,
            cell_sets: self.cell_sets,
            vertex_sets: self.vertex_sets,
            store: self.store,
        })
    }
}

/// Everything a finished pass produced.
#[derive(Debug)]
pub struct Partitioned {
    pub num_colors: usize,
    pub dimension: usize,
    /// Equal split of cells used for initialization.
    pub cells: ColorPartition,
    /// Equal split of vertices used for initialization.
    pub vertices: ColorPartition,
    /// Adjacency rows per color.
    pub dcrs: Vec<Dcrs>,
    /// Partitioner labels per color, row-aligned with `dcrs`.
    pub labels: Vec<Vec<usize>>,
    pub mesh: MeshRegions,
    pub connectivity: ConnectivityRegions,
    pub cell_sets: Vec<EntitySets>,
    pub vertex_sets: Vec<EntitySets>,
    pub store: ColoringStore,
}
