//! Run configuration for a partitioning pass.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshDpError;

/// Environment variable overriding [`PartitionConfig::num_colors`].
pub const ENV_COLORS: &str = "MESH_DP_COLORS";
/// Environment variable overriding [`PartitionConfig::mesh_path`].
pub const ENV_MESH: &str = "MESH_DP_MESH";

/// How two cells are judged adjacent when building the cell-to-cell graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyOpts {
    /// Minimum number of shared vertices for two cells to be neighbours.
    /// `None` uses the mesh dimension (edges in 2-D, faces in 3-D).
    pub min_shared_vertices: Option<usize>,
}

impl AdjacencyOpts {
    /// Cells sharing at least `n` vertices are neighbours.
    pub fn shared_vertices(n: usize) -> Self {
        Self {
            min_shared_vertices: Some(n),
        }
    }

    /// Resolve the threshold for a mesh of dimension `dim`.
    pub fn threshold(&self, dim: usize) -> usize {
        self.min_shared_vertices.unwrap_or(dim).max(1)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Number of colors (one per worker).
    pub num_colors: usize,
    /// Path of the serial mesh definition.
    pub mesh_path: Option<PathBuf>,
    pub adjacency: AdjacencyOpts,
    /// Run the verification pass after offsets are assigned.
    pub verify: bool,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            num_colors: 4,
            mesh_path: None,
            adjacency: AdjacencyOpts::default(),
            verify: true,
        }
    }
}

impl PartitionConfig {
    pub fn with_colors(num_colors: usize) -> Self {
        Self {
            num_colors,
            ..Default::default()
        }
    }

    /// Defaults overridden by `MESH_DP_COLORS` / `MESH_DP_MESH`.
    pub fn from_env() -> Result<Self, MeshDpError> {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var(ENV_COLORS) {
            cfg.num_colors = raw.trim().parse().map_err(|_| {
                MeshDpError::Runtime(format!("{ENV_COLORS} is not a color count: {raw}"))
            })?;
        }
        if let Ok(path) = std::env::var(ENV_MESH) {
            cfg.mesh_path = Some(PathBuf::from(path));
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), MeshDpError> {
        if self.num_colors == 0 {
            return Err(MeshDpError::ZeroColors);
        }
        Ok(())
    }
}
