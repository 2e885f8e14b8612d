//! Coloring metadata: what each color owns, shares and ghosts.
//!
//! An [`IndexColoring`] is one color's view of one index space. The
//! [`ColoringStore`] is the framework-wide map keyed by index-space id that
//! the aggregator fills and later halo planning reads.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshDpError;

/// Index-space id of cells in a [`ColoringStore`].
pub const CELL_INDEX_SPACE: usize = 0;
/// Index-space id of vertices in a [`ColoringStore`].
pub const VERTEX_INDEX_SPACE: usize = 1;

/// One entity as seen by a color.
///
/// `rank` is the owning color and `offset` the entity's position in the
/// owner's primary set. For shared entities `shared` lists the colors that
/// ghost it; otherwise it is empty. Ordering is by id first.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityInfo {
    pub id: usize,
    pub rank: usize,
    pub offset: usize,
    pub shared: BTreeSet<usize>,
}

impl EntityInfo {
    pub fn new(id: usize, rank: usize, offset: usize) -> Self {
        Self {
            id,
            rank,
            offset,
            shared: BTreeSet::new(),
        }
    }

    pub fn with_shared(mut self, shared: impl IntoIterator<Item = usize>) -> Self {
        self.shared.extend(shared);
        self
    }
}

/// Buckets of one color in one index space.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColoring {
    pub color: usize,
    /// Ids owned by this color.
    pub primary: BTreeSet<usize>,
    pub exclusive: BTreeSet<EntityInfo>,
    pub shared: BTreeSet<EntityInfo>,
    pub ghost: BTreeSet<EntityInfo>,
}

impl IndexColoring {
    pub fn new(color: usize) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn shared_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.shared.iter().map(|e| e.id)
    }

    pub fn ghost_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.ghost.iter().map(|e| e.id)
    }

    /// Shared entry for `id`, if this color shares it.
    pub fn shared_entry(&self, id: usize) -> Option<&EntityInfo> {
        self.shared.iter().find(|e| e.id == id)
    }

    /// Colors this color receives ghosts from.
    pub fn ghost_owners(&self) -> BTreeSet<usize> {
        self.ghost.iter().map(|e| e.rank).collect()
    }

    /// Colors that ghost at least one of this color's shared entities.
    pub fn shared_users(&self) -> BTreeSet<usize> {
        self.shared.iter().flat_map(|e| e.shared.iter().copied()).collect()
    }

    pub fn info(&self) -> ColoringInfo {
        ColoringInfo {
            exclusive: self.exclusive.len(),
            shared: self.shared.len(),
            ghost: self.ghost.len(),
            shared_users: self.shared_users(),
            ghost_owners: self.ghost_owners(),
        }
    }
}

impl DebugInvariants for IndexColoring {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "IndexColoring");
    }

    fn validate_invariants(&self) -> Result<(), MeshDpError> {
        let err = |detail: String| MeshDpError::consistency(self.color, "coloring", detail);
        let mut seen = BTreeSet::new();
        for e in self.exclusive.iter().chain(&self.shared) {
            if !seen.insert(e.id) {
                return Err(err(format!("entity {} is both exclusive and shared", e.id)));
            }
            if e.rank != self.color {
                return Err(err(format!("owned entity {} names rank {}", e.id, e.rank)));
            }
        }
        if seen != self.primary {
            return Err(err(format!(
                "exclusive + shared cover {} entities, primary has {}",
                seen.len(),
                self.primary.len()
            )));
        }
        for g in &self.ghost {
            if g.rank == self.color {
                return Err(err(format!("ghost {} is owned by its own color", g.id)));
            }
            if self.primary.contains(&g.id) {
                return Err(err(format!("ghost {} is also primary", g.id)));
            }
        }
        Ok(())
    }
}

/// Per-color bucket sizes and neighbor sets, as exchanged between colors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoringInfo {
    pub exclusive: usize,
    pub shared: usize,
    pub ghost: usize,
    /// Colors that ghost entities this color shares.
    pub shared_users: BTreeSet<usize>,
    /// Colors owning this color's ghosts.
    pub ghost_owners: BTreeSet<usize>,
}

/// Colorings and gathered infos of one index space.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceColoring {
    /// Indexed by color.
    pub colorings: Vec<IndexColoring>,
    /// Indexed by color; every color received the same vector.
    pub infos: Vec<ColoringInfo>,
}

impl SpaceColoring {
    pub fn num_colors(&self) -> usize {
        self.colorings.len()
    }

    pub fn total_primary(&self) -> usize {
        self.colorings.iter().map(|c| c.primary.len()).sum()
    }

    pub fn total_ghost(&self) -> usize {
        self.colorings.iter().map(|c| c.ghost.len()).sum()
    }
}

/// Framework-wide coloring map keyed by index-space id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoringStore {
    spaces: BTreeMap<usize, SpaceColoring>,
}

impl ColoringStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a space; replaces any earlier coloring of the same id.
    pub fn add_coloring(&mut self, index_space: usize, coloring: SpaceColoring) {
        if self.spaces.insert(index_space, coloring).is_some() {
            log::warn!("coloring of index space {index_space} replaced");
        }
    }

    pub fn get(&self, index_space: usize) -> Option<&SpaceColoring> {
        self.spaces.get(&index_space)
    }

    pub fn coloring(&self, index_space: usize, color: usize) -> Option<&IndexColoring> {
        self.get(index_space)?.colorings.get(color)
    }

    pub fn info(&self, index_space: usize, color: usize) -> Option<&ColoringInfo> {
        self.get(index_space)?.infos.get(color)
    }

    pub fn index_spaces(&self) -> impl Iterator<Item = usize> + '_ {
        self.spaces.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}
