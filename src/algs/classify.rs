//! Ownership classification: primary, exclusive, shared and ghost sets.
//!
//! For cells of color `C`:
//!
//! ```text
//! primary   = { c : label(c) == C }
//! reachable = image(image_range(primary, cell_range), cell_to_cell)
//! ghost     = reachable \ primary
//! shared    = image(image_range(ghost, cell_range), cell_to_cell) ∩ primary
//! exclusive = primary \ shared
//! ```
//!
//! Vertices are owned by the minimum color among the primary cells touching
//! them ([`VertexOwners`]). With `alias(C)` the vertices of `C`'s primary
//! cells and `foreign(C)` the cells of other colors touching a vertex `C`
//! owns:
//!
//! ```text
//! ghost     = (verts(ghost cells) ∪ alias) \ primary
//! shared    = primary ∩ (verts(shared cells) ∪ verts(foreign))
//! exclusive = primary \ shared
//! ```
//!
//! Every vertex `C` ghosts is then in its owner's shared set.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::algs::region_algebra::{
    IndexSet, difference, intersection, project, reverse_project, union,
};
use crate::data::region::{AdjacencyRecord, CellRecord, Interval, VertexRecord};
use crate::mesh_error::MeshDpError;

/// The four buckets of one color in one index space, as entity indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntitySets {
    pub primary: IndexSet,
    pub exclusive: IndexSet,
    pub shared: IndexSet,
    pub ghost: IndexSet,
}

impl EntitySets {
    /// `exclusive ⊎ shared == primary` and `ghost ∩ primary == ∅`.
    pub fn check(&self, color: usize, space: &'static str) -> Result<(), MeshDpError> {
        if let Some(id) = self.exclusive.intersection(&self.shared).next() {
            return Err(MeshDpError::consistency(
                color,
                space,
                format!("entity {id} is both exclusive and shared"),
            ));
        }
        if union(&self.exclusive, &self.shared) != self.primary {
            return Err(MeshDpError::consistency(
                color,
                space,
                format!(
                    "exclusive ({}) + shared ({}) != primary ({})",
                    self.exclusive.len(),
                    self.shared.len(),
                    self.primary.len()
                ),
            ));
        }
        if let Some(id) = self.ghost.intersection(&self.primary).next() {
            return Err(MeshDpError::consistency(
                color,
                space,
                format!("entity {id} is both ghost and primary"),
            ));
        }
        Ok(())
    }
}

fn cell_range(rec: &CellRecord) -> Interval {
    rec.cell_range
}

fn vertex_range(rec: &CellRecord) -> Interval {
    rec.vertex_range
}

/// Classify the cells of `color` given its primary set.
pub fn classify_cells(
    color: usize,
    primary: &IndexSet,
    cells: &[CellRecord],
    cell_to_cell: &[AdjacencyRecord],
) -> Result<EntitySets, MeshDpError> {
    let reachable = project(primary, cells, cell_range, cell_to_cell);
    let ghost = difference(&reachable, primary);
    let shared = intersection(&project(&ghost, cells, cell_range, cell_to_cell), primary);
    let exclusive = difference(primary, &shared);

    if primary.is_empty() {
        log::warn!("color {color}: partitioner assigned no cells");
    } else if ghost.is_empty() {
        log::warn!("color {color}: no ghost cells");
    }
    log::debug!(
        "color {color}: cells primary {} exclusive {} shared {} ghost {}",
        primary.len(),
        exclusive.len(),
        shared.len(),
        ghost.len()
    );

    let sets = EntitySets {
        primary: primary.clone(),
        exclusive,
        shared,
        ghost,
    };
    sets.check(color, "cells")?;
    Ok(sets)
}

/// Min-reduction target for vertex ownership. Every slot starts at the
/// unassigned sentinel `num_colors`; concurrent reductions from any number of
/// colors converge to the smallest contributing color.
#[derive(Debug)]
pub struct VertexOwners {
    owners: Vec<AtomicUsize>,
    num_colors: usize,
}

impl VertexOwners {
    pub fn new(num_vertices: usize, num_colors: usize) -> Self {
        Self {
            owners: (0..num_vertices).map(|_| AtomicUsize::new(num_colors)).collect(),
            num_colors,
        }
    }

    pub fn reduce(&self, vertex: usize, color: usize) -> Result<(), MeshDpError> {
        let slot = self.owners.get(vertex).ok_or(MeshDpError::EntityOutOfRange {
            dim: 0,
            id: vertex,
            count: self.owners.len(),
        })?;
        slot.fetch_min(color, Ordering::Relaxed);
        Ok(())
    }

    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    /// Final owners; call after the reduction epoch has completed.
    pub fn into_colors(self) -> Vec<usize> {
        self.owners.into_iter().map(AtomicUsize::into_inner).collect()
    }
}

/// Reduce `color` into every vertex of its primary cells. Returns the number
/// of incidences visited.
pub fn reduce_vertex_colors(
    color: usize,
    primary: &IndexSet,
    cells: &[CellRecord],
    cell_to_vertex: &[AdjacencyRecord],
    owners: &VertexOwners,
) -> Result<usize, MeshDpError> {
    let mut visited = 0;
    for &cell in primary {
        let rec = cells.get(cell).ok_or(MeshDpError::EntityOutOfRange {
            dim: 2,
            id: cell,
            count: cells.len(),
        })?;
        let entries = cell_to_vertex
            .get(rec.vertex_range.as_range())
            .ok_or(MeshDpError::SizeMismatch {
                what: "cell-to-vertex region bounds",
                expected: rec.vertex_range.hi,
                actual: cell_to_vertex.len(),
            })?;
        for entry in entries {
            owners.reduce(entry.target_ptr, color)?;
            visited += 1;
        }
    }
    Ok(visited)
}

/// Write reduced owners into the vertex records.
pub fn apply_vertex_colors(
    vertices: &mut [VertexRecord],
    colors: &[usize],
) -> Result<(), MeshDpError> {
    crate::mesh_error::check_size("vertex owner count", vertices.len(), colors.len())?;
    for (rec, &c) in vertices.iter_mut().zip(colors) {
        rec.partition_color = c;
    }
    Ok(())
}

/// Classify the vertices of `color`. `vertex_primary` comes from partitioning
/// the reduced vertex colors; `cell_sets` is the same color's cell result.
pub fn classify_vertices(
    color: usize,
    vertex_primary: &IndexSet,
    cell_sets: &EntitySets,
    cells: &[CellRecord],
    cell_to_vertex: &[AdjacencyRecord],
) -> Result<EntitySets, MeshDpError> {
    let alias = project(&cell_sets.primary, cells, vertex_range, cell_to_vertex);
    let ghost_cell_verts = project(&cell_sets.ghost, cells, vertex_range, cell_to_vertex);
    let ghost = difference(&union(&ghost_cell_verts, &alias), vertex_primary);

    let touching = reverse_project(vertex_primary, cells, vertex_range, cell_to_vertex);
    let foreign = difference(&touching, &cell_sets.primary);
    let needed = union(
        &project(&cell_sets.shared, cells, vertex_range, cell_to_vertex),
        &project(&foreign, cells, vertex_range, cell_to_vertex),
    );
    let shared = intersection(vertex_primary, &needed);
    let exclusive = difference(vertex_primary, &shared);

    if let Some(v) = vertex_primary.difference(&alias).next() {
        return Err(MeshDpError::consistency(
            color,
            "vertices",
            format!("owned vertex {v} touches none of the color's cells"),
        ));
    }
    log::debug!(
        "color {color}: vertices primary {} exclusive {} shared {} ghost {}",
        vertex_primary.len(),
        exclusive.len(),
        shared.len(),
        ghost.len()
    );

    let sets = EntitySets {
        primary: vertex_primary.clone(),
        exclusive,
        shared,
        ghost,
    };
    sets.check(color, "vertices")?;
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(xs: &[usize]) -> IndexSet {
        xs.iter().copied().collect()
    }

    // cells 0-1-2-3 in a path, cell i has vertices {i, i+1}
    fn path() -> (Vec<CellRecord>, Vec<AdjacencyRecord>, Vec<AdjacencyRecord>) {
        let nbrs: [&[usize]; 4] = [&[1], &[0, 2], &[1, 3], &[2]];
        let mut cells = Vec::new();
        let mut c2c = Vec::new();
        let mut c2v = Vec::new();
        for (i, n) in nbrs.iter().enumerate() {
            let lo = c2c.len();
            c2c.extend(n.iter().map(|&t| AdjacencyRecord::to(t)));
            let vlo = c2v.len();
            c2v.extend([i, i + 1].map(AdjacencyRecord::to));
            cells.push(CellRecord {
                id: i,
                partition_color: usize::from(i >= 2),
                cell_range: Interval::new(lo, c2c.len()),
                vertex_range: Interval::new(vlo, c2v.len()),
                offset: None,
            });
        }
        (cells, c2c, c2v)
    }

    #[test]
    fn cells_on_a_path() {
        let (cells, c2c, _) = path();
        let s0 = classify_cells(0, &set(&[0, 1]), &cells, &c2c).unwrap();
        assert_eq!(s0.ghost, set(&[2]));
        assert_eq!(s0.shared, set(&[1]));
        assert_eq!(s0.exclusive, set(&[0]));
        let s1 = classify_cells(1, &set(&[2, 3]), &cells, &c2c).unwrap();
        assert_eq!(s1.ghost, set(&[1]));
        assert_eq!(s1.shared, set(&[2]));
    }

    #[test]
    fn isolated_color_is_fully_exclusive() {
        let (cells, c2c, _) = path();
        let all = set(&[0, 1, 2, 3]);
        let s = classify_cells(0, &all, &cells, &c2c).unwrap();
        assert!(s.ghost.is_empty());
        assert!(s.shared.is_empty());
        assert_eq!(s.exclusive, all);
    }

    #[test]
    fn vertex_min_reduction_on_a_path() {
        let (cells, _, c2v) = path();
        let owners = VertexOwners::new(5, 2);
        // reduce the higher color first; order must not matter
        reduce_vertex_colors(1, &set(&[2, 3]), &cells, &c2v, &owners).unwrap();
        reduce_vertex_colors(0, &set(&[0, 1]), &cells, &c2v, &owners).unwrap();
        assert_eq!(owners.into_colors(), vec![0, 0, 0, 1, 1]);
    }

    #[test]
    fn untouched_vertex_keeps_sentinel() {
        let owners = VertexOwners::new(2, 3);
        owners.reduce(0, 2).unwrap();
        assert!(owners.reduce(5, 0).is_err());
        assert_eq!(owners.into_colors(), vec![2, 3]);
    }

    #[test]
    fn vertices_on_a_path() {
        let (cells, c2c, c2v) = path();
        let c0 = classify_cells(0, &set(&[0, 1]), &cells, &c2c).unwrap();
        let c1 = classify_cells(1, &set(&[2, 3]), &cells, &c2c).unwrap();
        let v0 = classify_vertices(0, &set(&[0, 1, 2]), &c0, &cells, &c2v).unwrap();
        let v1 = classify_vertices(1, &set(&[3, 4]), &c1, &cells, &c2v).unwrap();
        // vertex 2 sits on the color boundary and is owned by 0
        assert_eq!(v0.shared, set(&[1, 2]));
        assert_eq!(v0.ghost, set(&[3]));
        assert_eq!(v1.ghost, set(&[1, 2]));
        assert_eq!(v1.shared, set(&[3]));
        assert_eq!(v1.exclusive, set(&[4]));
    }

    #[test]
    fn overlapping_buckets_are_fatal() {
        let sets = EntitySets {
            primary: set(&[1, 2]),
            exclusive: set(&[1, 2]),
            shared: set(&[2]),
            ghost: IndexSet::new(),
        };
        assert!(sets.check(0, "cells").unwrap_err().is_consistency_failure());
    }
}
