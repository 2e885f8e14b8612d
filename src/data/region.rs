//! Region: flat 1-D index spaces with typed per-entity field records.
//!
//! A partitioning pass allocates four spaces: cells, vertices, and the two
//! concatenated connectivity arrays (cell-to-cell, cell-to-vertex). Each
//! space carries its own record type, so field sets never overlap between
//! spaces. Allocation is a pure function of the requested volumes.
//!
//! # Invariants
//!
//! - Every region has a strictly positive volume.
//! - `records.len() == space.volume` for the life of the region.
//! - Cell `cell_range` / `vertex_range` intervals are half-open and lie
//!   inside the corresponding connectivity region once populated.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::algs::equal_split::{ColorPartition, split_by_partition};
use crate::mesh_error::MeshDpError;

/// The four index spaces of a partitioning pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpaceKind {
    Cells,
    Vertices,
    CellToCell,
    CellToVertex,
}

impl SpaceKind {
    pub fn name(self) -> &'static str {
        match self {
            SpaceKind::Cells => "cells",
            SpaceKind::Vertices => "vertices",
            SpaceKind::CellToCell => "cell_to_cell",
            SpaceKind::CellToVertex => "cell_to_vertex",
        }
    }

    /// Entity spaces must be non-empty; connectivity spaces may be empty
    /// (a mesh whose cells have no neighbours).
    pub fn is_entity(self) -> bool {
        matches!(self, SpaceKind::Cells | SpaceKind::Vertices)
    }

    /// Fields allocated on this space.
    pub fn fields(self) -> &'static [FieldId] {
        match self {
            SpaceKind::Cells => &[
                FieldId::CellId,
                FieldId::CellPartitionColor,
                FieldId::CellCellRange,
                FieldId::CellVertexRange,
                FieldId::CellOffset,
            ],
            SpaceKind::Vertices => &[
                FieldId::VertexId,
                FieldId::VertexPartitionColor,
                FieldId::VertexOffset,
            ],
            SpaceKind::CellToCell => &[FieldId::CellToCellId, FieldId::CellToCellPtr],
            SpaceKind::CellToVertex => &[FieldId::CellToVertexId, FieldId::CellToVertexPtr],
        }
    }
}

/// Named fields, one per record member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldId {
    CellId,
    CellPartitionColor,
    CellCellRange,
    CellVertexRange,
    CellOffset,
    VertexId,
    VertexPartitionColor,
    VertexOffset,
    CellToCellId,
    CellToCellPtr,
    CellToVertexId,
    CellToVertexPtr,
}

/// A 1-D index space `0..volume`. Only connectivity spaces may be empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexSpace {
    pub kind: SpaceKind,
    pub volume: usize,
}

impl IndexSpace {
    pub fn new(kind: SpaceKind, volume: usize) -> Result<Self, MeshDpError> {
        if volume == 0 && kind.is_entity() {
            return Err(MeshDpError::InvalidEntityCount {
                space: kind.name(),
                count: volume,
            });
        }
        Ok(Self { kind, volume })
    }

    pub fn bounds(&self) -> Range<usize> {
        0..self.volume
    }
}

/// Half-open interval into a connectivity region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: usize,
    pub hi: usize,
}

impl Interval {
    pub fn new(lo: usize, hi: usize) -> Self {
        debug_assert!(lo <= hi, "interval [{lo}, {hi}) is reversed");
        Self { lo, hi }
    }

    pub fn len(&self) -> usize {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.lo == self.hi
    }

    pub fn as_range(&self) -> Range<usize> {
        self.lo..self.hi
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellRecord {
    pub id: usize,
    /// Owning color as labelled by the partitioner.
    pub partition_color: usize,
    pub cell_range: Interval,
    pub vertex_range: Interval,
    /// Dense index inside the owner's primary set.
    pub offset: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexRecord {
    pub id: usize,
    /// Unassigned vertices carry the color count as sentinel until the
    /// min-reduction runs.
    pub partition_color: usize,
    pub offset: Option<usize>,
}

/// Common view of cell and vertex records for classification passes.
pub trait EntityRecord {
    fn id(&self) -> usize;
    fn color(&self) -> usize;
    fn offset(&self) -> Option<usize>;
    fn set_offset(&mut self, offset: usize);
}

impl EntityRecord for CellRecord {
    fn id(&self) -> usize {
        self.id
    }
    fn color(&self) -> usize {
        self.partition_color
    }
    fn offset(&self) -> Option<usize> {
        self.offset
    }
    fn set_offset(&mut self, offset: usize) {
        self.offset = Some(offset);
    }
}

impl EntityRecord for VertexRecord {
    fn id(&self) -> usize {
        self.id
    }
    fn color(&self) -> usize {
        self.partition_color
    }
    fn offset(&self) -> Option<usize> {
        self.offset
    }
    fn set_offset(&mut self, offset: usize) {
        self.offset = Some(offset);
    }
}

/// One entry of a connectivity array. `target_ptr` is the same value as
/// `target_id`, kept as the index used to project into the target space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdjacencyRecord {
    pub target_id: usize,
    pub target_ptr: usize,
}

impl AdjacencyRecord {
    pub fn to(target: usize) -> Self {
        Self {
            target_id: target,
            target_ptr: target,
        }
    }
}

/// Records of one index space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region<R> {
    space: IndexSpace,
    records: Vec<R>,
}

impl<R: Clone + Default> Region<R> {
    /// Allocate a default-initialized region of `volume` records.
    pub fn allocate(kind: SpaceKind, volume: usize) -> Result<Self, MeshDpError> {
        let space = IndexSpace::new(kind, volume)?;
        log::debug!("allocated {} region, volume {volume}", kind.name());
        Ok(Self {
            space,
            records: vec![R::default(); volume],
        })
    }
}

impl<R> Region<R> {
    pub fn space(&self) -> IndexSpace {
        self.space
    }

    pub fn volume(&self) -> usize {
        self.space.volume
    }

    pub fn get(&self, idx: usize) -> Option<&R> {
        self.records.get(idx)
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [R] {
        &mut self.records
    }

    /// Records in `range`, or a size error naming this space.
    pub fn slice(&self, range: Range<usize>) -> Result<&[R], MeshDpError> {
        let volume = self.volume();
        self.records
            .get(range.clone())
            .ok_or(MeshDpError::SizeMismatch {
                what: "sub-region bounds",
                expected: volume,
                actual: range.end,
            })
    }

    /// Disjoint mutable sub-regions, one per color of `partition`.
    pub fn split_mut(&mut self, partition: &ColorPartition) -> Result<Vec<&mut [R]>, MeshDpError> {
        split_by_partition(&mut self.records, partition)
    }
}

/// Cell and vertex regions, sized from global entity counts.
#[derive(Clone, Debug)]
pub struct MeshRegions {
    pub cells: Region<CellRecord>,
    pub vertices: Region<VertexRecord>,
}

impl MeshRegions {
    pub fn allocate(num_cells: usize, num_vertices: usize) -> Result<Self, MeshDpError> {
        Ok(Self {
            cells: Region::allocate(SpaceKind::Cells, num_cells)?,
            vertices: Region::allocate(SpaceKind::Vertices, num_vertices)?,
        })
    }
}

/// Connectivity regions, sized from the per-color count reduction.
#[derive(Clone, Debug)]
pub struct ConnectivityRegions {
    pub cell_to_cell: Region<AdjacencyRecord>,
    pub cell_to_vertex: Region<AdjacencyRecord>,
}

impl ConnectivityRegions {
    pub fn allocate(cell_to_cell: usize, cell_to_vertex: usize) -> Result<Self, MeshDpError> {
        Ok(Self {
            cell_to_cell: Region::allocate(SpaceKind::CellToCell, cell_to_cell)?,
            cell_to_vertex: Region::allocate(SpaceKind::CellToVertex, cell_to_vertex)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_volume_is_a_configuration_error() {
        let err = Region::<CellRecord>::allocate(SpaceKind::Cells, 0).unwrap_err();
        assert_eq!(
            err,
            MeshDpError::InvalidEntityCount {
                space: "cells",
                count: 0
            }
        );
        assert!(MeshRegions::allocate(4, 0).is_err());
    }

    #[test]
    fn connectivity_may_be_empty() {
        let conn = ConnectivityRegions::allocate(0, 4).unwrap();
        assert_eq!(conn.cell_to_cell.volume(), 0);
        assert!(conn.cell_to_cell.records().is_empty());
        let mut c2c = conn.cell_to_cell;
        let parts = c2c.split_mut(&ColorPartition::from_counts([0, 0])).unwrap();
        assert!(parts.iter().all(|p| p.is_empty()));
    }

    #[test]
    fn allocation_is_idempotent() {
        let a = MeshRegions::allocate(6, 12).unwrap();
        let b = MeshRegions::allocate(6, 12).unwrap();
        assert_eq!(a.cells, b.cells);
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.cells.volume(), 6);
        assert_eq!(a.vertices.space().bounds(), 0..12);
    }

    #[test]
    fn field_sets_are_disjoint() {
        let kinds = [
            SpaceKind::Cells,
            SpaceKind::Vertices,
            SpaceKind::CellToCell,
            SpaceKind::CellToVertex,
        ];
        let mut seen = std::collections::HashSet::new();
        for k in kinds {
            for f in k.fields() {
                assert!(seen.insert(*f), "{f:?} allocated twice");
            }
        }
    }

    #[test]
    fn split_mut_follows_partition() {
        let mut r = Region::<AdjacencyRecord>::allocate(SpaceKind::CellToCell, 5).unwrap();
        let p = ColorPartition::from_counts([2, 3]);
        let parts = r.split_mut(&p).unwrap();
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 3);
        parts.into_iter().nth(1).unwrap()[0] = AdjacencyRecord::to(9);
        assert_eq!(r.get(2), Some(&AdjacencyRecord::to(9)));
    }

    #[test]
    fn slice_out_of_bounds_reports_size() {
        let r = Region::<VertexRecord>::allocate(SpaceKind::Vertices, 3).unwrap();
        assert!(r.slice(1..3).is_ok());
        assert!(r.slice(2..5).is_err());
    }
}
