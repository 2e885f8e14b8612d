//! Local offsets and per-color coloring assembly.
//!
//! Each color numbers its primary entities densely in ascending id order.
//! Exclusive and shared entities keep their primary offset; a ghost carries
//! the offset its owner assigned.

use crate::algs::classify::EntitySets;
use crate::data::region::EntityRecord;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshDpError;
use crate::topology::coloring::{EntityInfo, IndexColoring};

/// `(entity, offset)` pairs for the primary set of one color.
pub fn primary_offsets(sets: &EntitySets) -> Vec<(usize, usize)> {
    sets.primary
        .iter()
        .enumerate()
        .map(|(offset, &entity)| (entity, offset))
        .collect()
}

/// Write every color's offsets into the records. Primary sets are disjoint,
/// so each record is written at most once.
pub fn apply_offsets<R: EntityRecord>(
    records: &mut [R],
    per_color: &[Vec<(usize, usize)>],
) -> Result<(), MeshDpError> {
    let count = records.len();
    for (color, offsets) in per_color.iter().enumerate() {
        for &(entity, offset) in offsets {
            let rec = records.get_mut(entity).ok_or(MeshDpError::EntityOutOfRange {
                dim: 0,
                id: entity,
                count,
            })?;
            if let Some(prev) = rec.offset() {
                return Err(MeshDpError::consistency(
                    color,
                    "offsets",
                    format!("entity {entity} already numbered {prev}"),
                ));
            }
            rec.set_offset(offset);
        }
    }
    Ok(())
}

fn owned_info<R: EntityRecord>(
    color: usize,
    space: &'static str,
    records: &[R],
    entity: usize,
) -> Result<EntityInfo, MeshDpError> {
    let rec = records.get(entity).ok_or(MeshDpError::EntityOutOfRange {
        dim: 0,
        id: entity,
        count: records.len(),
    })?;
    let offset = rec.offset().ok_or_else(|| {
        MeshDpError::consistency(color, space, format!("entity {entity} has no offset"))
    })?;
    Ok(EntityInfo::new(rec.id(), rec.color(), offset))
}

/// Build the coloring of `color` from its sets once offsets are applied.
/// Shared users are filled in by the coloring exchange.
pub fn build_coloring<R: EntityRecord>(
    color: usize,
    space: &'static str,
    sets: &EntitySets,
    records: &[R],
) -> Result<IndexColoring, MeshDpError> {
    let mut coloring = IndexColoring::new(color);
    for &e in &sets.primary {
        coloring.primary.insert(records.get(e).map_or(e, |r| r.id()));
    }
    for &e in &sets.exclusive {
        coloring.exclusive.insert(owned_info(color, space, records, e)?);
    }
    for &e in &sets.shared {
        coloring.shared.insert(owned_info(color, space, records, e)?);
    }
    for &e in &sets.ghost {
        coloring.ghost.insert(owned_info(color, space, records, e)?);
    }
    log::trace!("color {color}: {space} coloring {coloring:?}");
    coloring.debug_assert_invariants();
    Ok(coloring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::region_algebra::IndexSet;
    use crate::data::region::CellRecord;

    fn set(xs: &[usize]) -> IndexSet {
        xs.iter().copied().collect()
    }

    fn records(colors: &[usize]) -> Vec<CellRecord> {
        colors
            .iter()
            .enumerate()
            .map(|(id, &c)| CellRecord {
                id,
                partition_color: c,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn offsets_follow_ascending_ids() {
        let sets = EntitySets {
            primary: set(&[7, 2, 5]),
            ..Default::default()
        };
        assert_eq!(primary_offsets(&sets), vec![(2, 0), (5, 1), (7, 2)]);
    }

    #[test]
    fn ghosts_carry_owner_offsets() {
        let mut recs = records(&[0, 1, 0, 1]);
        let s0 = EntitySets {
            primary: set(&[0, 2]),
            exclusive: set(&[0]),
            shared: set(&[2]),
            ghost: set(&[3]),
        };
        let s1 = EntitySets {
            primary: set(&[1, 3]),
            exclusive: set(&[1]),
            shared: set(&[3]),
            ghost: set(&[2]),
        };
        apply_offsets(&mut recs, &[primary_offsets(&s0), primary_offsets(&s1)]).unwrap();
        let c0 = build_coloring(0, "cells", &s0, &recs).unwrap();
        assert_eq!(c0.ghost.iter().next(), Some(&EntityInfo::new(3, 1, 1)));
        assert_eq!(c0.shared.iter().next(), Some(&EntityInfo::new(2, 0, 1)));
        assert_eq!(c0.exclusive.iter().next(), Some(&EntityInfo::new(0, 0, 0)));
    }

    #[test]
    fn double_numbering_is_fatal() {
        let mut recs = records(&[0, 0]);
        let err = apply_offsets(&mut recs, &[vec![(0, 0)], vec![(0, 1)]]).unwrap_err();
        assert!(err.is_consistency_failure());
    }

    #[test]
    fn missing_offset_is_fatal() {
        let recs = records(&[0, 1]);
        let sets = EntitySets {
            primary: set(&[0]),
            exclusive: set(&[0]),
            ..Default::default()
        };
        assert!(build_coloring(0, "cells", &sets, &recs).is_err());
    }
}
