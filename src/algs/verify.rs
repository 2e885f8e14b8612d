//! Verification pass run after offsets are assigned.
//!
//! Reads every bucket back from the records and cross-checks it against the
//! classifier output. Any mismatch is a fatal consistency failure carrying
//! the color, the entity and both sides of the comparison.

use crate::algs::classify::EntitySets;
use crate::algs::region_algebra::IndexSet;
use crate::data::region::{EntityRecord, VertexRecord};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshDpError;
use crate::topology::coloring::IndexColoring;

/// Every vertex must carry a resolved color after the min-reduction. A
/// vertex still at the sentinel is referenced by no cell.
pub fn verify_vertex_colors(
    vertices: &[VertexRecord],
    num_colors: usize,
) -> Result<(), MeshDpError> {
    if let Some(v) = vertices.iter().find(|v| v.partition_color >= num_colors) {
        return Err(MeshDpError::consistency(
            v.partition_color,
            "vertices",
            format!("vertex {} is referenced by no cell", v.id),
        ));
    }
    Ok(())
}

/// Check one color's coloring of one space.
///
/// `primary_counts[c]` is the size of color `c`'s primary set, i.e. its
/// exclusive plus shared count.
pub fn verify_coloring<R: EntityRecord>(
    color: usize,
    space: &'static str,
    sets: &EntitySets,
    coloring: &IndexColoring,
    records: &[R],
    primary_counts: &[usize],
) -> Result<(), MeshDpError> {
    let fail = |detail: String| MeshDpError::consistency(color, space, detail);
    coloring.validate_invariants()?;

    let own = primary_counts.get(color).copied().unwrap_or(0);
    if own != sets.primary.len() {
        return Err(fail(format!(
            "primary count {own} reported, {} classified",
            sets.primary.len()
        )));
    }

    let read_back = |bucket: &'static str, ids: IndexSet, expected: &IndexSet| {
        if &ids != expected {
            return Err(fail(format!(
                "{bucket} bucket has {} entities, classifier produced {}",
                ids.len(),
                expected.len()
            )));
        }
        Ok(())
    };
    read_back(
        "exclusive",
        coloring.exclusive.iter().map(|e| e.id).collect(),
        &sets.exclusive,
    )?;
    read_back("shared", coloring.shared_ids().collect(), &sets.shared)?;
    read_back("ghost", coloring.ghost_ids().collect(), &sets.ghost)?;

    for e in coloring.exclusive.iter().chain(&coloring.shared) {
        if e.offset >= own {
            return Err(fail(format!(
                "entity {} offset {} outside primary count {own}",
                e.id, e.offset
            )));
        }
    }
    for g in &coloring.ghost {
        let owner_count = primary_counts.get(g.rank).copied().ok_or_else(|| {
            fail(format!("ghost {} names unknown owner {}", g.id, g.rank))
        })?;
        if g.offset >= owner_count {
            return Err(fail(format!(
                "ghost {} offset {} exceeds owner {} count {owner_count}",
                g.id, g.offset, g.rank
            )));
        }
        let rec = records.get(g.id).ok_or(MeshDpError::EntityOutOfRange {
            dim: 0,
            id: g.id,
            count: records.len(),
        })?;
        if rec.color() != g.rank || rec.offset() != Some(g.offset) {
            return Err(fail(format!(
                "ghost {} expected at owner {} offset {}, record says {} / {:?}",
                g.id,
                g.rank,
                g.offset,
                rec.color(),
                rec.offset()
            )));
        }
    }
    log::debug!("color {color}: {space} verified");
    Ok(())
}
