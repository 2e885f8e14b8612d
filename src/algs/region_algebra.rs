//! Eager set algebra over index spaces.
//!
//! Sets are ordered (`BTreeSet`), so every derived set iterates in
//! ascending index order. The operators mirror dependent partitioning:
//!
//! * [`partition_by_field`] — split a space by a color-valued field
//! * [`image_range`] — follow each entity's interval into a connectivity space
//! * [`image`] — follow connectivity entries to their targets
//! * [`preimage`] / [`preimage_range`] — the same relations, backwards
//! * [`difference`] / [`intersection`] / [`union`]
//!
//! Every operator accepts empty inputs and then returns an empty set.

use std::collections::BTreeSet;

use crate::data::region::{AdjacencyRecord, Interval};

/// Ordered set of indices into one index space.
pub type IndexSet = BTreeSet<usize>;

/// `sets[c] = { i : color(records[i]) == c }`. Records whose color is
/// `>= num_colors` (the unassigned sentinel) land in no set.
pub fn partition_by_field<R>(
    records: &[R],
    num_colors: usize,
    color: impl Fn(&R) -> usize,
) -> Vec<IndexSet> {
    let mut sets = vec![IndexSet::new(); num_colors];
    for (idx, rec) in records.iter().enumerate() {
        if let Some(set) = sets.get_mut(color(rec)) {
            set.insert(idx);
        }
    }
    sets
}

/// Union of the intervals `range(records[i])` for `i` in `set`.
pub fn image_range<R>(
    set: &IndexSet,
    records: &[R],
    range: impl Fn(&R) -> Interval,
) -> IndexSet {
    set.iter()
        .filter_map(|&i| records.get(i))
        .flat_map(|rec| range(rec).as_range())
        .collect()
}

/// Targets of the connectivity entries in `entries`.
pub fn image(entries: &IndexSet, relation: &[AdjacencyRecord]) -> IndexSet {
    entries
        .iter()
        .filter_map(|&e| relation.get(e))
        .map(|rec| rec.target_ptr)
        .collect()
}

/// Connectivity entries whose target lies in `targets`.
pub fn preimage(targets: &IndexSet, relation: &[AdjacencyRecord]) -> IndexSet {
    if targets.is_empty() {
        return IndexSet::new();
    }
    relation
        .iter()
        .enumerate()
        .filter(|(_, rec)| targets.contains(&rec.target_ptr))
        .map(|(e, _)| e)
        .collect()
}

/// Entities whose interval contains at least one entry of `entries`.
pub fn preimage_range<R>(
    entries: &IndexSet,
    records: &[R],
    range: impl Fn(&R) -> Interval,
) -> IndexSet {
    if entries.is_empty() {
        return IndexSet::new();
    }
    records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            let r = range(rec);
            !r.is_empty() && entries.range(r.lo..r.hi).next().is_some()
        })
        .map(|(i, _)| i)
        .collect()
}

/// One-hop projection: `image(image_range(set))`.
pub fn project<R>(
    set: &IndexSet,
    records: &[R],
    range: impl Fn(&R) -> Interval,
    relation: &[AdjacencyRecord],
) -> IndexSet {
    image(&image_range(set, records, range), relation)
}

/// Entities of `records` reaching into `targets` through `relation`:
/// `preimage_range(preimage(targets))`.
pub fn reverse_project<R>(
    targets: &IndexSet,
    records: &[R],
    range: impl Fn(&R) -> Interval,
    relation: &[AdjacencyRecord],
) -> IndexSet {
    preimage_range(&preimage(targets, relation), records, range)
}

pub fn difference(a: &IndexSet, b: &IndexSet) -> IndexSet {
    a.difference(b).copied().collect()
}

pub fn intersection(a: &IndexSet, b: &IndexSet) -> IndexSet {
    a.intersection(b).copied().collect()
}

pub fn union(a: &IndexSet, b: &IndexSet) -> IndexSet {
    a.union(b).copied().collect()
}
