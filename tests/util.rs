#![allow(dead_code)]
use std::collections::BTreeSet;

use mesh_dp::prelude::*;

/// Global cell labels of a finished pass, indexed by cell id.
pub fn flat_labels(out: &Partitioned) -> Vec<usize> {
    out.labels.iter().flatten().copied().collect()
}

/// Per color, the distinct foreign cells adjacent to its cells, found by a
/// plain scan of the global adjacency.
pub fn brute_force_ghosts(
    md: &SimpleDefinition,
    labels: &[usize],
    num_colors: usize,
    opts: AdjacencyOpts,
) -> Vec<BTreeSet<usize>> {
    let graph = make_global_dcrs(md, opts).unwrap();
    let mut ghosts = vec![BTreeSet::new(); num_colors];
    for cell in 0..graph.num_rows() {
        for &nbr in graph.row(cell) {
            if labels[nbr] != labels[cell] {
                ghosts[labels[cell]].insert(nbr);
            }
        }
    }
    ghosts
}

/// Check the classification invariants of one index space.
pub fn assert_space_invariants(out: &Partitioned, index_space: usize, num_entities: usize) {
    let space = out.store.get(index_space).expect("space colored");
    let mut owned = BTreeSet::new();
    for (color, c) in space.colorings.iter().enumerate() {
        assert_eq!(c.color, color);
        let ex: BTreeSet<usize> = c.exclusive.iter().map(|e| e.id).collect();
        let sh: BTreeSet<usize> = c.shared.iter().map(|e| e.id).collect();
        assert!(ex.is_disjoint(&sh), "color {color}: exclusive and shared overlap");
        assert_eq!(
            ex.union(&sh).copied().collect::<BTreeSet<_>>(),
            c.primary,
            "color {color}: exclusive + shared != primary"
        );
        for &id in &c.primary {
            assert!(owned.insert(id), "entity {id} owned twice");
        }
        for g in &c.ghost {
            assert_ne!(g.rank, color, "ghost {} owned by its holder", g.id);
            let owner = &space.colorings[g.rank];
            let at = owner.primary.iter().position(|&p| p == g.id);
            assert_eq!(at, Some(g.offset), "ghost {} offset mismatch", g.id);
            let shared = owner.shared_entry(g.id).expect("ghost backed by owner's shared set");
            assert!(shared.shared.contains(&color));
        }
    }
    assert_eq!(owned, (0..num_entities).collect::<BTreeSet<_>>());
}
