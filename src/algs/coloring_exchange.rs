//! Coloring aggregation: the all-to-all that connects owners and ghosters.
//!
//! Each color sends every ghost it holds, as `(id, offset)`, to the ghost's
//! owner. The owner checks each request against its shared set and records
//! the requester as a user of that entity. Finally every color gathers every
//! other color's [`ColoringInfo`].

use std::collections::BTreeMap;

use crate::algs::communicator::Communicator;
use crate::algs::wire::{
    self, KIND_COLORING_INFO, KIND_GHOST_REQUEST, KIND_RANKS, WireColoringInfo,
    WireGhostRequest, WireRank,
};
use crate::mesh_error::{CommFailure, MeshDpError};
use crate::topology::coloring::{ColoringInfo, EntityInfo, IndexColoring};

/// One color's result of the exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeOutcome {
    /// The input coloring with shared users filled in.
    pub coloring: IndexColoring,
    /// Every color's info, indexed by color.
    pub infos: Vec<ColoringInfo>,
}

fn tag(index_space: usize, step: u16) -> u16 {
    (index_space as u16).wrapping_mul(4).wrapping_add(step)
}

/// Run the exchange for `coloring` on `comm`; collective over all ranks.
pub fn exchange_coloring<C>(
    comm: &C,
    index_space: usize,
    mut coloring: IndexColoring,
) -> Result<ExchangeOutcome, MeshDpError>
where
    C: Communicator + ?Sized,
{
    let color = comm.rank();
    let size = comm.size();
    if coloring.color != color {
        return Err(MeshDpError::consistency(
            color,
            "coloring exchange",
            format!("rank {color} handed the coloring of color {}", coloring.color),
        ));
    }

    // ghost requests, grouped by owner
    let mut requests: Vec<Vec<WireGhostRequest>> = vec![Vec::new(); size];
    for g in &coloring.ghost {
        let slot = requests.get_mut(g.rank).ok_or_else(|| {
            MeshDpError::consistency(
                color,
                "coloring exchange",
                format!("ghost {} owned by unknown color {}", g.id, g.rank),
            )
        })?;
        slot.push(WireGhostRequest::new(g.id, g.offset));
    }
    let sends = requests
        .iter()
        .map(|r| wire::encode(KIND_GHOST_REQUEST, r))
        .collect();
    let received = comm.all_to_all(tag(index_space, 0), sends)?;

    let mut shared: BTreeMap<usize, EntityInfo> = std::mem::take(&mut coloring.shared)
        .into_iter()
        .map(|e| (e.id, e))
        .collect();
    for (peer, buf) in received.iter().enumerate() {
        let reqs: Vec<WireGhostRequest> = wire::decode(KIND_GHOST_REQUEST, peer, buf)?;
        for r in reqs {
            let entry = shared.get_mut(&r.id()).ok_or_else(|| {
                MeshDpError::consistency(
                    color,
                    "coloring exchange",
                    format!("color {peer} ghosts {} which is not shared here", r.id()),
                )
            })?;
            if peer == color || entry.offset != r.offset() {
                return Err(MeshDpError::consistency(
                    color,
                    "coloring exchange",
                    format!(
                        "color {peer} expects {} at offset {}, owner has {}",
                        r.id(),
                        r.offset(),
                        entry.offset
                    ),
                ));
            }
            entry.shared.insert(peer);
        }
    }
    if let Some(unused) = shared.values().find(|e| e.shared.is_empty()) {
        return Err(MeshDpError::consistency(
            color,
            "coloring exchange",
            format!("shared entity {} is ghosted by no color", unused.id),
        ));
    }
    coloring.shared = shared.into_values().collect();

    let infos = gather_infos(comm, index_space, &coloring.info())?;
    log::debug!(
        "color {color}: space {index_space} exchange done, shared users {:?}, ghost owners {:?}",
        infos[color].shared_users,
        infos[color].ghost_owners
    );
    Ok(ExchangeOutcome { coloring, infos })
}

fn gather_infos<C>(
    comm: &C,
    index_space: usize,
    local: &ColoringInfo,
) -> Result<Vec<ColoringInfo>, MeshDpError>
where
    C: Communicator + ?Sized,
{
    let head = WireColoringInfo::new(
        local.exclusive,
        local.shared,
        local.ghost,
        local.shared_users.len(),
        local.ghost_owners.len(),
    );
    let ranks: Vec<WireRank> = local
        .shared_users
        .iter()
        .chain(&local.ghost_owners)
        .map(|&r| WireRank::of(r))
        .collect();

    let heads = comm.all_gather(tag(index_space, 1), &wire::encode(KIND_COLORING_INFO, &[head]))?;
    let lists = comm.all_gather(tag(index_space, 2), &wire::encode(KIND_RANKS, &ranks))?;

    heads
        .iter()
        .zip(&lists)
        .enumerate()
        .map(|(peer, (h, l))| {
            let h: Vec<WireColoringInfo> = wire::decode(KIND_COLORING_INFO, peer, h)?;
            let [h] = h[..] else {
                return Err(MeshDpError::CommError {
                    neighbor: peer,
                    source: CommFailure::Malformed(format!("{} info records", h.len())),
                });
            };
            let ranks: Vec<WireRank> = wire::decode(KIND_RANKS, peer, l)?;
            let split = h.shared_users();
            if ranks.len() != split + h.ghost_owners() {
                return Err(MeshDpError::CommError {
                    neighbor: peer,
                    source: CommFailure::Malformed(format!(
                        "{} ranks for {} + {} neighbors",
                        ranks.len(),
                        split,
                        h.ghost_owners()
                    )),
                });
            }
            Ok(ColoringInfo {
                exclusive: h.exclusive(),
                shared: h.shared(),
                ghost: h.ghost(),
                shared_users: ranks[..split].iter().map(WireRank::get).collect(),
                ghost_owners: ranks[split..].iter().map(WireRank::get).collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, RayonComm};
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn run_world(colorings: Vec<IndexColoring>) -> Vec<Result<ExchangeOutcome, MeshDpError>> {
        let world: Vec<_> = RayonComm::world(colorings.len())
            .into_iter()
            .map(|c| c.with_timeout(Duration::from_secs(2)))
            .collect();
        std::thread::scope(|s| {
            let handles: Vec<_> = world
                .iter()
                .zip(colorings)
                .map(|(comm, c)| s.spawn(move || exchange_coloring(comm, 0, c)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    fn two_colors() -> Vec<IndexColoring> {
        // cells 0,1 on color 0 and 2,3 on color 1; 1 and 2 are neighbours
        let mut c0 = IndexColoring::new(0);
        c0.primary = [0, 1].into_iter().collect();
        c0.exclusive.insert(EntityInfo::new(0, 0, 0));
        c0.shared.insert(EntityInfo::new(1, 0, 1));
        c0.ghost.insert(EntityInfo::new(2, 1, 0));
        let mut c1 = IndexColoring::new(1);
        c1.primary = [2, 3].into_iter().collect();
        c1.shared.insert(EntityInfo::new(2, 1, 0));
        c1.exclusive.insert(EntityInfo::new(3, 1, 1));
        c1.ghost.insert(EntityInfo::new(1, 0, 1));
        vec![c0, c1]
    }

    #[test]
    fn shared_users_come_from_requests() {
        let out: Vec<_> = run_world(two_colors())
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            out[0].coloring.shared_entry(1).map(|e| e.shared.clone()),
            Some(BTreeSet::from([1]))
        );
        assert_eq!(out[0].infos, out[1].infos);
        assert_eq!(out[1].infos[1].shared_users, BTreeSet::from([0]));
        assert_eq!(out[1].infos[0].ghost_owners, BTreeSet::from([1]));
        assert_eq!(out[0].infos[1].exclusive, 1);
    }

    #[test]
    fn wrong_offset_is_fatal() {
        let mut cs = two_colors();
        cs[1].ghost.clear();
        cs[1].ghost.insert(EntityInfo::new(1, 0, 0));
        let res = run_world(cs);
        assert!(matches!(
            res[0],
            Err(MeshDpError::ConsistencyCheck { color: 0, .. })
        ));
    }

    #[test]
    fn single_color_has_nothing_to_exchange() {
        let mut c = IndexColoring::new(0);
        c.primary = [0].into_iter().collect();
        c.exclusive.insert(EntityInfo::new(0, 0, 0));
        let out = exchange_coloring(&NoComm, 1, c).unwrap();
        assert_eq!(out.infos.len(), 1);
        assert_eq!(out.infos[0].exclusive, 1);
    }
}
