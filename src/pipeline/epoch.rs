//! Must-epoch launcher: one task per color, all-or-nothing completion.
//!
//! [`MustEpoch::launch_with`] runs exactly one task per color on a pool of
//! `num_colors` workers, so every task of an epoch is live at the same time
//! and tasks may rendezvous with each other (the coloring exchange does).
//! The call returns only after *every* task has finished; the next phase
//! never observes partially written state. A failing task fails the whole
//! epoch: there is no partial result and no retry.

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::mesh_error::MeshDpError;

/// Per-color task results of one epoch, indexed by color.
#[derive(Debug)]
pub struct EpochResults<T> {
    name: &'static str,
    results: Vec<T>,
}

impl<T> EpochResults<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, color: usize) -> Option<&T> {
        self.results.get(color)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.results.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.results
    }
}

impl<T> IntoIterator for EpochResults<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Collective launcher bound to a fixed number of colors.
pub struct MustEpoch {
    pool: ThreadPool,
    num_colors: usize,
}

impl std::fmt::Debug for MustEpoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MustEpoch")
            .field("num_colors", &self.num_colors)
            .finish()
    }
}

impl MustEpoch {
    pub fn new(num_colors: usize) -> Result<Self, MeshDpError> {
        if num_colors == 0 {
            return Err(MeshDpError::ZeroColors);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_colors)
            .thread_name(|i| format!("mesh-dp-color-{i}"))
            .build()
            .map_err(|e| MeshDpError::Runtime(e.to_string()))?;
        Ok(Self { pool, num_colors })
    }

    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    /// Run `task(color)` for every color and wait for all of them.
    pub fn launch<T, F>(&self, name: &'static str, task: F) -> Result<EpochResults<T>, MeshDpError>
    where
        T: Send,
        F: Fn(usize) -> Result<T, MeshDpError> + Sync,
    {
        let args = vec![(); self.num_colors];
        self.launch_with(name, args, |color, ()| task(color))
    }

    /// Run `task(color, args[color])` for every color and wait for all of
    /// them. `args` typically carries each color's disjoint mutable
    /// sub-region.
    pub fn launch_with<A, T, F>(
        &self,
        name: &'static str,
        args: Vec<A>,
        task: F,
    ) -> Result<EpochResults<T>, MeshDpError>
    where
        A: Send,
        T: Send,
        F: Fn(usize, A) -> Result<T, MeshDpError> + Sync,
    {
        if args.len() != self.num_colors {
            return Err(MeshDpError::ColorCountMismatch {
                expected: self.num_colors,
                found: args.len(),
            });
        }
        log::debug!("epoch `{name}`: launching {} tasks", self.num_colors);

        let slots: Vec<Mutex<Option<Result<T, MeshDpError>>>> =
            (0..self.num_colors).map(|_| Mutex::new(None)).collect();
        let task = &task;
        let slots_ref = &slots;
        self.pool.scope(|s| {
            for (color, arg) in args.into_iter().enumerate() {
                s.spawn(move |_| {
                    let out = task(color, arg);
                    *slots_ref[color].lock() = Some(out);
                });
            }
        });

        let mut results = Vec::with_capacity(self.num_colors);
        for (color, slot) in slots.into_iter().enumerate() {
            match slot.into_inner() {
                Some(Ok(v)) => results.push(v),
                Some(Err(e)) => {
                    log::error!("epoch `{name}`: color {color} failed: {e}");
                    return Err(e);
                }
                None => {
                    return Err(MeshDpError::Runtime(format!(
                        "epoch `{name}`: color {color} produced no result"
                    )));
                }
            }
        }
        log::debug!("epoch `{name}`: all {} tasks complete", self.num_colors);
        Ok(EpochResults { name, results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn results_are_indexed_by_color() {
        let epoch = MustEpoch::new(4).unwrap();
        let out = epoch.launch("square", |c| Ok(c * c)).unwrap();
        assert_eq!(out.name(), "square");
        assert_eq!(out.into_vec(), vec![0, 1, 4, 9]);
    }

    #[test]
    fn all_tasks_are_live_together() {
        // deadlocks unless every color runs concurrently
        let epoch = MustEpoch::new(3).unwrap();
        let barrier = Barrier::new(3);
        let out = epoch
            .launch("rendezvous", |c| {
                barrier.wait();
                Ok(c)
            })
            .unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn disjoint_sub_regions_are_written_in_parallel() {
        let epoch = MustEpoch::new(3).unwrap();
        let mut data = vec![0usize; 6];
        let parts: Vec<&mut [usize]> = data.chunks_mut(2).collect();
        epoch
            .launch_with("fill", parts, |c, part| {
                part.fill(c + 1);
                Ok(())
            })
            .unwrap();
        assert_eq!(data, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn one_failure_fails_the_epoch() {
        let epoch = MustEpoch::new(2).unwrap();
        let res = epoch.launch("fail", |c| {
            if c == 1 {
                Err(MeshDpError::consistency(c, "cells", "boom"))
            } else {
                Ok(())
            }
        });
        assert!(matches!(res, Err(MeshDpError::ConsistencyCheck { color: 1, .. })));
    }

    #[test]
    fn argument_count_must_match_colors() {
        let epoch = MustEpoch::new(2).unwrap();
        let res = epoch.launch_with("short", vec![()], |_, ()| Ok(()));
        assert_eq!(
            res.unwrap_err(),
            MeshDpError::ColorCountMismatch {
                expected: 2,
                found: 1
            }
        );
        assert!(MustEpoch::new(0).is_err());
    }
}
