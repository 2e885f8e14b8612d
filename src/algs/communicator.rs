//! Thin façade over intra-process (Rayon) or inter-process (MPI) message passing.
//!
//! The coloring exchange needs exactly one collective: every rank hands one
//! byte buffer to every other rank and gets one back from each
//! ([`Communicator::all_to_all`]). Payloads are opaque bytes; the records
//! inside are defined in [`crate::algs::wire`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;

use crate::mesh_error::{CommFailure, MeshDpError};

/// Collective exchange between the ranks of one world.
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Send `sends[peer]` to every peer; return what each peer sent here,
    /// indexed by peer. `tag` separates consecutive exchanges.
    fn all_to_all(&self, tag: u16, sends: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, MeshDpError>;

    /// Every rank's `buf`, indexed by rank.
    fn all_gather(&self, tag: u16, buf: &[u8]) -> Result<Vec<Vec<u8>>, MeshDpError> {
        self.all_to_all(tag, vec![buf.to_vec(); self.size()])
    }
}

fn check_send_count(size: usize, sends: &[Vec<u8>]) -> Result<(), MeshDpError> {
    if sends.len() != size {
        return Err(MeshDpError::ColorCountMismatch {
            expected: size,
            found: sends.len(),
        });
    }
    Ok(())
}

/// Single-rank world for serial runs.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_to_all(&self, _tag: u16, sends: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, MeshDpError> {
        check_send_count(1, &sends)?;
        Ok(sends)
    }
}

// --- RayonComm: intra-process / multi-thread ---
type Key = (usize, usize, u16); // (src, dst, tag)
type Mailbox = DashMap<Key, VecDeque<Bytes>>;

/// How long a receive waits before reporting the peer as missing.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(60);

/// In-process rank. All ranks of a world share one mailbox, so independent
/// worlds (e.g. concurrent tests) never see each other's messages.
#[derive(Clone, Debug)]
pub struct RayonComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
    timeout: Duration,
}

/// Polls that only yield before [`LocalHandle::wait`] starts sleeping.
const SPIN_POLLS: u32 = 16;
/// Longest sleep between two polls of a pending receive.
const MAX_POLL_SLEEP: Duration = Duration::from_millis(1);

/// Pause before poll number `attempt`: `None` means yield, otherwise sleep
/// for an interval doubling from 16µs up to [`MAX_POLL_SLEEP`].
fn poll_backoff(attempt: u32) -> Option<Duration> {
    let sleeps = attempt.checked_sub(SPIN_POLLS)?;
    let micros = 16u64 << sleeps.min(10);
    Some(Duration::from_micros(micros).min(MAX_POLL_SLEEP))
}

/// Pending receive; resolves on [`LocalHandle::wait`].
pub struct LocalHandle {
    key: Key,
    mailbox: Arc<Mailbox>,
    timeout: Duration,
}

impl LocalHandle {
    /// Block until the message arrives or the timeout expires.
    pub fn wait(self) -> Option<Bytes> {
        let deadline = Instant::now() + self.timeout;
        let mut attempt = 0u32;
        loop {
            if let Some(mut queue) = self.mailbox.get_mut(&self.key) {
                if let Some(bytes) = queue.pop_front() {
                    return Some(bytes);
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            match poll_backoff(attempt) {
                None => std::thread::yield_now(),
                Some(pause) => std::thread::sleep(pause.min(deadline - now)),
            }
            attempt = attempt.saturating_add(1);
        }
    }
}

impl RayonComm {
    /// Create the `size` ranks of a fresh world.
    pub fn world(size: usize) -> Vec<RayonComm> {
        let mailbox = Arc::new(Mailbox::new());
        (0..size)
            .map(|rank| RayonComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
                timeout: DEFAULT_RECV_TIMEOUT,
            })
            .collect()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Post `buf` for `peer`. Never blocks.
    pub fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        self.mailbox
            .entry((self.rank, peer, tag))
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
    }

    pub fn irecv(&self, peer: usize, tag: u16) -> LocalHandle {
        LocalHandle {
            key: (peer, self.rank, tag),
            mailbox: Arc::clone(&self.mailbox),
            timeout: self.timeout,
        }
    }
}

impl Communicator for RayonComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_to_all(&self, tag: u16, sends: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, MeshDpError> {
        check_send_count(self.size, &sends)?;
        for (peer, buf) in sends.iter().enumerate() {
            self.isend(peer, tag, buf);
        }
        let handles: Vec<_> = (0..self.size).map(|peer| self.irecv(peer, tag)).collect();
        let mut out = Vec::with_capacity(self.size);
        for (peer, h) in handles.into_iter().enumerate() {
            let bytes = h.wait().ok_or(MeshDpError::CommError {
                neighbor: peer,
                source: CommFailure::Missing,
            })?;
            out.push(bytes.to_vec());
        }
        Ok(out)
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::datatype::{Partition, PartitionMut};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{Communicator as _, CommunicatorCollectives as _};
    use mpi::Count;

    /// One MPI process per rank. Tags are implied by the collective call order.
    ///
    /// The driver runs every color in one process and so cannot take an
    /// `MpiComm` world; use it to call
    /// [`exchange_coloring`](crate::algs::coloring_exchange::exchange_coloring)
    /// directly on each rank.
    pub struct MpiComm {
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        pub fn new(world: SimpleCommunicator) -> Self {
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Self { world, rank, size }
        }
    }

    fn displacements(counts: &[Count]) -> Vec<Count> {
        counts
            .iter()
            .scan(0, |acc, &x| {
                let old = *acc;
                *acc += x;
                Some(old)
            })
            .collect()
    }

    fn to_count(n: usize, neighbor: usize) -> Result<Count, MeshDpError> {
        Count::try_from(n).map_err(|_| MeshDpError::CommError {
            neighbor,
            source: CommFailure::Malformed(format!("{n} bytes exceed the MPI count range")),
        })
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn all_to_all(&self, _tag: u16, sends: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, MeshDpError> {
            check_send_count(self.size, &sends)?;
            let counts = sends
                .iter()
                .enumerate()
                .map(|(peer, b)| to_count(b.len(), peer))
                .collect::<Result<Vec<_>, _>>()?;

            // counts first, then the variable-length payloads
            let mut recv_counts: Vec<Count> = vec![0; self.size];
            self.world.all_to_all_into(&counts[..], &mut recv_counts[..]);

            let flat: Vec<u8> = sends.concat();
            let total = recv_counts.iter().map(|&c| c as usize).sum();
            let mut recv = vec![0u8; total];
            let send_displs = displacements(&counts);
            let recv_displs = displacements(&recv_counts);
            {
                let send_partition = Partition::new(&flat[..], &counts[..], &send_displs[..]);
                let mut recv_partition =
                    PartitionMut::new(&mut recv[..], &recv_counts[..], &recv_displs[..]);
                self.world
                    .all_to_all_varcount_into(&send_partition, &mut recv_partition);
            }

            Ok(recv_displs
                .iter()
                .zip(&recv_counts)
                .map(|(&lo, &n)| recv[lo as usize..(lo + n) as usize].to_vec())
                .collect())
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
