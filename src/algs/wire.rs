//! Fixed, versioned, little-endian wire types for the coloring exchange.
//!
//! Every buffer starts with a [`WireHdr`] naming its record kind, followed by
//! a [`WireCount`] and that many fixed-size records.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;

use crate::mesh_error::{CommFailure, MeshDpError};

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Record kinds carried after the header.
pub const KIND_GHOST_REQUEST: u16 = 1;
pub const KIND_COLORING_INFO: u16 = 2;
pub const KIND_RANKS: u16 = 3;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireHdr {
    pub version_le: u16,
    pub kind_le: u16,
    pub reserved_le: u32,
}

impl WireHdr {
    pub fn new(kind: u16) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: kind.to_le(),
            reserved_le: 0,
        }
    }
    pub fn kind(&self) -> u16 {
        u16::from_le(self.kind_le)
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u64,
}

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u64).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u64::from_le(self.n_le) as usize
    }
}

/// "I hold `id` as a ghost and expect it at `offset` in your primary set."
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WireGhostRequest {
    pub id_le: u64,
    pub offset_le: u64,
}

impl WireGhostRequest {
    pub fn new(id: usize, offset: usize) -> Self {
        Self {
            id_le: (id as u64).to_le(),
            offset_le: (offset as u64).to_le(),
        }
    }
    pub fn id(&self) -> usize {
        u64::from_le(self.id_le) as usize
    }
    pub fn offset(&self) -> usize {
        u64::from_le(self.offset_le) as usize
    }
}

/// Bucket sizes of one color for one index space, plus the lengths of the
/// neighbor lists sent alongside as [`WireRank`] records.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WireColoringInfo {
    pub exclusive_le: u64,
    pub shared_le: u64,
    pub ghost_le: u64,
    pub shared_users_le: u64,
    pub ghost_owners_le: u64,
}

impl WireColoringInfo {
    pub fn new(
        exclusive: usize,
        shared: usize,
        ghost: usize,
        shared_users: usize,
        ghost_owners: usize,
    ) -> Self {
        Self {
            exclusive_le: (exclusive as u64).to_le(),
            shared_le: (shared as u64).to_le(),
            ghost_le: (ghost as u64).to_le(),
            shared_users_le: (shared_users as u64).to_le(),
            ghost_owners_le: (ghost_owners as u64).to_le(),
        }
    }
    pub fn exclusive(&self) -> usize {
        u64::from_le(self.exclusive_le) as usize
    }
    pub fn shared(&self) -> usize {
        u64::from_le(self.shared_le) as usize
    }
    pub fn ghost(&self) -> usize {
        u64::from_le(self.ghost_le) as usize
    }
    pub fn shared_users(&self) -> usize {
        u64::from_le(self.shared_users_le) as usize
    }
    pub fn ghost_owners(&self) -> usize {
        u64::from_le(self.ghost_owners_le) as usize
    }
}

/// A color id on the wire.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WireRank {
    pub rank_le: u64,
}

impl WireRank {
    pub fn of(rank: usize) -> Self {
        Self {
            rank_le: (rank as u64).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u64::from_le(self.rank_le) as usize
    }
}

const_assert_eq!(size_of::<WireHdr>(), 8);
const_assert_eq!(size_of::<WireCount>(), 8);
const_assert_eq!(size_of::<WireGhostRequest>(), 16);
const_assert_eq!(size_of::<WireColoringInfo>(), 40);
const_assert_eq!(size_of::<WireRank>(), 8);

/// Header, count, then `records`.
pub fn encode<T: Pod>(kind: u16, records: &[T]) -> Vec<u8> {
    let payload: &[u8] = bytemuck::cast_slice(records);
    let mut out = Vec::with_capacity(size_of::<WireHdr>() + size_of::<WireCount>() + payload.len());
    out.extend_from_slice(bytemuck::bytes_of(&WireHdr::new(kind)));
    out.extend_from_slice(bytemuck::bytes_of(&WireCount::new(records.len())));
    out.extend_from_slice(payload);
    out
}

/// Inverse of [`encode`]; `peer` only labels the error.
pub fn decode<T: Pod>(kind: u16, peer: usize, buf: &[u8]) -> Result<Vec<T>, MeshDpError> {
    let malformed = |msg: String| MeshDpError::CommError {
        neighbor: peer,
        source: CommFailure::Malformed(msg),
    };
    let head = size_of::<WireHdr>() + size_of::<WireCount>();
    if buf.len() < head {
        return Err(malformed(format!("{} bytes is shorter than the header", buf.len())));
    }
    let hdr: WireHdr = bytemuck::pod_read_unaligned(&buf[..size_of::<WireHdr>()]);
    if hdr.version() != WIRE_VERSION {
        return Err(malformed(format!("wire version {}", hdr.version())));
    }
    if hdr.kind() != kind {
        return Err(malformed(format!("expected kind {kind}, got {}", hdr.kind())));
    }
    let count: WireCount = bytemuck::pod_read_unaligned(&buf[size_of::<WireHdr>()..head]);
    let body = &buf[head..];
    let expected = count.get() * size_of::<T>();
    if body.len() != expected {
        return Err(malformed(format!(
            "expected {expected} payload bytes, got {}",
            body.len()
        )));
    }
    Ok(body
        .chunks_exact(size_of::<T>())
        .map(bytemuck::pod_read_unaligned::<T>)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghost_requests_survive_the_wire() {
        let reqs = vec![WireGhostRequest::new(17, 3), WireGhostRequest::new(40, 0)];
        let buf = encode(KIND_GHOST_REQUEST, &reqs);
        let back: Vec<WireGhostRequest> = decode(KIND_GHOST_REQUEST, 2, &buf).unwrap();
        assert_eq!(back, reqs);
        assert_eq!(back[0].id(), 17);
        assert_eq!(back[0].offset(), 3);
    }

    #[test]
    fn empty_payload_is_valid() {
        let buf = encode::<WireColoringInfo>(KIND_COLORING_INFO, &[]);
        assert_eq!(buf.len(), 16);
        let back: Vec<WireColoringInfo> = decode(KIND_COLORING_INFO, 0, &buf).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn wrong_kind_and_truncation_are_rejected() {
        let buf = encode(KIND_COLORING_INFO, &[WireColoringInfo::new(1, 2, 3, 0, 1)]);
        assert!(decode::<WireColoringInfo>(KIND_GHOST_REQUEST, 1, &buf).is_err());
        let err = decode::<WireColoringInfo>(KIND_COLORING_INFO, 1, &buf[..buf.len() - 1])
            .unwrap_err();
        assert!(matches!(
            err,
            MeshDpError::CommError {
                neighbor: 1,
                source: CommFailure::Malformed(_)
            }
        ));
    }

    #[test]
    fn version_guard() {
        assert_eq!(WireHdr::new(KIND_GHOST_REQUEST).version(), WIRE_VERSION);
    }
}
