//! Fixed, versioned, little-endian wire types for hyperedge distribution.
//!
//! Every message is a frame: an 8-byte [`WireHdr`] followed by a payload whose
//! length the receiver already knows from earlier messages. Arrays of ids and
//! offsets travel as `u64`, ranks as `u32`, weights as `f32` bits.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// The messages of the distribution protocol, in the order they are sent.
///
/// After [`MessageKind::Scalars`], each non-coordinating rank receives the
/// remaining kinds exactly in [`MessageKind::sequence`] order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageKind {
    Scalars = 1,
    Counts = 2,
    EdgeIds = 3,
    Offsets = 4,
    Pins = 5,
    PinOwners = 6,
    Weights = 7,
}

const SEQUENCE: [MessageKind; 6] = [
    MessageKind::Counts,
    MessageKind::EdgeIds,
    MessageKind::Offsets,
    MessageKind::Pins,
    MessageKind::PinOwners,
    MessageKind::Weights,
];

impl MessageKind {
    /// Per-rank message order after the scalar header; `Weights` only when `weight_dim > 0`.
    pub fn sequence(weight_dim: usize) -> &'static [MessageKind] {
        if weight_dim > 0 { &SEQUENCE } else { &SEQUENCE[..5] }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            1 => Some(MessageKind::Scalars),
            2 => Some(MessageKind::Counts),
            3 => Some(MessageKind::EdgeIds),
            4 => Some(MessageKind::Offsets),
            5 => Some(MessageKind::Pins),
            6 => Some(MessageKind::PinOwners),
            7 => Some(MessageKind::Weights),
            _ => None,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireHdr {
    pub version_le: u16, // = WIRE_VERSION.to_le()
    pub kind_le: u16,    // MessageKind
    pub reserved_le: u32, // future use; keep zero
}

impl WireHdr {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: kind.as_u16().to_le(),
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

/// Collectively agreed scalars, sent once by the coordinator to every other rank.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireScalars {
    pub global_edges_le: u64,
    pub weight_dim_le: u32,
    pub policy_le: u32,
    pub base_le: u32,
    pub dist_procs_le: u32, // 0 = whole group
    pub status_le: u32,     // SCALARS_OK or SCALARS_ABORT
    pub reserved_le: u32,   // keep zero
}

/// The coordinator is about to send hyperedges.
pub const SCALARS_OK: u32 = 0;
/// The coordinator failed before sending any hyperedge; nothing else follows.
pub const SCALARS_ABORT: u32 = 1;

impl WireScalars {
    pub fn new(global_edges: usize, weight_dim: usize, policy: u32, base: usize, dist_procs: usize) -> Self {
        Self {
            global_edges_le: (global_edges as u64).to_le(),
            weight_dim_le: (weight_dim as u32).to_le(),
            policy_le: policy.to_le(),
            base_le: (base as u32).to_le(),
            dist_procs_le: (dist_procs as u32).to_le(),
            status_le: SCALARS_OK.to_le(),
            reserved_le: 0,
        }
    }

    /// A header telling every receiver the collective was abandoned.
    pub fn abort() -> Self {
        Self {
            status_le: SCALARS_ABORT.to_le(),
            ..Self::zeroed()
        }
    }
    pub fn status(&self) -> u32 {
        u32::from_le(self.status_le)
    }
    pub fn global_edges(&self) -> usize {
        u64::from_le(self.global_edges_le) as usize
    }
    pub fn weight_dim(&self) -> usize {
        u32::from_le(self.weight_dim_le) as usize
    }
    pub fn policy(&self) -> u32 {
        u32::from_le(self.policy_le)
    }
    pub fn base(&self) -> usize {
        u32::from_le(self.base_le) as usize
    }
    pub fn dist_procs(&self) -> usize {
        u32::from_le(self.dist_procs_le) as usize
    }
}

/// `[edgeCount, pinCount]` for one destination.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCounts {
    pub edges_le: u64,
    pub pins_le: u64,
}

impl WireCounts {
    pub fn new(edges: usize, pins: usize) -> Self {
        Self {
            edges_le: (edges as u64).to_le(),
            pins_le: (pins as u64).to_le(),
        }
    }
    pub fn edges(&self) -> usize {
        u64::from_le(self.edges_le) as usize
    }
    pub fn pins(&self) -> usize {
        u64::from_le(self.pins_le) as usize
    }
}

const_assert_eq!(size_of::<WireHdr>(), 8);
const_assert_eq!(size_of::<WireScalars>(), 32);
const_assert_eq!(size_of::<WireCounts>(), 16);

pub const HDR_LEN: usize = size_of::<WireHdr>();

/// Bytes per element of each array message kind.
pub fn elem_size(kind: MessageKind) -> usize {
    match kind {
        MessageKind::EdgeIds | MessageKind::Offsets | MessageKind::Pins => size_of::<u64>(),
        MessageKind::PinOwners | MessageKind::Weights => size_of::<u32>(),
        MessageKind::Scalars => size_of::<WireScalars>(),
        MessageKind::Counts => size_of::<WireCounts>(),
    }
}

/// Start a frame for `kind` in `out`, discarding its previous contents.
pub fn begin_frame(out: &mut Vec<u8>, kind: MessageKind) {
    out.clear();
    out.extend_from_slice(bytemuck::bytes_of(&WireHdr::new(kind)));
}

pub fn put_record<T: Pod>(out: &mut Vec<u8>, rec: &T) {
    out.extend_from_slice(bytemuck::bytes_of(rec));
}

pub fn put_u64s(out: &mut Vec<u8>, vals: impl IntoIterator<Item = usize>) {
    for v in vals {
        out.extend_from_slice(&(v as u64).to_le_bytes());
    }
}

pub fn put_u32s(out: &mut Vec<u8>, vals: impl IntoIterator<Item = usize>) {
    for v in vals {
        out.extend_from_slice(&(v as u32).to_le_bytes());
    }
}

pub fn put_f32s(out: &mut Vec<u8>, vals: &[f32]) {
    for v in vals {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Split a received frame into its header and payload.
pub fn split_frame(bytes: &[u8]) -> Option<(WireHdr, &[u8])> {
    if bytes.len() < HDR_LEN {
        return None;
    }
    let hdr: WireHdr = bytemuck::pod_read_unaligned(&bytes[..HDR_LEN]);
    Some((hdr, &bytes[HDR_LEN..]))
}

/// Read one record from an exactly-sized, possibly unaligned payload.
pub fn get_record<T: Pod>(payload: &[u8]) -> Option<T> {
    (payload.len() == size_of::<T>()).then(|| bytemuck::pod_read_unaligned(payload))
}

pub fn get_u64s(payload: &[u8]) -> Vec<usize> {
    payload
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes(c.try_into().unwrap_or([0; 8])) as usize)
        .collect()
}

pub fn get_u32s(payload: &[u8]) -> Vec<usize> {
    payload
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap_or([0; 4])) as usize)
        .collect()
}

pub fn get_f32s(payload: &[u8]) -> Vec<f32> {
    payload
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().unwrap_or([0; 4])))
        .collect()
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}
