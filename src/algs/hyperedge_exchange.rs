//! Scatter/gather of hyperedges from the coordinating rank.
//!
//! This is a lock-step protocol, not a self-describing stream. The
//! coordinator first sends a [`MessageKind::Scalars`] frame to every other
//! rank, then, rank by rank, the frames of [`MessageKind::sequence`]:
//!
//! 1. `Counts`: `[edgeCount, pinCount]`
//! 2. `EdgeIds`: global edge ids, `edgeCount` entries
//! 3. `Offsets`: receiver-local CSR offsets, `edgeCount + 1` entries
//! 4. `Pins`: global vertex ids, `pinCount` entries
//! 5. `PinOwners`: owning rank of each pin, `pinCount` entries
//! 6. `Weights`: `edgeCount * weightDim` weights, only when `weightDim > 0`
//!
//! Receivers post exactly the same sequence. Each kind has its own tag
//! (`base + kind`), and every frame carries its kind in the header, so a
//! sender/receiver disagreement surfaces as an error on the receiving side
//! instead of silently mixing arrays.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::fanout::{DestinationLoad, FanoutPlan};
use crate::algs::wire::{self, MessageKind, SCALARS_OK, WIRE_VERSION, WireCounts, WireScalars};
use crate::config::{DistributionConfig, DistributionPolicy};
use crate::debug_invariants::DebugInvariants;
use crate::hyperdist_error::HyperdistError;
use crate::topology::hyperedges::{GlobalHyperedges, HyperedgeSet};

/// Values every rank must agree on before any hyperedge data moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScalarHeader {
    pub global_edge_count: usize,
    pub weight_dim: usize,
    pub policy: DistributionPolicy,
    pub base: usize,
    /// 0 means the whole group.
    pub dist_procs: usize,
}

impl ScalarHeader {
    pub fn new(edges: &GlobalHyperedges, cfg: &DistributionConfig) -> Self {
        Self {
            global_edge_count: edges.edge_count(),
            weight_dim: edges.weight_dim(),
            policy: cfg.policy,
            base: cfg.base,
            dist_procs: cfg.dist_procs.unwrap_or(0),
        }
    }

    /// The coordinator's settings, as seen by every rank.
    pub fn config(&self, host_rank: usize) -> DistributionConfig {
        DistributionConfig {
            policy: self.policy,
            host_rank,
            dist_procs: (self.dist_procs > 0).then_some(self.dist_procs),
            base: self.base,
        }
    }
}

fn send_frame<C: Communicator>(comm: &C, peer: usize, tag: CommTag, kind: MessageKind, frame: &[u8]) {
    log::trace!(
        "rank {} -> {peer}: {kind:?} ({} bytes)",
        comm.rank(),
        frame.len()
    );
    let _ = comm
        .isend(peer, tag.offset(kind.as_u16()).as_u16(), frame)
        .wait();
}

/// Receive the next frame from `host`, which must be of `kind` with a
/// payload of exactly `payload_len` bytes.
fn recv_frame<C: Communicator>(
    comm: &C,
    host: usize,
    tag: CommTag,
    kind: MessageKind,
    payload_len: usize,
) -> Result<Vec<u8>, HyperdistError> {
    let mut buf = vec![0u8; wire::HDR_LEN + payload_len];
    let data = comm
        .irecv(host, tag.offset(kind.as_u16()).as_u16(), &mut buf)
        .wait()
        .ok_or_else(|| HyperdistError::comm(host, format!("no {kind:?} message from rank {host}")))?;
    let (hdr, payload) = wire::split_frame(&data)
        .ok_or_else(|| HyperdistError::comm(host, format!("truncated {kind:?} frame ({} bytes)", data.len())))?;
    if hdr.version() != WIRE_VERSION {
        return Err(HyperdistError::WireVersion {
            neighbor: host,
            got: hdr.version(),
        });
    }
    if hdr.kind() != kind.as_u16() {
        return Err(HyperdistError::ProtocolMismatch {
            neighbor: host,
            expected: kind,
            got: hdr.kind(),
        });
    }
    wire::expect_exact_len(payload.len(), payload_len)
        .map_err(|e| HyperdistError::comm(host, format!("{kind:?}: {e}")))?;
    log::trace!("rank {} <- {host}: {kind:?} ({} bytes)", comm.rank(), data.len());
    Ok(payload.to_vec())
}

/// Send the scalar header from the coordinator to every other rank.
pub fn send_scalars<C: Communicator>(comm: &C, tag: CommTag, header: &ScalarHeader) {
    let rec = WireScalars::new(
        header.global_edge_count,
        header.weight_dim,
        header.policy.to_wire(),
        header.base,
        header.dist_procs,
    );
    broadcast_scalars(comm, tag, &rec);
}

/// Tell every other rank that the coordinator has given up, in place of the
/// scalar header.
pub fn send_abort<C: Communicator>(comm: &C, tag: CommTag) {
    broadcast_scalars(comm, tag, &WireScalars::abort());
}

fn broadcast_scalars<C: Communicator>(comm: &C, tag: CommTag, rec: &WireScalars) {
    let mut frame = Vec::with_capacity(wire::HDR_LEN + wire::elem_size(MessageKind::Scalars));
    wire::begin_frame(&mut frame, MessageKind::Scalars);
    wire::put_record(&mut frame, rec);
    for peer in (0..comm.size()).filter(|&p| p != comm.rank()) {
        send_frame(comm, peer, tag, MessageKind::Scalars, &frame);
    }
}

/// Receive the scalar header from `host`.
pub fn recv_scalars<C: Communicator>(comm: &C, host: usize, tag: CommTag) -> Result<ScalarHeader, HyperdistError> {
    let payload = recv_frame(comm, host, tag, MessageKind::Scalars, wire::elem_size(MessageKind::Scalars))?;
    let rec: WireScalars = wire::get_record(&payload)
        .ok_or_else(|| HyperdistError::comm(host, "malformed scalar header"))?;
    if rec.status() != SCALARS_OK {
        return Err(HyperdistError::CoordinatorFailed { host });
    }
    let policy = DistributionPolicy::from_wire(rec.policy())
        .ok_or_else(|| HyperdistError::comm(host, format!("unknown policy code {}", rec.policy())))?;
    Ok(ScalarHeader {
        global_edge_count: rec.global_edges(),
        weight_dim: rec.weight_dim(),
        policy,
        base: rec.base(),
        dist_procs: rec.dist_procs(),
    })
}

/// Send buffers sized once to the largest destination and reused for all of them.
pub struct SendBuffers {
    staging: HyperedgeSet,
    frame: Vec<u8>,
}

impl SendBuffers {
    pub fn with_capacity(max: DestinationLoad, weight_dim: usize) -> Self {
        let largest_frame = [
            (max.edges + 1) * 8,
            max.pins * 8,
            max.edges * weight_dim * 4,
            wire::elem_size(MessageKind::Counts),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        Self {
            staging: HyperedgeSet::with_capacity(max.edges, max.pins, weight_dim),
            frame: Vec::with_capacity(wire::HDR_LEN + largest_frame),
        }
    }

    /// Gather the edges planned for `dest` into the staging set.
    pub fn load(&mut self, edges: &GlobalHyperedges, plan: &FanoutPlan, dest: usize) -> &HyperedgeSet {
        self.staging.clear();
        let owners = plan.pin_owners();
        for &h in plan.edges_for(dest) {
            let range = edges.pin_range(h);
            self.staging
                .push_edge(h, edges.pins(h), &owners[range], edges.weights(h));
        }
        &self.staging
    }

    /// Send the staged edges to `peer` as the fixed frame sequence.
    fn send_staged<C: Communicator>(&mut self, comm: &C, peer: usize, tag: CommTag) {
        let set = &self.staging;
        for &kind in MessageKind::sequence(set.weight_dim) {
            wire::begin_frame(&mut self.frame, kind);
            match kind {
                MessageKind::Counts => {
                    wire::put_record(&mut self.frame, &WireCounts::new(set.edge_count(), set.pin_count()))
                }
                MessageKind::EdgeIds => wire::put_u64s(&mut self.frame, set.edge_gids.iter().copied()),
                MessageKind::Offsets => wire::put_u64s(&mut self.frame, set.offsets.iter().copied()),
                MessageKind::Pins => wire::put_u64s(&mut self.frame, set.pins.iter().copied()),
                MessageKind::PinOwners => wire::put_u32s(&mut self.frame, set.pin_owners.iter().copied()),
                MessageKind::Weights => wire::put_f32s(&mut self.frame, &set.weights),
                MessageKind::Scalars => unreachable!("scalars are not part of the per-rank sequence"),
            }
            send_frame(comm, peer, tag, kind, &self.frame);
        }
    }
}

/// Coordinator side: send every other rank its planned edges, then return
/// the coordinator's own edges (pins still global), copied without messaging.
pub fn scatter_hyperedges<C: Communicator>(
    comm: &C,
    tag: CommTag,
    edges: &GlobalHyperedges,
    plan: &FanoutPlan,
) -> HyperedgeSet {
    let me = comm.rank();
    let weight_dim = edges.weight_dim();
    let mut bufs = SendBuffers::with_capacity(plan.max_load(), weight_dim);
    for peer in (0..comm.size()).filter(|&p| p != me) {
        let staged = bufs.load(edges, plan, peer);
        log::debug!(
            "rank {me}: sending {} edges / {} pins to rank {peer}",
            staged.edge_count(),
            staged.pin_count()
        );
        bufs.send_staged(comm, peer, tag);
    }

    let load = plan.load(me);
    let mut own = HyperedgeSet::with_capacity(load.edges, load.pins, weight_dim);
    let owners = plan.pin_owners();
    for &h in plan.edges_for(me) {
        own.push_edge(h, edges.pins(h), &owners[edges.pin_range(h)], edges.weights(h));
    }
    own
}

/// Non-coordinator side: receive this rank's edges from `host` (pins still global).
pub fn gather_hyperedges<C: Communicator>(
    comm: &C,
    host: usize,
    tag: CommTag,
    weight_dim: usize,
) -> Result<HyperedgeSet, HyperdistError> {
    let mut set = HyperedgeSet::empty(weight_dim);
    let (mut n_edges, mut n_pins) = (0, 0);
    for &kind in MessageKind::sequence(weight_dim) {
        let n_elems = match kind {
            MessageKind::Counts => 1,
            MessageKind::EdgeIds => n_edges,
            MessageKind::Offsets => n_edges + 1,
            MessageKind::Pins | MessageKind::PinOwners => n_pins,
            MessageKind::Weights => n_edges * weight_dim,
            MessageKind::Scalars => unreachable!("scalars are not part of the per-rank sequence"),
        };
        let payload = recv_frame(comm, host, tag, kind, n_elems * wire::elem_size(kind))?;
        match kind {
            MessageKind::Counts => {
                let counts: WireCounts = wire::get_record(&payload)
                    .ok_or_else(|| HyperdistError::comm(host, "malformed counts"))?;
                n_edges = counts.edges();
                n_pins = counts.pins();
            }
            MessageKind::EdgeIds => set.edge_gids = wire::get_u64s(&payload),
            MessageKind::Offsets => set.offsets = wire::get_u64s(&payload),
            MessageKind::Pins => set.pins = wire::get_u64s(&payload),
            MessageKind::PinOwners => set.pin_owners = wire::get_u32s(&payload),
            MessageKind::Weights => set.weights = wire::get_f32s(&payload),
            MessageKind::Scalars => {}
        }
    }
    log::debug!(
        "rank {}: received {n_edges} edges / {n_pins} pins from rank {host}",
        comm.rank()
    );
    set.validate_invariants()?;
    Ok(set)
}
