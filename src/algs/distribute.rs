// src/algs/distribute.rs

use crate::algs::communicator::{CommTag, Communicator, HYPEREDGE_TAG};
use crate::algs::fanout::FanoutPlan;
use crate::algs::hyperedge_exchange::{
    ScalarHeader, gather_hyperedges, recv_scalars, scatter_hyperedges, send_abort, send_scalars,
};
use crate::algs::local_ids::LocalIdMap;
use crate::algs::localize::{global_pin, localize_pins};
use crate::config::{DistributionConfig, DistributionPolicy};
use crate::debug_invariants::DebugInvariants;
use crate::hyperdist_error::HyperdistError;
use crate::topology::hyperedges::{GlobalHyperedges, HyperedgeSet};
use crate::topology::vertex_dist::VertexDistribution;

/// What one rank holds after [`distribute_hyperedges`].
#[derive(Clone, Debug)]
pub struct DistributedHyperedges {
    pub global_edge_count: usize,
    pub weight_dim: usize,
    /// The coordinator's settings, agreed by every rank.
    pub config: DistributionConfig,
    /// Local CSR set; pins owned here are local indices, others global ids.
    pub edges: HyperedgeSet,
    /// The numbering used to localize `edges`.
    pub local_ids: LocalIdMap,
}

impl DistributedHyperedges {
    pub fn local_edge_count(&self) -> usize {
        self.edges.edge_count()
    }

    pub fn policy(&self) -> DistributionPolicy {
        self.config.policy
    }

    /// Global vertex id of pin `i`, whichever addressing it uses.
    pub fn global_pin(&self, i: usize) -> Option<usize> {
        global_pin(&self.edges, &self.local_ids, i)
    }
}

/// Distribute hyperedges from the coordinating rank to the whole group.
///
/// This is a **collective** call: every rank of `comm` must call it, with the
/// same `host_rank` in `cfg` and an identical `dist`. Only the coordinator
/// passes `edges`; other ranks pass `None` (anything they pass is ignored).
/// The coordinator's `policy`, `base` and `dist_procs` override the values on
/// the other ranks. The full set is dropped as soon as it has been sent.
///
/// # Arguments
/// - `comm`: communicator of the process group
/// - `cfg`: distribution settings (coordinator's are authoritative)
/// - `n_vertices`: global vertex count; must match `dist`
/// - `edges`: the full hypergraph, coordinator only
/// - `dist`: vertex-to-rank assignment, identical on every rank
///
/// # Errors
/// The coordinator validates its settings, the assignment and every pin before
/// it sends any hyperedge. If that fails it sends an abort header instead, and
/// every other rank returns [`HyperdistError::CoordinatorFailed`]. Any later error means the
/// collective as a whole has failed; there is no partial state to recover.
pub fn distribute_hyperedges<C: Communicator>(
    comm: &C,
    cfg: &DistributionConfig,
    n_vertices: usize,
    edges: Option<GlobalHyperedges>,
    dist: &VertexDistribution,
) -> Result<DistributedHyperedges, HyperdistError> {
    distribute_hyperedges_with_tag(comm, cfg, n_vertices, edges, dist, HYPEREDGE_TAG)
}

/// [`distribute_hyperedges`] on a caller-chosen tag range (`tag..tag + 8`).
pub fn distribute_hyperedges_with_tag<C: Communicator>(
    comm: &C,
    cfg: &DistributionConfig,
    n_vertices: usize,
    edges: Option<GlobalHyperedges>,
    dist: &VertexDistribution,
    tag: CommTag,
) -> Result<DistributedHyperedges, HyperdistError> {
    let (rank, size) = (comm.rank(), comm.size());
    let host = cfg.host_rank;

    // 1) coordinator: validate and plan everything before the first send
    let (header, local_ids, own) = if rank == host {
        let prepared = edges
            .ok_or(HyperdistError::MissingEdgeSet { rank })
            .and_then(|edges| {
                cfg.validate(size)?;
                dist.check(n_vertices, size)?;
                let local_ids = LocalIdMap::new(dist, n_vertices, cfg.base, rank)?;
                let plan = FanoutPlan::build(&edges, dist, size, cfg)?;
                Ok((edges, local_ids, plan))
            });
        let (edges, local_ids, plan) = match prepared {
            Ok(p) => p,
            Err(e) => {
                log::error!("rank {rank}: abandoning hyperedge distribution: {e}");
                send_abort(comm, tag);
                return Err(e);
            }
        };
        let header = ScalarHeader::new(&edges, cfg);
        send_scalars(comm, tag, &header);
        let own = (header.global_edge_count > 0).then(|| scatter_hyperedges(comm, tag, &edges, &plan));
        drop(edges);
        (header, local_ids, own)
    } else {
        // policy, base and dist_procs come from the coordinator
        cfg.validate_host(size)?;
        let header = recv_scalars(comm, host, tag)?;
        header.config(host).validate(size)?;
        let local_ids = LocalIdMap::new(dist, n_vertices, header.base, rank)?;
        (header, local_ids, None)
    };

    let mut result = DistributedHyperedges {
        global_edge_count: header.global_edge_count,
        weight_dim: header.weight_dim,
        config: header.config(host),
        edges: HyperedgeSet::empty(header.weight_dim),
        local_ids,
    };
    if header.global_edge_count == 0 {
        log::debug!("rank {rank}: no hyperedges to distribute");
        return Ok(result);
    }

    // 2) coordinator keeps its own share, everyone else gathers
    result.edges = match own {
        Some(own) => own,
        None => gather_hyperedges(comm, host, tag, header.weight_dim)?,
    };

    // 3) localize own pins
    localize_pins(&mut result.edges, &result.local_ids)?;
    crate::debug_invariants!(result.edges.validate_invariants(), "distributed hyperedges");

    log::debug!(
        "rank {rank}: holds {} of {} hyperedges ({} pins, policy {})",
        result.local_edge_count(),
        result.global_edge_count,
        result.edges.pin_count(),
        result.config.policy
    );
    Ok(result)
}
