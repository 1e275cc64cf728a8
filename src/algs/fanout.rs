//! Coordinator-side planning: which ranks receive which hyperedges.
//!
//! The plan also records the owning rank of every pin of the full set, since
//! a receiving rank needs pin owners even for edges it got by CYCLIC or
//! LINEAR bucketing.

use crate::config::{DistributionConfig, DistributionPolicy};
use crate::hyperdist_error::HyperdistError;
use crate::topology::hyperedges::GlobalHyperedges;
use crate::topology::vertex_dist::VertexDistribution;
use itertools::Itertools;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Outgoing volume for one destination rank.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DestinationLoad {
    pub edges: usize,
    pub pins: usize,
}

/// Send plan produced on the coordinating rank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FanoutPlan {
    policy: DistributionPolicy,
    n_procs: usize,
    /// Destinations of edge `e`: `dests[dest_offsets[e]..dest_offsets[e + 1]]`, ascending.
    dest_offsets: Vec<usize>,
    dests: Vec<usize>,
    /// Edges for rank `p`: `by_dest[by_dest_offsets[p]..by_dest_offsets[p + 1]]`, ascending.
    by_dest_offsets: Vec<usize>,
    by_dest: Vec<usize>,
    pin_owners: Vec<usize>,
    loads: Vec<DestinationLoad>,
}

/// Single destination of edge `h` under CYCLIC or LINEAR.
fn bucket(policy: DistributionPolicy, h: usize, n_edges: usize, dist_procs: usize) -> usize {
    match policy {
        DistributionPolicy::Cyclic => h % dist_procs,
        _ => ((h as u128 * dist_procs as u128) / n_edges as u128) as usize,
    }
}

fn pin_owners(
    edges: &GlobalHyperedges,
    dist: &VertexDistribution,
    base: usize,
) -> Result<Vec<usize>, HyperdistError> {
    #[cfg(feature = "rayon")]
    {
        edges
            .all_pins()
            .par_iter()
            .map(|&v| dist.owner_of(v, base))
            .collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        edges
            .all_pins()
            .iter()
            .map(|&v| dist.owner_of(v, base))
            .collect()
    }
}

impl FanoutPlan {
    /// Plan the fan-out of `edges` over a group of `n_procs` ranks.
    pub fn build(
        edges: &GlobalHyperedges,
        dist: &VertexDistribution,
        n_procs: usize,
        cfg: &DistributionConfig,
    ) -> Result<Self, HyperdistError> {
        let n_edges = edges.edge_count();
        let policy = cfg.policy;
        let dist_procs = cfg.effective_dist_procs(n_procs);
        let pin_owners = pin_owners(edges, dist, cfg.base)?;
        if let Some(&rank) = pin_owners.iter().find(|&&p| p >= n_procs) {
            return Err(HyperdistError::InvalidRank {
                rank,
                size: n_procs,
            });
        }

        let mut dest_offsets = Vec::with_capacity(n_edges + 1);
        let mut dests = Vec::with_capacity(n_edges);
        let mut loads = vec![DestinationLoad::default(); n_procs];
        let mut unrouted = 0usize;
        dest_offsets.push(0);
        for h in 0..n_edges {
            let range = edges.pin_range(h);
            let start = dests.len();
            match policy {
                DistributionPolicy::Owner => {
                    dests.extend(pin_owners[range.clone()].iter().copied().sorted_unstable().dedup());
                    if dests.len() == start {
                        unrouted += 1;
                    }
                }
                _ => dests.push(bucket(policy, h, n_edges, dist_procs)),
            }
            for &p in &dests[start..] {
                loads[p].edges += 1;
                loads[p].pins += range.len();
            }
            dest_offsets.push(dests.len());
        }
        if unrouted > 0 {
            log::debug!("{unrouted} pinless hyperedges have no owner and are not sent anywhere");
        }

        // Counting sort of (edge, dest) pairs by destination; edges stay ascending.
        let mut by_dest_offsets = Vec::with_capacity(n_procs + 1);
        by_dest_offsets.push(0);
        for load in &loads {
            by_dest_offsets.push(by_dest_offsets[by_dest_offsets.len() - 1] + load.edges);
        }
        let mut cursor = by_dest_offsets.clone();
        let mut by_dest = vec![0usize; dests.len()];
        for h in 0..n_edges {
            for &p in &dests[dest_offsets[h]..dest_offsets[h + 1]] {
                by_dest[cursor[p]] = h;
                cursor[p] += 1;
            }
        }

        let plan = Self {
            policy,
            n_procs,
            dest_offsets,
            dests,
            by_dest_offsets,
            by_dest,
            pin_owners,
            loads,
        };
        log::debug!(
            "fan-out ({policy}) of {n_edges} edges over {n_procs} ranks: {} sends, max load {:?}",
            plan.total_sends(),
            plan.max_load()
        );
        Ok(plan)
    }

    pub fn policy(&self) -> DistributionPolicy {
        self.policy
    }

    pub fn n_procs(&self) -> usize {
        self.n_procs
    }

    pub fn global_edge_count(&self) -> usize {
        self.dest_offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.global_edge_count() == 0
    }

    /// Ranks that receive edge `e`.
    pub fn destinations(&self, e: usize) -> &[usize] {
        &self.dests[self.dest_offsets[e]..self.dest_offsets[e + 1]]
    }

    /// Edges sent to rank `p`, ascending by global id.
    pub fn edges_for(&self, p: usize) -> &[usize] {
        &self.by_dest[self.by_dest_offsets[p]..self.by_dest_offsets[p + 1]]
    }

    pub fn load(&self, p: usize) -> DestinationLoad {
        self.loads[p]
    }

    /// Owning rank of every pin of the full set, aligned with its flattened pins.
    pub fn pin_owners(&self) -> &[usize] {
        &self.pin_owners
    }

    /// Largest edge count and largest pin count over all destinations.
    ///
    /// The two maxima may come from different ranks; they size the send buffers.
    pub fn max_load(&self) -> DestinationLoad {
        self.loads
            .iter()
            .fold(DestinationLoad::default(), |acc, l| DestinationLoad {
                edges: acc.edges.max(l.edges),
                pins: acc.pins.max(l.pins),
            })
    }

    /// Total number of (edge, destination) pairs.
    pub fn total_sends(&self) -> usize {
        self.dests.len()
    }

    /// Average number of ranks each edge is sent to.
    pub fn replication_factor(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.total_sends() as f64 / self.global_edge_count() as f64
        }
    }
}
