#![allow(dead_code)]
use hyperdist::prelude::*;

pub const N_VERTICES: usize = 6;

/// Edge 0 = {0, 1, 4}, edge 1 = {2, 5}.
pub fn two_edges() -> GlobalHyperedges {
    GlobalHyperedges::from_pin_lists([vec![0, 1, 4], vec![2, 5]])
}

/// Vertices 0–2 on rank 0, 3–5 on rank 1.
pub fn two_blocks() -> VertexDistribution {
    VertexDistribution::contiguous(N_VERTICES, 2)
}

/// Run a full distribution on `size` simulated ranks; only the host gets `edges`.
pub fn simulate(
    size: usize,
    cfg: &DistributionConfig,
    n_vertices: usize,
    edges: &GlobalHyperedges,
    dist: &VertexDistribution,
) -> hyperdist::algs::simulate::SimulationRun<DistributedHyperedges> {
    run_ranks(size, cfg.host_rank, |comm| {
        let mine = (comm.rank() == cfg.host_rank).then(|| edges.clone());
        distribute_hyperedges(comm, cfg, n_vertices, mine, dist).unwrap()
    })
}

/// Sorted global edge ids held by each rank.
pub fn gids_per_rank(results: &[DistributedHyperedges]) -> Vec<Vec<usize>> {
    results
        .iter()
        .map(|r| {
            let mut g = r.edges.edge_gids.clone();
            g.sort_unstable();
            g
        })
        .collect()
}
