mod util;

use hyperdist::prelude::*;
use util::{N_VERTICES, gids_per_rank, simulate, two_blocks, two_edges};

#[test]
fn cyclic_two_ranks() {
    let cfg = DistributionConfig::new(DistributionPolicy::Cyclic);
    let run = simulate(2, &cfg, N_VERTICES, &two_edges(), &two_blocks());
    let (r0, r1) = (&run.results[0], &run.results[1]);

    assert_eq!(r0.edges.edge_gids, vec![0]);
    assert_eq!(r0.edges.offsets, vec![0, 3]);
    assert_eq!(r0.edges.pin_owners, vec![0, 0, 1]);
    // 0 and 1 localized, 4 left global
    assert_eq!(r0.edges.pins, vec![0, 1, 4]);

    assert_eq!(r1.edges.edge_gids, vec![1]);
    assert_eq!(r1.edges.pin_owners, vec![0, 1]);
    // 2 left global, 5 localized to 2
    assert_eq!(r1.edges.pins, vec![2, 2]);

    for r in &run.results {
        assert_eq!(r.global_edge_count, 2);
        assert_eq!(r.weight_dim, 0);
        assert!(r.edges.weights.is_empty());
    }
    assert_eq!(run.undelivered, 0);
}

#[test]
fn owner_replicates_boundary_edges() {
    let cfg = DistributionConfig::new(DistributionPolicy::Owner);
    let run = simulate(2, &cfg, N_VERTICES, &two_edges(), &two_blocks());
    assert_eq!(gids_per_rank(&run.results), vec![vec![0, 1], vec![0, 1]]);

    let (r0, r1) = (&run.results[0], &run.results[1]);
    assert_eq!(r0.edges.pin_owners, vec![0, 0, 1, 0, 1]);
    assert_eq!(r0.edges.pins, vec![0, 1, 4, 2, 5]);
    assert_eq!(r1.edges.pin_owners, vec![0, 0, 1, 0, 1]);
    assert_eq!(r1.edges.pins, vec![0, 1, 1, 2, 2]);
}

#[test]
fn linear_buckets_by_edge_index() {
    let g = GlobalHyperedges::from_pin_lists((0..6).map(|v| vec![v]));
    let cfg = DistributionConfig::new(DistributionPolicy::Linear);
    let run = simulate(3, &cfg, 6, &g, &VertexDistribution::contiguous(6, 3));
    assert_eq!(
        gids_per_rank(&run.results),
        vec![vec![0, 1], vec![2, 3], vec![4, 5]]
    );
}

#[test]
fn weights_follow_their_edges() {
    let g = two_edges().with_weights(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let cfg = DistributionConfig::new(DistributionPolicy::Owner);
    let run = simulate(2, &cfg, N_VERTICES, &g, &two_blocks());
    for r in &run.results {
        assert_eq!(r.weight_dim, 2);
        assert_eq!(r.edges.weights, vec![1.0, 2.0, 3.0, 4.0]);
    }

    let cfg = DistributionConfig::new(DistributionPolicy::Cyclic);
    let run = simulate(2, &cfg, N_VERTICES, &g, &two_blocks());
    assert_eq!(run.results[0].edges.weights(0), &[1.0, 2.0]);
    assert_eq!(run.results[1].edges.weights(0), &[3.0, 4.0]);
}

#[test]
fn empty_hypergraph_everywhere() {
    let cfg = DistributionConfig::new(DistributionPolicy::Owner);
    let run = simulate(3, &cfg, N_VERTICES, &GlobalHyperedges::default(), &VertexDistribution::contiguous(N_VERTICES, 3));
    for r in &run.results {
        assert_eq!(r.global_edge_count, 0);
        assert_eq!(r.local_edge_count(), 0);
        assert_eq!(r.edges.offsets, vec![0]);
        assert!(r.edges.pins.is_empty());
        assert!(r.edges.pin_owners.is_empty());
    }
}

#[test]
fn non_zero_host_and_one_based_numbering() {
    // Same graph, numbered from 1, read on rank 1.
    let g = GlobalHyperedges::from_pin_lists([vec![1, 2, 5], vec![3, 6]]);
    let cfg = DistributionConfig::new(DistributionPolicy::Cyclic)
        .with_host_rank(1)
        .with_base(1);
    let run = simulate(2, &cfg, N_VERTICES, &g, &two_blocks());
    let (r0, r1) = (&run.results[0], &run.results[1]);
    assert_eq!(r0.edges.edge_gids, vec![0]);
    assert_eq!(r0.edges.pins, vec![0, 1, 5]);
    assert_eq!(r1.edges.edge_gids, vec![1]);
    assert_eq!(r1.edges.pins, vec![3, 2]);
    assert_eq!(r1.global_pin(1), Some(6));
    assert_eq!(r0.global_pin(1), Some(2));
}

#[test]
fn coordinator_settings_win() {
    // Rank 1 asks for OWNER and base 0; the host's CYCLIC/base 0 is what runs.
    let g = two_edges();
    let dist = two_blocks();
    let host_cfg = DistributionConfig::new(DistributionPolicy::Cyclic);
    let other_cfg = DistributionConfig::new(DistributionPolicy::Owner);
    let run = run_ranks(2, 0, |comm| {
        if comm.rank() == 0 {
            distribute_hyperedges(comm, &host_cfg, N_VERTICES, Some(g.clone()), &dist).unwrap()
        } else {
            distribute_hyperedges(comm, &other_cfg, N_VERTICES, Some(g.clone()), &dist).unwrap()
        }
    });
    assert_eq!(run.results[1].policy(), DistributionPolicy::Cyclic);
    assert_eq!(gids_per_rank(&run.results), vec![vec![0], vec![1]]);
}

#[test]
fn dist_procs_leaves_trailing_ranks_empty() {
    let g = GlobalHyperedges::from_pin_lists((0..8).map(|v| vec![v]));
    let cfg = DistributionConfig::new(DistributionPolicy::Cyclic).with_dist_procs(2);
    let run = simulate(4, &cfg, 8, &g, &VertexDistribution::contiguous(8, 4));
    assert_eq!(
        gids_per_rank(&run.results),
        vec![vec![0, 2, 4, 6], vec![1, 3, 5, 7], vec![], vec![]]
    );
    for r in &run.results {
        assert_eq!(r.config.dist_procs, Some(2));
    }
}

#[test]
fn explicit_assignment_with_interleaved_owners() {
    let dist = VertexDistribution::explicit(vec![1, 0, 1, 0, 1, 0]);
    let cfg = DistributionConfig::new(DistributionPolicy::Owner);
    let run = simulate(2, &cfg, N_VERTICES, &two_edges(), &dist);
    let r1 = &run.results[1];
    // rank 1 owns 0, 2, 4 -> local 0, 1, 2
    assert_eq!(r1.edges.pin_owners, vec![1, 0, 1, 1, 0]);
    assert_eq!(r1.edges.pins, vec![0, 1, 2, 1, 5]);
    assert_eq!(r1.local_ids.owned_globals().collect::<Vec<_>>(), vec![0, 2, 4]);
}

#[test]
fn threaded_run_matches_sequential_run() {
    let g = two_edges().with_weights(1, vec![0.25, 0.75]).unwrap();
    let dist = two_blocks();
    for policy in [
        DistributionPolicy::Cyclic,
        DistributionPolicy::Linear,
        DistributionPolicy::Owner,
    ] {
        let cfg = DistributionConfig::new(policy);
        let seq = simulate(2, &cfg, N_VERTICES, &g, &dist);
        let thr = run_ranks_threaded(2, |comm| {
            let mine = (comm.rank() == 0).then(|| g.clone());
            distribute_hyperedges(comm, &cfg, N_VERTICES, mine, &dist).unwrap()
        });
        for (a, b) in seq.results.iter().zip(&thr.results) {
            assert_eq!(a.edges, b.edges);
        }
        assert_eq!(thr.undelivered, 0);
    }
}

#[test]
fn bad_pin_on_coordinator_releases_waiting_ranks() {
    // Blocking receives: the other ranks must be told to stop, not left waiting.
    let g = GlobalHyperedges::from_pin_lists([vec![0, 9]]);
    let cfg = DistributionConfig::new(DistributionPolicy::Cyclic);
    let run = run_ranks_threaded(3, |comm| {
        let mine = (comm.rank() == 0).then(|| g.clone());
        distribute_hyperedges(comm, &cfg, N_VERTICES, mine, &VertexDistribution::contiguous(N_VERTICES, 3))
    });
    assert!(matches!(
        run.results[0],
        Err(HyperdistError::VertexOutOfRange { vertex: 9, .. })
    ));
    for r in &run.results[1..] {
        assert!(matches!(r, Err(HyperdistError::CoordinatorFailed { host: 0 })));
    }
    assert_eq!(run.undelivered, 0);

    // Same for an assignment that names a rank outside the group.
    let bad = VertexDistribution::explicit(vec![0, 0, 0, 1, 1, 5]);
    let run = run_ranks_threaded(2, |comm| {
        let mine = (comm.rank() == 0).then(two_edges);
        distribute_hyperedges(comm, &cfg, N_VERTICES, mine, &bad)
    });
    assert!(matches!(
        run.results[0],
        Err(HyperdistError::InvalidRank { rank: 5, size: 2 })
    ));
    assert!(matches!(
        run.results[1],
        Err(HyperdistError::CoordinatorFailed { host: 0 })
    ));
}

#[test]
fn other_ranks_base_is_overridden_not_validated() {
    let g = two_edges();
    let dist = two_blocks();
    let host_cfg = DistributionConfig::new(DistributionPolicy::Cyclic);
    let other_cfg = DistributionConfig::new(DistributionPolicy::Cyclic).with_base(2);
    let run = run_ranks(2, 0, |comm| {
        if comm.rank() == 0 {
            distribute_hyperedges(comm, &host_cfg, N_VERTICES, Some(g.clone()), &dist)
        } else {
            distribute_hyperedges(comm, &other_cfg, N_VERTICES, None, &dist)
        }
    });
    let r1 = run.results[1].as_ref().unwrap();
    assert_eq!(r1.config.base, 0);
    assert_eq!(r1.edges.pins, vec![2, 2]);
}
