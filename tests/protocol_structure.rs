mod util;

use hyperdist::algs::communicator::HYPEREDGE_TAG;
use hyperdist::algs::distribute::distribute_hyperedges_with_tag;
use hyperdist::algs::wire::{HDR_LEN, MessageKind};
use hyperdist::prelude::*;
use util::{N_VERTICES, simulate, two_blocks, two_edges};

fn tag_of(kind: MessageKind) -> u16 {
    HYPEREDGE_TAG.offset(kind.as_u16()).as_u16()
}

fn per_rank_tags(weight_dim: usize) -> Vec<u16> {
    MessageKind::sequence(weight_dim)
        .iter()
        .map(|&k| tag_of(k))
        .collect()
}

#[test]
fn unweighted_run_sends_scalars_then_five_frames() {
    let cfg = DistributionConfig::new(DistributionPolicy::Cyclic);
    let run = simulate(2, &cfg, N_VERTICES, &two_edges(), &two_blocks());

    let tags: Vec<u16> = run.messages_between(0, 1).map(|m| m.tag).collect();
    let mut expected = vec![tag_of(MessageKind::Scalars)];
    expected.extend(per_rank_tags(0));
    assert_eq!(tags, expected);
    assert_eq!(run.messages_between(1, 0).count(), 0);
    assert_eq!(run.undelivered, 0);
}

#[test]
fn weighted_run_adds_the_weight_frame() {
    let g = two_edges().with_weights(3, vec![0.0; 6]).unwrap();
    let cfg = DistributionConfig::new(DistributionPolicy::Linear);
    let run = simulate(2, &cfg, N_VERTICES, &g, &two_blocks());

    let sent: Vec<_> = run.messages_between(0, 1).collect();
    assert_eq!(sent.len(), 7);
    assert_eq!(sent.last().map(|m| m.tag), Some(tag_of(MessageKind::Weights)));
    // one edge of weight_dim 3 as f32
    assert_eq!(sent.last().map(|m| m.len), Some(HDR_LEN + 3 * 4));
    assert_eq!(run.undelivered, 0);
}

#[test]
fn every_receiver_gets_the_full_sequence_even_when_empty() {
    // Three ranks, OWNER, no pin owned by rank 2: it still gets zero counts.
    let cfg = DistributionConfig::new(DistributionPolicy::Owner);
    let dist = VertexDistribution::explicit(vec![0, 0, 0, 1, 1, 1]);
    let g = two_edges();
    let run = run_ranks(3, 0, |comm| {
        let mine = (comm.rank() == 0).then(|| g.clone());
        distribute_hyperedges(comm, &cfg, N_VERTICES, mine, &dist).unwrap()
    });
    let mut expected = vec![tag_of(MessageKind::Scalars)];
    expected.extend(per_rank_tags(0));
    for dst in 1..3 {
        let tags: Vec<u16> = run.messages_between(0, dst).map(|m| m.tag).collect();
        assert_eq!(tags, expected, "to rank {dst}");
    }
    assert_eq!(run.results[2].local_edge_count(), 0);
    assert_eq!(run.results[2].edges.offsets, vec![0]);

    // Scalars go to everyone before any per-rank frame.
    let first_two: Vec<_> = run.trace.iter().take(2).map(|m| (m.dst, m.tag)).collect();
    assert_eq!(
        first_two,
        vec![(1, tag_of(MessageKind::Scalars)), (2, tag_of(MessageKind::Scalars))]
    );
}

#[test]
fn empty_hypergraph_sends_only_scalars() {
    let cfg = DistributionConfig::default();
    let run = simulate(3, &cfg, N_VERTICES, &GlobalHyperedges::default(), &VertexDistribution::contiguous(N_VERTICES, 3));
    assert_eq!(run.trace.len(), 2);
    assert!(run.trace.iter().all(|m| m.tag == tag_of(MessageKind::Scalars)));
    assert_eq!(run.undelivered, 0);
}

#[test]
fn coordinator_never_messages_itself() {
    let cfg = DistributionConfig::new(DistributionPolicy::Owner).with_host_rank(1);
    let run = simulate(3, &cfg, N_VERTICES, &two_edges(), &VertexDistribution::contiguous(N_VERTICES, 3));
    assert!(run.trace.iter().all(|m| m.src == 1 && m.dst != 1));
}

#[test]
fn tag_disagreement_fails_instead_of_hanging() {
    let g = two_edges();
    let dist = two_blocks();
    let cfg = DistributionConfig::new(DistributionPolicy::Cyclic);
    let run = run_ranks(2, 0, |comm| {
        let (mine, tag) = if comm.rank() == 0 {
            (Some(g.clone()), HYPEREDGE_TAG)
        } else {
            (None, CommTag::new(0x2000))
        };
        distribute_hyperedges_with_tag(comm, &cfg, N_VERTICES, mine, &dist, tag)
    });
    assert!(run.results[0].is_ok());
    assert!(matches!(
        run.results[1],
        Err(HyperdistError::CommError { neighbor: 0, .. })
    ));
    assert!(run.undelivered > 0);
}

#[test]
fn host_disagreement_is_reported() {
    let g = two_edges();
    let dist = two_blocks();
    let run = run_ranks(2, 0, |comm| {
        // Each rank believes it is the coordinator.
        let cfg = DistributionConfig::default().with_host_rank(comm.rank());
        let mine = (comm.rank() == 0).then(|| g.clone());
        distribute_hyperedges(comm, &cfg, N_VERTICES, mine, &dist)
    });
    assert!(run.results[0].is_ok());
    assert!(matches!(
        run.results[1],
        Err(HyperdistError::MissingEdgeSet { rank: 1 })
    ));
}
