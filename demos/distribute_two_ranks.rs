// demos/distribute_two_ranks.rs
// mpirun -n 2 target/debug/examples/distribute_two_ranks   (build with --features mpi-support)
// Distributes a two-edge hypergraph over six vertices from rank 0 to two MPI
// ranks, once per policy. Each rank prints what it ends up holding.

#[cfg(feature = "mpi-support")]
fn main() {
    use hyperdist::algs::communicator::{Communicator, MpiComm};
    use hyperdist::prelude::*;

    let comm = match MpiComm::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };
    let size = Communicator::size(&comm);
    let rank = Communicator::rank(&comm);

    if size != 2 {
        if rank == 0 {
            eprintln!("Run with exactly 2 MPI ranks");
        }
        return;
    }

    // 1) Vertices 0..3 on rank 0, 3..6 on rank 1
    let dist = VertexDistribution::contiguous(6, 2);

    for policy in [
        DistributionPolicy::Cyclic,
        DistributionPolicy::Linear,
        DistributionPolicy::Owner,
    ] {
        // 2) Only the coordinator holds the hypergraph
        let edges = (rank == 0)
            .then(|| GlobalHyperedges::from_pin_lists([vec![0, 1, 4], vec![2, 5]]));
        let cfg = DistributionConfig::new(policy);

        // 3) Collective call on every rank
        let out = match distribute_hyperedges(&comm, &cfg, 6, edges, &dist) {
            Ok(out) => out,
            Err(e) => {
                eprintln!("[rank {rank}] distribute_hyperedges failed: {e}");
                return;
            }
        };

        println!(
            "[rank {rank}] {policy}: edges {:?} offsets {:?} pins {:?} owners {:?}",
            out.edges.edge_gids, out.edges.offsets, out.edges.pins, out.edges.pin_owners
        );
    }
}

#[cfg(not(feature = "mpi-support"))]
fn main() {
    eprintln!("This example requires the 'mpi-support' feature to run.");
}
