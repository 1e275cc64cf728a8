// demos/simulate_fanout.rs
// cargo run --example simulate_fanout [cyclic|linear|owner] [ranks]
// Runs a distribution on simulated ranks inside one process and prints the
// fan-out plan statistics and each rank's resulting hyperedge set.

use hyperdist::prelude::*;

fn main() {
    let mut args = std::env::args().skip(1);
    let policy = match args.next().map(|s| s.parse::<DistributionPolicy>()) {
        Some(Ok(p)) => p,
        Some(Err(e)) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
        None => DistributionPolicy::Owner,
    };
    let size: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);

    // A small ring of triangles over 12 vertices.
    let n_vertices = 12;
    let edges = GlobalHyperedges::from_pin_lists(
        (0..n_vertices).map(|v| vec![v, (v + 1) % n_vertices, (v + 2) % n_vertices]),
    );
    let dist = VertexDistribution::contiguous(n_vertices, size);
    let cfg = DistributionConfig::new(policy);

    match FanoutPlan::build(&edges, &dist, size, &cfg) {
        Ok(plan) => println!(
            "{policy} over {size} ranks: {} sends, replication {:.2}, max load {:?}",
            plan.total_sends(),
            plan.replication_factor(),
            plan.max_load()
        ),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }

    let run = run_ranks(size, cfg.host_rank, |comm| {
        let mine = (comm.rank() == cfg.host_rank).then(|| edges.clone());
        distribute_hyperedges(comm, &cfg, n_vertices, mine, &dist)
    });

    for (rank, res) in run.results.iter().enumerate() {
        match res {
            Ok(out) => println!(
                "[rank {rank}] {} edges {:?}, pins {:?}",
                out.local_edge_count(),
                out.edges.edge_gids,
                out.edges.pins
            ),
            Err(e) => println!("[rank {rank}] failed: {e}"),
        }
    }
    println!("{} messages, {} undelivered", run.trace.len(), run.undelivered);
}
