#![cfg_attr(docsrs, feature(doc_cfg))]
//! # hyperdist
//!
//! hyperdist distributes the hyperedges of a hypergraph, read on a single
//! coordinating rank, across a process group. Each rank ends up with a CSR
//! set of the hyperedges it is responsible for, with pins it owns rewritten
//! to local indices and every other pin left as a global id tagged with its
//! owning rank.
//!
//! ## Features
//! - Three fan-out policies: CYCLIC, LINEAR and OWNER (replicating boundary edges)
//! - A lock-step scatter/gather protocol with an explicit, versioned message sequence
//! - Pluggable communication backends (serial, in-process mailbox, MPI)
//! - A single-process simulation harness for deterministic multi-rank tests
//!
//! ## Usage
//! Add `hyperdist` as a dependency in your `Cargo.toml` and enable features as needed:
//!
//! ```toml
//! [dependencies]
//! hyperdist = "0.1"
//! # Optional features:
//! # features = ["mpi-support", "rayon"]
//! ```
//!
//! Every rank calls [`distribute_hyperedges`](algs::distribute::distribute_hyperedges);
//! only the coordinator passes the full hypergraph:
//!
//! ```
//! use hyperdist::prelude::*;
//!
//! let dist = VertexDistribution::contiguous(6, 2);
//! let cfg = DistributionConfig::new(DistributionPolicy::Cyclic);
//! let run = run_ranks(2, cfg.host_rank, |comm| {
//!     let edges = (comm.rank() == cfg.host_rank)
//!         .then(|| GlobalHyperedges::from_pin_lists([vec![0, 1, 4], vec![2, 5]]));
//!     distribute_hyperedges(comm, &cfg, 6, edges, &dist).unwrap()
//! });
//! assert_eq!(run.results[0].edges.edge_gids, vec![0]);
//! assert_eq!(run.results[1].edges.edge_gids, vec![1]);
//! ```

pub mod algs;
pub mod config;
pub mod debug_invariants;
pub mod hyperdist_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, MailboxComm, NoComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::distribute::{DistributedHyperedges, distribute_hyperedges};
    pub use crate::algs::fanout::FanoutPlan;
    pub use crate::algs::local_ids::LocalIdMap;
    pub use crate::algs::simulate::{run_ranks, run_ranks_threaded};
    pub use crate::config::{DistributionConfig, DistributionPolicy};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::hyperdist_error::HyperdistError;
    pub use crate::topology::hyperedges::{GlobalHyperedges, HyperedgeSet};
    pub use crate::topology::vertex_dist::VertexDistribution;
}
