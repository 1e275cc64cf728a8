//! Re-export public algorithms.

pub mod communicator;
pub mod distribute;
pub mod fanout;
pub mod hyperedge_exchange;
pub mod local_ids;
pub mod localize;
pub mod simulate;
pub mod wire;

pub use distribute::{DistributedHyperedges, distribute_hyperedges};
pub use fanout::FanoutPlan;
pub use local_ids::LocalIdMap;
