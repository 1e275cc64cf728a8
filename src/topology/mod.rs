//! Top-level module for hypergraph data abstractions.
//!
//! This module provides the CSR hyperedge containers and the vertex-to-rank
//! distribution they are addressed against:
//! - [`GlobalHyperedges`]: the full hypergraph on the coordinating rank
//! - [`HyperedgeSet`]: one rank's share after distribution
//! - [`VertexDistribution`]: explicit or contiguous vertex ownership

pub mod hyperedges;
pub mod vertex_dist;

pub use hyperedges::{GlobalHyperedges, HyperedgeRef, HyperedgeSet};
pub use vertex_dist::VertexDistribution;
