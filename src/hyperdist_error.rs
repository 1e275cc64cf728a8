//! HyperdistError: Unified error type for hyperdist public APIs
//!
//! Every fallible operation in the crate returns this error. The distribution
//! call is collective and all-or-nothing: once a rank has sent any message,
//! an error on any rank means the whole collective has failed and the caller
//! should treat it as fatal for the process group.

use crate::algs::wire::MessageKind;
use thiserror::Error;

/// Unified error type for hyperdist operations.
#[derive(Debug, Error)]
pub enum HyperdistError {
    /// A receive produced no data, or a payload of the wrong length.
    #[error("Communication error with rank {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A frame arrived carrying a different message kind than the one expected next.
    #[error("Protocol mismatch with rank {neighbor}: expected {expected:?}, got kind {got}")]
    ProtocolMismatch {
        neighbor: usize,
        expected: MessageKind,
        got: u16,
    },
    /// A frame arrived with an incompatible wire version.
    #[error("Wire version {got} from rank {neighbor} is not supported")]
    WireVersion { neighbor: usize, got: u16 },
    /// The vertex assignment does not cover the declared global vertex count.
    #[error("Vertex assignment covers {got} vertices, expected {expected}")]
    AssignmentLengthMismatch { expected: usize, got: usize },
    /// A pin references a vertex outside `[base, base + n_vertices)`.
    #[error("Vertex {vertex} out of range (base {base}, {n_vertices} vertices)")]
    VertexOutOfRange {
        vertex: usize,
        base: usize,
        n_vertices: usize,
    },
    /// Vertex numbering must start at 0 or 1.
    #[error("Invalid vertex numbering base {0} (expected 0 or 1)")]
    InvalidBase(usize),
    /// A rank lies outside the process group.
    #[error("Rank {rank} is outside a process group of size {size}")]
    InvalidRank { rank: usize, size: usize },
    /// A pin was marked as locally owned but the local-id table has no entry for it.
    #[error("Vertex {vertex} is not owned by rank {rank}")]
    NotLocallyOwned { vertex: usize, rank: usize },
    /// The coordinating rank was called without the full hyperedge set.
    #[error("Coordinating rank {rank} was called without a hyperedge set")]
    MissingEdgeSet { rank: usize },
    /// CSR arrays are inconsistent (offsets, pin owners, or weights).
    #[error("Malformed hyperedge CSR: {0}")]
    MalformedCsr(String),
    /// The coordinator rejected its input and abandoned the collective.
    #[error("Coordinating rank {host} failed before sending any hyperedge")]
    CoordinatorFailed { host: usize },
    /// A distribution policy name could not be parsed.
    #[error("Unknown distribution policy `{0}`")]
    UnknownPolicy(String),
    /// MPI could not be initialised (already initialised, or unavailable).
    #[error("MPI initialisation failed")]
    MpiInit,
}

impl HyperdistError {
    pub(crate) fn comm(neighbor: usize, msg: impl Into<String>) -> Self {
        HyperdistError::CommError {
            neighbor,
            source: msg.into().into(),
        }
    }
}
