//! Vertex-to-rank assignment shared by every rank.
//!
//! The assignment is produced upstream and must be identical on all ranks;
//! nothing here re-derives or reconciles it.

use crate::hyperdist_error::HyperdistError;
use serde::{Deserialize, Serialize};

/// Owner lookup for global vertices, indexed zero-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDistribution")]
pub enum VertexDistribution {
    /// `assignment[v]` is the rank owning vertex `v`.
    Explicit(Vec<usize>),
    /// Rank `p` owns vertices `starts[p]..starts[p + 1]`.
    Contiguous { starts: Vec<usize> },
}

/// Unchecked serde form of [`VertexDistribution`].
#[derive(Deserialize)]
enum RawDistribution {
    Explicit(Vec<usize>),
    Contiguous { starts: Vec<usize> },
}

impl TryFrom<RawDistribution> for VertexDistribution {
    type Error = HyperdistError;

    fn try_from(raw: RawDistribution) -> Result<Self, Self::Error> {
        match raw {
            RawDistribution::Explicit(a) => Ok(VertexDistribution::Explicit(a)),
            RawDistribution::Contiguous { starts } => {
                check_starts(&starts)?;
                Ok(VertexDistribution::Contiguous { starts })
            }
        }
    }
}

/// Block boundaries start at 0 and never decrease.
fn check_starts(starts: &[usize]) -> Result<(), HyperdistError> {
    if starts.first() != Some(&0) {
        return Err(HyperdistError::MalformedCsr(
            "contiguous block starts must begin at 0".into(),
        ));
    }
    if let Some(p) = starts.windows(2).position(|w| w[0] > w[1]) {
        return Err(HyperdistError::MalformedCsr(format!(
            "contiguous block starts decrease at rank {p}"
        )));
    }
    Ok(())
}

impl VertexDistribution {
    pub fn explicit(assignment: Vec<usize>) -> Self {
        VertexDistribution::Explicit(assignment)
    }

    /// Split `n_vertices` into `n_procs` contiguous blocks; the first
    /// `n_vertices % n_procs` ranks get one extra vertex.
    pub fn contiguous(n_vertices: usize, n_procs: usize) -> Self {
        let n_procs = n_procs.max(1);
        let (per, extra) = (n_vertices / n_procs, n_vertices % n_procs);
        let counts: Vec<usize> = (0..n_procs)
            .map(|p| per + usize::from(p < extra))
            .collect();
        Self::from_counts(&counts)
    }

    /// Contiguous blocks with explicit per-rank vertex counts.
    pub fn from_counts(counts: &[usize]) -> Self {
        let mut starts = Vec::with_capacity(counts.len() + 1);
        starts.push(0);
        let mut acc = 0;
        for &c in counts {
            acc += c;
            starts.push(acc);
        }
        VertexDistribution::Contiguous { starts }
    }

    /// Number of global vertices covered.
    pub fn n_vertices(&self) -> usize {
        match self {
            VertexDistribution::Explicit(a) => a.len(),
            VertexDistribution::Contiguous { starts } => starts.last().copied().unwrap_or(0),
        }
    }

    /// Owner of zero-based vertex `v`, or `None` if out of range.
    pub fn owner(&self, v: usize) -> Option<usize> {
        match self {
            VertexDistribution::Explicit(a) => a.get(v).copied(),
            VertexDistribution::Contiguous { starts } => {
                if v >= self.n_vertices() {
                    return None;
                }
                starts.partition_point(|&s| s <= v).checked_sub(1)
            }
        }
    }

    /// Owner of vertex `vertex` numbered from `base`.
    pub fn owner_of(&self, vertex: usize, base: usize) -> Result<usize, HyperdistError> {
        vertex
            .checked_sub(base)
            .and_then(|v| self.owner(v))
            .ok_or(HyperdistError::VertexOutOfRange {
                vertex,
                base,
                n_vertices: self.n_vertices(),
            })
    }

    /// Check that the distribution covers `n_vertices` and names only ranks below `size`.
    pub fn check(&self, n_vertices: usize, size: usize) -> Result<(), HyperdistError> {
        if self.n_vertices() != n_vertices {
            return Err(HyperdistError::AssignmentLengthMismatch {
                expected: n_vertices,
                got: self.n_vertices(),
            });
        }
        let max_rank = match self {
            VertexDistribution::Explicit(a) => a.iter().copied().max(),
            VertexDistribution::Contiguous { starts } => {
                check_starts(starts)?;
                // trailing empty blocks own nothing
                starts.windows(2).rposition(|w| w[0] < w[1])
            }
        };
        match max_rank {
            Some(rank) if rank >= size => Err(HyperdistError::InvalidRank { rank, size }),
            _ => Ok(()),
        }
    }
}
