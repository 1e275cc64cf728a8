//! Global-to-local vertex numbering for the calling rank.
//!
//! Every rank builds its own [`LocalIdMap`] from the shared
//! [`VertexDistribution`]; local indices are 0-based and follow ascending
//! global order of the vertices the rank owns.

use crate::hyperdist_error::HyperdistError;
use crate::topology::vertex_dist::VertexDistribution;
use serde::{Deserialize, Serialize};

/// Local numbering of the vertices owned by one rank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdMap {
    rank: usize,
    base: usize,
    /// Zero-based global ids owned here, ascending; position is the local id.
    owned: Vec<usize>,
    /// `local_of[v - owned[0]]` for zero-based `v` in `[min, max]`.
    local_of: Vec<Option<usize>>,
}

impl LocalIdMap {
    /// Build the table for `rank`.
    ///
    /// `n_vertices` must match the distribution's size; `base` is the
    /// numbering of global ids handed to the lookup methods.
    pub fn new(
        dist: &VertexDistribution,
        n_vertices: usize,
        base: usize,
        rank: usize,
    ) -> Result<Self, HyperdistError> {
        if base > 1 {
            return Err(HyperdistError::InvalidBase(base));
        }
        if dist.n_vertices() != n_vertices {
            return Err(HyperdistError::AssignmentLengthMismatch {
                expected: n_vertices,
                got: dist.n_vertices(),
            });
        }

        let owned: Vec<usize> = match dist {
            VertexDistribution::Explicit(assignment) => assignment
                .iter()
                .enumerate()
                .filter_map(|(v, &p)| (p == rank).then_some(v))
                .collect(),
            VertexDistribution::Contiguous { starts } => match starts.get(rank..=rank + 1) {
                Some(&[lo, hi]) => (lo..hi).collect(),
                _ => Vec::new(),
            },
        };

        let local_of = match (owned.first(), owned.last()) {
            (Some(&min), Some(&max)) => {
                let mut table = vec![None; max - min + 1];
                for (local, &v) in owned.iter().enumerate() {
                    table[v - min] = Some(local);
                }
                table
            }
            _ => Vec::new(),
        };

        log::trace!(
            "rank {rank}: {} owned vertices, global range {:?}..={:?}",
            owned.len(),
            owned.first(),
            owned.last()
        );

        Ok(Self {
            rank,
            base,
            owned,
            local_of,
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Number of vertices owned by this rank.
    pub fn num_owned(&self) -> usize {
        self.owned.len()
    }

    /// Smallest owned global id, in `base` numbering.
    pub fn min_global(&self) -> Option<usize> {
        self.owned.first().map(|v| v + self.base)
    }

    /// Largest owned global id, in `base` numbering.
    pub fn max_global(&self) -> Option<usize> {
        self.owned.last().map(|v| v + self.base)
    }

    /// Local index of global id `gid` (in `base` numbering), if owned here.
    pub fn local_id(&self, gid: usize) -> Option<usize> {
        let min = *self.owned.first()?;
        let offset = gid.checked_sub(self.base)?.checked_sub(min)?;
        self.local_of.get(offset).copied().flatten()
    }

    pub fn is_owned(&self, gid: usize) -> bool {
        self.local_id(gid).is_some()
    }

    /// Global id (in `base` numbering) of local index `local`.
    pub fn to_global(&self, local: usize) -> Option<usize> {
        self.owned.get(local).map(|v| v + self.base)
    }

    /// Owned global ids in local order, in `base` numbering.
    pub fn owned_globals(&self) -> impl Iterator<Item = usize> + '_ {
        self.owned.iter().map(move |v| v + self.base)
    }
}
