//! Distribution settings shared by every rank of a collective call.
//!
//! Only the coordinating rank's values are authoritative: they travel in the
//! scalar header and replace whatever the other ranks passed in.

use crate::hyperdist_error::HyperdistError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the coordinator chooses destination ranks for each hyperedge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionPolicy {
    /// Edge `h` goes to rank `h mod P`.
    Cyclic,
    /// Edge `h` goes to rank `floor(h * P / E)`.
    #[default]
    Linear,
    /// Edge `h` is replicated on every rank owning at least one of its pins.
    Owner,
}

impl DistributionPolicy {
    pub(crate) fn to_wire(self) -> u32 {
        match self {
            DistributionPolicy::Cyclic => 1,
            DistributionPolicy::Linear => 2,
            DistributionPolicy::Owner => 3,
        }
    }

    pub(crate) fn from_wire(v: u32) -> Option<Self> {
        match v {
            1 => Some(DistributionPolicy::Cyclic),
            2 => Some(DistributionPolicy::Linear),
            3 => Some(DistributionPolicy::Owner),
            _ => None,
        }
    }

    /// True if every edge lands on exactly one rank.
    pub fn is_single_destination(self) -> bool {
        !matches!(self, DistributionPolicy::Owner)
    }
}

impl fmt::Display for DistributionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistributionPolicy::Cyclic => "cyclic",
            DistributionPolicy::Linear => "linear",
            DistributionPolicy::Owner => "owner",
        };
        f.write_str(name)
    }
}

impl FromStr for DistributionPolicy {
    type Err = HyperdistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cyclic" => Ok(DistributionPolicy::Cyclic),
            "linear" => Ok(DistributionPolicy::Linear),
            "owner" => Ok(DistributionPolicy::Owner),
            _ => Err(HyperdistError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Settings for [`distribute_hyperedges`](crate::algs::distribute::distribute_hyperedges).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    pub policy: DistributionPolicy,
    /// Rank holding the full hyperedge set.
    pub host_rank: usize,
    /// Number of ranks CYCLIC/LINEAR bucket over; `None` means the whole group.
    pub dist_procs: Option<usize>,
    /// Smallest vertex number in pins and assignments (0 or 1).
    pub base: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            policy: DistributionPolicy::default(),
            host_rank: 0,
            dist_procs: None,
            base: 0,
        }
    }
}

impl DistributionConfig {
    pub fn new(policy: DistributionPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn with_host_rank(mut self, host_rank: usize) -> Self {
        self.host_rank = host_rank;
        self
    }

    pub fn with_dist_procs(mut self, dist_procs: usize) -> Self {
        self.dist_procs = Some(dist_procs);
        self
    }

    pub fn with_base(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    /// Number of ranks CYCLIC/LINEAR actually bucket over in a group of `size`.
    ///
    /// Unset, zero, or oversized values fall back to `size`.
    pub fn effective_dist_procs(&self, size: usize) -> usize {
        match self.dist_procs {
            Some(n) if n > 0 && n <= size => n,
            Some(n) if n > size => {
                log::warn!("dist_procs {n} exceeds group size {size}; using {size}");
                size
            }
            _ => size,
        }
    }

    /// Check the settings against a process group of `size` ranks.
    pub fn validate(&self, size: usize) -> Result<(), HyperdistError> {
        if self.base > 1 {
            return Err(HyperdistError::InvalidBase(self.base));
        }
        self.validate_host(size)
    }

    /// Check only `host_rank`, the one setting every rank must supply itself.
    pub fn validate_host(&self, size: usize) -> Result<(), HyperdistError> {
        if self.host_rank >= size {
            return Err(HyperdistError::InvalidRank {
                rank: self.host_rank,
                size,
            });
        }
        Ok(())
    }
}
