//! CSR (offset + flattened array) hyperedge containers.
//!
//! [`GlobalHyperedges`] is the full hypergraph as read on the coordinating rank:
//! edge ids are implicit (`0..edge_count`) and pins are global vertex numbers.
//! [`HyperedgeSet`] is what each rank holds after distribution: explicit global
//! edge ids, pins, and the owning rank of every pin.

use crate::debug_invariants::DebugInvariants;
use crate::hyperdist_error::HyperdistError;
use serde::{Deserialize, Serialize};

fn check_offsets(offsets: &[usize], n_pins: usize) -> Result<(), HyperdistError> {
    match offsets.first() {
        Some(0) => {}
        Some(first) => {
            return Err(HyperdistError::MalformedCsr(format!(
                "offsets[0] = {first}, expected 0"
            )));
        }
        None => {
            return Err(HyperdistError::MalformedCsr(
                "offsets must hold at least one entry".into(),
            ));
        }
    }
    if let Some(e) = offsets.windows(2).position(|w| w[0] > w[1]) {
        return Err(HyperdistError::MalformedCsr(format!(
            "offsets decrease at edge {e}"
        )));
    }
    let last = offsets[offsets.len() - 1];
    if last != n_pins {
        return Err(HyperdistError::MalformedCsr(format!(
            "offsets end at {last} but there are {n_pins} pins"
        )));
    }
    Ok(())
}

fn check_weights(n_edges: usize, weight_dim: usize, n_weights: usize) -> Result<(), HyperdistError> {
    if n_weights != n_edges * weight_dim {
        return Err(HyperdistError::MalformedCsr(format!(
            "{n_weights} weights for {n_edges} edges of dimension {weight_dim}"
        )));
    }
    Ok(())
}

/// The complete hypergraph, materialised on the coordinating rank only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHyperedges")]
pub struct GlobalHyperedges {
    offsets: Vec<usize>,
    pins: Vec<usize>,
    weight_dim: usize,
    weights: Vec<f32>,
}

/// Unchecked serde form of [`GlobalHyperedges`].
#[derive(Deserialize)]
struct RawHyperedges {
    offsets: Vec<usize>,
    pins: Vec<usize>,
    weight_dim: usize,
    weights: Vec<f32>,
}

impl TryFrom<RawHyperedges> for GlobalHyperedges {
    type Error = HyperdistError;

    fn try_from(raw: RawHyperedges) -> Result<Self, Self::Error> {
        GlobalHyperedges::new(raw.offsets, raw.pins, raw.weight_dim, raw.weights)
    }
}

impl Default for GlobalHyperedges {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            pins: Vec::new(),
            weight_dim: 0,
            weights: Vec::new(),
        }
    }
}

impl GlobalHyperedges {
    /// Build from raw CSR arrays, checking their shape.
    pub fn new(
        offsets: Vec<usize>,
        pins: Vec<usize>,
        weight_dim: usize,
        weights: Vec<f32>,
    ) -> Result<Self, HyperdistError> {
        check_offsets(&offsets, pins.len())?;
        check_weights(offsets.len() - 1, weight_dim, weights.len())?;
        Ok(Self {
            offsets,
            pins,
            weight_dim,
            weights,
        })
    }

    /// Build an unweighted set from per-edge pin lists; edge `i` gets global id `i`.
    pub fn from_pin_lists<I, P>(lists: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[usize]>,
    {
        let mut out = Self::default();
        for pins in lists {
            out.pins.extend_from_slice(pins.as_ref());
            out.offsets.push(out.pins.len());
        }
        out
    }

    /// Attach `weight_dim` weights per edge, laid out edge-major.
    pub fn with_weights(mut self, weight_dim: usize, weights: Vec<f32>) -> Result<Self, HyperdistError> {
        check_weights(self.edge_count(), weight_dim, weights.len())?;
        self.weight_dim = weight_dim;
        self.weights = weights;
        Ok(self)
    }

    pub fn edge_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn weight_dim(&self) -> usize {
        self.weight_dim
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// All pins of all edges, flattened.
    pub fn all_pins(&self) -> &[usize] {
        &self.pins
    }

    /// Range of edge `e` in the flattened pin array.
    pub fn pin_range(&self, e: usize) -> std::ops::Range<usize> {
        self.offsets[e]..self.offsets[e + 1]
    }

    pub fn pins(&self, e: usize) -> &[usize] {
        &self.pins[self.pin_range(e)]
    }

    pub fn weights(&self, e: usize) -> &[f32] {
        &self.weights[e * self.weight_dim..(e + 1) * self.weight_dim]
    }
}

/// One hyperedge of a [`HyperedgeSet`], borrowed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HyperedgeRef<'a> {
    pub gid: usize,
    pub pins: &'a [usize],
    pub owners: &'a [usize],
    pub weights: &'a [f32],
}

/// Per-rank CSR hyperedge set produced by distribution.
///
/// `pins[i]` is a local index when `pin_owners[i]` is the rank holding the set,
/// and a global vertex number otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HyperedgeSet {
    pub edge_gids: Vec<usize>,
    pub offsets: Vec<usize>,
    pub pins: Vec<usize>,
    pub pin_owners: Vec<usize>,
    pub weight_dim: usize,
    pub weights: Vec<f32>,
}

impl Default for HyperedgeSet {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl HyperedgeSet {
    /// An empty set whose edges would carry `weight_dim` weights.
    pub fn empty(weight_dim: usize) -> Self {
        Self {
            edge_gids: Vec::new(),
            offsets: vec![0],
            pins: Vec::new(),
            pin_owners: Vec::new(),
            weight_dim,
            weights: Vec::new(),
        }
    }

    /// An empty set with room for `edges` edges and `pins` pins.
    pub fn with_capacity(edges: usize, pins: usize, weight_dim: usize) -> Self {
        let mut offsets = Vec::with_capacity(edges + 1);
        offsets.push(0);
        Self {
            edge_gids: Vec::with_capacity(edges),
            offsets,
            pins: Vec::with_capacity(pins),
            pin_owners: Vec::with_capacity(pins),
            weight_dim,
            weights: Vec::with_capacity(edges * weight_dim),
        }
    }

    /// Remove every edge, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.edge_gids.clear();
        self.offsets.truncate(1);
        self.pins.clear();
        self.pin_owners.clear();
        self.weights.clear();
    }

    /// Append one edge. `owners` must be as long as `pins`, `weights` as long as `weight_dim`.
    pub fn push_edge(&mut self, gid: usize, pins: &[usize], owners: &[usize], weights: &[f32]) {
        debug_assert_eq!(pins.len(), owners.len());
        debug_assert_eq!(weights.len(), self.weight_dim);
        self.edge_gids.push(gid);
        self.pins.extend_from_slice(pins);
        self.pin_owners.extend_from_slice(owners);
        self.weights.extend_from_slice(weights);
        self.offsets.push(self.pins.len());
    }

    pub fn edge_count(&self) -> usize {
        self.edge_gids.len()
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_gids.is_empty()
    }

    pub fn pins(&self, e: usize) -> &[usize] {
        &self.pins[self.offsets[e]..self.offsets[e + 1]]
    }

    pub fn pin_owners(&self, e: usize) -> &[usize] {
        &self.pin_owners[self.offsets[e]..self.offsets[e + 1]]
    }

    pub fn weights(&self, e: usize) -> &[f32] {
        &self.weights[e * self.weight_dim..(e + 1) * self.weight_dim]
    }

    pub fn edge(&self, e: usize) -> HyperedgeRef<'_> {
        HyperedgeRef {
            gid: self.edge_gids[e],
            pins: self.pins(e),
            owners: self.pin_owners(e),
            weights: self.weights(e),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = HyperedgeRef<'_>> + '_ {
        (0..self.edge_count()).map(move |e| self.edge(e))
    }

    /// Position of global edge `gid` in this set, if present.
    pub fn position(&self, gid: usize) -> Option<usize> {
        self.edge_gids.iter().position(|&g| g == gid)
    }

    pub fn contains_edge(&self, gid: usize) -> bool {
        self.position(gid).is_some()
    }
}

impl DebugInvariants for HyperedgeSet {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "HyperedgeSet");
    }

    fn validate_invariants(&self) -> Result<(), HyperdistError> {
        if self.offsets.len() != self.edge_gids.len() + 1 {
            return Err(HyperdistError::MalformedCsr(format!(
                "{} offsets for {} edges",
                self.offsets.len(),
                self.edge_gids.len()
            )));
        }
        check_offsets(&self.offsets, self.pins.len())?;
        if self.pin_owners.len() != self.pins.len() {
            return Err(HyperdistError::MalformedCsr(format!(
                "{} pin owners for {} pins",
                self.pin_owners.len(),
                self.pins.len()
            )));
        }
        check_weights(self.edge_count(), self.weight_dim, self.weights.len())
    }
}
