//! Pin localization: rewrite pins owned by the calling rank to local indices.
//!
//! Only pin values change; `pin_owners` is never touched. Pins owned
//! elsewhere keep their global id, so consumers tell local from remote pins
//! by comparing the owner with their own rank.

use crate::algs::local_ids::LocalIdMap;
use crate::hyperdist_error::HyperdistError;
use crate::topology::hyperedges::HyperedgeSet;

/// Rewrite every pin with `owner == ids.rank()` to its local index.
///
/// Returns the number of pins rewritten. On error the set may be partially
/// rewritten.
pub fn localize_pins(set: &mut HyperedgeSet, ids: &LocalIdMap) -> Result<usize, HyperdistError> {
    let rank = ids.rank();
    let mut rewritten = 0;
    for (pin, &owner) in set.pins.iter_mut().zip(&set.pin_owners) {
        if owner == rank {
            *pin = ids
                .local_id(*pin)
                .ok_or(HyperdistError::NotLocallyOwned { vertex: *pin, rank })?;
            rewritten += 1;
        }
    }
    log::trace!(
        "rank {rank}: localized {rewritten} of {} pins",
        set.pin_count()
    );
    Ok(rewritten)
}

/// Inverse of [`localize_pins`]: turn local pins back into global ids.
pub fn globalize_pins(set: &mut HyperedgeSet, ids: &LocalIdMap) -> Result<usize, HyperdistError> {
    let rank = ids.rank();
    let mut rewritten = 0;
    for (pin, &owner) in set.pins.iter_mut().zip(&set.pin_owners) {
        if owner == rank {
            *pin = ids
                .to_global(*pin)
                .ok_or(HyperdistError::NotLocallyOwned { vertex: *pin, rank })?;
            rewritten += 1;
        }
    }
    Ok(rewritten)
}

/// Global id of pin `i`, whichever addressing it uses; `None` past the last pin.
pub fn global_pin(set: &HyperedgeSet, ids: &LocalIdMap, i: usize) -> Option<usize> {
    let (&pin, &owner) = (set.pins.get(i)?, set.pin_owners.get(i)?);
    if owner == ids.rank() {
        ids.to_global(pin)
    } else {
        Some(pin)
    }
}
