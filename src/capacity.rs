//! Capacity search: turns "do N items fit?" into "how many items fit?".

use crate::config::{Estimator, PackingConfig};
use crate::error::{Error, Result};
use crate::structs::{Bin, BoxSpec, ItemSpec};

/// Default ceiling on the number of units tried per box.
pub const DEFAULT_HARD_CAP: usize = 1000;

/// Repacks `bin` from scratch with `count` copies of `template`.
///
/// Returns true only if every copy was placed.
pub fn probe(bin: &mut Bin, template: &ItemSpec, count: usize) -> bool {
    bin.reset();
    (0..count).all(|i| bin.add_item(template.instance(i)))
}

/// Largest count the greedy placer accepts, found by binary search between
/// zero and `min(hard_cap, floor(max_weight / weight))`.
///
/// Feasibility is assumed monotonic in count. The placer does not guarantee
/// that, and the search does not try to compensate.
///
/// A non-positive template weight yields 0 without probing.
pub fn max_capacity(bin: &mut Bin, template: &ItemSpec, hard_cap: usize) -> usize {
    if !(template.weight > 0.0) {
        return 0;
    }

    let by_weight = (bin.spec().max_weight / template.weight).floor();
    if !(by_weight >= 0.0) {
        return 0;
    }
    let upper = if by_weight >= hard_cap as f64 {
        hard_cap
    } else {
        by_weight as usize
    };

    let mut low = 0usize;
    let mut high = upper;
    let mut best = 0usize;

    while low <= high {
        let mid = low + (high - low) / 2;
        if probe(bin, template, mid) {
            best = mid;
            low = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            high = mid - 1;
        }
    }

    bin.reset();
    best
}

/// Capacity of one (item, box) pair under the configured tolerances.
///
/// Pair-local problems come back as [`Error::InvalidTemplate`] or
/// [`Error::DegenerateBox`]; callers substitute a zero capacity.
pub fn pair_capacity(item: &ItemSpec, spec: &BoxSpec, config: &PackingConfig) -> Result<usize> {
    if !(item.weight > 0.0) {
        return Err(Error::InvalidTemplate {
            sku: item.name.clone(),
            weight: item.weight,
        });
    }

    let adjusted = spec.adjusted(config.dimension_tolerance, config.weight_tolerance);
    if adjusted.is_degenerate() {
        return Err(Error::DegenerateBox {
            label: spec.label.clone(),
        });
    }

    let units = match config.estimator {
        Estimator::GreedyPacking => {
            let mut bin = Bin::new(adjusted);
            max_capacity(&mut bin, item, config.hard_cap)
        }
        Estimator::AxisGrid => grid_capacity(item, &adjusted),
    };
    Ok(units)
}

/// Unrotated grid estimate: whole units per axis multiplied together, capped
/// by the weight limit.
pub fn grid_capacity(item: &ItemSpec, adjusted: &BoxSpec) -> usize {
    let dims = item.dims();
    if dims.iter().any(|d| !(*d > 0.0)) || !(item.weight > 0.0) {
        return 0;
    }

    let bounds = adjusted.dims();
    if (0..3).any(|axis| dims[axis] > bounds[axis]) || item.weight > adjusted.max_weight {
        return 0;
    }

    let by_volume: f64 = (0..3)
        .map(|axis| (bounds[axis] / dims[axis]).floor())
        .product();
    let by_weight = (adjusted.max_weight / item.weight).floor();
    by_volume.min(by_weight) as usize
}
