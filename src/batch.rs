//! Batch driver: capacities for every (item, box) pair.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::capacity::pair_capacity;
use crate::config::PackingConfig;
use crate::error::{Error, Result};
use crate::structs::{BoxSpec, ItemSpec};

/// Progress after a completed pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressInfo {
    /// Pairs finished so far.
    pub completed: usize,
    /// Pairs in the whole batch.
    pub total: usize,
    /// `completed / total * 100`, or 100 for an empty batch.
    pub percent: f64,
}

/// Units of one item that fit in one box type.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxCapacity {
    pub label: String,
    pub units: usize,
}

/// One item with its capacity in every box type, in box input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub item: ItemSpec,
    pub capacities: Vec<BoxCapacity>,
}

impl ResultRow {
    pub fn units_in(&self, label: &str) -> Option<usize> {
        self.capacities
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.units)
    }
}

/// Flat spreadsheet-style row: item columns, then `Units_in_<label>`.
impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5 + self.capacities.len()))?;
        map.serialize_entry("SKU", &self.item.name)?;
        map.serialize_entry("Height", &self.item.height)?;
        map.serialize_entry("Width", &self.item.width)?;
        map.serialize_entry("Length", &self.item.depth)?;
        map.serialize_entry("Weight", &self.item.weight)?;
        for capacity in &self.capacities {
            map.serialize_entry(&format!("Units_in_{}", capacity.label), &capacity.units)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct BatchSummary {
    pub items: usize,
    pub boxes: usize,
    pub pairs: usize,
    /// Pairs answered with 0 because the template or adjusted box was unusable.
    pub substituted_pairs: usize,
    pub total_units: usize,
    pub elapsed_ms: u64,
}

/// Result rows in item input order, plus run statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityTable {
    pub rows: Vec<ResultRow>,
    pub summary: BatchSummary,
}

/// Runs the capacity search over every (item, box) pair, items outer and
/// boxes inner.
pub struct CapacityBatch {
    config: PackingConfig,
    cancelled: Arc<AtomicBool>,
}

impl CapacityBatch {
    pub fn new(config: PackingConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn default_config() -> Self {
        Self::new(PackingConfig::default())
    }

    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    /// Flag checked before every pair. Setting it stops the running batch,
    /// or the next one if no batch is running. `run` clears it on return.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Computes the capacity table.
    ///
    /// A `None` collection is a hard [`Error::MissingCollection`]; an empty
    /// one just produces no pairs. Unusable pairs score 0 and the batch goes
    /// on. Cancellation discards the rows computed so far.
    pub fn run(
        &self,
        items: Option<&[ItemSpec]>,
        boxes: Option<&[BoxSpec]>,
        progress: Option<&mut dyn FnMut(ProgressInfo)>,
    ) -> Result<CapacityTable> {
        let result = self.run_pairs(items, boxes, progress);
        // A cancel only ever stops one run
        self.cancelled.store(false, Ordering::Relaxed);
        result
    }

    fn check_cancelled(&self, done: usize, total: usize) -> Result<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            log::warn!("Capacity batch cancelled after {} of {} pairs", done, total);
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn run_pairs(
        &self,
        items: Option<&[ItemSpec]>,
        boxes: Option<&[BoxSpec]>,
        mut progress: Option<&mut dyn FnMut(ProgressInfo)>,
    ) -> Result<CapacityTable> {
        let items = items.ok_or(Error::MissingCollection("items"))?;
        let boxes = boxes.ok_or(Error::MissingCollection("boxes"))?;
        self.config.validate()?;

        let start = Instant::now();
        let total = items.len() * boxes.len();
        log::info!(
            "Estimating capacities for {} items x {} boxes (dimension tolerance {}, weight tolerance {})",
            items.len(),
            boxes.len(),
            self.config.dimension_tolerance,
            self.config.weight_tolerance
        );

        let mut summary = BatchSummary {
            items: items.len(),
            boxes: boxes.len(),
            ..BatchSummary::default()
        };
        let mut rows = Vec::with_capacity(items.len());
        self.check_cancelled(0, total)?;

        for item in items {
            let mut capacities = Vec::with_capacity(boxes.len());

            for spec in boxes {
                self.check_cancelled(summary.pairs, total)?;

                let units = match pair_capacity(item, spec, &self.config) {
                    Ok(units) => units,
                    Err(e) if e.is_pair_local() => {
                        log::debug!("{} in {}: {}, using 0", item.name, spec.label, e);
                        summary.substituted_pairs += 1;
                        0
                    }
                    Err(e) => return Err(e),
                };
                log::debug!("{} in {}: {} units", item.name, spec.label, units);

                summary.pairs += 1;
                summary.total_units += units;
                capacities.push(BoxCapacity {
                    label: spec.label.clone(),
                    units,
                });

                if let Some(sink) = progress.as_mut() {
                    sink(ProgressInfo {
                        completed: summary.pairs,
                        total,
                        percent: summary.pairs as f64 / total as f64 * 100.0,
                    });
                }
            }

            rows.push(ResultRow {
                item: item.clone(),
                capacities,
            });
        }

        if total == 0 {
            if let Some(sink) = progress.as_mut() {
                sink(ProgressInfo {
                    completed: 0,
                    total: 0,
                    percent: 100.0,
                });
            }
        }

        summary.elapsed_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "Capacity batch finished: {} pairs, {} substituted, {} ms",
            summary.pairs,
            summary.substituted_pairs,
            summary.elapsed_ms
        );

        Ok(CapacityTable { rows, summary })
    }
}
