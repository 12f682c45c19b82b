//! Packing configuration.

use serde::{Deserialize, Serialize};

use crate::capacity::DEFAULT_HARD_CAP;
use crate::error::{Error, Result};

/// How a single (item, box) capacity is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    /// Greedy 3D placement with orientation search, wrapped in a binary search.
    #[default]
    GreedyPacking,
    /// Whole units per axis without rotation, capped by weight.
    AxisGrid,
}

/// Common configuration for a capacity batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingConfig {
    /// Subtracted from every box dimension before packing.
    pub dimension_tolerance: f64,

    /// Subtracted from every box weight limit before packing.
    pub weight_tolerance: f64,

    /// Largest unit count the capacity search will try.
    pub hard_cap: usize,

    pub estimator: Estimator,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            dimension_tolerance: 0.5,
            weight_tolerance: 0.0,
            hard_cap: DEFAULT_HARD_CAP,
            estimator: Estimator::default(),
        }
    }
}

impl PackingConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dimension safety margin.
    pub fn with_dimension_tolerance(mut self, tolerance: f64) -> Self {
        self.dimension_tolerance = tolerance;
        self
    }

    /// Sets the weight safety margin.
    pub fn with_weight_tolerance(mut self, tolerance: f64) -> Self {
        self.weight_tolerance = tolerance;
        self
    }

    /// Sets the per-box unit ceiling.
    pub fn with_hard_cap(mut self, hard_cap: usize) -> Self {
        self.hard_cap = hard_cap;
        self
    }

    pub fn with_estimator(mut self, estimator: Estimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Tolerances must be finite and non-negative, and the hard cap must lie
    /// in `1..=DEFAULT_HARD_CAP`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("dimension_tolerance", self.dimension_tolerance),
            ("weight_tolerance", self.weight_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !(1..=DEFAULT_HARD_CAP).contains(&self.hard_cap) {
            return Err(Error::InvalidConfig(format!(
                "hard_cap must be between 1 and {DEFAULT_HARD_CAP}, got {}",
                self.hard_cap
            )));
        }
        Ok(())
    }
}
