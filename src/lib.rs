//! # boxweaver
//!
//! Estimates how many identical items fit in each candidate box type.
//!
//! For every (item, box) pair the box is shrunk by a dimension and a weight
//! safety margin, then a binary search over the unit count repeatedly packs a
//! fresh trial bin with a greedy, orientation-sweeping placer. The result is
//! one row per item holding a capacity per box type.
//!
//! The packing core ([`structs`], [`capacity`], [`batch`]) is pure
//! computation. JSON ingestion and export live in [`utils`], and an optional
//! Python module is built with the `python` feature.

pub mod batch;
pub mod capacity;
pub mod config;
pub mod error;
pub mod structs;
pub mod utils;

pub use batch::{BatchSummary, BoxCapacity, CapacityBatch, CapacityTable, ProgressInfo, ResultRow};
pub use capacity::{grid_capacity, max_capacity, pair_capacity, probe, DEFAULT_HARD_CAP};
pub use config::{Estimator, PackingConfig};
pub use error::{Error, Result};
pub use structs::{Aabb, Bin, BoxSpec, ItemSpec, Orientation, PlacedItem, Placement, Position};
pub use utils::{BoxRecord, Cell, ItemRecord, ProblemInput};

#[cfg(feature = "python")]
mod python {
    use crate::error::Error;
    use crate::utils;
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;
    use std::path::Path;

    fn to_py_err(e: Error) -> PyErr {
        match e {
            Error::Validation(_)
            | Error::MissingCollection(_)
            | Error::InvalidConfig(_)
            | Error::Json(_) => PyErr::new::<PyValueError, _>(e.to_string()),
            _ => PyErr::new::<PyRuntimeError, _>(e.to_string()),
        }
    }

    /// Compute capacities from a JSON request file, return the rows as a JSON string.
    #[pyfunction]
    fn capacity_from_json(input_path: &str) -> PyResult<String> {
        utils::solve_from_json(input_path).map_err(to_py_err)
    }

    /// Compute capacities from a JSON request file and write the full report,
    /// optionally appending a line to a CSV run log.
    #[pyfunction]
    #[pyo3(signature = (input_path, output_path, run_log = None))]
    fn capacity_and_write(
        input_path: &str,
        output_path: &str,
        run_log: Option<&str>,
    ) -> PyResult<()> {
        utils::solve_and_write(input_path, output_path, run_log.map(Path::new))
            .map_err(to_py_err)
    }

    /// Python module definition
    #[pymodule]
    fn boxweaver(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(capacity_from_json, m)?)?;
        m.add_function(wrap_pyfunction!(capacity_and_write, m)?)?;
        Ok(())
    }
}
