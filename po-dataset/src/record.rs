//! A single labeled example in a [`crate::Dataset`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One row of a dataset: a map of input column name to value, and a map of
/// output column name to value.
///
/// `outputs` MUST contain exactly one entry; this is enforced when the
/// owning [`crate::Dataset`] is constructed, not per-record, so a
/// `DatasetRecord` built directly is a plain data holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Input column values, keyed by column name.
    pub inputs: HashMap<String, String>,
    /// Output (ground-truth) column values, keyed by column name.
    pub outputs: HashMap<String, String>,
}

impl DatasetRecord {
    /// Builds a record from the given input/output maps.
    #[must_use]
    pub fn new(inputs: HashMap<String, String>, outputs: HashMap<String, String>) -> Self {
        Self { inputs, outputs }
    }

    /// Returns the single ground-truth value, given the dataset's declared
    /// output column name.
    #[must_use]
    pub fn ground_truth(&self, output_column: &str) -> &str {
        self.outputs
            .get(output_column)
            .map_or("", String::as_str)
    }
}
