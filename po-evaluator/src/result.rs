//! Result types produced by inference and evaluation.

use po_dataset::DatasetRecord;
use serde::{Deserialize, Serialize};

/// A dataset record extended with the model's completion text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InferenceResult {
    /// The original record's input values.
    pub inputs: std::collections::HashMap<String, String>,
    /// The original record's ground-truth output values.
    pub outputs: std::collections::HashMap<String, String>,
    /// The model's completion text for this record, if inference succeeded.
    pub inference_output: Option<String>,
}

impl InferenceResult {
    /// Pairs a record with its completion (or lack thereof).
    #[must_use]
    pub fn new(record: &DatasetRecord, inference_output: Option<String>) -> Self {
        Self {
            inputs: record.inputs.clone(),
            outputs: record.outputs.clone(),
            inference_output,
        }
    }

    /// Returns the ground-truth value for the declared output column.
    #[must_use]
    pub fn ground_truth(&self, output_column: &str) -> &str {
        self.outputs.get(output_column).map_or("", String::as_str)
    }
}

/// An [`InferenceResult`] extended with its metric score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The underlying inference result.
    #[serde(flatten)]
    pub inference: InferenceResult,
    /// The metric's score for this record.
    pub evaluation: f64,
}
