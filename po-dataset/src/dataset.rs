//! Ordered collection of [`DatasetRecord`]s with load/split support.

use std::collections::HashMap;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::thread_rng;
use serde_json::Value;

use crate::error::{DatasetError, Result};
use crate::record::DatasetRecord;

/// An ordered sequence of [`DatasetRecord`]s sharing declared input/output
/// column metadata.
///
/// The output column set is always a singleton; this is validated at
/// construction and cannot be bypassed afterward.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<DatasetRecord>,
    input_columns: Vec<String>,
    output_column: String,
}

impl Dataset {
    /// Builds a dataset directly from already-standardized records.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Invalid`] if `output_columns` does not
    /// contain exactly one column name.
    pub fn new(
        records: Vec<DatasetRecord>,
        input_columns: Vec<String>,
        output_columns: Vec<String>,
    ) -> Result<Self> {
        if output_columns.len() != 1 {
            return Err(DatasetError::invalid(
                "output_columns must be a singleton set (contain exactly one element)",
            ));
        }
        Ok(Self {
            records,
            input_columns,
            output_column: output_columns.into_iter().next().unwrap_or_default(),
        })
    }

    /// Loads a dataset from a newline-delimited JSON file. Columns absent
    /// from a given row are filled with an empty string rather than
    /// erroring.
    ///
    /// # Errors
    ///
    /// Propagates I/O and JSON-parsing errors, and [`DatasetError::Invalid`]
    /// if `output_columns` is not a singleton set.
    pub fn from_jsonl(
        path: impl AsRef<Path>,
        input_columns: Vec<String>,
        output_columns: Vec<String>,
    ) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut records = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line)?;
            records.push(standardize_row(&value, &input_columns, &output_columns));
        }
        Self::new(records, input_columns, output_columns)
    }

    /// Loads a dataset from a CSV file with a header row. Columns absent
    /// from a given row are filled with an empty string rather than
    /// erroring.
    ///
    /// # Errors
    ///
    /// Propagates I/O and CSV-parsing errors, and [`DatasetError::Invalid`]
    /// if `output_columns` is not a singleton set.
    pub fn from_csv(
        path: impl AsRef<Path>,
        input_columns: Vec<String>,
        output_columns: Vec<String>,
    ) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            let mut fields: HashMap<String, String> = HashMap::new();
            for (header, value) in headers.iter().zip(row.iter()) {
                fields.insert(header.to_owned(), value.to_owned());
            }
            let inputs = input_columns
                .iter()
                .map(|col| (col.clone(), fields.get(col).cloned().unwrap_or_default()))
                .collect();
            let outputs = output_columns
                .iter()
                .map(|col| (col.clone(), fields.get(col).cloned().unwrap_or_default()))
                .collect();
            records.push(DatasetRecord::new(inputs, outputs));
        }
        Self::new(records, input_columns, output_columns)
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the dataset has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    /// Returns the declared input column names.
    #[must_use]
    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    /// Returns the declared (singleton) output column name.
    #[must_use]
    pub fn output_column(&self) -> &str {
        &self.output_column
    }

    /// Splits the dataset into `(train, test)` by the given fraction.
    ///
    /// When `stratify` is `false`, the whole dataset is shuffled and the
    /// first `floor(p * len)` records become `train`. When `stratify` is
    /// `true`, records are grouped by their ground-truth value, each group
    /// is independently split by the same fraction, and the two resulting
    /// halves are each shuffled.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidSplit`] if `p` is not in `(0, 1)`.
    pub fn split(&self, p: f64, stratify: bool) -> Result<(Self, Self)> {
        if !(p > 0.0 && p < 1.0) {
            return Err(DatasetError::InvalidSplit { percentage: p });
        }

        let mut rng = thread_rng();

        let (train, test) = if stratify {
            let mut groups: Vec<(String, Vec<DatasetRecord>)> = Vec::new();
            for record in &self.records {
                let key = record.ground_truth(&self.output_column).to_owned();
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, items)) => items.push(record.clone()),
                    None => groups.push((key, vec![record.clone()])),
                }
            }

            let mut train = Vec::new();
            let mut test = Vec::new();
            for (_, group) in groups {
                let train_size = (group.len() as f64 * p) as usize;
                let (group_train, group_test) = group.split_at(train_size);
                train.extend_from_slice(group_train);
                test.extend_from_slice(group_test);
            }
            train.shuffle(&mut rng);
            test.shuffle(&mut rng);
            (train, test)
        } else {
            let mut shuffled = self.records.clone();
            shuffled.shuffle(&mut rng);
            let train_size = (self.records.len() as f64 * p) as usize;
            let test = shuffled.split_off(train_size);
            (shuffled, test)
        };

        Ok((
            Self {
                records: train,
                input_columns: self.input_columns.clone(),
                output_column: self.output_column.clone(),
            },
            Self {
                records: test,
                input_columns: self.input_columns.clone(),
                output_column: self.output_column.clone(),
            },
        ))
    }
}

fn standardize_row(value: &Value, input_columns: &[String], output_columns: &[String]) -> DatasetRecord {
    let inputs = input_columns
        .iter()
        .map(|col| (col.clone(), field_as_string(value, col)))
        .collect();
    let outputs = output_columns
        .iter()
        .map(|col| (col.clone(), field_as_string(value, col)))
        .collect();
    DatasetRecord::new(inputs, outputs)
}

fn field_as_string(value: &Value, column: &str) -> String {
    match value.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records(n: usize) -> Vec<DatasetRecord> {
        (0..n)
            .map(|i| {
                let label = if i % 2 == 0 { "pos" } else { "neg" };
                DatasetRecord::new(
                    HashMap::from([("text".to_owned(), format!("row {i}"))]),
                    HashMap::from([("label".to_owned(), label.to_owned())]),
                )
            })
            .collect()
    }

    #[test]
    fn rejects_non_singleton_output_columns() {
        let err = Dataset::new(
            sample_records(2),
            vec!["text".to_owned()],
            vec!["label".to_owned(), "extra".to_owned()],
        )
        .expect_err("should reject multiple output columns");
        assert!(matches!(err, DatasetError::Invalid { .. }));
    }

    #[test]
    fn split_rejects_out_of_range_percentage() {
        let dataset = Dataset::new(
            sample_records(10),
            vec!["text".to_owned()],
            vec!["label".to_owned()],
        )
        .unwrap();

        assert!(matches!(
            dataset.split(0.0, false),
            Err(DatasetError::InvalidSplit { .. })
        ));
        assert!(matches!(
            dataset.split(1.0, false),
            Err(DatasetError::InvalidSplit { .. })
        ));
    }

    #[test]
    fn split_preserves_total_count() {
        let dataset = Dataset::new(
            sample_records(10),
            vec!["text".to_owned()],
            vec!["label".to_owned()],
        )
        .unwrap();

        let (train, test) = dataset.split(0.7, false).unwrap();
        assert_eq!(train.len() + test.len(), 10);
        assert_eq!(train.len(), 7);
    }

    #[test]
    fn stratified_split_keeps_each_group_proportional() {
        let dataset = Dataset::new(
            sample_records(10),
            vec!["text".to_owned()],
            vec!["label".to_owned()],
        )
        .unwrap();

        let (train, test) = dataset.split(0.5, true).unwrap();
        assert_eq!(train.len() + test.len(), 10);

        let pos_in_train = train
            .records()
            .iter()
            .filter(|r| r.ground_truth("label") == "pos")
            .count();
        assert_eq!(pos_in_train, 2);
    }

    #[test]
    fn missing_columns_fill_empty_string() {
        let value: Value = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        let record = standardize_row(
            &value,
            &["text".to_owned()],
            &["label".to_owned()],
        );
        assert_eq!(record.outputs.get("label").unwrap(), "");
    }
}
