//! Scores a prompt template against a dataset, memoizing inference.

use std::path::Path;
use std::sync::Arc;

use po_adapters::traits::InferenceAdapter;
use po_dataset::{Dataset, Metric};
use po_runner::{InferenceOutcome, InferenceRunner};
use po_template::PromptTemplate;
use tracing::warn;

use crate::cache::{InferenceCache, InferenceCacheKey};
use crate::error::Result;
use crate::result::{EvaluationResult, InferenceResult};

/// Runs inference over a dataset and scores it with a metric, caching
/// inference results per `(model_id, dataset, prompt, metric)` for the
/// lifetime of the shared [`InferenceCache`].
pub struct Evaluator<A> {
    prompt: Arc<PromptTemplate>,
    dataset: Arc<Dataset>,
    metric: Arc<dyn Metric>,
    runner: Arc<InferenceRunner<A>>,
    cache: Arc<InferenceCache>,
}

impl<A> Evaluator<A>
where
    A: InferenceAdapter + 'static,
{
    /// Builds an evaluator over the given prompt, dataset, metric, and
    /// inference runner, sharing `cache` with any other evaluator that
    /// should memoize against the same process-wide cache.
    #[must_use]
    pub fn new(
        prompt: Arc<PromptTemplate>,
        dataset: Arc<Dataset>,
        metric: Arc<dyn Metric>,
        runner: Arc<InferenceRunner<A>>,
        cache: Arc<InferenceCache>,
    ) -> Self {
        Self {
            prompt,
            dataset,
            metric,
            runner,
            cache,
        }
    }

    /// Returns the metric's batch-aggregated score for `model_id`.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::EvaluatorError::Runner`] if inference fails to
    /// complete.
    pub async fn aggregate_score(&self, model_id: &str) -> Result<f64> {
        let results = self.get_or_run_inference(model_id).await?;

        let (predictions, ground_truths): (Vec<String>, Vec<String>) = results
            .iter()
            .filter_map(|r| {
                r.inference_output
                    .clone()
                    .map(|pred| (pred, r.ground_truth(self.dataset.output_column()).to_owned()))
            })
            .unzip();

        Ok(self.metric.batch_apply(&predictions, &ground_truths))
    }

    /// Returns one [`EvaluationResult`] per successfully-inferred record.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::EvaluatorError::Runner`] if inference fails to
    /// complete.
    pub async fn scores(&self, model_id: &str) -> Result<Vec<EvaluationResult>> {
        let results = self.get_or_run_inference(model_id).await?;

        Ok(results
            .iter()
            .filter_map(|r| {
                let prediction = r.inference_output.as_ref()?;
                let ground_truth = r.ground_truth(self.dataset.output_column());
                let evaluation = self.metric.apply(prediction, ground_truth);
                Some(EvaluationResult {
                    inference: r.clone(),
                    evaluation,
                })
            })
            .collect())
    }

    /// Writes `results` as one JSON object per line, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Propagates I/O and serialization errors.
    pub fn save(&self, results: &[EvaluationResult], path: impl AsRef<Path>) -> Result<()> {
        if results.is_empty() {
            warn!("save() called with no evaluation results to write");
            return Ok(());
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut buffer = String::new();
        for result in results {
            buffer.push_str(&serde_json::to_string(result)?);
            buffer.push('\n');
        }
        std::fs::write(path, buffer)?;
        Ok(())
    }

    async fn get_or_run_inference(&self, model_id: &str) -> Result<Arc<Vec<InferenceResult>>> {
        let key = InferenceCacheKey::new(model_id, &self.dataset, &self.prompt, &self.metric);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let outcomes = self
            .runner
            .run(&self.prompt, self.dataset.records())
            .await?;

        let results: Vec<InferenceResult> = self
            .dataset
            .records()
            .iter()
            .zip(outcomes)
            .filter_map(|(record, outcome)| match outcome {
                InferenceOutcome::Completed(text) => {
                    Some(InferenceResult::new(record, Some(text)))
                }
                InferenceOutcome::Failed(reason) => {
                    warn!(reason, "dropping record with failed inference");
                    None
                }
            })
            .collect();

        Ok(self.cache.get_or_insert_with(key, results))
    }
}
