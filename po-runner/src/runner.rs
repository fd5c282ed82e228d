//! Concurrent, rate-limited inference runner.

use std::sync::Arc;

use po_adapters::traits::{AdapterError, InferenceAdapter, InferenceRequest, MessageRole as AdapterRole, PromptMessage};
use po_dataset::DatasetRecord;
use po_template::{Message, MessageRole, PromptTemplate};
use thiserror::Error;
use tracing::warn;

use crate::scheduler::{SchedulerConfig, TaskScheduler};

/// Errors produced while running a batch of records through a template and
/// adapter.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The template failed to render for a given record.
    #[error("prompt rendering failed: {0}")]
    Render(#[from] po_template::PromptError),

    /// The scheduler rejected a task (it was closed mid-run).
    #[error("scheduler closed")]
    SchedulerClosed,
}

/// Result alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// One record's outcome: either a completion string, or the error that
/// caused this record's inference to be skipped.
///
/// Per-task failures never abort the batch; they're recorded here so the
/// caller (typically an evaluator) can decide how to score them.
#[derive(Debug, Clone)]
pub enum InferenceOutcome {
    /// The adapter returned a completion for this record.
    Completed(String),
    /// Rendering or inference failed for this record.
    Failed(String),
}

/// Runs a [`PromptTemplate`] against a batch of [`DatasetRecord`]s through a
/// single [`InferenceAdapter`], fanning work out across a bounded worker
/// pool.
///
/// Holds no per-run state between calls to [`InferenceRunner::run`]: each
/// call starts a fresh batch of results.
pub struct InferenceRunner<A> {
    adapter: Arc<A>,
    scheduler: TaskScheduler,
}

impl<A> InferenceRunner<A>
where
    A: InferenceAdapter + 'static,
{
    /// Builds a runner bounded to `max_workers` concurrent in-flight calls.
    #[must_use]
    pub fn new(adapter: Arc<A>, max_workers: std::num::NonZeroUsize) -> Self {
        Self {
            adapter,
            scheduler: TaskScheduler::new(SchedulerConfig::new(max_workers)),
        }
    }

    /// Renders `template` against every record and runs inference
    /// concurrently, respecting the configured worker limit.
    ///
    /// Results are returned in the same order as `records`. A record whose
    /// rendering or inference fails produces an
    /// [`InferenceOutcome::Failed`] entry rather than aborting the batch.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::SchedulerClosed`] if the scheduler was closed
    /// concurrently with this call.
    pub async fn run(
        &self,
        template: &PromptTemplate,
        records: &[DatasetRecord],
    ) -> RunnerResult<Vec<InferenceOutcome>> {
        self.run_with_progress(template, records, None).await
    }

    /// Identical to [`Self::run`], but invokes `on_progress` after each
    /// record's future completes, passing `(completed, total)`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::SchedulerClosed`] if the scheduler was closed
    /// concurrently with this call.
    pub async fn run_with_progress(
        &self,
        template: &PromptTemplate,
        records: &[DatasetRecord],
        on_progress: Option<&(dyn Fn(usize, usize) + Send + Sync)>,
    ) -> RunnerResult<Vec<InferenceOutcome>> {
        let total = records.len();
        let mut handles = Vec::with_capacity(records.len());

        for record in records {
            let rendered = template.render(record);
            let adapter = Arc::clone(&self.adapter);

            let handle = match rendered {
                Ok(rendered) => {
                    let request = to_inference_request(rendered);
                    self.scheduler
                        .spawn(async move {
                            match request {
                                Ok(request) => match adapter.call_model(request).await {
                                    Ok(text) => InferenceOutcome::Completed(text),
                                    Err(err) => {
                                        warn!(error = %err, "inference call failed");
                                        InferenceOutcome::Failed(err.to_string())
                                    }
                                },
                                Err(err) => InferenceOutcome::Failed(err.to_string()),
                            }
                        })
                        .map_err(|_| RunnerError::SchedulerClosed)?
                }
                Err(err) => {
                    let message = err.to_string();
                    self.scheduler
                        .spawn(async move { InferenceOutcome::Failed(message) })
                        .map_err(|_| RunnerError::SchedulerClosed)?
                }
            };

            handles.push(handle);
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => results.push(outcome),
                Err(join_err) => results.push(InferenceOutcome::Failed(join_err.to_string())),
            }
            if let Some(on_progress) = on_progress {
                on_progress(results.len(), total);
            }
        }

        Ok(results)
    }
}

fn to_inference_request(rendered: po_template::RenderedPrompt) -> Result<InferenceRequest, AdapterError> {
    let messages: Vec<PromptMessage> = rendered
        .messages
        .into_iter()
        .map(to_prompt_message)
        .collect();

    let mut request = InferenceRequest::new(messages)?;
    if let Some(system) = rendered.system {
        request = request.with_system_prompt(system);
    }
    Ok(request)
}

fn to_prompt_message(message: Message) -> PromptMessage {
    let role = match message.role {
        MessageRole::User => AdapterRole::User,
        MessageRole::Assistant => AdapterRole::Assistant,
    };
    PromptMessage::new(role, message.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use po_adapters::traits::{AdapterMetadata, AdapterResult, AdapterStream};
    use std::collections::HashMap;

    struct EchoAdapter {
        metadata: AdapterMetadata,
    }

    #[async_trait]
    impl InferenceAdapter for EchoAdapter {
        fn metadata(&self) -> &AdapterMetadata {
            &self.metadata
        }

        async fn infer(&self, _request: InferenceRequest) -> AdapterResult<AdapterStream> {
            unreachable!("runner always uses call_model")
        }

        async fn call_model(&self, request: InferenceRequest) -> AdapterResult<String> {
            Ok(request
                .messages()
                .last()
                .map_or_else(String::new, |m| m.content().to_owned()))
        }
    }

    #[tokio::test]
    async fn runs_all_records_concurrently() {
        let template = PromptTemplate::builder("echo: {{text}}")
            .user_vars(["text"])
            .build()
            .unwrap();

        let records: Vec<DatasetRecord> = (0..5)
            .map(|i| {
                DatasetRecord::new(
                    HashMap::from([("text".to_owned(), format!("row-{i}"))]),
                    HashMap::new(),
                )
            })
            .collect();

        let adapter = Arc::new(EchoAdapter {
            metadata: AdapterMetadata::new("test", "mock"),
        });
        let runner = InferenceRunner::new(adapter, std::num::NonZeroUsize::new(2).unwrap());

        let results = runner.run(&template, &records).await.unwrap();
        assert_eq!(results.len(), 5);
        for (i, outcome) in results.iter().enumerate() {
            match outcome {
                InferenceOutcome::Completed(text) => {
                    assert_eq!(text, &format!("echo: row-{i}"));
                }
                InferenceOutcome::Failed(reason) => panic!("unexpected failure: {reason}"),
            }
        }
    }

    #[tokio::test]
    async fn progress_callback_sees_every_completion() {
        let template = PromptTemplate::builder("echo: {{text}}")
            .user_vars(["text"])
            .build()
            .unwrap();

        let records: Vec<DatasetRecord> = (0..5)
            .map(|i| {
                DatasetRecord::new(
                    HashMap::from([("text".to_owned(), format!("row-{i}"))]),
                    HashMap::new(),
                )
            })
            .collect();

        let adapter = Arc::new(EchoAdapter {
            metadata: AdapterMetadata::new("test", "mock"),
        });
        let runner = InferenceRunner::new(adapter, std::num::NonZeroUsize::new(2).unwrap());

        let completed = std::sync::atomic::AtomicUsize::new(0);
        let on_progress = |done: usize, total: usize| {
            assert!(done <= total);
            completed.store(done, std::sync::atomic::Ordering::SeqCst);
        };

        let results = runner
            .run_with_progress(&template, &records, Some(&on_progress))
            .await
            .unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(completed.load(std::sync::atomic::Ordering::SeqCst), 5);
    }
}
