//! Exercises a template, a dataset, a mock adapter, and a metric through the
//! full composite optimizer pipeline.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use po_adapters::traits::{
    AdapterMetadata, AdapterResult, AdapterStream, InferenceAdapter, InferenceRequest,
};
use po_dataset::{Dataset, DatasetRecord, ExactMatch, Metric};
use po_optimizer::{CompositeOptimizer, CustomParams, Mode};
use po_template::PromptTemplate;

/// An adapter that rewrites instructions verbatim when asked to propose a
/// candidate, and otherwise echoes the ground-truth-shaped input back so the
/// metric passes deterministically during bootstrap and scoring.
struct ScriptedModel {
    metadata: AdapterMetadata,
    proposals: AtomicUsize,
}

#[async_trait]
impl InferenceAdapter for ScriptedModel {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, _request: InferenceRequest) -> AdapterResult<AdapterStream> {
        unreachable!("this test only drives call_model")
    }

    async fn call_model(&self, request: InferenceRequest) -> AdapterResult<String> {
        let last = request
            .messages()
            .last()
            .map(|m| m.content().to_owned())
            .unwrap_or_default();

        if let Some(system_prompt) = request.system_prompt() {
            if system_prompt.contains("<system_prompt>...</system_prompt>") {
                // The meta-prompter's rewrite pass.
                return Ok(
                    "<system_prompt>Classify sentiment.</system_prompt>\n\
                     <user_prompt>Text: {{text}}\nLabel:</user_prompt>"
                        .to_owned(),
                );
            }
        }

        if last.starts_with("Propose a single reworded version") {
            let n = self.proposals.fetch_add(1, Ordering::SeqCst);
            return Ok(format!("Classify the sentiment of the text. (variant {n})"));
        }

        // Task execution: the dataset's labels equal their inputs, so
        // answering with the rendered value satisfies ExactMatch.
        if let Some(value) = last.strip_prefix("Text: ").and_then(|s| s.split("\nLabel:").next()) {
            return Ok(value.trim().to_owned());
        }
        Ok(last)
    }
}

fn dataset() -> Dataset {
    let records = (0..8)
        .map(|i| {
            let value = format!("row-{i}");
            DatasetRecord::new(
                HashMap::from([("text".to_owned(), value.clone())]),
                HashMap::from([("label".to_owned(), value)]),
            )
        })
        .collect();
    Dataset::new(records, vec!["text".to_owned()], vec!["label".to_owned()]).unwrap()
}

#[tokio::test]
async fn composite_optimizer_runs_meta_prompt_and_search_end_to_end() {
    let template = PromptTemplate::builder("Text: {{text}}\nLabel:")
        .system_template("Classify the text.")
        .user_vars(["text"])
        .build()
        .unwrap();

    let adapter = Arc::new(ScriptedModel {
        metadata: AdapterMetadata::new("test", "scripted"),
        proposals: AtomicUsize::new(0),
    });
    let metric: Arc<dyn Metric> = Arc::new(ExactMatch);
    let dataset = dataset();

    let custom = CustomParams {
        meta_prompt_model_id: Some("scripted".to_owned()),
        task_model_id: Some("scripted".to_owned()),
        num_candidates: Some(3),
        num_trials: Some(4),
        max_bootstrapped_demos: Some(2),
        max_labeled_demos: Some(2),
    };

    let optimized = CompositeOptimizer::new()
        .optimize(
            adapter.as_ref(),
            Some(Arc::clone(&adapter)),
            &template,
            Some(&dataset),
            Some(metric),
            NonZeroUsize::new(2).unwrap(),
            Mode::Custom(custom),
        )
        .await
        .unwrap();

    // The meta-prompter rewrite preserves the declared placeholder, and the
    // search phase never drops it from a candidate template either.
    assert!(optimized.user_template().contains("{{text}}"));
}

#[tokio::test]
async fn composite_optimizer_without_dataset_only_runs_meta_prompt() {
    let template = PromptTemplate::builder("Text: {{text}}\nLabel:")
        .system_template("Classify the text.")
        .user_vars(["text"])
        .build()
        .unwrap();

    let adapter = Arc::new(ScriptedModel {
        metadata: AdapterMetadata::new("test", "scripted"),
        proposals: AtomicUsize::new(0),
    });

    let optimized = CompositeOptimizer::new()
        .optimize::<ScriptedModel, ScriptedModel>(
            adapter.as_ref(),
            None,
            &template,
            None,
            None,
            NonZeroUsize::new(2).unwrap(),
            Mode::Named("lite".to_owned()),
        )
        .await
        .unwrap();

    assert!(optimized.user_template().contains("{{text}}"));
}
