//! Multi-trial search over instruction rewordings and few-shot subsets.

use std::num::NonZeroUsize;
use std::sync::Arc;

use po_adapters::traits::{InferenceAdapter, InferenceRequest, MessageRole, PromptMessage};
use po_dataset::{Dataset, Metric};
use po_evaluator::{Evaluator, InferenceCache};
use po_runner::InferenceRunner;
use po_template::{FewShotExample, FewShotFormat, PromptTemplate};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::error::{OptimizerError, Result};
use crate::tips::sample_tip;

/// Tunable knobs for [`SearchOptimizer::optimize`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Alternative instructions proposed per search run.
    pub num_candidates: usize,
    /// Instruction/demo combinations scored before returning the best.
    pub num_trials: usize,
    /// Maximum demonstrations bootstrapped from model-passed train rows.
    pub max_bootstrapped_demos: usize,
    /// Maximum raw (input, output) pairs sampled straight from train.
    pub max_labeled_demos: usize,
    /// Fraction of the dataset held out for trial scoring (the remainder is
    /// used for bootstrapping).
    pub validation_split: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_candidates: 20,
            num_trials: 30,
            max_bootstrapped_demos: 4,
            max_labeled_demos: 4,
            validation_split: 0.8,
        }
    }
}

/// Bootstraps demonstrations, proposes reworded instructions, and searches
/// instruction/demo combinations for the one that scores best on a held-out
/// split.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchOptimizer;

impl SearchOptimizer {
    /// Builds a search optimizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs the Bootstrap/Propose/Search/Return pipeline and returns the
    /// winning [`PromptTemplate`].
    ///
    /// `proposer` generates alternative instructions; `task_adapter` runs
    /// the candidate prompts being scored. They may be the same adapter.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Prompt`] if no candidate (including the
    /// original template) ever builds successfully, and propagates runner
    /// errors from the bootstrap pass.
    pub async fn optimize<P, T>(
        &self,
        proposer: &P,
        task_adapter: Arc<T>,
        template: &PromptTemplate,
        dataset: &Dataset,
        metric: Arc<dyn Metric>,
        max_workers: NonZeroUsize,
        config: &SearchConfig,
    ) -> Result<PromptTemplate>
    where
        P: InferenceAdapter,
        T: InferenceAdapter + 'static,
    {
        let (bootstrap_set, validation_set) = dataset
            .split(config.validation_split, false)
            .unwrap_or_else(|_| (dataset.clone(), dataset.clone()));

        let runner = Arc::new(InferenceRunner::new(Arc::clone(&task_adapter), max_workers));

        let demo_pool =
            bootstrap_demos(runner.as_ref(), template, &bootstrap_set, metric.as_ref(), config).await?;
        let validation_set = Arc::new(validation_set);

        let mut candidates = vec![template.system_template().to_owned()];
        for _ in 0..config.num_candidates.saturating_sub(1) {
            match propose_instruction(proposer, template.system_template()).await {
                Ok(candidate) => candidates.push(candidate),
                Err(err) => warn!(error = %err, "instruction proposal failed, skipping candidate"),
            }
        }

        let cache = Arc::new(InferenceCache::new());
        let mut rng = rand::thread_rng();
        let mut best_score = f64::MIN;
        let mut best_instruction = template.system_template().to_owned();
        let mut best_demos = template.few_shot().examples.clone();

        for trial in 0..config.num_trials {
            let instruction = candidates[trial % candidates.len()].clone();
            let demos = sample_demo_subset(&demo_pool, &mut rng);

            let candidate_template = match build_candidate_template(template, &instruction, demos.clone()) {
                Ok(t) => t,
                Err(err) => {
                    warn!(trial, error = %err, "candidate template failed to build, skipping trial");
                    continue;
                }
            };

            let evaluator = Evaluator::new(
                Arc::new(candidate_template.clone()),
                Arc::clone(&validation_set),
                Arc::clone(&metric),
                Arc::clone(&runner),
                Arc::clone(&cache),
            );

            match evaluator.aggregate_score(task_adapter.metadata().model()).await {
                Ok(score) => {
                    if score > best_score {
                        info!(trial, score, "new best candidate");
                        best_score = score;
                        best_instruction = instruction;
                        best_demos = demos;
                    }
                }
                Err(err) => {
                    warn!(trial, error = %err, "trial scoring failed, keeping prior best");
                }
            }
        }

        build_candidate_template(template, &best_instruction, best_demos)
    }
}

async fn bootstrap_demos<T>(
    runner: &InferenceRunner<T>,
    template: &PromptTemplate,
    train: &Dataset,
    metric: &dyn Metric,
    config: &SearchConfig,
) -> Result<Vec<FewShotExample>>
where
    T: InferenceAdapter + 'static,
{
    let mut demos = Vec::new();

    let outcomes = runner.run(template, train.records()).await?;
    for (record, outcome) in train.records().iter().zip(outcomes) {
        if demos.len() >= config.max_bootstrapped_demos {
            break;
        }
        if let po_runner::InferenceOutcome::Completed(text) = outcome {
            let ground_truth = record.ground_truth(train.output_column());
            if metric.apply(&text, ground_truth) >= 1.0 {
                demos.push(FewShotExample {
                    input: render_record_input(record),
                    output: text,
                });
            }
        }
    }

    let mut labeled: Vec<&po_dataset::DatasetRecord> = train.records().iter().collect();
    labeled.shuffle(&mut rand::thread_rng());
    for record in labeled.into_iter().take(config.max_labeled_demos) {
        demos.push(FewShotExample {
            input: render_record_input(record),
            output: record.ground_truth(train.output_column()).to_owned(),
        });
    }

    Ok(demos)
}

fn render_record_input(record: &po_dataset::DatasetRecord) -> String {
    let mut values: Vec<&String> = record.inputs.values().collect();
    values.sort();
    values
        .into_iter()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

fn sample_demo_subset(pool: &[FewShotExample], rng: &mut impl Rng) -> Vec<FewShotExample> {
    if pool.is_empty() {
        return Vec::new();
    }
    let take = rng.gen_range(0..=pool.len());
    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng);
    shuffled.into_iter().take(take).collect()
}

async fn propose_instruction<P: InferenceAdapter>(
    proposer: &P,
    current_instruction: &str,
) -> Result<String> {
    let (tip_name, tip_sentence) = sample_tip();
    let mut instructions = format!(
        "Propose a single reworded version of the following instruction. \
         Output only the reworded instruction, nothing else.\n\nInstruction:\n{current_instruction}"
    );
    if !tip_sentence.is_empty() {
        instructions.push_str(&format!("\n\nTip: {tip_sentence}"));
    }
    tracing::debug!(tip = tip_name, "proposing candidate instruction");

    let request = InferenceRequest::new(vec![PromptMessage::new(MessageRole::User, instructions)])
        .map_err(OptimizerError::Adapter)?;
    let response = proposer.call_model(request).await?;
    Ok(response.trim().to_owned())
}

fn build_candidate_template(
    original: &PromptTemplate,
    instruction: &str,
    demos: Vec<FewShotExample>,
) -> Result<PromptTemplate> {
    let format = if demos.is_empty() {
        FewShotFormat::None
    } else {
        match original.few_shot().format {
            FewShotFormat::None => FewShotFormat::Converse,
            other => other,
        }
    };

    PromptTemplate::builder(original.user_template())
        .system_template(instruction)
        .user_vars(original.user_vars().clone())
        .system_vars(original.system_vars().clone())
        .few_shot(demos, format)
        .build()
        .map_err(OptimizerError::Prompt)
}
