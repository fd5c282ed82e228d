//! Sequences the meta-prompter and search optimizers behind named presets.

use std::num::NonZeroUsize;
use std::sync::Arc;

use po_adapters::traits::InferenceAdapter;
use po_dataset::{Dataset, Metric};
use po_template::PromptTemplate;
use tracing::{info, warn};

use crate::error::{OptimizerError, Result};
use crate::meta_prompter::MetaPrompter;
use crate::search::{SearchConfig, SearchOptimizer};

/// Model ids and search parameters fixed by a named preset.
#[derive(Debug, Clone)]
pub struct ModePreset {
    /// Model used by the meta-prompter rewrite pass.
    pub meta_prompt_model_id: String,
    /// Model used to propose search-phase instruction candidates.
    pub prompter_model_id: String,
    /// Model the search phase scores candidates against.
    pub task_model_id: String,
    /// Search-phase tunables.
    pub search: SearchConfig,
}

fn preset(task_model_id: &str) -> ModePreset {
    ModePreset {
        meta_prompt_model_id: "us.amazon.nova-premier-v1:0".to_owned(),
        prompter_model_id: "us.amazon.nova-premier-v1:0".to_owned(),
        task_model_id: task_model_id.to_owned(),
        search: SearchConfig::default(),
    }
}

/// Resolves a named mode (`micro`, `lite`, `pro`, `premier`) to its preset.
/// An unrecognized name logs a warning and falls back to `pro`.
#[must_use]
pub fn resolve_named_mode(mode: &str) -> ModePreset {
    match mode {
        "micro" => preset("us.amazon.nova-micro-v1:0"),
        "lite" => preset("us.amazon.nova-lite-v1:0"),
        "pro" => preset("us.amazon.nova-pro-v1:0"),
        "premier" => preset("us.amazon.nova-premier-v1:0"),
        other => {
            warn!(mode = other, "mode not recognized, defaulting to 'pro'");
            preset("us.amazon.nova-pro-v1:0")
        }
    }
}

/// Explicit parameters for `custom` mode. All fields are required; a missing
/// one surfaces [`OptimizerError::Configuration`] before any optimization
/// runs.
#[derive(Debug, Clone, Default)]
pub struct CustomParams {
    /// Model used by the meta-prompter rewrite pass, if any.
    pub meta_prompt_model_id: Option<String>,
    /// Model used to propose search-phase instruction candidates.
    pub task_model_id: Option<String>,
    /// Instruction variants per predictor.
    pub num_candidates: Option<usize>,
    /// Combinations evaluated during search.
    pub num_trials: Option<usize>,
    /// Maximum demos bootstrapped from train.
    pub max_bootstrapped_demos: Option<usize>,
    /// Maximum raw demos sampled from train.
    pub max_labeled_demos: Option<usize>,
}

impl CustomParams {
    fn into_preset(self) -> Result<ModePreset> {
        let task_model_id = self.task_model_id.ok_or_else(|| {
            OptimizerError::Configuration("custom mode requires task_model_id".to_owned())
        })?;
        let num_candidates = self.num_candidates.ok_or_else(|| {
            OptimizerError::Configuration("custom mode requires num_candidates".to_owned())
        })?;
        let num_trials = self.num_trials.ok_or_else(|| {
            OptimizerError::Configuration("custom mode requires num_trials".to_owned())
        })?;
        let max_bootstrapped_demos = self.max_bootstrapped_demos.ok_or_else(|| {
            OptimizerError::Configuration("custom mode requires max_bootstrapped_demos".to_owned())
        })?;
        let max_labeled_demos = self.max_labeled_demos.ok_or_else(|| {
            OptimizerError::Configuration("custom mode requires max_labeled_demos".to_owned())
        })?;

        Ok(ModePreset {
            meta_prompt_model_id: self
                .meta_prompt_model_id
                .unwrap_or_else(|| "us.amazon.nova-premier-v1:0".to_owned()),
            prompter_model_id: "us.amazon.nova-premier-v1:0".to_owned(),
            task_model_id,
            search: SearchConfig {
                num_candidates,
                num_trials,
                max_bootstrapped_demos,
                max_labeled_demos,
                ..SearchConfig::default()
            },
        })
    }
}

/// Selects which preset [`CompositeOptimizer::optimize`] should use.
#[derive(Debug, Clone)]
pub enum Mode {
    /// One of the named presets (`micro`, `lite`, `pro`, `premier`, or
    /// anything else, which falls back to `pro`).
    Named(String),
    /// An explicit, fully-specified preset.
    Custom(CustomParams),
}

/// Sequences the meta-prompter (§ rewrite pass) and the search optimizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompositeOptimizer;

impl CompositeOptimizer {
    /// Builds a composite optimizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs the meta-prompter, then (if `dataset`/`metric` are supplied) the
    /// search optimizer, returning the final prompt template.
    ///
    /// `prompter` serves both the meta-prompter rewrite and the search
    /// phase's instruction proposals; `task_adapter` executes and scores
    /// candidate prompts during search.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] if `mode` is
    /// [`Mode::Custom`] and a required parameter is missing. Propagates
    /// optimizer and runner errors from either phase.
    pub async fn optimize<P, T>(
        &self,
        prompter: &P,
        task_adapter: Option<Arc<T>>,
        template: &PromptTemplate,
        dataset: Option<&Dataset>,
        metric: Option<Arc<dyn Metric>>,
        max_workers: NonZeroUsize,
        mode: Mode,
    ) -> Result<PromptTemplate>
    where
        P: InferenceAdapter,
        T: InferenceAdapter + 'static,
    {
        let preset = match mode {
            Mode::Named(name) => resolve_named_mode(&name),
            Mode::Custom(params) => params.into_preset()?,
        };

        info!(
            meta_prompt_model_id = %preset.meta_prompt_model_id,
            "running meta-prompter rewrite pass"
        );
        let rewritten = MetaPrompter::new()
            .optimize(prompter, template, Some(&preset.meta_prompt_model_id), None)
            .await?;

        let (Some(dataset), Some(metric), Some(task_adapter)) = (dataset, metric, task_adapter) else {
            info!("no dataset or metric provided, returning meta-prompter output only");
            return Ok(rewritten);
        };

        info!(task_model_id = %preset.task_model_id, "running search optimizer");
        SearchOptimizer::new()
            .optimize(
                prompter,
                task_adapter,
                &rewritten,
                dataset,
                metric,
                max_workers,
                &preset.search,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_mode_falls_back_to_pro() {
        let preset = resolve_named_mode("nonexistent");
        assert_eq!(preset.task_model_id, "us.amazon.nova-pro-v1:0");
    }

    #[test]
    fn named_presets_fix_search_params() {
        let preset = resolve_named_mode("micro");
        assert_eq!(preset.search.num_candidates, 20);
        assert_eq!(preset.search.num_trials, 30);
        assert_eq!(preset.task_model_id, "us.amazon.nova-micro-v1:0");
    }

    #[test]
    fn custom_mode_rejects_missing_keys() {
        let params = CustomParams {
            task_model_id: Some("m".to_owned()),
            ..CustomParams::default()
        };
        let err = params.into_preset().expect_err("missing num_candidates etc");
        assert!(matches!(err, OptimizerError::Configuration(_)));
    }

    #[test]
    fn custom_mode_accepts_complete_params() {
        let params = CustomParams {
            meta_prompt_model_id: None,
            task_model_id: Some("m".to_owned()),
            num_candidates: Some(5),
            num_trials: Some(10),
            max_bootstrapped_demos: Some(2),
            max_labeled_demos: Some(2),
        };
        let preset = params.into_preset().unwrap();
        assert_eq!(preset.search.num_candidates, 5);
    }
}
