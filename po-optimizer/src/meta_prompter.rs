//! Single-shot rewrite of a template into a tagged system/user split.

use std::collections::HashSet;

use po_adapters::traits::{InferenceAdapter, InferenceRequest, MessageRole, PromptMessage};
use po_template::{FewShotFormat, PromptTemplate};
use regex::Regex;
use tracing::warn;

use crate::error::{OptimizerError, Result};

const DEFAULT_PROMPTER_MODEL_ID: &str = "us.amazon.nova-premier-v1:0";
const DEFAULT_MAX_RETRIES: u32 = 5;
const META_MAX_OUTPUT_TOKENS: u32 = 5000;
const META_TEMPERATURE: f32 = 1.0;

const META_INSTRUCTION_HEADER: &str = "\
You are translating an existing prompt into a well-structured, contextual, \
and specific system prompt and user prompt for a language model.

Your output MUST contain exactly two tagged sections, in this order:
<system_prompt>...</system_prompt>
<user_prompt>...</user_prompt>

Rules:
- The system prompt holds task context, instructions, and a description of
  the input variables, but MUST NOT contain any of the input variable tokens
  themselves.
- The user prompt MUST contain every one of the following variable tokens,
  verbatim: {placeholders}
- Preserve every section of the original prompt (task, context, model
  instructions, response format). Do not drop any of them.
- Remove any worked examples from the original prompt; do not invent new ones.
- Output nothing besides the two tagged sections.

Original prompt:
{original}
";

fn build_meta_instruction(placeholders: &[String], original: &str) -> String {
    let list = if placeholders.is_empty() {
        "(none)".to_owned()
    } else {
        placeholders
            .iter()
            .map(|v| format!("{{{{{v}}}}}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    META_INSTRUCTION_HEADER
        .replace("{placeholders}", &list)
        .replace("{original}", original)
}

/// Rewrites a [`PromptTemplate`] once, using a prompter model to split the
/// combined system/user text into a cleaner tagged system/user pair while
/// preserving every declared placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaPrompter;

impl MetaPrompter {
    /// Builds a meta-prompter with no state of its own.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Rewrites `template` via `adapter`, retrying up to `max_retries` times
    /// when the prompter's response fails validation.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Optimization`] if the prompter never
    /// produces a parseable `<system_prompt>`/`<user_prompt>` response
    /// across the retry budget.
    pub async fn optimize<A: InferenceAdapter>(
        &self,
        adapter: &A,
        template: &PromptTemplate,
        prompter_model_id: Option<&str>,
        max_retries: Option<u32>,
    ) -> Result<PromptTemplate> {
        let prompter_model_id = prompter_model_id.unwrap_or(DEFAULT_PROMPTER_MODEL_ID);
        let max_retries = max_retries.unwrap_or(DEFAULT_MAX_RETRIES);

        let mut all_variables: Vec<String> = template
            .system_vars()
            .union(template.user_vars())
            .cloned()
            .collect();
        all_variables.sort();

        let overall_prompt = format!(
            "{}\n\n{}",
            template.system_template(),
            template.user_template()
        );
        let meta_instruction = build_meta_instruction(&all_variables, &overall_prompt);

        let mut last_split: Option<(Option<String>, Option<String>)> = None;

        for attempt in 0..max_retries {
            let request = InferenceRequest::new(vec![PromptMessage::new(
                MessageRole::User,
                overall_prompt.clone(),
            )])
            .map_err(OptimizerError::Adapter)?
            .with_system_prompt(meta_instruction.clone())
            .with_max_output_tokens(META_MAX_OUTPUT_TOKENS)
            .with_temperature(META_TEMPERATURE);

            let response = adapter.call_model(request).await?;
            let (system_prompt, user_prompt) = split_prompt(&response);
            last_split = Some((system_prompt.clone(), user_prompt.clone()));

            if let (Some(system_prompt), Some(user_prompt)) = (&system_prompt, &user_prompt) {
                if validate_user_prompt(user_prompt, &all_variables)
                    && validate_system_prompt(system_prompt, &all_variables)
                {
                    return build_optimized_template(system_prompt, user_prompt, &all_variables);
                }
            }
            warn!(attempt = attempt + 1, "optimized prompt failed validation, retrying");
        }

        warn!("meta-prompter exhausted retries, appending missing placeholders to last response");

        match last_split {
            Some((Some(system_prompt), Some(user_prompt))) => {
                let user_prompt = append_missing_variables(&user_prompt, &all_variables);
                build_optimized_template(&system_prompt, &user_prompt, &all_variables)
            }
            _ => Err(OptimizerError::Optimization(
                "prompter never returned a parseable <system_prompt>/<user_prompt> response"
                    .to_owned(),
            )),
        }
    }
}

fn split_prompt(response: &str) -> (Option<String>, Option<String>) {
    let system_re = Regex::new(r"(?s)<system_prompt>(.*?)</system_prompt>").expect("valid regex");
    let user_re = Regex::new(r"(?s)<user_prompt>(.*?)</user_prompt>").expect("valid regex");

    let system = system_re
        .captures(response)
        .map(|c| c[1].trim().to_owned());
    let user = user_re.captures(response).map(|c| c[1].trim().to_owned());
    (system, user)
}

fn contains_placeholder(text: &str, var: &str) -> bool {
    text.contains(&format!("{{{{{var}}}}}"))
}

fn validate_user_prompt(prompt: &str, variables: &[String]) -> bool {
    variables.iter().all(|v| contains_placeholder(prompt, v))
}

fn validate_system_prompt(prompt: &str, variables: &[String]) -> bool {
    if variables.is_empty() {
        return true;
    }
    !variables.iter().all(|v| contains_placeholder(prompt, v))
}

fn append_missing_variables(prompt: &str, variables: &[String]) -> String {
    let missing: Vec<&String> = variables
        .iter()
        .filter(|v| !contains_placeholder(prompt, v))
        .collect();
    if missing.is_empty() {
        return prompt.to_owned();
    }
    let mut out = prompt.to_owned();
    out.push_str("\n\nHere are the additional inputs:\n");
    for var in missing {
        out.push_str(&format!("[[ ## {var} ## ]]\n{{{{{var}}}}}\n"));
    }
    out
}

fn build_optimized_template(
    system_prompt: &str,
    user_prompt: &str,
    all_variables: &[String],
) -> Result<PromptTemplate> {
    let all_variables: HashSet<String> = all_variables.iter().cloned().collect();
    PromptTemplate::builder(user_prompt)
        .system_template(system_prompt)
        .user_vars(all_variables)
        .few_shot(Vec::new(), FewShotFormat::None)
        .build()
        .map_err(OptimizerError::Prompt)
}
