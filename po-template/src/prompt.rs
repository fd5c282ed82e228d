//! The system/user prompt template with placeholders and few-shot
//! demonstrations, and its rendering into a system string plus ordered
//! message list.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use po_dataset::DatasetRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::substitution::{extract_variable_refs, substitute};

/// Errors raised while building or rendering a [`PromptTemplate`].
#[derive(Debug, Error)]
pub enum PromptError {
    /// The user template is empty, or no user message could be produced
    /// (e.g. an empty user template combined with `APPEND_TO_USER` and no
    /// few-shot examples).
    #[error("invalid prompt: {reason}")]
    InvalidPrompt {
        /// Human-readable reason.
        reason: String,
    },
}

/// Result alias for this crate's prompt operations.
pub type PromptResult<T> = Result<T, PromptError>;

/// The role of a rendered message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// A message authored by the user (or standing in for a few-shot input).
    User,
    /// A message authored by the assistant (or standing in for a few-shot
    /// output).
    Assistant,
}

/// A single rendered message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: MessageRole,
    /// Message text.
    pub text: String,
}

impl Message {
    /// Builds a message with the given role and text.
    #[must_use]
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// The output of rendering a [`PromptTemplate`] against a record: an
/// optional system string and an ordered message list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPrompt {
    /// Rendered system text, if the template declares one.
    pub system: Option<String>,
    /// Ordered messages to send to the model.
    pub messages: Vec<Message>,
}

/// A single in-context demonstration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    /// The demonstrated input.
    pub input: String,
    /// The demonstrated output.
    pub output: String,
}

/// How few-shot examples are injected into the rendered prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FewShotFormat {
    /// Examples become alternating user/assistant messages, prepended
    /// before the rendered user message.
    Converse,
    /// Examples are concatenated as a formatted block onto the rendered
    /// user text.
    AppendToUser,
    /// Examples are concatenated as a formatted block onto the rendered
    /// system text.
    AppendToSystem,
    /// No examples are injected.
    None,
}

/// The few-shot configuration carried by a [`PromptTemplate`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShot {
    /// Ordered demonstrations.
    pub examples: Vec<FewShotExample>,
    /// Injection format.
    pub format: FewShotFormatOrNone,
}

/// A [`FewShotFormat`] that defaults to [`FewShotFormat::None`] when absent.
pub type FewShotFormatOrNone = FewShotFormat;

impl Default for FewShotFormat {
    fn default() -> Self {
        Self::None
    }
}

/// A prompt made of a system template, a user template, named placeholders,
/// and optional few-shot demonstrations.
///
/// Built once by the caller (or by an optimizer) and treated as immutable
/// afterward: safe to share across threads and to render concurrently.
#[derive(Debug, Serialize, Deserialize)]
pub struct PromptTemplate {
    system_template: String,
    system_vars: HashSet<String>,
    user_template: String,
    user_vars: HashSet<String>,
    few_shot: FewShot,
    #[serde(skip, default)]
    warned_undeclared: AtomicBool,
}

impl Clone for PromptTemplate {
    fn clone(&self) -> Self {
        Self {
            system_template: self.system_template.clone(),
            system_vars: self.system_vars.clone(),
            user_template: self.user_template.clone(),
            user_vars: self.user_vars.clone(),
            few_shot: self.few_shot.clone(),
            warned_undeclared: AtomicBool::new(self.warned_undeclared.load(Ordering::Relaxed)),
        }
    }
}

impl PartialEq for PromptTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.system_template == other.system_template
            && self.system_vars == other.system_vars
            && self.user_template == other.user_template
            && self.user_vars == other.user_vars
            && self.few_shot == other.few_shot
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_template)
    }
}

impl PromptTemplate {
    /// Returns a builder for constructing a [`PromptTemplate`].
    #[must_use]
    pub fn builder(user_template: impl Into<String>) -> PromptTemplateBuilder {
        PromptTemplateBuilder::new(user_template)
    }

    /// The raw system template text.
    #[must_use]
    pub fn system_template(&self) -> &str {
        &self.system_template
    }

    /// The raw user template text.
    #[must_use]
    pub fn user_template(&self) -> &str {
        &self.user_template
    }

    /// Declared system placeholder names.
    #[must_use]
    pub fn system_vars(&self) -> &HashSet<String> {
        &self.system_vars
    }

    /// Declared user placeholder names.
    #[must_use]
    pub fn user_vars(&self) -> &HashSet<String> {
        &self.user_vars
    }

    /// The few-shot configuration.
    #[must_use]
    pub fn few_shot(&self) -> &FewShot {
        &self.few_shot
    }

    /// Renders this template against a record's `inputs` map.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::InvalidPrompt`] if no user message can be
    /// produced.
    pub fn render(&self, record: &DatasetRecord) -> PromptResult<RenderedPrompt> {
        let inputs = &record.inputs;
        let user_rendered = self.render_field(&self.user_template, &self.user_vars, inputs);
        let mut system_rendered = self.render_field(&self.system_template, &self.system_vars, inputs);

        let mut user_rendered = user_rendered;

        let mut messages = Vec::new();
        match self.few_shot.format {
            FewShotFormat::Converse => {
                for example in &self.few_shot.examples {
                    messages.push(Message::new(MessageRole::User, example.input.clone()));
                    messages.push(Message::new(MessageRole::Assistant, example.output.clone()));
                }
            }
            FewShotFormat::AppendToUser => {
                user_rendered.push_str(&examples_block(&self.few_shot.examples));
            }
            FewShotFormat::AppendToSystem => {
                system_rendered.push_str(&examples_block(&self.few_shot.examples));
            }
            FewShotFormat::None => {}
        }

        if user_rendered.is_empty() && messages.is_empty() {
            return Err(PromptError::InvalidPrompt {
                reason: "rendering produced no user message".to_owned(),
            });
        }

        if !user_rendered.is_empty() {
            messages.push(Message::new(MessageRole::User, user_rendered));
        }

        let system = if system_rendered.is_empty() {
            None
        } else {
            Some(system_rendered)
        };

        Ok(RenderedPrompt { system, messages })
    }

    /// Persists the template as `system_prompt.txt`, `user_prompt.txt`, and
    /// (if examples exist) `few_shot.json` under `dir`.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors encountered while writing the artifact files.
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> std::io::Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        fs::write(dir.join("system_prompt.txt"), &self.system_template)?;
        fs::write(dir.join("user_prompt.txt"), &self.user_template)?;
        if !self.few_shot.examples.is_empty() {
            let json = serde_json::to_vec_pretty(&self.few_shot.examples)
                .unwrap_or_default();
            fs::write(dir.join("few_shot.json"), json)?;
        }
        Ok(())
    }

    fn render_field(
        &self,
        template: &str,
        declared: &HashSet<String>,
        inputs: &HashMap<String, String>,
    ) -> String {
        let mut values = HashMap::new();
        for name in declared {
            values.insert(
                name.clone(),
                inputs.get(name).cloned().unwrap_or_default(),
            );
        }
        let mut rendered = substitute(template, &values);

        let referenced: HashSet<String> = extract_variable_refs(template).into_iter().collect();
        let mut unused: Vec<&String> = declared.difference(&referenced).collect();
        unused.sort();

        if !unused.is_empty() {
            if !self.warned_undeclared.swap(true, Ordering::Relaxed) {
                warn!(
                    vars = ?unused,
                    "prompt template declares variables that are not referenced in its text; appending them as additional inputs"
                );
            }
            rendered.push_str("\n\nHere are the additional inputs:\n");
            for name in unused {
                let value = inputs.get(name).cloned().unwrap_or_default();
                rendered.push_str(&format!("[[ ## {name} ## ]]\n{value}\n"));
            }
        }

        rendered
    }
}

fn examples_block(examples: &[FewShotExample]) -> String {
    let mut block = String::from("\n\n**Examples**\n");
    for (i, example) in examples.iter().enumerate() {
        block.push_str(&format!(
            "Example {}:\nInput: {}\nOutput: {}\n",
            i + 1,
            example.input,
            example.output
        ));
    }
    block
}

/// Builder for [`PromptTemplate`].
pub struct PromptTemplateBuilder {
    system_template: String,
    system_vars: HashSet<String>,
    user_template: String,
    user_vars: HashSet<String>,
    few_shot: FewShot,
}

impl PromptTemplateBuilder {
    /// Starts a builder from the user template text.
    #[must_use]
    pub fn new(user_template: impl Into<String>) -> Self {
        Self {
            system_template: String::new(),
            system_vars: HashSet::new(),
            user_template: user_template.into(),
            user_vars: HashSet::new(),
            few_shot: FewShot::default(),
        }
    }

    /// Sets the system template text.
    #[must_use]
    pub fn system_template(mut self, text: impl Into<String>) -> Self {
        self.system_template = text.into();
        self
    }

    /// Declares the set of placeholders usable in the user template.
    #[must_use]
    pub fn user_vars<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_vars = vars.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the set of placeholders usable in the system template.
    #[must_use]
    pub fn system_vars<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.system_vars = vars.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the few-shot examples and injection format.
    #[must_use]
    pub fn few_shot(mut self, examples: Vec<FewShotExample>, format: FewShotFormat) -> Self {
        self.few_shot = FewShot { examples, format };
        self
    }

    /// Builds the template, validating declared-placeholder coverage and
    /// the `APPEND_TO_USER` + empty-user-template combination.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::InvalidPrompt`] if:
    /// - a placeholder appears in a template's text but is not listed in
    ///   the corresponding declared-vars set, or
    /// - the user template is empty and the few-shot format is
    ///   `AppendToUser` with no examples (this would render no messages).
    pub fn build(self) -> PromptResult<PromptTemplate> {
        validate_declared_superset(&self.user_template, &self.user_vars, "user")?;
        validate_declared_superset(&self.system_template, &self.system_vars, "system")?;

        if self.user_template.trim().is_empty()
            && self.few_shot.format != FewShotFormat::Converse
            && self.few_shot.examples.is_empty()
        {
            return Err(PromptError::InvalidPrompt {
                reason: "user template is empty and no few-shot examples would produce a message"
                    .to_owned(),
            });
        }

        Ok(PromptTemplate {
            system_template: self.system_template,
            system_vars: self.system_vars,
            user_template: self.user_template,
            user_vars: self.user_vars,
            few_shot: self.few_shot,
            warned_undeclared: AtomicBool::new(false),
        })
    }
}

fn validate_declared_superset(
    template: &str,
    declared: &HashSet<String>,
    which: &str,
) -> PromptResult<()> {
    let referenced: HashSet<String> = extract_variable_refs(template).into_iter().collect();
    let undeclared: Vec<&String> = referenced.difference(declared).collect();
    if !undeclared.is_empty() {
        return Err(PromptError::InvalidPrompt {
            reason: format!(
                "{which} template references undeclared placeholder(s): {undeclared:?}"
            ),
        });
    }
    Ok(())
}
