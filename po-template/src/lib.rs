//! Prompt templates: placeholder substitution and few-shot formatting for
//! the prompt optimization engine.

#![warn(missing_docs, clippy::pedantic)]

mod prompt;
mod substitution;

/// The prompt template type, its builder, and rendering output types.
pub use prompt::{
    FewShot, FewShotExample, FewShotFormat, Message, MessageRole, PromptError, PromptResult,
    PromptTemplate, PromptTemplateBuilder, RenderedPrompt,
};
