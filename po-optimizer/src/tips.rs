//! Rhetorical "tips" sampled into proposer instructions to diversify
//! candidate rewordings.

/// One named tip and the sentence appended to the proposer's instructions
/// when it is selected.
pub const TIPS: &[(&str, &str)] = &[
    ("none", ""),
    (
        "creative",
        "Encourage the model to think outside the box and explore novel or unconventional ideas.",
    ),
    (
        "simple",
        "Keep the instruction short, clear, and unambiguous. Avoid unnecessary complexity or jargon.",
    ),
    (
        "description",
        "Include detailed and informative context to guide the model toward a more accurate response.",
    ),
    (
        "high_stakes",
        "Frame the task with high-consequence scenarios where accuracy and precision are critical.",
    ),
    (
        "persona",
        "Assign a relevant persona (e.g. \"You are a legal advisor...\") to anchor the model's tone and expertise.",
    ),
    (
        "format_control",
        "Explicitly define the required output format (e.g. JSON, bullet points, Markdown) and enforce strict formatting rules.",
    ),
    (
        "structured_prompt",
        "Use structured prompt sections like Task, Context, and Instructions to improve comprehension.",
    ),
    (
        "examples",
        "Provide both positive and negative examples to illustrate what a good or bad response looks like.",
    ),
    (
        "rules_based",
        "State rules or compliance constraints that the model MUST follow.",
    ),
    (
        "multi_turn",
        "Guide the model to ask clarifying questions if the task is ambiguous or requires multiple steps.",
    ),
];

/// Samples one tip at random, returning its name and descriptive sentence.
#[must_use]
pub fn sample_tip() -> (&'static str, &'static str) {
    use rand::Rng;
    let idx = rand::thread_rng().gen_range(0..TIPS.len());
    TIPS[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_tip_has_no_sentence() {
        let (_, sentence) = TIPS[0];
        assert_eq!(sentence, "");
    }

    #[test]
    fn sample_tip_returns_a_known_entry() {
        let (name, sentence) = sample_tip();
        assert!(TIPS.iter().any(|(n, s)| *n == name && *s == sentence));
    }
}
