//! Per-vendor request shaping applied internally by adapters (§4.2).
//!
//! `top_k` is not part of every provider's native request shape the same
//! way, so it is layered on as additional fields keyed off the model id
//! rather than a single shared struct field.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};
use tracing::warn;

/// Computes additional request fields for `model_id` given the requested
/// `top_k`, returning `None` when there is nothing to add.
///
/// The first time a model id matches neither a `"nova"` nor an
/// `"anthropic"` substring, a warning is logged through `warned` and then
/// suppressed for the lifetime of the adapter instance that owns it.
pub fn extra_fields(model_id: &str, top_k: Option<u32>, warned: &AtomicBool) -> Option<Value> {
    let top_k = top_k?;

    if model_id.contains("nova") {
        Some(json!({ "inferenceConfig": { "topK": top_k } }))
    } else if model_id.contains("anthropic") {
        Some(json!({ "top_k": top_k }))
    } else {
        if !warned.swap(true, Ordering::SeqCst) {
            warn!(model_id, "no vendor-specific request shaping for this model; top_k dropped");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nova_models_get_nested_inference_config() {
        let warned = AtomicBool::new(false);
        let fields = extra_fields("amazon.nova-lite-v1", Some(20), &warned);
        assert_eq!(fields, Some(json!({ "inferenceConfig": { "topK": 20 } })));
        assert!(!warned.load(Ordering::SeqCst));
    }

    #[test]
    fn anthropic_models_get_native_top_k() {
        let warned = AtomicBool::new(false);
        let fields = extra_fields("anthropic.claude-3-5-sonnet", Some(20), &warned);
        assert_eq!(fields, Some(json!({ "top_k": 20 })));
        assert!(!warned.load(Ordering::SeqCst));
    }

    #[test]
    fn unrecognized_vendor_warns_once() {
        let warned = AtomicBool::new(false);
        assert_eq!(extra_fields("gpt-4o", Some(20), &warned), None);
        assert!(warned.load(Ordering::SeqCst));
        // Second call finds the flag already set; no additional field either way.
        assert_eq!(extra_fields("gpt-4o", Some(20), &warned), None);
    }

    #[test]
    fn no_top_k_requested_means_nothing_to_add() {
        let warned = AtomicBool::new(false);
        assert_eq!(extra_fields("anthropic.claude-3-5-sonnet", None, &warned), None);
        assert!(!warned.load(Ordering::SeqCst));
    }
}
