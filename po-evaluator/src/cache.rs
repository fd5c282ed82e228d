//! Process-scoped inference memoization.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use po_dataset::Dataset;
use po_dataset::Metric;
use po_template::PromptTemplate;

use crate::result::InferenceResult;

/// Identifies one memoized inference run.
///
/// Dataset/prompt/metric identity is the object's address rather than its
/// contents: two textually identical prompts are still distinct cache
/// entries if they're distinct objects, matching the source's
/// `id(dataset)`/`id(prompt)`/`id(metric)` keying.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InferenceCacheKey {
    model_id: String,
    dataset_id: usize,
    prompt_id: usize,
    metric_id: usize,
}

impl InferenceCacheKey {
    /// Builds a cache key from a model id and the three objects whose
    /// addresses identify this run.
    #[must_use]
    pub fn new(
        model_id: impl Into<String>,
        dataset: &Arc<Dataset>,
        prompt: &Arc<PromptTemplate>,
        metric: &Arc<dyn Metric>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            dataset_id: Arc::as_ptr(dataset) as *const () as usize,
            prompt_id: Arc::as_ptr(prompt) as *const () as usize,
            metric_id: Arc::as_ptr(metric) as *const () as usize,
        }
    }
}

/// A process-wide, thread-safe cache of inference results keyed by
/// [`InferenceCacheKey`].
///
/// A cache hit returns a cheap `Arc` clone; callers must treat the returned
/// list as read-only, matching the source's "return by reference, do not
/// mutate" contract.
#[derive(Default)]
pub struct InferenceCache {
    entries: RwLock<HashMap<InferenceCacheKey, Arc<Vec<InferenceResult>>>>,
}

impl InferenceCache {
    /// Builds an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached results for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &InferenceCacheKey) -> Option<Arc<Vec<InferenceResult>>> {
        self.entries
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    /// Inserts `results` for `key`, returning the now-cached `Arc`.
    ///
    /// If another writer raced and inserted first, the existing entry wins
    /// (single-writer-per-key semantics; readers never observe a partial
    /// list).
    pub fn get_or_insert_with(
        &self,
        key: InferenceCacheKey,
        results: Vec<InferenceResult>,
    ) -> Arc<Vec<InferenceResult>> {
        let mut guard = self.entries.write().unwrap_or_else(|p| p.into_inner());
        guard
            .entry(key)
            .or_insert_with(|| Arc::new(results))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn distinct_objects_get_distinct_keys_even_with_equal_content() {
        let dataset_a = Arc::new(Dataset::new(Vec::new(), vec![], vec!["y".into()]).unwrap());
        let dataset_b = Arc::new(Dataset::new(Vec::new(), vec![], vec!["y".into()]).unwrap());
        let prompt = Arc::new(
            PromptTemplate::builder("hi")
                .build()
                .expect("valid template"),
        );
        let metric: Arc<dyn Metric> = Arc::new(po_dataset::ExactMatch);

        let key_a = InferenceCacheKey::new("m", &dataset_a, &prompt, &metric);
        let key_b = InferenceCacheKey::new("m", &dataset_b, &prompt, &metric);
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn repeated_lookup_reuses_cached_entry() {
        let cache = InferenceCache::new();
        let dataset = Arc::new(Dataset::new(Vec::new(), vec![], vec!["y".into()]).unwrap());
        let prompt = Arc::new(PromptTemplate::builder("hi").build().unwrap());
        let metric: Arc<dyn Metric> = Arc::new(po_dataset::ExactMatch);
        let key = InferenceCacheKey::new("m", &dataset, &prompt, &metric);

        assert!(cache.get(&key).is_none());
        let inserted = cache.get_or_insert_with(key.clone(), vec![InferenceResult {
            inputs: HashMap::new(),
            outputs: HashMap::new(),
            inference_output: Some("a".to_owned()),
        }]);
        assert_eq!(inserted.len(), 1);

        let hit = cache.get(&key).expect("cached");
        assert!(Arc::ptr_eq(&inserted, &hit));
    }
}
