//! User-supplied scoring function.

/// A scalar metric comparing a model's prediction against ground truth.
///
/// Implementations MUST be pure: two calls with the same inputs must return
/// the same score. The evaluator's cache assumes this; a metric with hidden
/// state silently invalidates it.
pub trait Metric: Send + Sync {
    /// Scores a single prediction against its ground truth.
    fn apply(&self, prediction: &str, ground_truth: &str) -> f64;

    /// Scores an entire batch of predictions at once.
    ///
    /// Most metrics can implement this as the mean of [`Metric::apply`]
    /// over the batch, but aggregate metrics (F1, BLEU, ...) need the whole
    /// batch to compute a single number, so this is a separate method
    /// rather than a provided default.
    fn batch_apply(&self, predictions: &[String], ground_truths: &[String]) -> f64;
}

/// A metric that checks exact string equality, scoring `1.0` on match and
/// `0.0` otherwise. `batch_apply` is the mean per-row score.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatch;

impl Metric for ExactMatch {
    fn apply(&self, prediction: &str, ground_truth: &str) -> f64 {
        f64::from(u8::from(prediction.trim() == ground_truth.trim()))
    }

    fn batch_apply(&self, predictions: &[String], ground_truths: &[String]) -> f64 {
        if predictions.is_empty() {
            return 0.0;
        }
        let total: f64 = predictions
            .iter()
            .zip(ground_truths.iter())
            .map(|(pred, truth)| self.apply(pred, truth))
            .sum();
        total / predictions.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_equal_strings() {
        let metric = ExactMatch;
        assert_eq!(metric.apply("yes", "yes"), 1.0);
        assert_eq!(metric.apply("yes", "no"), 0.0);
    }

    #[test]
    fn exact_match_batch_averages() {
        let metric = ExactMatch;
        let preds = vec!["a".to_owned(), "b".to_owned()];
        let truths = vec!["a".to_owned(), "x".to_owned()];
        assert_eq!(metric.batch_apply(&preds, &truths), 0.5);
    }
}
