//! Completion counters for a single step

use serde::Serialize;
use tracing::debug;

/// How much of a step has been processed
///
/// `count_success` and `count_failed` are the authoritative running totals.
/// `count_total` is a reporting field: it is never checked against the
/// running counts and may be exceeded or left stale. Counters saturate at
/// the `i64` bounds instead of overflowing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Total number of units in the step, unknown when absent
    pub count_total: Option<i64>,
    /// Units completed successfully
    pub count_success: i64,
    /// Units that failed and will not be retried
    pub count_failed: i64,
}

impl Completion {
    pub fn new(count_total: Option<i64>, count_success: i64, count_failed: i64) -> Self {
        Self {
            count_total,
            count_success,
            count_failed,
        }
    }

    /// Overwrite the total unconditionally
    pub fn set_total(&mut self, count_total: Option<i64>) {
        debug!(?count_total, "Completion::set_total: called");
        self.count_total = count_total;
    }

    /// Add to the success count (negative values are not clamped)
    pub fn increment_success(&mut self, by: i64) {
        self.count_success = self.count_success.saturating_add(by);
    }

    /// Add to the failed count (negative values are not clamped)
    pub fn increment_failed(&mut self, by: i64) {
        self.count_failed = self.count_failed.saturating_add(by);
    }

    /// Units processed so far, successful or not
    pub fn count_processed(&self) -> i64 {
        self.count_success.saturating_add(self.count_failed)
    }

    /// Fraction of the total that has been processed
    ///
    /// `None` when the total is unknown or zero.
    pub fn ratio(&self) -> Option<f64> {
        match self.count_total {
            Some(total) if total != 0 => Some(self.count_processed() as f64 / total as f64),
            _ => None,
        }
    }

    /// Merge with completions from other shards of the same step
    ///
    /// Success and failed counts are summed. Totals are NOT summed: every
    /// input is assumed to describe the same logical total, so the first
    /// present one wins (self first, then `others` in argument order).
    pub fn merge(&self, others: &[&Completion]) -> Completion {
        debug!(others = others.len(), "Completion::merge: called");
        let mut result = self.clone();
        for other in others {
            if result.count_total.is_none() {
                result.count_total = other.count_total;
            }
            result.count_success = result.count_success.saturating_add(other.count_success);
            result.count_failed = result.count_failed.saturating_add(other.count_failed);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let completion = Completion::default();
        assert_eq!(completion, Completion::new(None, 0, 0));
    }

    #[test]
    fn test_increments() {
        let mut completion = Completion::default();
        completion.increment_success(3);
        completion.increment_success(1);
        completion.increment_failed(2);

        assert_eq!(completion.count_success, 4);
        assert_eq!(completion.count_failed, 2);
        assert_eq!(completion.count_processed(), 6);
    }

    #[test]
    fn test_negative_increment_is_not_clamped() {
        let mut completion = Completion::new(None, 1, 0);
        completion.increment_success(-3);
        assert_eq!(completion.count_success, -2);
    }

    #[test]
    fn test_set_total_overwrites() {
        let mut completion = Completion::new(Some(10), 0, 0);
        completion.set_total(Some(3));
        assert_eq!(completion.count_total, Some(3));
        completion.set_total(None);
        assert_eq!(completion.count_total, None);
    }

    #[test]
    fn test_merge_sums_counts() {
        let a = Completion::new(Some(15), 2, 10);
        let b = Completion::new(None, 5, 1);
        let c = Completion::new(None, 3, 0);

        let merged = a.merge(&[&b, &c]);

        assert_eq!(merged, Completion::new(Some(15), 10, 11));
    }

    #[test]
    fn test_merge_first_present_total_wins() {
        let none = Completion::new(None, 1, 0);
        let forty = Completion::new(Some(40), 1, 0);
        let fifty = Completion::new(Some(50), 1, 0);

        assert_eq!(none.merge(&[&forty, &fifty]).count_total, Some(40));
        assert_eq!(none.merge(&[&fifty, &forty]).count_total, Some(50));
        assert_eq!(forty.merge(&[&fifty]).count_total, Some(40));
        assert_eq!(none.merge(&[&none]).count_total, None);
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let a = Completion::new(None, 1, 1);
        let b = Completion::new(Some(9), 2, 2);
        let _ = a.merge(&[&b]);

        assert_eq!(a, Completion::new(None, 1, 1));
        assert_eq!(b, Completion::new(Some(9), 2, 2));
    }

    #[test]
    fn test_merge_with_no_others_is_identity() {
        let a = Completion::new(Some(7), 3, 4);
        assert_eq!(a.merge(&[]), a);
    }

    #[test]
    fn test_counters_saturate() {
        let mut completion = Completion::new(None, i64::MAX - 1, i64::MIN + 1);
        completion.increment_success(5);
        completion.increment_failed(-5);
        assert_eq!(completion.count_success, i64::MAX);
        assert_eq!(completion.count_failed, i64::MIN);

        let full = Completion::new(None, i64::MAX, 1);
        let merged = full.merge(&[&Completion::new(None, 1, i64::MAX)]);
        assert_eq!(merged, Completion::new(None, i64::MAX, i64::MAX));
        assert_eq!(merged.count_processed(), i64::MAX);
    }

    #[test]
    fn test_ratio() {
        assert_eq!(Completion::new(None, 1, 1).ratio(), None);
        assert_eq!(Completion::new(Some(0), 1, 1).ratio(), None);
        assert_eq!(Completion::new(Some(4), 1, 1).ratio(), Some(0.5));
    }

    #[test]
    fn test_serializes_wire_names() {
        let json = serde_json::to_value(Completion::new(None, 2, 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"countTotal": null, "countSuccess": 2, "countFailed": 1})
        );
    }
}
