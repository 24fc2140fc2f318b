//! A single named step of a progress report

use serde::Serialize;
use tracing::debug;

use crate::completion::Completion;
use crate::id::ItemId;
use crate::transient::{ErrorDetail, TransientData};

/// One phase of a batch job: its counters plus a window of recent ids
///
/// Mutators return `&mut Self` so calls can be chained:
///
/// ```ignore
/// progress.step("import").set_total(Some(10)).track_success("row-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub name: String,
    pub completion: Completion,
    pub transient_data: TransientData,
}

impl Step {
    /// Create an empty step
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_parts(name, Completion::default(), TransientData::default())
    }

    pub fn with_parts(name: impl Into<String>, completion: Completion, transient_data: TransientData) -> Self {
        Self {
            name: name.into(),
            completion,
            transient_data,
        }
    }

    /// Set the total number of units in the step
    pub fn set_total(&mut self, count_total: Option<i64>) -> &mut Self {
        debug!(step = %self.name, ?count_total, "Step::set_total: called");
        self.completion.set_total(count_total);
        self
    }

    pub fn increment_success(&mut self, by: i64) -> &mut Self {
        debug!(step = %self.name, %by, "Step::increment_success: called");
        self.completion.increment_success(by);
        self
    }

    pub fn increment_failed(&mut self, by: i64) -> &mut Self {
        debug!(step = %self.name, %by, "Step::increment_failed: called");
        self.completion.increment_failed(by);
        self
    }

    /// Count one success and remember its id
    pub fn track_success(&mut self, id: impl Into<ItemId>) -> &mut Self {
        self.completion.increment_success(1);
        self.transient_data.record_success(id);
        self
    }

    /// Count one failure and remember its id, with the error if there is one
    pub fn track_failure(&mut self, id: impl Into<ItemId>, error: Option<ErrorDetail>) -> &mut Self {
        self.completion.increment_failed(1);
        self.transient_data.record_failure(id, error);
        self
    }

    /// Merge with the same step from other reports
    ///
    /// The result keeps this step's name. Callers must only pass steps with
    /// the same name; this is not checked.
    pub fn merge(&self, others: &[&Step]) -> Step {
        self.merge_with_limit(others, TransientData::MAX_TRACKED)
    }

    /// Same as [`Self::merge`] with an explicit retention cap for transient data
    pub fn merge_with_limit(&self, others: &[&Step], limit: usize) -> Step {
        debug!(step = %self.name, others = others.len(), "Step::merge_with_limit: called");
        let completions: Vec<&Completion> = others.iter().map(|s| &s.completion).collect();
        let transients: Vec<&TransientData> = others.iter().map(|s| &s.transient_data).collect();

        Step {
            name: self.name.clone(),
            completion: self.completion.merge(&completions),
            transient_data: self.transient_data.merge_with_limit(&transients, limit),
        }
    }
}
