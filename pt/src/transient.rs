//! Bounded window of recently seen ids and errors
//!
//! Holds the most recent success ids, failed ids and error details of a
//! step. Capacity is intentionally limited to keep reports small: as more
//! data is pushed in, the oldest entries are dropped. The completion
//! counters hold the ground truth; this is only a diagnostic sample.

use serde::ser::{Error, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use tracing::debug;

use crate::id::ItemId;
use crate::ordered::OrderedMap;

/// Details of the error that made a unit fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: i64,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// Capture the display message of an error together with a caller-chosen code
    pub fn from_error(err: &dyn std::error::Error, code: i64) -> Self {
        Self::new(err.to_string(), code)
    }
}

/// Recent ids and errors of a step, capped at [`TransientData::MAX_TRACKED`] each
///
/// Serializes as `{successIDs, failedIDs, errorsByID}`. Error keys become
/// JSON object keys and lose their variant; they are read back with
/// [`ItemId::from_key_among`] against `failedIDs`. Serialization fails when
/// that would not restore the same id: a string id such as `"5"` whose
/// error outlived it in `failedIDs`, or `5` and `"5"` both carrying errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransientData {
    /// Recent successful ids, oldest first, no duplicates
    pub success_ids: Vec<ItemId>,
    /// Recent failed ids, oldest first, no duplicates
    pub failed_ids: Vec<ItemId>,
    /// Error details keyed by failed id, oldest first
    pub errors_by_id: OrderedMap<ItemId, ErrorDetail>,
}

impl TransientData {
    /// Retention cap for each list and for the error map
    pub const MAX_TRACKED: usize = 100;

    /// Build from raw parts, kept exactly as given
    ///
    /// The next record of the same kind, or any merge, de-duplicates and caps the lists.
    pub fn new(
        success_ids: Vec<ItemId>,
        failed_ids: Vec<ItemId>,
        errors_by_id: OrderedMap<ItemId, ErrorDetail>,
    ) -> Self {
        Self {
            success_ids,
            failed_ids,
            errors_by_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.success_ids.is_empty() && self.failed_ids.is_empty() && self.errors_by_id.is_empty()
    }

    /// Remember a successful id
    pub fn record_success(&mut self, id: impl Into<ItemId>) {
        let id = id.into();
        debug!(%id, "TransientData::record_success: called");
        self.success_ids.push(id);
        dedup_in_place(&mut self.success_ids);
        limit_to_cap(&mut self.success_ids, Self::MAX_TRACKED);
    }

    /// Remember a failed id and, optionally, the error behind it
    ///
    /// Without an error any previously recorded detail for the id is kept.
    pub fn record_failure(&mut self, id: impl Into<ItemId>, error: Option<ErrorDetail>) {
        let id = id.into();
        debug!(%id, has_error = error.is_some(), "TransientData::record_failure: called");
        if let Some(error) = error {
            self.errors_by_id.insert(id.clone(), error);
            self.errors_by_id.retain_last(Self::MAX_TRACKED);
        }
        self.failed_ids.push(id);
        dedup_in_place(&mut self.failed_ids);
        limit_to_cap(&mut self.failed_ids, Self::MAX_TRACKED);
    }

    /// Merge with transient data from other shards
    ///
    /// - Ids are concatenated (self first, then `others` in order) and
    ///   de-duplicated, keeping the first occurrence.
    /// - Error details are overwritten by later inputs for the same id.
    /// - Only the newest [`Self::MAX_TRACKED`] of each kind survive.
    pub fn merge(&self, others: &[&TransientData]) -> TransientData {
        self.merge_with_limit(others, Self::MAX_TRACKED)
    }

    /// Same as [`Self::merge`] with an explicit retention cap
    pub fn merge_with_limit(&self, others: &[&TransientData], limit: usize) -> TransientData {
        debug!(others = others.len(), %limit, "TransientData::merge_with_limit: called");
        let all: Vec<&TransientData> = std::iter::once(self).chain(others.iter().copied()).collect();

        let mut success_ids = dedup_concat(all.iter().map(|t| t.success_ids.as_slice()));
        let mut failed_ids = dedup_concat(all.iter().map(|t| t.failed_ids.as_slice()));
        let mut errors_by_id = OrderedMap::merged(all.iter().map(|t| &t.errors_by_id));

        limit_to_cap(&mut success_ids, limit);
        limit_to_cap(&mut failed_ids, limit);
        errors_by_id.retain_last(limit);

        debug!(
            success = success_ids.len(),
            failed = failed_ids.len(),
            errors = errors_by_id.len(),
            "TransientData::merge_with_limit: merged"
        );
        TransientData {
            success_ids,
            failed_ids,
            errors_by_id,
        }
    }
}

impl Serialize for TransientData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Some(id) = self
            .errors_by_id
            .keys()
            .find(|id| ItemId::from_key_among(&id.to_string(), &self.failed_ids) != **id)
        {
            return Err(Error::custom(format!(
                "error key {:?} cannot be written without losing its id type",
                id
            )));
        }

        let mut state = serializer.serialize_struct("TransientData", 3)?;
        state.serialize_field("successIDs", &self.success_ids)?;
        state.serialize_field("failedIDs", &self.failed_ids)?;
        state.serialize_field("errorsByID", &self.errors_by_id)?;
        state.end()
    }
}

/// Drop repeated ids, keeping the first occurrence of each
fn dedup_in_place(ids: &mut Vec<ItemId>) {
    let mut seen: HashSet<ItemId> = HashSet::with_capacity(ids.len());
    ids.retain(|id| seen.insert(id.clone()));
}

/// Concatenate id lists, keeping only the first occurrence of each id
fn dedup_concat<'a>(lists: impl Iterator<Item = &'a [ItemId]>) -> Vec<ItemId> {
    let mut seen: HashSet<&ItemId> = HashSet::new();
    let mut result = Vec::new();
    for list in lists {
        for id in list {
            if seen.insert(id) {
                result.push(id.clone());
            }
        }
    }
    result
}

/// Keep the last `cap` elements in their relative order
fn limit_to_cap<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}
