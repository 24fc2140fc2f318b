//! Top-level progress report
//!
//! A `Progress` is what callers construct: a named set of steps that
//! workers mutate while they run, and that can be merged with the reports
//! of other workers afterwards.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, ValidationError};
use crate::ordered::OrderedMap;
use crate::schema;
use crate::step::Step;
use crate::transient::TransientData;

/// Progress of a multi-step batch job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Descriptive label, not used as a key
    pub name: String,
    /// Steps keyed by step name, in the order they were first referenced
    steps: OrderedMap<String, Step>,
}

impl Progress {
    /// Create an empty report
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug!(%name, "Progress::new: called");
        Self {
            name,
            steps: OrderedMap::new(),
        }
    }

    /// Create a report from already-built steps
    ///
    /// A later step with the same key replaces an earlier one in place.
    pub fn with_steps(name: impl Into<String>, steps: impl IntoIterator<Item = (String, Step)>) -> Self {
        Self {
            name: name.into(),
            steps: steps.into_iter().collect(),
        }
    }

    /// Get a step by name, creating an empty one on first access
    pub fn step(&mut self, name: &str) -> &mut Step {
        self.steps.get_or_insert_with(name, || {
            debug!(step = %name, "Progress::step: creating step");
            Step::new(name)
        })
    }

    /// Look up a step without creating it
    pub fn get_step(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    /// Iterate steps in order
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.values()
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Merge with reports from other workers
    ///
    /// - This report's name is kept.
    /// - Steps are ordered by first appearance: this report's steps first,
    ///   then new names from each other report in argument order.
    /// - Steps with the same name are merged; a report without a step
    ///   contributes nothing to it.
    /// - Transient data is truncated after merge if there is too much.
    ///
    /// Neither this report nor `others` is modified.
    pub fn merge(&self, others: &[&Progress]) -> Progress {
        self.merge_with_limit(others, TransientData::MAX_TRACKED)
    }

    /// Same as [`Self::merge`] with an explicit retention cap for transient data
    pub fn merge_with_limit(&self, others: &[&Progress], limit: usize) -> Progress {
        debug!(name = %self.name, others = others.len(), %limit, "Progress::merge_with_limit: called");
        let mut by_name: OrderedMap<String, Vec<&Step>> = OrderedMap::new();
        for progress in std::iter::once(self).chain(others.iter().copied()) {
            for (name, step) in progress.steps.iter() {
                by_name.get_or_insert_with(name.as_str(), Vec::new).push(step);
            }
        }

        let steps: OrderedMap<String, Step> = by_name
            .into_iter()
            .map(|(name, steps)| {
                let merged = match steps.split_first() {
                    Some((first, rest)) => first.merge_with_limit(rest, limit),
                    None => Step::new(name.as_str()),
                };
                (name, merged)
            })
            .collect();

        info!(name = %self.name, reports = others.len() + 1, steps = steps.len(), "Merged progress reports");
        Progress {
            name: self.name.clone(),
            steps,
        }
    }

    /// Merge using the retention cap from configuration
    pub fn merge_with_config(&self, others: &[&Progress], config: &Config) -> Progress {
        self.merge_with_limit(others, config.max_tracked)
    }

    /// Project to the structured wire form
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuild from the structured wire form, validating every field
    pub fn from_value(value: &Value) -> std::result::Result<Progress, ValidationError> {
        schema::parse_progress(value)
    }

    /// Parse JSON text and validate it
    pub fn from_json(json: &str) -> Result<Progress> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value)?)
    }
}

impl<'de> serde::Deserialize<'de> for Progress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Progress::from_value(&value).map_err(serde::de::Error::custom)
    }
}
