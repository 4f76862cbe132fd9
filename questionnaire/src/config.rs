use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_SCALE_RANGE;

/// Tunables shared by the wizard and the builder.
///
/// Hosts usually build this with the `with_*` methods, or deserialize it from
/// their own configuration file; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Review text for questions without an answer.
    pub not_answered: String,

    /// Joins the labels of a checkbox answer in review text.
    pub separator: String,

    /// First point of the scale new scale questions get.
    pub scale_min: i64,

    /// Last point of the scale new scale questions get.
    pub scale_max: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            not_answered: "Not answered".to_string(),
            separator: ", ".to_string(),
            scale_min: *DEFAULT_SCALE_RANGE.start(),
            scale_max: *DEFAULT_SCALE_RANGE.end(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the review text for unanswered questions.
    pub fn with_not_answered(mut self, not_answered: impl Into<String>) -> Self {
        self.not_answered = not_answered.into();
        self
    }

    /// Set the separator between checkbox labels.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the default scale. An empty range keeps the current one.
    pub fn with_scale_range(mut self, range: RangeInclusive<i64>) -> Self {
        if !range.is_empty() {
            self.scale_min = *range.start();
            self.scale_max = *range.end();
        }
        self
    }

    pub fn scale_range(&self) -> RangeInclusive<i64> {
        self.scale_min..=self.scale_max
    }
}
