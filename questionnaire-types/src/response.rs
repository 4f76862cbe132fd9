use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::WireValue;

/// One encoded answer in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAnswer {
    pub question_id: String,
    pub value: WireValue,
}

/// Body sent to the response repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub form_id: String,
    pub answers: Vec<WireAnswer>,
}

/// A stored response. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub form_id: String,
    pub answers: Vec<WireAnswer>,
    pub submitted_at: DateTime<Utc>,
}

impl Response {
    /// The response a backend records for `payload` at `submitted_at`.
    pub fn from_payload(payload: SubmissionPayload, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            form_id: payload.form_id,
            answers: payload.answers,
            submitted_at,
        }
    }

    pub fn answer(&self, question_id: &str) -> Option<&WireValue> {
        self.answers
            .iter()
            .find(|answer| answer.question_id == question_id)
            .map(|answer| &answer.value)
    }
}
