//! Per-type answer encoding for submissions and review text.

use crate::{AnswerValue, EngineConfig, IntegrityError, Question, WireAnswer, WireValue};

/// Encodes answers for the response repository and renders them for review.
#[derive(Debug, Clone)]
pub struct AnswerCodec {
    not_answered: String,
    separator: String,
}

impl Default for AnswerCodec {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl AnswerCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            not_answered: config.not_answered.clone(),
            separator: config.separator.clone(),
        }
    }

    /// The review text for a question without an answer.
    pub fn not_answered(&self) -> &str {
        &self.not_answered
    }

    /// Encode one answer for submission.
    ///
    /// Scalar answers pass through unchanged. Checkbox selections keep the
    /// order in which they were made; they are not re-sorted to option order.
    pub fn encode_for_submission(
        &self,
        question: &Question,
        value: &AnswerValue,
    ) -> Result<WireAnswer, IntegrityError> {
        let question_id = question
            .id
            .as_persisted()
            .ok_or_else(|| IntegrityError::DraftOnWire(question.id.clone()))?;

        let actual = value.question_type();
        if actual != question.kind {
            return Err(IntegrityError::AnswerTypeMismatch {
                question_id: question.id.clone(),
                expected: question.kind,
                actual,
            });
        }

        Ok(WireAnswer {
            question_id: question_id.to_string(),
            value: value.to_wire(),
        })
    }

    /// Rebuild a typed answer from a stored wire value.
    pub fn decode_for_submission(
        &self,
        question: &Question,
        wire: &WireValue,
    ) -> Result<AnswerValue, IntegrityError> {
        AnswerValue::from_wire(question.kind, wire.clone()).ok_or_else(|| {
            IntegrityError::WireShapeMismatch {
                question_id: question.id.clone(),
                expected: question.kind,
            }
        })
    }

    /// Human-readable text for the review step.
    ///
    /// Choice values resolve to their option label. A value that matches no
    /// option (the option was renamed or removed since) is shown raw rather
    /// than failing. Absent or empty answers render as the "not answered"
    /// sentinel, never as an empty string.
    pub fn decode_for_review(&self, question: &Question, value: Option<&AnswerValue>) -> String {
        let Some(value) = value.filter(|value| !value.is_empty()) else {
            return self.not_answered.clone();
        };

        match value {
            AnswerValue::Text(text) | AnswerValue::Date(text) => text.clone(),
            AnswerValue::MultipleChoice(choice)
            | AnswerValue::Dropdown(choice)
            | AnswerValue::Scale(choice) => self.label(question, choice),
            AnswerValue::Checkbox(selected) => selected
                .iter()
                .map(|choice| self.label(question, choice))
                .collect::<Vec<_>>()
                .join(&self.separator),
        }
    }

    fn label(&self, question: &Question, value: &str) -> String {
        question.option_label(value).unwrap_or(value).to_string()
    }
}
