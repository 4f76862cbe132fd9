use serde::{Deserialize, Serialize};

use crate::QuestionType;

/// A respondent's answer to one question.
///
/// The variant mirrors the question's type, so a checkbox answer is always a
/// sequence and every other answer a single string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    /// Free text.
    Text(String),

    /// The value of the chosen option.
    MultipleChoice(String),

    /// The values of the chosen options, in the order they were selected.
    Checkbox(Vec<String>),

    /// The value of the chosen option.
    Dropdown(String),

    /// The value of the chosen scale point.
    Scale(String),

    /// An ISO calendar date, `YYYY-MM-DD`.
    Date(String),
}

impl AnswerValue {
    /// A checkbox answer; repeated values keep only their first selection.
    pub fn checkbox<S: Into<String>>(selected: impl IntoIterator<Item = S>) -> Self {
        let mut values: Vec<String> = Vec::new();
        for value in selected {
            let value = value.into();
            if !values.contains(&value) {
                values.push(value);
            }
        }
        Self::Checkbox(values)
    }

    /// The answer variant for a single-string question type.
    ///
    /// Returns `None` for checkbox questions, whose answers are sequences.
    pub fn single(kind: QuestionType, value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        match kind {
            QuestionType::Text => Some(Self::Text(value)),
            QuestionType::MultipleChoice => Some(Self::MultipleChoice(value)),
            QuestionType::Dropdown => Some(Self::Dropdown(value)),
            QuestionType::Scale => Some(Self::Scale(value)),
            QuestionType::Date => Some(Self::Date(value)),
            QuestionType::Checkbox => None,
        }
    }

    /// The question type this answer belongs to.
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::Text(_) => QuestionType::Text,
            Self::MultipleChoice(_) => QuestionType::MultipleChoice,
            Self::Checkbox(_) => QuestionType::Checkbox,
            Self::Dropdown(_) => QuestionType::Dropdown,
            Self::Scale(_) => QuestionType::Scale,
            Self::Date(_) => QuestionType::Date,
        }
    }

    /// Try to get this value as a single string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s)
            | Self::MultipleChoice(s)
            | Self::Dropdown(s)
            | Self::Scale(s)
            | Self::Date(s) => Some(s),
            Self::Checkbox(_) => None,
        }
    }

    /// Try to get this value as a list of selections.
    pub fn as_selections(&self) -> Option<&[String]> {
        match self {
            Self::Checkbox(values) => Some(values),
            _ => None,
        }
    }

    /// Blank text (whitespace only) and an empty selection count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Checkbox(values) => values.is_empty(),
            _ => self.as_str().is_none_or(|s| s.trim().is_empty()),
        }
    }

    /// The wire representation of this value.
    pub fn to_wire(&self) -> WireValue {
        match self {
            Self::Checkbox(values) => WireValue::Multiple(values.clone()),
            _ => WireValue::Single(self.as_str().unwrap_or_default().to_string()),
        }
    }

    /// Rebuild a typed answer from its wire form.
    ///
    /// Returns `None` when the wire shape does not fit the question type.
    pub fn from_wire(kind: QuestionType, wire: WireValue) -> Option<Self> {
        match (kind, wire) {
            (QuestionType::Checkbox, WireValue::Multiple(values)) => Some(Self::Checkbox(values)),
            (QuestionType::Checkbox, WireValue::Single(_)) => None,
            (_, WireValue::Single(value)) => Self::single(kind, value),
            (_, WireValue::Multiple(_)) => None,
        }
    }
}

/// Answer value as sent to and received from the response repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Single(String),
    Multiple(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_keeps_selection_order_and_drops_repeats() {
        let value = AnswerValue::checkbox(["c", "a", "c", "b"]);
        assert_eq!(
            value.as_selections(),
            Some(&["c".to_string(), "a".to_string(), "b".to_string()][..])
        );
    }

    #[test]
    fn blank_values_are_empty() {
        assert!(AnswerValue::Text("   ".into()).is_empty());
        assert!(AnswerValue::Checkbox(Vec::new()).is_empty());
        assert!(!AnswerValue::Scale("0".into()).is_empty());
    }

    #[test]
    fn wire_shape_must_fit_type() {
        assert_eq!(
            AnswerValue::from_wire(QuestionType::Date, WireValue::Single("2024-05-01".into())),
            Some(AnswerValue::Date("2024-05-01".into()))
        );
        assert_eq!(
            AnswerValue::from_wire(QuestionType::Checkbox, WireValue::Single("a".into())),
            None
        );
        assert_eq!(
            AnswerValue::from_wire(QuestionType::Text, WireValue::Multiple(vec![])),
            None
        );
    }

    #[test]
    fn wire_value_is_untagged() {
        let json = serde_json::to_string(&WireValue::Multiple(vec!["a".into(), "b".into()]))
            .unwrap();
        assert_eq!(json, r#"["a","b"]"#);
        let single: WireValue = serde_json::from_str(r#""ok""#).unwrap();
        assert_eq!(single, WireValue::Single("ok".into()));
    }
}
