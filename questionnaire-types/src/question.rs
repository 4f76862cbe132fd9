use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{AnswerValue, QuestionId, QuestionType, ValidationError};

/// One selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Text shown to the respondent.
    pub label: String,

    /// Value stored in answers; unique within its question.
    pub value: String,
}

impl QuestionOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Answer constraints attached to a question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    /// The question's own default; a form may override it.
    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Regular expression the whole text answer must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// A reusable question definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub kind: QuestionType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,

    #[serde(default)]
    pub validation: ValidationRules,
}

impl Question {
    /// Create a question with the type's default options.
    pub fn new(id: impl Into<QuestionId>, title: impl Into<String>, kind: QuestionType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            kind,
            options: kind.default_options(),
            validation: ValidationRules::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the options.
    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = options;
        self
    }

    /// Replace the options with `(label, value)` pairs.
    pub fn with_choices<L, V>(self, choices: impl IntoIterator<Item = (L, V)>) -> Self
    where
        L: Into<String>,
        V: Into<String>,
    {
        let options = choices
            .into_iter()
            .map(|(label, value)| QuestionOption::new(label, value))
            .collect();
        self.with_options(options)
    }

    /// Set the question's default required flag.
    pub fn required(mut self, required: bool) -> Self {
        self.validation.required = required;
        self
    }

    pub fn with_validation(mut self, validation: ValidationRules) -> Self {
        self.validation = validation;
        self
    }

    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.value == value)
    }

    /// Label of the option with the given value.
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.option(value).map(|option| option.label.as_str())
    }

    /// Zero-based position of a scale value, used for ordered tier colouring.
    pub fn scale_tier(&self, value: &str) -> Option<usize> {
        if self.kind != QuestionType::Scale {
            return None;
        }
        self.options.iter().position(|option| option.value == value)
    }

    /// Check that the options fit the type and the pattern compiles.
    pub fn validate_structure(&self) -> Result<(), ValidationError> {
        self.kind
            .validate_options(&self.options)
            .map_err(|violation| ValidationError::InvalidOptions {
                question_id: self.id.clone(),
                title: self.title.clone(),
                violation,
            })?;

        if let Some(pattern) = &self.validation.pattern
            && anchored(pattern).is_err()
        {
            return Err(ValidationError::InvalidPattern {
                question_id: self.id.clone(),
                title: self.title.clone(),
                pattern: pattern.clone(),
            });
        }

        Ok(())
    }

    /// Check a non-empty answer against the type's shape and the text rules.
    pub fn check_answer(&self, value: &AnswerValue) -> Result<(), ValidationError> {
        self.kind
            .validate_answer(&self.options, value)
            .map_err(|violation| ValidationError::InvalidAnswer {
                question_id: self.id.clone(),
                title: self.title.clone(),
                violation,
            })?;

        let AnswerValue::Text(text) = value else {
            return Ok(());
        };

        let length = text.chars().count();
        if let Some(min) = self.validation.min_length
            && length < min
        {
            return Err(ValidationError::TooShort {
                question_id: self.id.clone(),
                title: self.title.clone(),
                min,
            });
        }
        if let Some(max) = self.validation.max_length
            && length > max
        {
            return Err(ValidationError::TooLong {
                question_id: self.id.clone(),
                title: self.title.clone(),
                max,
            });
        }
        if let Some(pattern) = &self.validation.pattern {
            let matches = anchored(pattern).is_ok_and(|regex| regex.is_match(text));
            if !matches {
                return Err(ValidationError::PatternMismatch {
                    question_id: self.id.clone(),
                    title: self.title.clone(),
                });
            }
        }

        Ok(())
    }

    /// The body sent to the question repository on create/update.
    pub fn to_dto(&self) -> QuestionDto {
        QuestionDto {
            title: self.title.clone(),
            description: self.description.clone(),
            kind: self.kind,
            options: self.options.clone(),
            validation: self.validation.clone(),
        }
    }
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

/// Question body exchanged with the question repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDto {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub kind: QuestionType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,

    #[serde(default)]
    pub validation: ValidationRules,
}

/// A partial edit of a question, merged in memory by the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub kind: Option<QuestionType>,
    pub options: Option<Vec<QuestionOption>>,
    pub validation: Option<ValidationRules>,
}

impl QuestionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set (`Some`) or clear (`None`) the description.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn kind(mut self, kind: QuestionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn validation(mut self, validation: ValidationRules) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge this patch into `question`. The id is never touched.
    pub fn apply_to(self, question: &mut Question) {
        if let Some(title) = self.title {
            question.title = title;
        }
        if let Some(description) = self.description {
            question.description = description;
        }
        if let Some(kind) = self.kind {
            question.kind = kind;
        }
        if let Some(options) = self.options {
            question.options = options;
        }
        if let Some(validation) = self.validation {
            question.validation = validation;
        }
    }
}
