use crate::{QuestionId, QuestionType};

/// Why an option list does not fit its question type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsViolation {
    #[error("{0} questions do not take options")]
    Forbidden(QuestionType),

    #[error("{0} questions need at least one option")]
    Missing(QuestionType),

    #[error("option value '{0}' is used more than once")]
    DuplicateValue(String),

    #[error("scale option value '{0}' is not an integer")]
    NotNumeric(String),

    #[error("scale option values must be consecutive integers, found {found} after {previous}")]
    NotContiguous { previous: i64, found: i64 },
}

/// Why an answer does not fit its question.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerViolation {
    #[error("expected a {expected} answer, got a {actual} answer")]
    TypeMismatch {
        expected: QuestionType,
        actual: QuestionType,
    },

    #[error("'{0}' is not one of the offered options")]
    UnknownOption(String),

    #[error("'{0}' is selected more than once")]
    DuplicateSelection(String),

    #[error("'{0}' is not a calendar date (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Local, user-correctable input problems.
///
/// Validation errors never involve a repository call and are always
/// recoverable by correcting the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{title}' requires an answer")]
    RequiredUnanswered { question_id: QuestionId, title: String },

    #[error("invalid answer for '{title}': {violation}")]
    InvalidAnswer {
        question_id: QuestionId,
        title: String,
        violation: AnswerViolation,
    },

    #[error("'{title}' needs at least {min} characters")]
    TooShort {
        question_id: QuestionId,
        title: String,
        min: usize,
    },

    #[error("'{title}' allows at most {max} characters")]
    TooLong {
        question_id: QuestionId,
        title: String,
        max: usize,
    },

    #[error("'{title}' does not match the expected format")]
    PatternMismatch { question_id: QuestionId, title: String },

    #[error("'{title}' has an invalid pattern '{pattern}'")]
    InvalidPattern {
        question_id: QuestionId,
        title: String,
        pattern: String,
    },

    #[error("the form needs a title")]
    EmptyTitle,

    #[error("the form needs at least one question")]
    NoQuestions,

    #[error("invalid options for '{title}': {violation}")]
    InvalidOptions {
        question_id: QuestionId,
        title: String,
        violation: OptionsViolation,
    },
}

impl ValidationError {
    /// The question this error is about, if any.
    pub fn question_id(&self) -> Option<&QuestionId> {
        match self {
            Self::RequiredUnanswered { question_id, .. }
            | Self::InvalidAnswer { question_id, .. }
            | Self::TooShort { question_id, .. }
            | Self::TooLong { question_id, .. }
            | Self::PatternMismatch { question_id, .. }
            | Self::InvalidPattern { question_id, .. }
            | Self::InvalidOptions { question_id, .. } => Some(question_id),
            Self::EmptyTitle | Self::NoQuestions => None,
        }
    }
}

/// Failure reported by an external repository.
///
/// The message is passed through verbatim so the host can show it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RepositoryError {
    message: String,
}

impl RepositoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Upstream contract violations.
///
/// These are not user-facing situations: the operation that hit one is
/// aborted and the fault is logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("unknown question type '{0}'")]
    UnknownQuestionType(String),

    #[error("order {0} is used by more than one form question")]
    DuplicateOrder(u32),

    #[error("form question order must run 1..={len} without gaps, found {found}")]
    OrderGap { len: usize, found: u32 },

    #[error("question {0} is referenced more than once")]
    DuplicateReference(QuestionId),

    #[error("form references missing question {0}")]
    MissingQuestion(QuestionId),

    #[error("draft question {0} cannot be sent to the backend")]
    DraftOnWire(QuestionId),

    #[error("answer for {question_id} is a {actual} value but the question is {expected}")]
    AnswerTypeMismatch {
        question_id: QuestionId,
        expected: QuestionType,
        actual: QuestionType,
    },

    #[error("{question_id} expects a {expected} answer but the stored value has another shape")]
    WireShapeMismatch {
        question_id: QuestionId,
        expected: QuestionType,
    },

    #[error("form has no id; only saved forms can be answered")]
    UnsavedForm,

    #[error("index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("question {question_id} has invalid options: {violation}")]
    InvalidOptions {
        question_id: QuestionId,
        violation: OptionsViolation,
    },
}
