//! Core types for the questionnaire crate.
//!
//! This crate provides the foundational data model for institutional forms:
//! - `QuestionType` - The catalog of supported question types and their rules
//! - `Question`, `QuestionId` and `QuestionOption` - Reusable question definitions
//! - `Form` and `FormQuestion` - Forms composed from question references
//! - `AnswerValue` and `Answers` - A respondent's typed answers
//! - `Response` and the wire payloads exchanged with a backend
//! - `ValidationError`, `RepositoryError` and `IntegrityError` - The error taxonomy

mod question_type;
pub use question_type::{
    AnswerShape, DATE_FORMAT, DEFAULT_SCALE_RANGE, OptionsRule, QuestionType, TypeRules,
};

mod question_id;
pub use question_id::{DraftToken, QuestionId};

mod question;
pub use question::{Question, QuestionDto, QuestionOption, QuestionPatch, ValidationRules};

mod form;
pub use form::{Form, FormPayload, FormQuestion, FormQuestionPayload, FormStatus, UserRef};

mod answer_value;
pub use answer_value::{AnswerValue, WireValue};

mod answers;
pub use answers::Answers;

mod response;
pub use response::{Response, SubmissionPayload, WireAnswer};

mod error;
pub use error::{
    AnswerViolation, IntegrityError, OptionsViolation, RepositoryError, ValidationError,
};
