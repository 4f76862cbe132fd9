//! Repository ports consumed by the engines.
//!
//! Transport, authentication and storage live behind these traits. The
//! engines only ever see results or a [`RepositoryError`] whose message is
//! shown to the user as is.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Form, FormPayload, Question, QuestionDto, RepositoryError, Response, SubmissionPayload,
};

/// The person answering forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Respondent {
    pub id: String,
}

impl Respondent {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// The form a respondent should answer, as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveForm {
    pub form: Form,

    /// The questions the form references.
    pub questions: Vec<Question>,

    /// Set by the backend; never computed locally.
    pub already_answered: bool,

    /// When the earlier response was recorded, if `already_answered`.
    pub response_date: Option<DateTime<Utc>>,
}

/// What the backend did with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The response was recorded.
    Accepted(Response),

    /// The respondent had already answered this form. Not a failure.
    AlreadyAnswered,
}

#[async_trait]
pub trait FormRepository: Send + Sync {
    /// The active form assigned to `respondent`; `None` when there is none.
    async fn fetch_active_form_for(
        &self,
        respondent: &Respondent,
    ) -> Result<Option<ActiveForm>, RepositoryError>;

    async fn create(&self, payload: &FormPayload) -> Result<Form, RepositoryError>;

    async fn update(&self, id: &str, payload: &FormPayload) -> Result<Form, RepositoryError>;

    async fn fetch_by_id(&self, id: &str) -> Result<Form, RepositoryError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist a new question; the returned question carries its issued id.
    async fn create(&self, dto: &QuestionDto) -> Result<Question, RepositoryError>;

    async fn update(&self, id: &str, dto: &QuestionDto) -> Result<Question, RepositoryError>;

    async fn fetch_all(&self) -> Result<Vec<Question>, RepositoryError>;

    /// Hard delete.
    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ResponseRepository: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitOutcome, RepositoryError>;
}
