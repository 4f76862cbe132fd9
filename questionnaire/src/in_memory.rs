//! In-memory repositories for testing engines without a backend.
//!
//! `InMemoryStore` implements [`FormRepository`] and [`QuestionRepository`]
//! over shared, mutex-guarded state; [`InMemoryStore::responses_for`] hands
//! out a [`ResponseRepository`] bound to one respondent. Every repository
//! call is counted, and a failure can be scheduled for the next call of an
//! operation.
//!
//! # Example
//!
//! ```rust,ignore
//! use questionnaire::{InMemoryStore, Operation};
//!
//! let store = InMemoryStore::new();
//! store.fail(Operation::CreateForm, "backend offline");
//! // ... drive a BuilderEngine ...
//! assert_eq!(store.calls(Operation::CreateForm), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};

use crate::repository::{
    ActiveForm, FormRepository, QuestionRepository, Respondent, ResponseRepository, SubmitOutcome,
};
use crate::{
    Form, FormPayload, FormQuestion, Question, QuestionDto, QuestionId, RepositoryError, Response,
    SubmissionPayload, UserRef,
};

/// A repository operation, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchActiveForm,
    CreateForm,
    UpdateForm,
    FetchForm,
    CreateQuestion,
    UpdateQuestion,
    FetchQuestions,
    DeleteQuestion,
    SubmitResponse,
}

#[derive(Debug, Default)]
struct State {
    forms: Vec<Form>,
    questions: Vec<Question>,
    responses: Vec<Response>,

    /// `(respondent, form)` pairs with the time of their response.
    answered: HashMap<(String, String), DateTime<Utc>>,
    next_id: u64,
    calls: HashMap<Operation, usize>,
    failures: HashMap<Operation, String>,
}

impl State {
    fn issue_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn form_from_payload(id: String, payload: &FormPayload) -> Form {
        Form {
            id: Some(id),
            title: payload.title.clone(),
            description: payload.description.clone(),
            questions: payload
                .questions
                .iter()
                .map(|entry| {
                    FormQuestion::new(entry.question_id.as_str(), entry.order, entry.required)
                })
                .collect(),
            assigned_users: payload.assigned_users.iter().map(UserRef::new).collect(),
            is_active: payload.is_active,
        }
    }

    fn question_from_dto(id: String, dto: &QuestionDto) -> Question {
        Question {
            id: QuestionId::persisted(id),
            title: dto.title.clone(),
            description: dto.description.clone(),
            kind: dto.kind,
            options: dto.options.clone(),
            validation: dto.validation.clone(),
        }
    }
}

/// Shared in-memory forms, questions and responses.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored question. Draft ids are replaced with issued ones.
    pub fn with_question(self, question: Question) -> Self {
        self.insert_question(question);
        self
    }

    /// Seed a stored form. A form without id gets one.
    pub fn with_form(self, form: Form) -> Self {
        self.insert_form(form);
        self
    }

    /// Store a question directly, bypassing call counting.
    pub fn insert_question(&self, mut question: Question) -> Question {
        let mut state = self.state.lock();
        if question.id.is_draft() {
            question.id = QuestionId::persisted(state.issue_id("question"));
        }
        state.questions.retain(|stored| stored.id != question.id);
        state.questions.push(question.clone());
        question
    }

    /// Store a form directly, bypassing call counting.
    pub fn insert_form(&self, mut form: Form) -> Form {
        let mut state = self.state.lock();
        if form.id.is_none() {
            form.id = Some(state.issue_id("form"));
        }
        state.forms.retain(|stored| stored.id != form.id);
        state.forms.push(form.clone());
        form
    }

    /// Record that `respondent` has answered `form_id`.
    pub fn mark_answered(&self, respondent: &Respondent, form_id: &str, at: DateTime<Utc>) {
        self.state
            .lock()
            .answered
            .insert((respondent.id.clone(), form_id.to_string()), at);
    }

    /// Make the next call of `operation` fail with `message`.
    pub fn fail(&self, operation: Operation, message: impl Into<String>) {
        self.state.lock().failures.insert(operation, message.into());
    }

    /// How often `operation` was called, failed calls included.
    pub fn calls(&self, operation: Operation) -> usize {
        self.state.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Total number of repository calls.
    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    pub fn forms(&self) -> Vec<Form> {
        self.state.lock().forms.clone()
    }

    pub fn form(&self, id: &str) -> Option<Form> {
        self.state
            .lock()
            .forms
            .iter()
            .find(|form| form.id.as_deref() == Some(id))
            .cloned()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.state.lock().questions.clone()
    }

    pub fn responses(&self) -> Vec<Response> {
        self.state.lock().responses.clone()
    }

    /// A response repository submitting as `respondent`.
    pub fn responses_for(&self, respondent: &Respondent) -> InMemoryResponses {
        InMemoryResponses {
            store: self.clone(),
            respondent: respondent.clone(),
        }
    }

    /// Count the call and honour a scheduled failure.
    fn begin(&self, operation: Operation) -> Result<MutexGuard<'_, State>, RepositoryError> {
        let mut state = self.state.lock();
        *state.calls.entry(operation).or_default() += 1;
        match state.failures.remove(&operation) {
            Some(message) => Err(RepositoryError::new(message)),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl FormRepository for InMemoryStore {
    async fn fetch_active_form_for(
        &self,
        respondent: &Respondent,
    ) -> Result<Option<ActiveForm>, RepositoryError> {
        let state = self.begin(Operation::FetchActiveForm)?;
        let assigned = |form: &&Form| {
            form.assigned_users.is_empty()
                || form.assigned_users.iter().any(|user| user.id == respondent.id)
        };
        let Some(form) = state
            .forms
            .iter()
            .filter(|form| form.is_active)
            .find(assigned)
            .cloned()
        else {
            return Ok(None);
        };

        let questions = form
            .questions
            .iter()
            .filter_map(|entry| {
                state
                    .questions
                    .iter()
                    .find(|question| question.id == entry.question_id)
                    .cloned()
            })
            .collect();
        let response_date = form.id.as_ref().and_then(|form_id| {
            state
                .answered
                .get(&(respondent.id.clone(), form_id.clone()))
                .copied()
        });

        Ok(Some(ActiveForm {
            form,
            questions,
            already_answered: response_date.is_some(),
            response_date,
        }))
    }

    async fn create(&self, payload: &FormPayload) -> Result<Form, RepositoryError> {
        let mut state = self.begin(Operation::CreateForm)?;
        let id = state.issue_id("form");
        let form = State::form_from_payload(id, payload);
        state.forms.push(form.clone());
        Ok(form)
    }

    async fn update(&self, id: &str, payload: &FormPayload) -> Result<Form, RepositoryError> {
        let mut state = self.begin(Operation::UpdateForm)?;
        let stored = state
            .forms
            .iter_mut()
            .find(|form| form.id.as_deref() == Some(id))
            .ok_or_else(|| RepositoryError::new(format!("form {id} not found")))?;
        *stored = State::form_from_payload(id.to_string(), payload);
        Ok(stored.clone())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Form, RepositoryError> {
        let state = self.begin(Operation::FetchForm)?;
        state
            .forms
            .iter()
            .find(|form| form.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| RepositoryError::new(format!("form {id} not found")))
    }
}

#[async_trait]
impl QuestionRepository for InMemoryStore {
    async fn create(&self, dto: &QuestionDto) -> Result<Question, RepositoryError> {
        let mut state = self.begin(Operation::CreateQuestion)?;
        let id = state.issue_id("question");
        let question = State::question_from_dto(id, dto);
        state.questions.push(question.clone());
        Ok(question)
    }

    async fn update(&self, id: &str, dto: &QuestionDto) -> Result<Question, RepositoryError> {
        let mut state = self.begin(Operation::UpdateQuestion)?;
        let stored = state
            .questions
            .iter_mut()
            .find(|question| question.id.as_persisted() == Some(id))
            .ok_or_else(|| RepositoryError::new(format!("question {id} not found")))?;
        *stored = State::question_from_dto(id.to_string(), dto);
        Ok(stored.clone())
    }

    async fn fetch_all(&self) -> Result<Vec<Question>, RepositoryError> {
        let state = self.begin(Operation::FetchQuestions)?;
        Ok(state.questions.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut state = self.begin(Operation::DeleteQuestion)?;
        let referenced = state.forms.iter().any(|form| {
            form.is_active
                && form
                    .questions
                    .iter()
                    .any(|entry| entry.question_id.as_persisted() == Some(id))
        });
        if referenced {
            return Err(RepositoryError::new(format!("question {id} is used by an active form")));
        }
        let before = state.questions.len();
        state
            .questions
            .retain(|question| question.id.as_persisted() != Some(id));
        if state.questions.len() == before {
            return Err(RepositoryError::new(format!("question {id} not found")));
        }
        Ok(())
    }
}

/// Response repository of an [`InMemoryStore`], bound to one respondent.
#[derive(Debug, Clone)]
pub struct InMemoryResponses {
    store: InMemoryStore,
    respondent: Respondent,
}

#[async_trait]
impl ResponseRepository for InMemoryResponses {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitOutcome, RepositoryError> {
        let mut state = self.store.begin(Operation::SubmitResponse)?;
        if !state
            .forms
            .iter()
            .any(|form| form.id.as_deref() == Some(payload.form_id.as_str()))
        {
            return Err(RepositoryError::new(format!(
                "form {} not found",
                payload.form_id
            )));
        }

        let key = (self.respondent.id.clone(), payload.form_id.clone());
        if state.answered.contains_key(&key) {
            return Ok(SubmitOutcome::AlreadyAnswered);
        }

        let mut response = Response::from_payload(payload.clone(), Utc::now());
        response.id = Some(state.issue_id("response"));
        state.answered.insert(key, response.submitted_at);
        state.responses.push(response.clone());
        Ok(SubmitOutcome::Accepted(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuestionType;

    #[tokio::test]
    async fn scheduled_failure_hits_once() {
        let store = InMemoryStore::new();
        store.fail(Operation::FetchQuestions, "timeout");
        let first = QuestionRepository::fetch_all(&store).await;
        assert_eq!(first, Err(RepositoryError::new("timeout")));
        assert!(QuestionRepository::fetch_all(&store).await.is_ok());
        assert_eq!(store.calls(Operation::FetchQuestions), 2);
    }

    #[tokio::test]
    async fn active_form_respects_assignment() {
        let store = InMemoryStore::new()
            .with_question(Question::new("q-1", "Mood", QuestionType::Text))
            .with_form(Form {
                assigned_users: vec![UserRef::new("alice")],
                ..Form::new("Pulse")
                    .with_id("f-1")
                    .with_questions(vec![FormQuestion::new("q-1", 1, true)])
            });

        let alice = store
            .fetch_active_form_for(&Respondent::new("alice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alice.questions.len(), 1);
        assert!(!alice.already_answered);

        let bob = store
            .fetch_active_form_for(&Respondent::new("bob"))
            .await
            .unwrap();
        assert!(bob.is_none());
    }

    #[tokio::test]
    async fn second_submission_is_already_answered() {
        let store = InMemoryStore::new().with_form(Form::new("Pulse").with_id("f-1"));
        let responses = store.responses_for(&Respondent::new("alice"));
        let payload = SubmissionPayload {
            form_id: "f-1".into(),
            answers: Vec::new(),
        };
        assert!(matches!(
            responses.submit(&payload).await,
            Ok(SubmitOutcome::Accepted(_))
        ));
        assert_eq!(
            responses.submit(&payload).await,
            Ok(SubmitOutcome::AlreadyAnswered)
        );
        assert_eq!(store.responses().len(), 1);
    }

    #[tokio::test]
    async fn delete_refuses_questions_of_active_forms() {
        let pulse = Form::new("Pulse")
            .with_id("f-1")
            .with_questions(vec![FormQuestion::new("q-1", 1, true)]);
        let store = InMemoryStore::new()
            .with_question(Question::new("q-1", "Mood", QuestionType::Text))
            .with_form(pulse.clone());

        assert_eq!(
            QuestionRepository::delete(&store, "q-1").await,
            Err(RepositoryError::new("question q-1 is used by an active form"))
        );
        assert_eq!(store.questions().len(), 1);

        store.insert_form(Form {
            is_active: false,
            ..pulse
        });
        assert!(QuestionRepository::delete(&store, "q-1").await.is_ok());
        assert!(store.questions().is_empty());
    }
}
