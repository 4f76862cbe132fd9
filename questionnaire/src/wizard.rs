//! The respondent-side state machine.
//!
//! A [`WizardEngine`] walks one respondent through one form, a question per
//! step, then a review step, then submission. The host renders whatever
//! [`WizardEngine::state`] says and calls the transition methods in response
//! to input.
//!
//! ```text
//! Answering{0} -> ... -> Answering{n-1} -> Review -> Submitting -> Success
//!                                           ^  |          |
//!                                           |  v          +-> AlreadyAnswered
//!                                    Answering{k}         +-> Review (error kept)
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::repository::{ActiveForm, FormRepository, Respondent, ResponseRepository, SubmitOutcome};
use crate::{
    AnswerCodec, AnswerValue, AnswerViolation, Answers, EngineConfig, Form, FormSchema,
    IntegrityError, Question, QuestionCatalog, QuestionId, RepositoryError, Response,
    SubmissionPayload, ValidationError,
};

/// Where the respondent is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    /// Showing the question at `step` (zero-based).
    Answering { step: usize },

    /// Showing every answer before submission.
    Review,

    /// A submission is in flight.
    Submitting,

    /// The response was recorded. Terminal.
    Success,

    /// The respondent had already answered this form. Terminal.
    AlreadyAnswered,

    /// The form could not be loaded.
    LoadError { message: String },

    /// No active form with questions is assigned to the respondent.
    EmptyForm,
}

impl WizardState {
    /// No operation is accepted in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::AlreadyAnswered)
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answering { step } => write!(f, "answering step {step}"),
            Self::Review => write!(f, "reviewing"),
            Self::Submitting => write!(f, "submitting"),
            Self::Success => write!(f, "submitted"),
            Self::AlreadyAnswered => write!(f, "already answered"),
            Self::LoadError { .. } => write!(f, "failed to load"),
            Self::EmptyForm => write!(f, "without a form"),
        }
    }
}

/// Why a wizard operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: WizardState,
    },

    #[error("a submission is already in flight")]
    SubmitInFlight,

    #[error("question {0} is not part of this form")]
    UnknownQuestion(QuestionId),

    #[error("step {step} is out of range for {steps} questions")]
    StepOutOfRange { step: usize, steps: usize },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// The question shown on the current step.
#[derive(Debug, Clone, Copy)]
pub struct CurrentQuestion<'a> {
    pub step: usize,

    /// Number of question steps, not counting review.
    pub total: usize,

    pub question: &'a Question,

    /// Whether this form requires an answer.
    pub required: bool,

    pub answer: Option<&'a AnswerValue>,
}

/// One line of the review step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub step: usize,
    pub question_id: QuestionId,
    pub title: String,

    /// Display text; the "not answered" sentinel when there is no answer.
    pub answer: String,
    pub required: bool,
    pub answered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

/// Drives one respondent through one form.
pub struct WizardEngine {
    form: Option<Form>,
    schema: FormSchema,
    catalog: QuestionCatalog,
    answers: Answers,
    state: WizardState,
    codec: AnswerCodec,
    responses: Arc<dyn ResponseRepository>,

    /// Set once the review step has been shown.
    reviewed: bool,
    last_error: Option<String>,
    response_date: Option<DateTime<Utc>>,
    response: Option<Response>,
}

impl WizardEngine {
    /// Fetch the form assigned to `respondent` and start on its first step.
    ///
    /// Never fails: problems are reported through the resulting state.
    pub async fn load(
        forms: &dyn FormRepository,
        responses: Arc<dyn ResponseRepository>,
        respondent: &Respondent,
        config: &EngineConfig,
    ) -> Self {
        match forms.fetch_active_form_for(respondent).await {
            Ok(Some(active)) => Self::from_active_form(active, responses, config),
            Ok(None) => {
                debug!(respondent = %respondent.id, "no active form assigned");
                Self::with_state(WizardState::EmptyForm, responses, config)
            }
            Err(error) => {
                warn!(respondent = %respondent.id, %error, "failed to load the active form");
                let state = WizardState::LoadError {
                    message: error.message().to_string(),
                };
                Self::with_state(state, responses, config)
            }
        }
    }

    /// Start from a form the host already fetched.
    pub fn from_active_form(
        active: ActiveForm,
        responses: Arc<dyn ResponseRepository>,
        config: &EngineConfig,
    ) -> Self {
        let mut engine = Self::with_state(WizardState::EmptyForm, responses, config);

        if active.already_answered {
            debug!(form = ?active.form.id, "form already answered");
            engine.response_date = active.response_date;
            engine.form = Some(active.form);
            engine.state = WizardState::AlreadyAnswered;
            return engine;
        }

        if !active.form.is_active || active.form.questions.is_empty() {
            debug!(form = ?active.form.id, "form is inactive or has no questions");
            engine.form = Some(active.form);
            return engine;
        }

        match Self::assemble(&active) {
            Ok((schema, catalog)) => {
                debug!(form = ?active.form.id, questions = schema.len(), "form loaded");
                engine.schema = schema;
                engine.catalog = catalog;
                engine.state = WizardState::Answering { step: 0 };
            }
            Err(fault) => {
                error!(form = ?active.form.id, %fault, "form is inconsistent");
                engine.state = WizardState::LoadError {
                    message: fault.to_string(),
                };
            }
        }
        engine.form = Some(active.form);
        engine
    }

    fn assemble(active: &ActiveForm) -> Result<(FormSchema, QuestionCatalog), IntegrityError> {
        if active.form.id.is_none() {
            return Err(IntegrityError::UnsavedForm);
        }
        let schema = FormSchema::from_form_questions(active.form.questions.clone())?;
        let catalog = QuestionCatalog::from_questions(active.questions.iter().cloned());
        catalog.verify(&schema)?;
        Ok((schema, catalog))
    }

    fn with_state(
        state: WizardState,
        responses: Arc<dyn ResponseRepository>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            form: None,
            schema: FormSchema::new(),
            catalog: QuestionCatalog::new(),
            answers: Answers::new(),
            state,
            codec: AnswerCodec::from_config(config),
            responses,
            reviewed: false,
            last_error: None,
            response_date: None,
            response: None,
        }
    }

    /// Record an answer for a question of this form.
    ///
    /// Only the variant is checked here; shape and text rules are checked when
    /// leaving the step.
    pub fn set_answer(
        &mut self,
        question_id: &QuestionId,
        value: AnswerValue,
    ) -> Result<(), WizardError> {
        self.answering_step("set an answer")?;
        let question = self.question(question_id)?;
        let actual = value.question_type();
        if actual != question.kind {
            return Err(ValidationError::InvalidAnswer {
                question_id: question.id.clone(),
                title: question.title.clone(),
                violation: AnswerViolation::TypeMismatch {
                    expected: question.kind,
                    actual,
                },
            }
            .into());
        }
        self.answers.insert(question_id.clone(), value);
        Ok(())
    }

    pub fn clear_answer(&mut self, question_id: &QuestionId) -> Result<(), WizardError> {
        self.answering_step("clear an answer")?;
        self.question(question_id)?;
        self.answers.remove(question_id);
        Ok(())
    }

    /// Validate the current step and advance; after the last question comes
    /// review.
    pub fn next(&mut self) -> Result<(), WizardError> {
        let step = self.answering_step("advance")?;
        self.validate_step(step)?;

        self.state = if step + 1 >= self.schema.review_step() {
            self.reviewed = true;
            WizardState::Review
        } else {
            WizardState::Answering { step: step + 1 }
        };
        debug!(from = step, to = %self.state, "wizard advanced");
        Ok(())
    }

    /// Go back one step. A no-op on the first step.
    pub fn prev(&mut self) -> Result<(), WizardError> {
        let step = self.answering_step("go back")?;
        if step > 0 {
            self.state = WizardState::Answering { step: step - 1 };
        }
        Ok(())
    }

    /// Jump from review to a question; answers are kept.
    pub fn edit_question(&mut self, step: usize) -> Result<(), WizardError> {
        if self.state != WizardState::Review {
            return Err(self.invalid("edit a question"));
        }
        let steps = self.schema.len();
        if step >= steps {
            return Err(WizardError::StepOutOfRange { step, steps });
        }
        self.state = WizardState::Answering { step };
        debug!(step, "editing from review");
        Ok(())
    }

    /// Validate the current step and return straight to review.
    ///
    /// Only available once review has been reached.
    pub fn back_to_review(&mut self) -> Result<(), WizardError> {
        let step = self.answering_step("return to review")?;
        if !self.reviewed {
            return Err(self.invalid("return to review"));
        }
        self.validate_step(step)?;
        self.state = WizardState::Review;
        Ok(())
    }

    /// Validate everything and build the submission; the wizard moves to
    /// [`WizardState::Submitting`].
    ///
    /// Hosts that drive the repository themselves hand the result to
    /// [`finish_submit`](Self::finish_submit).
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, WizardError> {
        match self.state {
            WizardState::Review => {}
            WizardState::Submitting => return Err(WizardError::SubmitInFlight),
            _ => return Err(self.invalid("submit")),
        }

        for step in 0..self.schema.len() {
            self.validate_step(step)?;
        }

        let payload = self.encode().inspect_err(|fault| {
            error!(form = ?self.form_id(), %fault, "cannot encode submission");
        })?;

        self.last_error = None;
        self.state = WizardState::Submitting;
        debug!(form = %payload.form_id, answers = payload.answers.len(), "submitting");
        Ok(payload)
    }

    /// Apply the repository's answer to a submission started with
    /// [`begin_submit`](Self::begin_submit).
    ///
    /// A repository failure returns the wizard to review with the message kept
    /// in [`last_error`](Self::last_error).
    pub fn finish_submit(
        &mut self,
        result: Result<SubmitOutcome, RepositoryError>,
    ) -> Result<(), WizardError> {
        if self.state != WizardState::Submitting {
            return Err(self.invalid("finish a submission"));
        }

        match result {
            Ok(SubmitOutcome::Accepted(response)) => {
                info!(form = %response.form_id, "response recorded");
                self.response_date = Some(response.submitted_at);
                self.response = Some(response);
                self.state = WizardState::Success;
                Ok(())
            }
            Ok(SubmitOutcome::AlreadyAnswered) => {
                info!(form = ?self.form_id(), "response rejected as already answered");
                self.state = WizardState::AlreadyAnswered;
                Ok(())
            }
            Err(error) => {
                warn!(form = ?self.form_id(), %error, "submission failed");
                self.last_error = Some(error.message().to_string());
                self.state = WizardState::Review;
                Err(error.into())
            }
        }
    }

    /// Submit through the response repository given at construction.
    pub async fn submit(&mut self) -> Result<(), WizardError> {
        let payload = self.begin_submit()?;
        let result = self.responses.submit(&payload).await;
        self.finish_submit(result)
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    /// The question on the current step, while answering.
    pub fn current_question(&self) -> Option<CurrentQuestion<'_>> {
        let WizardState::Answering { step } = self.state else {
            return None;
        };
        let form_question = self.schema.question_at(step)?;
        let question = self.catalog.get(&form_question.question_id)?;
        Some(CurrentQuestion {
            step,
            total: self.schema.len(),
            question,
            required: form_question.required,
            answer: self.answers.get(&question.id),
        })
    }

    /// Every question with its display answer, in form order.
    pub fn review_rows(&self) -> Vec<ReviewRow> {
        self.catalog
            .resolve(&self.schema)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(step, resolved)| {
                let question = resolved.question;
                ReviewRow {
                    step,
                    question_id: question.id.clone(),
                    title: question.title.clone(),
                    answer: self
                        .codec
                        .decode_for_review(question, self.answers.get(&question.id)),
                    required: resolved.required(),
                    answered: self.answers.has_value(&question.id),
                }
            })
            .collect()
    }

    pub fn progress(&self) -> Progress {
        let answered = self
            .schema
            .iter()
            .filter(|entry| self.answers.has_value(&entry.question_id))
            .count();
        Progress {
            answered,
            total: self.schema.len(),
        }
    }

    /// Message of the last failed submission.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// When the response was recorded, by this wizard or earlier.
    pub fn response_date(&self) -> Option<DateTime<Utc>> {
        self.response_date
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    fn form_id(&self) -> Option<&str> {
        self.form.as_ref().and_then(|form| form.id.as_deref())
    }

    fn answering_step(&self, operation: &'static str) -> Result<usize, WizardError> {
        match self.state {
            WizardState::Answering { step } => Ok(step),
            _ => Err(self.invalid(operation)),
        }
    }

    fn invalid(&self, operation: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            operation,
            state: self.state.clone(),
        }
    }

    fn question(&self, question_id: &QuestionId) -> Result<&Question, WizardError> {
        if !self.schema.contains(question_id) {
            return Err(WizardError::UnknownQuestion(question_id.clone()));
        }
        self.catalog
            .get(question_id)
            .ok_or_else(|| IntegrityError::MissingQuestion(question_id.clone()).into())
    }

    fn validate_step(&self, step: usize) -> Result<(), WizardError> {
        let form_question =
            self.schema
                .question_at(step)
                .ok_or(WizardError::StepOutOfRange {
                    step,
                    steps: self.schema.len(),
                })?;
        let question = self.question(&form_question.question_id)?;

        match self.answers.get(&question.id).filter(|value| !value.is_empty()) {
            Some(value) => question.check_answer(value)?,
            None if form_question.required => {
                return Err(ValidationError::RequiredUnanswered {
                    question_id: question.id.clone(),
                    title: question.title.clone(),
                }
                .into());
            }
            None => {}
        }
        Ok(())
    }

    fn encode(&self) -> Result<SubmissionPayload, IntegrityError> {
        let form_id = self.form_id().ok_or(IntegrityError::UnsavedForm)?;
        let mut answers = Vec::new();
        for resolved in self.catalog.resolve(&self.schema)? {
            let question = resolved.question;
            if let Some(value) = self.answers.get(&question.id).filter(|value| !value.is_empty()) {
                answers.push(self.codec.encode_for_submission(question, value)?);
            }
        }
        Ok(SubmissionPayload {
            form_id: form_id.to_string(),
            answers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormQuestion, InMemoryStore, QuestionType, WireValue};

    fn team() -> Question {
        Question::new("q-team", "Team", QuestionType::MultipleChoice)
            .with_choices([("Platform", "platform"), ("Product", "product")])
    }

    fn note() -> Question {
        Question::new("q-note", "Anything else?", QuestionType::Text)
    }

    fn active(required_team: bool) -> ActiveForm {
        ActiveForm {
            form: Form::new("Pulse").with_id("f-1").with_questions(vec![
                FormQuestion::new("q-team", 1, required_team),
                FormQuestion::new("q-note", 2, false),
            ]),
            questions: vec![team(), note()],
            already_answered: false,
            response_date: None,
        }
    }

    fn wizard(active: ActiveForm) -> (WizardEngine, InMemoryStore) {
        let store = InMemoryStore::new();
        let responses: Arc<dyn ResponseRepository> =
            Arc::new(store.responses_for(&Respondent::new("u-1")));
        let engine = WizardEngine::from_active_form(active, responses, &EngineConfig::default());
        (engine, store)
    }

    fn id(raw: &str) -> QuestionId {
        QuestionId::from(raw)
    }

    #[test]
    fn required_question_blocks_next() {
        let (mut engine, _) = wizard(active(true));
        assert!(matches!(
            engine.next(),
            Err(WizardError::Validation(ValidationError::RequiredUnanswered { .. }))
        ));
        assert_eq!(engine.state(), &WizardState::Answering { step: 0 });
    }

    #[test]
    fn blank_text_counts_as_unanswered() {
        let (mut engine, _) = wizard(active(false));
        engine.next().unwrap();
        engine
            .set_answer(&id("q-note"), AnswerValue::Text("   ".into()))
            .unwrap();
        engine.next().unwrap();
        assert_eq!(engine.state(), &WizardState::Review);
        assert_eq!(engine.progress(), Progress { answered: 0, total: 2 });
    }

    #[test]
    fn optional_questions_can_be_skipped() {
        let (mut engine, _) = wizard(active(false));
        engine.next().unwrap();
        engine.next().unwrap();
        assert_eq!(engine.state(), &WizardState::Review);
    }

    #[test]
    fn wrong_variant_is_rejected() {
        let (mut engine, _) = wizard(active(true));
        let result = engine.set_answer(&id("q-team"), AnswerValue::Text("platform".into()));
        assert!(matches!(
            result,
            Err(WizardError::Validation(ValidationError::InvalidAnswer {
                violation: AnswerViolation::TypeMismatch { .. },
                ..
            }))
        ));
        assert!(engine.answers().is_empty());
    }

    #[test]
    fn unknown_option_blocks_next() {
        let (mut engine, _) = wizard(active(true));
        engine
            .set_answer(&id("q-team"), AnswerValue::MultipleChoice("sales".into()))
            .unwrap();
        assert!(matches!(
            engine.next(),
            Err(WizardError::Validation(ValidationError::InvalidAnswer { .. }))
        ));
    }

    #[test]
    fn prev_on_first_step_is_a_no_op() {
        let (mut engine, _) = wizard(active(false));
        engine.prev().unwrap();
        assert_eq!(engine.state(), &WizardState::Answering { step: 0 });
        engine.next().unwrap();
        engine.prev().unwrap();
        assert_eq!(engine.state(), &WizardState::Answering { step: 0 });
    }

    #[test]
    fn back_to_review_needs_a_prior_review() {
        let (mut engine, _) = wizard(active(false));
        assert!(matches!(
            engine.back_to_review(),
            Err(WizardError::InvalidTransition { .. })
        ));
        engine.next().unwrap();
        engine.next().unwrap();
        engine.edit_question(0).unwrap();
        engine.back_to_review().unwrap();
        assert_eq!(engine.state(), &WizardState::Review);
    }

    #[test]
    fn edit_question_checks_range() {
        let (mut engine, _) = wizard(active(false));
        engine.next().unwrap();
        engine.next().unwrap();
        assert_eq!(
            engine.edit_question(2),
            Err(WizardError::StepOutOfRange { step: 2, steps: 2 })
        );
    }

    #[test]
    fn second_begin_submit_is_in_flight() {
        let (mut engine, _) = wizard(active(false));
        engine.next().unwrap();
        engine.next().unwrap();
        engine.begin_submit().unwrap();
        assert_eq!(engine.begin_submit(), Err(WizardError::SubmitInFlight));
        assert_eq!(engine.state(), &WizardState::Submitting);
    }

    #[test]
    fn payload_omits_blank_answers_and_follows_schema_order() {
        let (mut engine, _) = wizard(active(true));
        engine
            .set_answer(&id("q-team"), AnswerValue::MultipleChoice("product".into()))
            .unwrap();
        engine.next().unwrap();
        engine.next().unwrap();
        let payload = engine.begin_submit().unwrap();
        assert_eq!(payload.form_id, "f-1");
        assert_eq!(payload.answers.len(), 1);
        assert_eq!(payload.answers[0].question_id, "q-team");
        assert_eq!(payload.answers[0].value, WireValue::Single("product".into()));
    }

    #[test]
    fn failed_submission_returns_to_review() {
        let (mut engine, _) = wizard(active(false));
        engine.next().unwrap();
        engine.next().unwrap();
        engine.begin_submit().unwrap();
        let result = engine.finish_submit(Err(RepositoryError::new("backend offline")));
        assert!(matches!(result, Err(WizardError::Repository(_))));
        assert_eq!(engine.state(), &WizardState::Review);
        assert_eq!(engine.last_error(), Some("backend offline"));
    }

    #[test]
    fn review_rows_use_labels_and_sentinel() {
        let (mut engine, _) = wizard(active(true));
        engine
            .set_answer(&id("q-team"), AnswerValue::MultipleChoice("platform".into()))
            .unwrap();
        engine.next().unwrap();
        engine.next().unwrap();
        let rows = engine.review_rows();
        assert_eq!(rows[0].answer, "Platform");
        assert!(rows[0].answered);
        assert_eq!(rows[1].answer, "Not answered");
        assert!(!rows[1].answered);
    }

    #[test]
    fn unsaved_form_cannot_be_answered() {
        let mut form = active(false);
        form.form.id = None;
        let (engine, _) = wizard(form);
        assert!(matches!(engine.state(), WizardState::LoadError { .. }));
    }

    #[test]
    fn dangling_reference_is_a_load_error() {
        let mut form = active(false);
        form.questions.pop();
        let (engine, _) = wizard(form);
        assert!(matches!(engine.state(), WizardState::LoadError { .. }));
    }

    #[test]
    fn inactive_form_is_empty() {
        let mut form = active(false);
        form.form.is_active = false;
        let (engine, _) = wizard(form);
        assert_eq!(engine.state(), &WizardState::EmptyForm);
        assert!(engine.current_question().is_none());
    }
}
