//! The staff-side form editor.
//!
//! A [`BuilderEngine`] holds one form being edited: its metadata, its
//! [`FormSchema`], a working set of the questions it references (drafts and
//! local edits included) and the question bank offered for reuse. Edits are
//! local until [`BuilderEngine::save_question`] or [`BuilderEngine::save_form`]
//! sends them to the repositories.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::permissions::Capability;
use crate::repository::{FormRepository, QuestionRepository};
use crate::{
    EngineConfig, Form, FormPayload, FormSchema, IntegrityError, Permissions, Question,
    QuestionCatalog, QuestionId, QuestionOption, QuestionPatch, QuestionType, RepositoryError,
    UserRef, ValidationError,
};

/// Why a builder operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not permitted to {0}")]
    Forbidden(Capability),

    #[error("question {0} is not part of this form")]
    UnknownQuestion(QuestionId),

    #[error("question {0} has not been saved yet")]
    NotPersisted(QuestionId),

    /// The stored form is active and still references the question.
    #[error("question {0} is used by the active form; remove it and save the form first")]
    InUse(QuestionId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Result of adding an existing question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,

    /// The form already references the question; nothing changed.
    AlreadyAdded,
}

/// One question of the form as the builder shows it.
#[derive(Debug, Clone, Copy)]
pub struct BuilderQuestion<'a> {
    pub order: u32,
    pub question: &'a Question,

    /// The per-form required override.
    pub required: bool,

    /// Edited locally since the last save.
    pub dirty: bool,
}

/// Narrows the question bank in the "add existing question" picker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    /// Case-insensitive substring of the title; empty matches everything.
    pub search: String,
    pub kind: Option<QuestionType>,
}

impl QuestionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_kind(mut self, kind: QuestionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, question: &Question) -> bool {
        let needle = self.search.trim().to_lowercase();
        (needle.is_empty() || question.title.to_lowercase().contains(&needle))
            && self.kind.is_none_or(|kind| kind == question.kind)
    }
}

/// Edits one form.
pub struct BuilderEngine {
    forms: Arc<dyn FormRepository>,
    questions: Arc<dyn QuestionRepository>,
    permissions: Permissions,
    config: EngineConfig,

    /// Metadata only; the question list lives in `schema`.
    form: Form,
    schema: FormSchema,
    working: QuestionCatalog,
    bank: Vec<Question>,
    dirty: HashSet<QuestionId>,
    selected: Option<QuestionId>,
    form_changed: bool,

    /// References of the stored form while it is active.
    published: HashSet<QuestionId>,
}

impl BuilderEngine {
    /// A builder for a new, empty form.
    pub fn new(
        forms: Arc<dyn FormRepository>,
        questions: Arc<dyn QuestionRepository>,
        permissions: Permissions,
        config: EngineConfig,
    ) -> Self {
        Self {
            forms,
            questions,
            permissions,
            config,
            form: Form::new(""),
            schema: FormSchema::new(),
            working: QuestionCatalog::new(),
            bank: Vec::new(),
            dirty: HashSet::new(),
            selected: None,
            form_changed: false,
            published: HashSet::new(),
        }
    }

    /// A builder for a stored form, with the question bank loaded.
    pub async fn open(
        forms: Arc<dyn FormRepository>,
        questions: Arc<dyn QuestionRepository>,
        permissions: Permissions,
        config: EngineConfig,
        form_id: &str,
    ) -> Result<Self, BuilderError> {
        let form = forms.fetch_by_id(form_id).await.inspect_err(|error| {
            warn!(form = form_id, %error, "failed to fetch form");
        })?;
        let bank = questions.fetch_all().await.inspect_err(|error| {
            warn!(%error, "failed to fetch question bank");
        })?;

        let schema = FormSchema::from_form_questions(form.questions.clone())
            .inspect_err(|fault| error!(form = form_id, %fault, "stored form is inconsistent"))?;
        let working = QuestionCatalog::from_questions(
            bank.iter()
                .filter(|question| schema.contains(&question.id))
                .cloned(),
        );
        working
            .resolve(&schema)
            .inspect_err(|fault| error!(form = form_id, %fault, "stored form is inconsistent"))?;

        debug!(form = form_id, questions = schema.len(), "form opened");
        let mut builder = Self::new(forms, questions, permissions, config);
        builder.form = form;
        builder.schema = schema;
        builder.working = working;
        builder.bank = bank;
        builder.publish();
        Ok(builder)
    }

    /// Refresh the question bank; returns how many questions it holds.
    pub async fn load_question_bank(&mut self) -> Result<usize, BuilderError> {
        let bank = self.questions.fetch_all().await.inspect_err(|error| {
            warn!(%error, "failed to fetch question bank");
        })?;
        self.bank = bank;
        Ok(self.bank.len())
    }

    /// Append a new draft question of `kind` and select it.
    pub fn add_new_question(&mut self, kind: QuestionType) -> QuestionId {
        let id = QuestionId::draft();
        let question =
            Question::new(id.clone(), "", kind).with_options(self.default_options(kind));
        self.working.insert(question);
        if let Err(fault) = self.schema.push_question(id.clone(), false) {
            error!(question = %id, %fault, "draft token collision");
        }
        self.selected = Some(id.clone());
        self.form_changed = true;
        debug!(question = %id, %kind, "draft question added");
        id
    }

    /// Reference a stored question from the bank.
    pub fn add_existing_question(
        &mut self,
        question: Question,
    ) -> Result<AddOutcome, BuilderError> {
        if question.id.is_draft() {
            return Err(BuilderError::NotPersisted(question.id));
        }
        if self.schema.contains(&question.id) {
            return Ok(AddOutcome::AlreadyAdded);
        }
        let id = question.id.clone();
        self.schema
            .push_question(id.clone(), question.validation.required)?;
        self.working.insert(question);
        self.selected = Some(id.clone());
        self.form_changed = true;
        debug!(question = %id, "existing question added");
        Ok(AddOutcome::Added)
    }

    /// Merge `patch` into a question of this form, locally.
    ///
    /// When the type changes and the current options do not fit the new
    /// type, the options are reset to the new type's defaults.
    pub fn update_question(
        &mut self,
        question_id: &QuestionId,
        patch: QuestionPatch,
    ) -> Result<(), BuilderError> {
        if !self.schema.contains(question_id) {
            return Err(BuilderError::UnknownQuestion(question_id.clone()));
        }
        let options_given = patch.options.is_some();
        let new_kind = patch.kind;

        let defaults = new_kind.map(|kind| self.default_options(kind));
        let question = self
            .working
            .get_mut(question_id)
            .ok_or_else(|| BuilderError::UnknownQuestion(question_id.clone()))?;
        let old_kind = question.kind;
        patch.apply_to(question);

        if let Some(defaults) = defaults
            && !options_given
            && question.kind != old_kind
            && question.kind.validate_options(&question.options).is_err()
        {
            question.options = defaults;
        }

        if question_id.is_persisted() {
            self.dirty.insert(question_id.clone());
        }
        Ok(())
    }

    /// Set whether this form requires an answer to the question.
    pub fn set_required(
        &mut self,
        question_id: &QuestionId,
        required: bool,
    ) -> Result<(), BuilderError> {
        if !self.schema.set_required(question_id, required) {
            return Err(BuilderError::UnknownQuestion(question_id.clone()));
        }
        self.form_changed = true;
        Ok(())
    }

    /// Drop the question from this form. Removing twice is a no-op.
    ///
    /// Drafts disappear entirely; stored questions stay in the bank.
    pub fn remove_question(&mut self, question_id: &QuestionId) -> bool {
        let removed = self.schema.remove_question(question_id);
        self.forget(question_id);
        if removed {
            self.form_changed = true;
            debug!(question = %question_id, "question removed from form");
        }
        removed
    }

    /// Delete a question from the repository and from this form.
    ///
    /// A question the stored form references while active is refused; it
    /// has to be removed and the form saved before it can be deleted.
    pub async fn delete_question(&mut self, question_id: &QuestionId) -> Result<(), BuilderError> {
        if let Some(raw) = question_id.as_persisted() {
            self.require(Capability::ManageQuestions)?;
            if self.published.contains(question_id) {
                warn!(question = raw, "question is used by the active form");
                return Err(BuilderError::InUse(question_id.clone()));
            }
            self.questions.delete(raw).await.inspect_err(|error| {
                warn!(question = raw, %error, "failed to delete question");
            })?;
            self.bank.retain(|question| &question.id != question_id);
            info!(question = raw, "question deleted");
        }
        if self.schema.remove_question(question_id) {
            self.form_changed = true;
        }
        self.forget(question_id);
        Ok(())
    }

    /// Persist one question; returns its id, which is new for a draft.
    ///
    /// A draft is created and every reference to its draft id is replaced
    /// with the issued one. On failure nothing changes.
    pub async fn save_question(
        &mut self,
        question_id: &QuestionId,
    ) -> Result<QuestionId, BuilderError> {
        self.require(Capability::ManageQuestions)?;
        let question = self
            .working
            .get(question_id)
            .ok_or_else(|| BuilderError::UnknownQuestion(question_id.clone()))?;
        question.validate_structure()?;
        let dto = question.to_dto();

        let saved = match question_id.as_persisted() {
            Some(raw) => self.questions.update(raw, &dto).await,
            None => self.questions.create(&dto).await,
        }
        .inspect_err(|error| warn!(question = %question_id, %error, "failed to save question"))?;

        if !saved.id.is_persisted() {
            let fault = IntegrityError::DraftOnWire(saved.id.clone());
            error!(question = %question_id, %fault, "repository returned an unsaved question");
            return Err(fault.into());
        }

        if question_id.is_draft() {
            self.schema
                .replace_id(question_id, saved.id.clone())
                .inspect_err(|fault| {
                    error!(question = %question_id, %fault, "cannot promote draft");
                })?;
            self.working.remove(question_id);
            if self.selected.as_ref() == Some(question_id) {
                self.selected = Some(saved.id.clone());
            }
            info!(draft = %question_id, question = %saved.id, "question created");
        } else {
            info!(question = %saved.id, "question updated");
        }

        self.dirty.remove(question_id);
        match self.bank.iter_mut().find(|question| question.id == saved.id) {
            Some(banked) => *banked = saved.clone(),
            None => self.bank.push(saved.clone()),
        }
        let id = saved.id.clone();
        self.working.insert(saved);
        Ok(id)
    }

    /// Move the question at `drag` to position `hover`.
    ///
    /// The new order is visible at once and persisted by the next form save.
    pub fn move_question(&mut self, drag: usize, hover: usize) -> Result<(), BuilderError> {
        self.schema.move_question(drag, hover)?;
        self.form_changed = true;
        Ok(())
    }

    /// Save the form, saving new and edited questions first.
    ///
    /// The title must not be blank and the form needs a question; otherwise
    /// no repository is called.
    pub async fn save_form(&mut self) -> Result<Form, BuilderError> {
        self.require(Capability::ManageForms)?;
        let title = self.form.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }
        if self.schema.is_empty() {
            return Err(ValidationError::NoQuestions.into());
        }

        let pending: Vec<QuestionId> = self
            .schema
            .iter()
            .map(|entry| entry.question_id.clone())
            .filter(|id| id.is_draft() || self.dirty.contains(id))
            .collect();
        if !pending.is_empty() {
            self.require(Capability::ManageQuestions)?;
            for id in &pending {
                if let Some(question) = self.working.get(id) {
                    question.validate_structure()?;
                }
            }
        }
        for id in &pending {
            self.save_question(id).await?;
        }

        let payload = FormPayload {
            title,
            description: self.form.description.clone(),
            questions: self.schema.to_payload()?,
            assigned_users: self
                .form
                .assigned_users
                .iter()
                .map(|user| user.id.clone())
                .collect(),
            is_active: self.form.is_active,
        };

        let saved = match self.form.id.clone() {
            Some(id) => self.forms.update(&id, &payload).await,
            None => self.forms.create(&payload).await,
        }
        .inspect_err(|error| warn!(form = ?self.form.id, %error, "failed to save form"))?;

        if self.form.id.is_none() {
            self.form.id = saved.id.clone();
        }
        self.form.title = payload.title;
        self.form_changed = false;
        self.publish();
        info!(form = ?self.form.id, questions = self.schema.len(), "form saved");
        Ok(saved)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.form.title = title.into();
        self.form_changed = true;
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.form.description = description;
        self.form_changed = true;
    }

    /// Deactivated forms are kept for their responses but no longer offered.
    pub fn set_active(&mut self, active: bool) {
        self.form.is_active = active;
        self.form_changed = true;
    }

    pub fn assign_users(&mut self, users: Vec<UserRef>) {
        self.form.assigned_users = users;
        self.form_changed = true;
    }

    /// Select a question of this form for editing.
    pub fn select(&mut self, question_id: &QuestionId) -> Result<(), BuilderError> {
        if !self.schema.contains(question_id) {
            return Err(BuilderError::UnknownQuestion(question_id.clone()));
        }
        self.selected = Some(question_id.clone());
        Ok(())
    }

    pub fn selected_question(&self) -> Option<&Question> {
        self.selected.as_ref().and_then(|id| self.working.get(id))
    }

    /// The form's questions in order.
    pub fn questions(&self) -> Vec<BuilderQuestion<'_>> {
        self.schema
            .iter()
            .filter_map(|entry| {
                let question = self.working.get(&entry.question_id)?;
                Some(BuilderQuestion {
                    order: entry.order,
                    question,
                    required: entry.required,
                    dirty: self.dirty.contains(&entry.question_id),
                })
            })
            .collect()
    }

    /// Bank questions not yet in this form that match `filter`.
    pub fn filtered_existing_questions(&self, filter: &QuestionFilter) -> Vec<&Question> {
        self.bank
            .iter()
            .filter(|question| !self.schema.contains(&question.id))
            .filter(|question| filter.matches(question))
            .collect()
    }

    /// Whether anything would be lost by discarding this builder.
    pub fn has_unsaved_changes(&self) -> bool {
        self.form_changed
            || !self.dirty.is_empty()
            || self.schema.iter().any(|entry| entry.question_id.is_draft())
    }

    /// A snapshot of the form with its current question list.
    pub fn to_form(&self) -> Form {
        let mut form = self.form.clone();
        form.questions = self.schema.to_form_questions();
        form
    }

    pub fn form_id(&self) -> Option<&str> {
        self.form.id.as_deref()
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    fn require(&self, capability: Capability) -> Result<(), BuilderError> {
        if capability.granted_by(&self.permissions) {
            Ok(())
        } else {
            warn!(%capability, "operation refused");
            Err(BuilderError::Forbidden(capability))
        }
    }

    fn default_options(&self, kind: QuestionType) -> Vec<QuestionOption> {
        match kind {
            QuestionType::Scale => QuestionType::scale_options(self.config.scale_range()),
            _ => kind.default_options(),
        }
    }

    fn publish(&mut self) {
        self.published = if self.form.is_active {
            self.schema
                .iter()
                .map(|entry| entry.question_id.clone())
                .collect()
        } else {
            HashSet::new()
        };
    }

    fn forget(&mut self, question_id: &QuestionId) {
        if question_id.is_draft() || !self.schema.contains(question_id) {
            self.working.remove(question_id);
            self.dirty.remove(question_id);
        }
        if self.selected.as_ref() == Some(question_id) {
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;

    fn builder(store: &InMemoryStore, permissions: Permissions) -> BuilderEngine {
        BuilderEngine::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            permissions,
            EngineConfig::default(),
        )
    }

    #[test]
    fn new_draft_is_selected_with_defaults() {
        let store = InMemoryStore::new();
        let mut builder = builder(&store, Permissions::all());
        let id = builder.add_new_question(QuestionType::MultipleChoice);
        assert!(id.is_draft());
        let selected = builder.selected_question().unwrap();
        assert_eq!(selected.id, id);
        assert_eq!(selected.options.len(), 2);
        assert!(builder.has_unsaved_changes());
    }

    #[test]
    fn scale_drafts_use_configured_range() {
        let store = InMemoryStore::new();
        let mut builder = BuilderEngine::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Permissions::all(),
            EngineConfig::new().with_scale_range(1..=5),
        );
        builder.add_new_question(QuestionType::Scale);
        assert_eq!(builder.selected_question().unwrap().options.len(), 5);
    }

    #[test]
    fn type_change_resets_options_that_no_longer_fit() {
        let store = InMemoryStore::new();
        let mut builder = builder(&store, Permissions::all());
        let id = builder.add_new_question(QuestionType::Dropdown);

        builder
            .update_question(&id, QuestionPatch::new().kind(QuestionType::Text))
            .unwrap();
        assert!(builder.selected_question().unwrap().options.is_empty());

        builder
            .update_question(&id, QuestionPatch::new().kind(QuestionType::Checkbox))
            .unwrap();
        assert_eq!(builder.selected_question().unwrap().options.len(), 2);
    }

    #[test]
    fn type_change_keeps_options_that_still_fit() {
        let store = InMemoryStore::new();
        let mut builder = builder(&store, Permissions::all());
        let id = builder.add_new_question(QuestionType::Dropdown);
        builder
            .update_question(
                &id,
                QuestionPatch::new().options(vec![QuestionOption::new("Red", "red")]),
            )
            .unwrap();
        builder
            .update_question(&id, QuestionPatch::new().kind(QuestionType::MultipleChoice))
            .unwrap();
        let question = builder.selected_question().unwrap();
        assert_eq!(question.options, vec![QuestionOption::new("Red", "red")]);
    }

    #[test]
    fn removing_a_draft_drops_it() {
        let store = InMemoryStore::new();
        let mut builder = builder(&store, Permissions::all());
        let id = builder.add_new_question(QuestionType::Text);
        assert!(builder.remove_question(&id));
        assert!(!builder.remove_question(&id));
        assert!(builder.selected_question().is_none());
        assert!(builder.questions().is_empty());
    }

    #[test]
    fn adding_a_draft_as_existing_is_refused() {
        let store = InMemoryStore::new();
        let mut builder = builder(&store, Permissions::all());
        let draft = Question::new(QuestionId::draft(), "Loose", QuestionType::Text);
        assert!(matches!(
            builder.add_existing_question(draft),
            Err(BuilderError::NotPersisted(_))
        ));
    }

    #[test]
    fn filter_matches_title_and_kind() {
        let filter = QuestionFilter::new()
            .with_search("  TEAM ")
            .with_kind(QuestionType::Dropdown);
        let team = Question::new("q-1", "Your team", QuestionType::Dropdown);
        let other = Question::new("q-2", "Your team", QuestionType::Text);
        assert!(filter.matches(&team));
        assert!(!filter.matches(&other));
        assert!(QuestionFilter::new().matches(&other));
    }

    #[tokio::test]
    async fn save_form_without_permission_is_forbidden() {
        let store = InMemoryStore::new();
        let mut builder = builder(&store, Permissions::none());
        builder.set_title("Pulse");
        builder.add_new_question(QuestionType::Text);
        assert_eq!(
            builder.save_form().await,
            Err(BuilderError::Forbidden(Capability::ManageForms))
        );
        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn failed_save_question_changes_nothing() {
        let store = InMemoryStore::new();
        let mut builder = builder(&store, Permissions::all());
        let id = builder.add_new_question(QuestionType::Text);
        builder
            .update_question(&id, QuestionPatch::new().title("Comments"))
            .unwrap();
        store.fail(crate::Operation::CreateQuestion, "quota exceeded");

        let result = builder.save_question(&id).await;
        assert_eq!(
            result,
            Err(BuilderError::Repository(RepositoryError::new("quota exceeded")))
        );
        assert!(builder.schema().contains(&id));
        assert_eq!(builder.selected_question().unwrap().title, "Comments");
    }
}
