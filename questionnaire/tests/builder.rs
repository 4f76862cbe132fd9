//! Integration tests for the form builder

use std::sync::Arc;

use example_questionnaires::{
    WELLBEING_FORM_ID, course_feedback_questions, wellbeing_form, wellbeing_questions,
};
use questionnaire::{
    AddOutcome, BuilderEngine, BuilderError, Capability, EngineConfig, InMemoryStore, Operation,
    Permissions, QuestionFilter, QuestionId, QuestionPatch, QuestionType, RepositoryError,
    Respondent, ValidationError, WizardEngine, WizardState,
};

fn blank(store: &InMemoryStore, permissions: Permissions) -> BuilderEngine {
    BuilderEngine::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        permissions,
        EngineConfig::default(),
    )
}

async fn open_wellbeing(store: &InMemoryStore) -> BuilderEngine {
    BuilderEngine::open(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Permissions::all(),
        EngineConfig::default(),
        WELLBEING_FORM_ID,
    )
    .await
    .unwrap()
}

fn wellbeing_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    for question in wellbeing_questions() {
        store.insert_question(question);
    }
    store.insert_form(wellbeing_form());
    store
}

fn ids(builder: &BuilderEngine) -> Vec<String> {
    builder
        .questions()
        .iter()
        .map(|entry| entry.question.id.to_string())
        .collect()
}

#[tokio::test]
async fn test_empty_title_never_reaches_repository() {
    let store = InMemoryStore::new();
    let mut builder = blank(&store, Permissions::all());
    builder.add_new_question(QuestionType::Text);
    builder.set_title("   ");

    assert_eq!(
        builder.save_form().await,
        Err(BuilderError::Validation(ValidationError::EmptyTitle))
    );
    assert_eq!(store.calls(Operation::CreateForm), 0);
    assert_eq!(store.calls(Operation::CreateQuestion), 0);
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn test_form_without_questions_is_rejected() {
    let store = InMemoryStore::new();
    let mut builder = blank(&store, Permissions::all());
    builder.set_title("Pulse");
    assert_eq!(
        builder.save_form().await,
        Err(BuilderError::Validation(ValidationError::NoQuestions))
    );
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn test_add_existing_checkbox_twice() {
    let store = InMemoryStore::new();
    let checkbox = store.insert_question(
        questionnaire::Question::new("q-langs", "Languages", QuestionType::Checkbox)
            .with_choices([("Rust", "rust"), ("Go", "go")]),
    );
    let mut builder = blank(&store, Permissions::all());

    assert_eq!(
        builder.add_existing_question(checkbox.clone()),
        Ok(AddOutcome::Added)
    );
    assert_eq!(
        builder.add_existing_question(checkbox.clone()),
        Ok(AddOutcome::AlreadyAdded)
    );
    let references = builder
        .schema()
        .iter()
        .filter(|entry| entry.question_id == checkbox.id)
        .count();
    assert_eq!(references, 1);
}

#[tokio::test]
async fn test_save_question_promotes_draft_once() {
    let store = InMemoryStore::new();
    let mut builder = blank(&store, Permissions::all());
    let first = builder.add_new_question(QuestionType::Text);
    let draft = builder.add_new_question(QuestionType::Dropdown);
    builder
        .update_question(&draft, QuestionPatch::new().title("Team"))
        .unwrap();

    let saved = builder.save_question(&draft).await.unwrap();
    assert!(saved.is_persisted());

    let references: Vec<&QuestionId> = builder
        .schema()
        .iter()
        .map(|entry| &entry.question_id)
        .collect();
    assert_eq!(references, [&first, &saved]);
    assert!(!builder.schema().contains(&draft));
    assert_eq!(builder.selected_question().map(|q| &q.id), Some(&saved));
    assert_eq!(store.questions().len(), 1);
    assert_eq!(store.questions()[0].title, "Team");

    // Saving again updates in place
    builder.save_question(&saved).await.unwrap();
    assert_eq!(store.calls(Operation::CreateQuestion), 1);
    assert_eq!(store.calls(Operation::UpdateQuestion), 1);
}

#[tokio::test]
async fn test_save_form_saves_drafts_then_keeps_id() {
    let store = InMemoryStore::new();
    let mut builder = blank(&store, Permissions::all());
    builder.set_title("  Onboarding  ");
    let name = builder.add_new_question(QuestionType::Text);
    builder
        .update_question(&name, QuestionPatch::new().title("Preferred name"))
        .unwrap();
    builder.set_required(&name, true).unwrap();
    builder.add_new_question(QuestionType::Scale);

    let form = builder.save_form().await.unwrap();
    let form_id = form.id.clone().unwrap();
    assert_eq!(form.title, "Onboarding");
    assert_eq!(form.questions.len(), 2);
    assert!(form.questions[0].required);
    assert!(form.questions.iter().all(|entry| entry.question_id.is_persisted()));
    assert_eq!(builder.form_id(), Some(form_id.as_str()));
    assert!(!builder.has_unsaved_changes());
    assert_eq!(store.calls(Operation::CreateQuestion), 2);

    builder.set_description(Some("For new starters".into()));
    let again = builder.save_form().await.unwrap();
    assert_eq!(again.id.as_deref(), Some(form_id.as_str()));
    assert_eq!(store.calls(Operation::CreateForm), 1);
    assert_eq!(store.calls(Operation::UpdateForm), 1);
    assert_eq!(store.forms().len(), 1);
}

#[tokio::test]
async fn test_reorder_is_persisted_only_on_save() {
    let store = wellbeing_store();
    let mut builder = open_wellbeing(&store).await;
    builder.move_question(0, 2).unwrap();
    assert_eq!(
        &ids(&builder)[..3],
        ["q-workload", "q-contract", "q-department"]
    );
    let orders: Vec<u32> = builder.questions().iter().map(|entry| entry.order).collect();
    assert_eq!(orders, [1, 2, 3, 4, 5, 6]);

    let stored = store.form(WELLBEING_FORM_ID).unwrap();
    assert_eq!(stored.questions[0].question_id, QuestionId::from("q-department"));

    builder.save_form().await.unwrap();
    let stored = store.form(WELLBEING_FORM_ID).unwrap();
    assert_eq!(stored.questions[0].question_id, QuestionId::from("q-workload"));
    assert_eq!(stored.questions[2].question_id, QuestionId::from("q-department"));
    assert_eq!(stored.questions[2].order, 3);
    assert_eq!(stored.assigned_users.len(), 2);
}

#[tokio::test]
async fn test_edited_question_is_saved_with_form() {
    let store = wellbeing_store();
    let mut builder = open_wellbeing(&store).await;
    let comments = QuestionId::from("q-comments");
    builder
        .update_question(&comments, QuestionPatch::new().title("Other comments"))
        .unwrap();
    assert!(builder.has_unsaved_changes());

    builder.save_form().await.unwrap();
    assert_eq!(store.calls(Operation::UpdateQuestion), 1);
    let stored = store
        .questions()
        .into_iter()
        .find(|question| question.id == comments)
        .unwrap();
    assert_eq!(stored.title, "Other comments");
    assert!(!builder.has_unsaved_changes());
}

#[tokio::test]
async fn test_delete_refused_while_active_form_uses_question() {
    let store = wellbeing_store();
    let mut builder = open_wellbeing(&store).await;
    let contract = QuestionId::from("q-contract");

    assert_eq!(
        builder.delete_question(&contract).await,
        Err(BuilderError::InUse(contract.clone()))
    );
    assert_eq!(store.calls(Operation::DeleteQuestion), 0);
    assert!(builder.schema().contains(&contract));
    assert!(store.questions().iter().any(|question| question.id == contract));

    let ada = Respondent::new("u-ada");
    let responses = Arc::new(store.responses_for(&ada));
    let wizard = WizardEngine::load(&store, responses, &ada, &EngineConfig::default()).await;
    assert_eq!(wizard.state(), &WizardState::Answering { step: 0 });
}

#[tokio::test]
async fn test_delete_after_removing_from_saved_form() {
    let store = wellbeing_store();
    let mut builder = open_wellbeing(&store).await;
    let contract = QuestionId::from("q-contract");
    builder.select(&contract).unwrap();

    builder.remove_question(&contract);
    builder.save_form().await.unwrap();
    builder.delete_question(&contract).await.unwrap();

    assert!(!builder.schema().contains(&contract));
    assert!(builder.selected_question().is_none());
    assert!(store.questions().iter().all(|question| question.id != contract));
    let stored = store.form(WELLBEING_FORM_ID).unwrap();
    assert_eq!(stored.questions.len(), 5);
    assert!(stored.questions.iter().all(|entry| entry.question_id != contract));

    let ada = Respondent::new("u-ada");
    let responses = Arc::new(store.responses_for(&ada));
    let wizard = WizardEngine::load(&store, responses, &ada, &EngineConfig::default()).await;
    assert_eq!(wizard.current_question().unwrap().total, 5);
}

#[tokio::test]
async fn test_inactive_form_question_can_be_deleted() {
    let store = InMemoryStore::new();
    for question in wellbeing_questions() {
        store.insert_question(question);
    }
    let mut form = wellbeing_form();
    form.is_active = false;
    store.insert_form(form);
    let mut builder = open_wellbeing(&store).await;
    let contract = QuestionId::from("q-contract");

    builder.delete_question(&contract).await.unwrap();
    assert!(!builder.schema().contains(&contract));
    assert_eq!(builder.schema().len(), 5);
    assert!(builder.has_unsaved_changes());
}

#[tokio::test]
async fn test_failed_form_save_keeps_state_for_retry() {
    let store = InMemoryStore::new();
    let mut builder = blank(&store, Permissions::all());
    builder.set_title("Pulse");
    let draft = builder.add_new_question(QuestionType::Date);
    store.fail(Operation::CreateQuestion, "service unavailable");

    assert_eq!(
        builder.save_form().await,
        Err(BuilderError::Repository(RepositoryError::new(
            "service unavailable"
        )))
    );
    assert!(builder.schema().contains(&draft));
    assert!(builder.has_unsaved_changes());
    assert_eq!(store.calls(Operation::CreateForm), 0);

    builder.save_form().await.unwrap();
    assert!(!builder.schema().contains(&draft));
    assert_eq!(store.forms().len(), 1);
}

#[tokio::test]
async fn test_pending_drafts_need_question_permission() {
    let store = InMemoryStore::new();
    let mut builder = blank(
        &store,
        Permissions {
            manage_questions: false,
            manage_forms: true,
        },
    );
    builder.set_title("Pulse");
    builder.add_new_question(QuestionType::Text);
    assert_eq!(
        builder.save_form().await,
        Err(BuilderError::Forbidden(Capability::ManageQuestions))
    );
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn test_existing_question_picker() {
    let store = wellbeing_store();
    for question in course_feedback_questions() {
        store.insert_question(question);
    }
    let mut builder = blank(&store, Permissions::all());
    assert_eq!(builder.load_question_bank().await.unwrap(), 10);

    let scales =
        builder.filtered_existing_questions(&QuestionFilter::new().with_kind(QuestionType::Scale));
    assert_eq!(scales.len(), 2);

    let workload = scales
        .iter()
        .find(|question| question.title.contains("workload"))
        .map(|question| (*question).clone())
        .unwrap();
    builder.add_existing_question(workload).unwrap();

    let scales =
        builder.filtered_existing_questions(&QuestionFilter::new().with_kind(QuestionType::Scale));
    assert_eq!(scales.len(), 1);
    assert_eq!(scales[0].title, "Overall rating");

    let found = builder.filtered_existing_questions(&QuestionFilter::new().with_search("COURSE"));
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_open_unknown_form_reports_repository_message() {
    let store = InMemoryStore::new();
    let result = BuilderEngine::open(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Permissions::all(),
        EngineConfig::default(),
        "missing",
    )
    .await;
    assert!(matches!(
        result,
        Err(BuilderError::Repository(error)) if error.message() == "form missing not found"
    ));
}
