//! Compose a form with the builder, then answer it in the terminal.
//!
//! Run with: cargo run -p questionnaire-dialoguer-wizard --example compose_and_answer

use std::sync::Arc;

use example_questionnaires::course_feedback_questions;
use questionnaire::{
    BuilderEngine, EngineConfig, InMemoryStore, Permissions, QuestionFilter, QuestionOption,
    QuestionPatch, QuestionType, Respondent, WizardEngine,
};
use questionnaire_dialoguer_wizard::DialoguerWizard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = InMemoryStore::new();
    for question in course_feedback_questions() {
        store.insert_question(question);
    }

    let config = EngineConfig::new().with_scale_range(1..=5);
    let mut builder = BuilderEngine::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Permissions::all(),
        config.clone(),
    );
    builder.load_question_bank().await?;
    builder.set_title("Lab session feedback");

    let reused: Vec<_> = builder
        .filtered_existing_questions(&QuestionFilter::new().with_search("course"))
        .into_iter()
        .cloned()
        .collect();
    for question in reused {
        builder.add_existing_question(question)?;
    }

    let pace = builder.add_new_question(QuestionType::MultipleChoice);
    builder.update_question(
        &pace,
        QuestionPatch::new().title("How was the pace?").options(vec![
            QuestionOption::new("Too slow", "slow"),
            QuestionOption::new("Just right", "right"),
            QuestionOption::new("Too fast", "fast"),
        ]),
    )?;
    builder.set_required(&pace, true)?;

    let confidence = builder.add_new_question(QuestionType::Scale);
    builder.update_question(
        &confidence,
        QuestionPatch::new().title("How confident do you feel with the material?"),
    )?;
    builder.move_question(2, 1)?;

    let form = builder.save_form().await?;
    println!("Saved form {:?} with {} questions", form.id, form.questions.len());

    let respondent = Respondent::new("u-student");
    let responses = Arc::new(store.responses_for(&respondent));
    let mut wizard = WizardEngine::load(&store, responses, &respondent, &config).await;
    DialoguerWizard::new().run(&mut wizard).await?;
    Ok(())
}
