//! Answer the staff wellbeing survey in the terminal.
//!
//! Run with: cargo run -p questionnaire-dialoguer-wizard --example staff_wellbeing
//! Set RUST_LOG=questionnaire=debug to follow the wizard's transitions.

use std::sync::Arc;

use example_questionnaires::{wellbeing_form, wellbeing_questions};
use questionnaire::{EngineConfig, InMemoryStore, Respondent, WizardEngine};
use questionnaire_dialoguer_wizard::DialoguerWizard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let store = InMemoryStore::new();
    for question in wellbeing_questions() {
        store.insert_question(question);
    }
    store.insert_form(wellbeing_form());

    let respondent = Respondent::new("u-ada");
    let responses = Arc::new(store.responses_for(&respondent));
    let mut wizard =
        WizardEngine::load(&store, responses, &respondent, &EngineConfig::default()).await;

    let finish = DialoguerWizard::new().run(&mut wizard).await?;
    println!("{finish:?}");
    if let Some(response) = wizard.response() {
        println!("{}", serde_json::to_string_pretty(response)?);
    }
    Ok(())
}
