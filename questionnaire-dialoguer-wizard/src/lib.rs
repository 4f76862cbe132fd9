//! # questionnaire-dialoguer-wizard
//!
//! Dialoguer host for the questionnaire [`WizardEngine`](questionnaire::WizardEngine).
//!
//! Questions are presented one per step in a classic CLI wizard style, with a
//! prompt matching each question type, followed by a review screen from which
//! answers can be edited or submitted.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use questionnaire::{EngineConfig, InMemoryStore, Respondent, WizardEngine};
//! use questionnaire_dialoguer_wizard::DialoguerWizard;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = InMemoryStore::new();
//!     let respondent = Respondent::new("u-ada");
//!     let responses = Arc::new(store.responses_for(&respondent));
//!     let mut wizard =
//!         WizardEngine::load(&store, responses, &respondent, &EngineConfig::default()).await;
//!     DialoguerWizard::new().run(&mut wizard).await?;
//!     Ok(())
//! }
//! ```

mod host;

pub use host::{DialoguerError, DialoguerWizard, Finish};
