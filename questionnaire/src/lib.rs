//! Form definition and response engine.
//!
//! Staff compose forms from reusable, typed questions with the
//! [`BuilderEngine`]; respondents answer them step by step with the
//! [`WizardEngine`]. Both engines are presentation-agnostic: a host renders
//! their state and calls their operations, and all persistence goes through
//! the [`FormRepository`], [`QuestionRepository`] and [`ResponseRepository`]
//! traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use questionnaire::{EngineConfig, InMemoryStore, Respondent, WizardEngine, WizardState};
//!
//! let store = InMemoryStore::new();
//! let respondent = Respondent::new("alice");
//! let responses = Arc::new(store.responses_for(&respondent));
//! let mut wizard =
//!     WizardEngine::load(&store, responses, &respondent, &EngineConfig::default()).await;
//!
//! while let Some(current) = wizard.current_question() {
//!     // prompt for `current.question`, then `wizard.set_answer(..)` and `wizard.next()`
//! }
//! wizard.submit().await?;
//! assert_eq!(wizard.state(), &WizardState::Success);
//! ```

// Re-export the data model
pub use questionnaire_types::*;

mod config;
pub use config::EngineConfig;

mod codec;
pub use codec::AnswerCodec;

mod schema;
pub use schema::FormSchema;

mod catalog;
pub use catalog::{QuestionCatalog, ResolvedQuestion};

mod permissions;
pub use permissions::{Capability, Permissions};

mod repository;
pub use repository::{
    ActiveForm, FormRepository, QuestionRepository, Respondent, ResponseRepository, SubmitOutcome,
};

mod wizard;
pub use wizard::{CurrentQuestion, Progress, ReviewRow, WizardEngine, WizardError, WizardState};

mod builder;
pub use builder::{AddOutcome, BuilderEngine, BuilderError, BuilderQuestion, QuestionFilter};

// In-memory repositories for tests and demos
mod in_memory;
pub use in_memory::{InMemoryResponses, InMemoryStore, Operation};
