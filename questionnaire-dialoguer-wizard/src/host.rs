//! Dialoguer prompts driving a [`WizardEngine`].

use dialoguer::theme::{ColorfulTheme, SimpleTheme, Theme};
use dialoguer::{FuzzySelect, Input, MultiSelect, Select};
use questionnaire::{
    AnswerValue, CurrentQuestion, QuestionType, WizardEngine, WizardError, WizardState,
};
use thiserror::Error;

/// Label of the extra item that leaves an optional choice unanswered.
const SKIP: &str = "(skip)";

/// Error type for the Dialoguer host.
#[derive(Debug, Error)]
pub enum DialoguerError {
    /// User cancelled the questionnaire (e.g., pressed Ctrl+C or Escape).
    #[error("Questionnaire cancelled by user")]
    Cancelled,

    /// An I/O error occurred during prompting.
    #[error("Dialoguer error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// The wizard refused an operation it should have accepted.
    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finish {
    Submitted,
    AlreadyAnswered,
    NothingToAnswer,
    LoadFailed(String),
}

enum ReviewChoice {
    Submit,
    Edit(usize),
}

/// Helper to check if a dialoguer error is a cancellation (Ctrl+C / Escape)
fn is_cancelled(err: &dialoguer::Error) -> bool {
    matches!(err, dialoguer::Error::IO(io_err) if io_err.kind() == std::io::ErrorKind::Interrupted)
}

fn interact<T>(result: dialoguer::Result<T>) -> Result<T, DialoguerError> {
    result.map_err(|err| {
        if is_cancelled(&err) {
            DialoguerError::Cancelled
        } else {
            DialoguerError::Dialoguer(err)
        }
    })
}

/// Interactive CLI host for a respondent wizard.
#[derive(Debug, Clone)]
pub struct DialoguerWizard {
    /// Use colorful theme for prompts.
    colorful: bool,
}

impl Default for DialoguerWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl DialoguerWizard {
    /// Create a host with the colorful theme.
    pub fn new() -> Self {
        Self { colorful: true }
    }

    /// Create a host with plain (no color) prompts.
    pub fn plain() -> Self {
        Self { colorful: false }
    }

    fn theme(&self) -> Box<dyn Theme> {
        if self.colorful {
            Box::new(ColorfulTheme::default())
        } else {
            Box::new(SimpleTheme)
        }
    }

    /// Prompt until the wizard reaches a final state.
    ///
    /// Validation problems and failed submissions are printed and the
    /// respondent is asked again.
    pub async fn run(&self, wizard: &mut WizardEngine) -> Result<Finish, DialoguerError> {
        let theme = self.theme();
        let mut editing = false;

        loop {
            if let Some(current) = wizard.current_question() {
                let question_id = current.question.id.clone();
                match self.ask(theme.as_ref(), &current)? {
                    Some(value) => wizard.set_answer(&question_id, value)?,
                    None => wizard.clear_answer(&question_id)?,
                }
                let moved = if editing {
                    wizard.back_to_review()
                } else {
                    wizard.next()
                };
                match moved {
                    Ok(()) => {}
                    Err(WizardError::Validation(error)) => println!("Error: {error}"),
                    Err(error) => return Err(error.into()),
                }
                continue;
            }

            let state = wizard.state().clone();
            match state {
                WizardState::Review => {
                    editing = true;
                    match self.review(theme.as_ref(), wizard)? {
                        ReviewChoice::Submit => match wizard.submit().await {
                            Ok(()) => {}
                            Err(WizardError::Repository(error)) => {
                                println!("Submission failed: {error}");
                            }
                            Err(WizardError::Validation(error)) => println!("Error: {error}"),
                            Err(error) => return Err(error.into()),
                        },
                        ReviewChoice::Edit(step) => wizard.edit_question(step)?,
                    }
                }
                WizardState::Success => {
                    println!("Thank you, your answers were recorded.");
                    return Ok(Finish::Submitted);
                }
                WizardState::AlreadyAnswered => {
                    match wizard.response_date() {
                        Some(date) => println!(
                            "You already answered this form on {}.",
                            date.format("%Y-%m-%d")
                        ),
                        None => println!("You already answered this form."),
                    }
                    return Ok(Finish::AlreadyAnswered);
                }
                WizardState::EmptyForm => {
                    println!("There is no form for you to answer right now.");
                    return Ok(Finish::NothingToAnswer);
                }
                WizardState::LoadError { message } => {
                    println!("Could not load the form: {message}");
                    return Ok(Finish::LoadFailed(message));
                }
                WizardState::Answering { .. } | WizardState::Submitting => {
                    return Err(WizardError::InvalidTransition {
                        operation: "prompt",
                        state,
                    }
                    .into());
                }
            }
        }
    }

    /// Ask one question; `None` means no answer.
    fn ask(
        &self,
        theme: &dyn Theme,
        current: &CurrentQuestion<'_>,
    ) -> Result<Option<AnswerValue>, DialoguerError> {
        let question = current.question;
        if let Some(description) = &question.description {
            println!("{description}");
        }

        let mut prompt = format!("[{}/{}] {}", current.step + 1, current.total, question.title);
        if question.kind == QuestionType::Date {
            prompt.push_str(" (YYYY-MM-DD)");
        }
        if current.required {
            prompt.push_str(" *");
        }

        let answer = match question.kind {
            QuestionType::Text => self.ask_text(theme, &prompt, current)?.map(AnswerValue::Text),
            QuestionType::Date => self.ask_text(theme, &prompt, current)?.map(AnswerValue::Date),
            QuestionType::MultipleChoice | QuestionType::Scale => self
                .ask_choice(theme, &prompt, current, false)?
                .and_then(|value| AnswerValue::single(question.kind, value)),
            QuestionType::Dropdown => self
                .ask_choice(theme, &prompt, current, true)?
                .map(AnswerValue::Dropdown),
            QuestionType::Checkbox => self.ask_checkbox(theme, &prompt, current)?,
        };
        Ok(answer)
    }

    fn ask_text(
        &self,
        theme: &dyn Theme,
        prompt: &str,
        current: &CurrentQuestion<'_>,
    ) -> Result<Option<String>, DialoguerError> {
        let mut input = Input::<String>::with_theme(theme)
            .with_prompt(prompt)
            .allow_empty(!current.required);
        if let Some(existing) = current.answer.and_then(AnswerValue::as_str) {
            input = input.with_initial_text(existing);
        }
        let text = interact(input.interact_text())?;
        Ok(Some(text).filter(|text| !text.trim().is_empty()))
    }

    fn ask_choice(
        &self,
        theme: &dyn Theme,
        prompt: &str,
        current: &CurrentQuestion<'_>,
        fuzzy: bool,
    ) -> Result<Option<String>, DialoguerError> {
        let options = &current.question.options;
        let mut items: Vec<&str> = options.iter().map(|option| option.label.as_str()).collect();
        if !current.required {
            items.push(SKIP);
        }
        let default = current
            .answer
            .and_then(AnswerValue::as_str)
            .and_then(|value| options.iter().position(|option| option.value == value))
            .unwrap_or(0);

        let index = if fuzzy {
            interact(
                FuzzySelect::with_theme(theme)
                    .with_prompt(prompt)
                    .items(&items)
                    .default(default)
                    .interact(),
            )?
        } else {
            interact(
                Select::with_theme(theme)
                    .with_prompt(prompt)
                    .items(&items)
                    .default(default)
                    .interact(),
            )?
        };

        // The skip item sits past the last option
        Ok(options.get(index).map(|option| option.value.clone()))
    }

    fn ask_checkbox(
        &self,
        theme: &dyn Theme,
        prompt: &str,
        current: &CurrentQuestion<'_>,
    ) -> Result<Option<AnswerValue>, DialoguerError> {
        let options = &current.question.options;
        let items: Vec<&str> = options.iter().map(|option| option.label.as_str()).collect();
        let previous = current
            .answer
            .and_then(AnswerValue::as_selections)
            .unwrap_or_default();
        let defaults: Vec<bool> = options
            .iter()
            .map(|option| previous.contains(&option.value))
            .collect();

        let indices = interact(
            MultiSelect::with_theme(theme)
                .with_prompt(prompt)
                .items(&items)
                .defaults(&defaults)
                .interact(),
        )?;
        let chosen: Vec<&String> = indices
            .iter()
            .filter_map(|&index| options.get(index))
            .map(|option| &option.value)
            .collect();

        // Earlier selections keep their place, new ones follow in option order
        let kept = previous.iter().filter(|value| chosen.contains(value));
        let added = chosen.iter().copied().filter(|value| !previous.contains(*value));
        let answer = AnswerValue::checkbox(kept.chain(added).cloned());
        Ok(Some(answer).filter(|answer| !answer.is_empty()))
    }

    fn review(
        &self,
        theme: &dyn Theme,
        wizard: &WizardEngine,
    ) -> Result<ReviewChoice, DialoguerError> {
        if let Some(form) = wizard.form() {
            println!();
            println!("{}: review your answers", form.title);
        }
        let rows = wizard.review_rows();
        for row in &rows {
            let marker = if row.required { "*" } else { " " };
            println!("{marker} {}: {}", row.title, row.answer);
        }
        let progress = wizard.progress();
        println!("{} of {} answered", progress.answered, progress.total);
        if let Some(error) = wizard.last_error() {
            println!("Last submission failed: {error}");
        }

        let mut items = vec!["Submit".to_string()];
        items.extend(rows.iter().map(|row| format!("Edit: {}", row.title)));
        let index = interact(
            Select::with_theme(theme)
                .with_prompt("What next?")
                .items(&items)
                .default(0)
                .interact(),
        )?;

        Ok(match index.checked_sub(1).and_then(|row| rows.get(row)) {
            Some(row) => ReviewChoice::Edit(row.step),
            None => ReviewChoice::Submit,
        })
    }
}
