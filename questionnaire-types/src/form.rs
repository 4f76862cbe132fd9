use serde::{Deserialize, Serialize};

use crate::QuestionId;

/// A staff member or respondent a form is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A form's reference to a question.
///
/// This is not a copy of the question: it only names it, places it, and
/// decides whether this form requires an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormQuestion {
    pub question_id: QuestionId,

    /// One-based position, dense and unique within the form.
    pub order: u32,

    /// Required override for this form; takes precedence over the
    /// question's own `validation.required`.
    pub required: bool,
}

impl FormQuestion {
    pub fn new(question_id: impl Into<QuestionId>, order: u32, required: bool) -> Self {
        Self {
            question_id: question_id.into(),
            order,
            required,
        }
    }
}

/// Where a form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    /// Never saved; no id yet.
    Draft,

    /// Saved and offered to respondents.
    Persisted,

    /// Saved, no longer offered, kept for historical responses.
    Deactivated,
}

/// A form: an ordered composition of question references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    /// Absent until the first successful save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub questions: Vec<FormQuestion>,

    #[serde(default)]
    pub assigned_users: Vec<UserRef>,

    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl Form {
    /// A new, unsaved, active form without questions.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            questions: Vec::new(),
            assigned_users: Vec::new(),
            is_active: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_questions(mut self, questions: Vec<FormQuestion>) -> Self {
        self.questions = questions;
        self
    }

    pub fn status(&self) -> FormStatus {
        match (&self.id, self.is_active) {
            (None, _) => FormStatus::Draft,
            (Some(_), true) => FormStatus::Persisted,
            (Some(_), false) => FormStatus::Deactivated,
        }
    }
}

/// Form body sent to the form repository on create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPayload {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub questions: Vec<FormQuestionPayload>,

    /// Ids of the assigned users.
    #[serde(default)]
    pub assigned_users: Vec<String>,

    pub is_active: bool,
}

/// Wire form of a [`FormQuestion`]; only persisted ids can be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormQuestionPayload {
    pub question_id: String,
    pub order: u32,
    pub required: bool,
}
