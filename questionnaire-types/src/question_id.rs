use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Locally generated identity of a question that has never been saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftToken(Uuid);

impl DraftToken {
    /// Generate a fresh, random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DraftToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "draft-{}", self.0)
    }
}

/// Identity of a question.
///
/// A question is either a draft, known only to the builder that created it,
/// or persisted, carrying the opaque id the question repository issued. The
/// two can never be confused with each other: a draft is promoted exactly
/// once, when the question is first saved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionId {
    Draft(DraftToken),
    Persisted(String),
}

impl QuestionId {
    /// A new draft id.
    pub fn draft() -> Self {
        Self::Draft(DraftToken::generate())
    }

    pub fn persisted(id: impl Into<String>) -> Self {
        Self::Persisted(id.into())
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft(_))
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }

    /// The repository id, if this question has been saved.
    pub fn as_persisted(&self) -> Option<&str> {
        match self {
            Self::Persisted(id) => Some(id),
            Self::Draft(_) => None,
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft(token) => token.fmt(f),
            Self::Persisted(id) => f.write_str(id),
        }
    }
}

impl From<String> for QuestionId {
    fn from(id: String) -> Self {
        Self::Persisted(id)
    }
}

impl From<&str> for QuestionId {
    fn from(id: &str) -> Self {
        Self::Persisted(id.to_string())
    }
}

impl From<DraftToken> for QuestionId {
    fn from(token: DraftToken) -> Self {
        Self::Draft(token)
    }
}
