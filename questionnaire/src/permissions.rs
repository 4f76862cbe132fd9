/// Capabilities the host grants to a builder session.
///
/// The engine never decides who may do what; it only refuses operations whose
/// capability is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    /// Create, update and delete reusable questions.
    pub manage_questions: bool,

    /// Create and update forms.
    pub manage_forms: bool,
}

impl Permissions {
    /// Every capability.
    pub fn all() -> Self {
        Self {
            manage_questions: true,
            manage_forms: true,
        }
    }

    /// No capability; local edits still work but nothing can be saved.
    pub fn none() -> Self {
        Self::default()
    }
}

/// A builder capability, named in [`BuilderError::Forbidden`](crate::BuilderError::Forbidden).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageQuestions,
    ManageForms,
}

impl Capability {
    pub(crate) fn granted_by(self, permissions: &Permissions) -> bool {
        match self {
            Self::ManageQuestions => permissions.manage_questions,
            Self::ManageForms => permissions.manage_forms,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManageQuestions => write!(f, "manage questions"),
            Self::ManageForms => write!(f, "manage forms"),
        }
    }
}
