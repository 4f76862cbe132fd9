//! The ordered, validated composition of question references in one form.

use std::collections::HashSet;

use crate::{FormQuestion, FormQuestionPayload, IntegrityError, QuestionId};

/// A form's question references, in order.
///
/// The schema owns the `order` numbering: after construction and after every
/// mutation the orders are exactly `1..=len`, and no question is referenced
/// twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSchema {
    entries: Vec<FormQuestion>,
}

impl FormSchema {
    /// An empty schema.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a schema from stored form questions.
    ///
    /// The input may be in any order, but its `order` values must be a
    /// permutation of `1..=len` and every question may appear only once.
    pub fn from_form_questions(mut questions: Vec<FormQuestion>) -> Result<Self, IntegrityError> {
        questions.sort_by_key(|question| question.order);

        let len = questions.len();
        let mut seen = HashSet::new();
        let mut previous = 0;
        for (index, question) in questions.iter().enumerate() {
            if question.order == previous && index > 0 {
                return Err(IntegrityError::DuplicateOrder(question.order));
            }
            if usize::try_from(question.order).ok() != Some(index + 1) {
                return Err(IntegrityError::OrderGap {
                    len,
                    found: question.order,
                });
            }
            if !seen.insert(&question.question_id) {
                return Err(IntegrityError::DuplicateReference(
                    question.question_id.clone(),
                ));
            }
            previous = question.order;
        }

        Ok(Self { entries: questions })
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Question steps plus the review step, which is always last.
    pub fn total_steps(&self) -> usize {
        self.entries.len() + 1
    }

    /// Index of the review step.
    pub fn review_step(&self) -> usize {
        self.entries.len()
    }

    /// The question shown at `step`; `None` for the review step and beyond.
    pub fn question_at(&self, step: usize) -> Option<&FormQuestion> {
        self.entries.get(step)
    }

    pub fn entries(&self) -> &[FormQuestion] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormQuestion> {
        self.entries.iter()
    }

    pub fn contains(&self, question_id: &QuestionId) -> bool {
        self.position(question_id).is_some()
    }

    /// Zero-based step of a question.
    pub fn position(&self, question_id: &QuestionId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| &entry.question_id == question_id)
    }

    pub fn get(&self, question_id: &QuestionId) -> Option<&FormQuestion> {
        self.entries
            .iter()
            .find(|entry| &entry.question_id == question_id)
    }

    /// Insert a reference at `at` (clamped to the end).
    ///
    /// The incoming `order` is ignored; all orders are renumbered.
    pub fn insert_question(
        &mut self,
        question: FormQuestion,
        at: usize,
    ) -> Result<(), IntegrityError> {
        if self.contains(&question.question_id) {
            return Err(IntegrityError::DuplicateReference(question.question_id));
        }
        let at = at.min(self.entries.len());
        self.entries.insert(at, question);
        self.renumber();
        Ok(())
    }

    /// Append a reference to `question_id`.
    pub fn push_question(
        &mut self,
        question_id: QuestionId,
        required: bool,
    ) -> Result<(), IntegrityError> {
        let at = self.entries.len();
        self.insert_question(FormQuestion::new(question_id, 0, required), at)
    }

    /// Remove the reference to `question_id`.
    ///
    /// Removing a question that is not present is a no-op; returns whether
    /// anything was removed.
    pub fn remove_question(&mut self, question_id: &QuestionId) -> bool {
        let Some(index) = self.position(question_id) else {
            return false;
        };
        self.entries.remove(index);
        self.renumber();
        true
    }

    /// Move the question at `from` so it ends up at `to` (splice semantics).
    pub fn move_question(&mut self, from: usize, to: usize) -> Result<(), IntegrityError> {
        let len = self.entries.len();
        for index in [from, to] {
            if index >= len {
                return Err(IntegrityError::IndexOutOfRange { index, len });
            }
        }
        if from != to {
            let moved = self.entries.remove(from);
            self.entries.insert(to, moved);
            self.renumber();
        }
        Ok(())
    }

    /// Replace every reference to `old` with `new`.
    ///
    /// Returns whether `old` was present. Fails if `new` is already
    /// referenced, since that would create a duplicate.
    pub fn replace_id(
        &mut self,
        old: &QuestionId,
        new: QuestionId,
    ) -> Result<bool, IntegrityError> {
        if old == &new {
            return Ok(self.contains(old));
        }
        if self.contains(&new) {
            return Err(IntegrityError::DuplicateReference(new));
        }
        let mut replaced = false;
        for entry in self
            .entries
            .iter_mut()
            .filter(|entry| &entry.question_id == old)
        {
            entry.question_id = new.clone();
            replaced = true;
        }
        Ok(replaced)
    }

    /// Set the per-form required override; returns whether the question exists.
    pub fn set_required(&mut self, question_id: &QuestionId, required: bool) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| &entry.question_id == question_id)
        {
            Some(entry) => {
                entry.required = required;
                true
            }
            None => false,
        }
    }

    pub fn to_form_questions(&self) -> Vec<FormQuestion> {
        self.entries.clone()
    }

    /// The wire form of the schema. Fails on the first draft reference.
    pub fn to_payload(&self) -> Result<Vec<FormQuestionPayload>, IntegrityError> {
        self.entries
            .iter()
            .map(|entry| {
                let question_id = entry
                    .question_id
                    .as_persisted()
                    .ok_or_else(|| IntegrityError::DraftOnWire(entry.question_id.clone()))?;
                Ok(FormQuestionPayload {
                    question_id: question_id.to_string(),
                    order: entry.order,
                    required: entry.required,
                })
            })
            .collect()
    }

    fn renumber(&mut self) {
        for (order, entry) in (1u32..).zip(self.entries.iter_mut()) {
            entry.order = order;
        }
    }
}
