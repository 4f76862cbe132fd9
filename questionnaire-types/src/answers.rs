use std::collections::HashMap;

use crate::{AnswerValue, QuestionId};

/// A respondent's in-progress answers, keyed by question id.
///
/// Unanswered questions are simply absent; there are no placeholder values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers {
    values: HashMap<QuestionId, AnswerValue>,
}

impl Answers {
    /// Create a new empty answer set.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Record an answer, replacing any previous one.
    pub fn insert(&mut self, question_id: impl Into<QuestionId>, value: AnswerValue) {
        self.values.insert(question_id.into(), value);
    }

    pub fn get(&self, question_id: &QuestionId) -> Option<&AnswerValue> {
        self.values.get(question_id)
    }

    pub fn contains(&self, question_id: &QuestionId) -> bool {
        self.values.contains_key(question_id)
    }

    pub fn remove(&mut self, question_id: &QuestionId) -> Option<AnswerValue> {
        self.values.remove(question_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &AnswerValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the question has an answer that is not blank.
    ///
    /// A blank text or an empty checkbox selection counts as no answer.
    pub fn has_value(&self, question_id: &QuestionId) -> bool {
        self.get(question_id).is_some_and(|value| !value.is_empty())
    }
}

impl IntoIterator for Answers {
    type Item = (QuestionId, AnswerValue);
    type IntoIter = std::collections::hash_map::IntoIter<QuestionId, AnswerValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Answers {
    type Item = (&'a QuestionId, &'a AnswerValue);
    type IntoIter = std::collections::hash_map::Iter<'a, QuestionId, AnswerValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl FromIterator<(QuestionId, AnswerValue)> for Answers {
    fn from_iter<T: IntoIterator<Item = (QuestionId, AnswerValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
