use std::collections::HashMap;

use crate::{FormQuestion, FormSchema, IntegrityError, Question, QuestionId};

/// Questions by id: the definitions a schema's references point at.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    questions: HashMap<QuestionId, Question>,
}

/// A schema entry together with the question it references.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedQuestion<'a> {
    pub form_question: &'a FormQuestion,
    pub question: &'a Question,
}

impl ResolvedQuestion<'_> {
    /// Whether this form requires an answer; the form's override wins.
    pub fn required(&self) -> bool {
        self.form_question.required
    }
}

impl QuestionCatalog {
    pub fn new() -> Self {
        Self {
            questions: HashMap::new(),
        }
    }

    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            questions: questions
                .into_iter()
                .map(|question| (question.id.clone(), question))
                .collect(),
        }
    }

    /// Add or replace a question; returns the previous definition.
    pub fn insert(&mut self, question: Question) -> Option<Question> {
        self.questions.insert(question.id.clone(), question)
    }

    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.get(id)
    }

    pub fn get_mut(&mut self, id: &QuestionId) -> Option<&mut Question> {
        self.questions.get_mut(id)
    }

    pub fn remove(&mut self, id: &QuestionId) -> Option<Question> {
        self.questions.remove(id)
    }

    pub fn contains(&self, id: &QuestionId) -> bool {
        self.questions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    /// Pair every schema entry with its question, in schema order.
    pub fn resolve<'a>(
        &'a self,
        schema: &'a FormSchema,
    ) -> Result<Vec<ResolvedQuestion<'a>>, IntegrityError> {
        schema
            .iter()
            .map(|form_question| {
                self.get(&form_question.question_id)
                    .map(|question| ResolvedQuestion {
                        form_question,
                        question,
                    })
                    .ok_or_else(|| {
                        IntegrityError::MissingQuestion(form_question.question_id.clone())
                    })
            })
            .collect()
    }

    /// Check that every referenced question exists and has options that fit
    /// its type.
    pub fn verify(&self, schema: &FormSchema) -> Result<(), IntegrityError> {
        for resolved in self.resolve(schema)? {
            let question = resolved.question;
            question.kind.validate_options(&question.options).map_err(|violation| {
                IntegrityError::InvalidOptions {
                    question_id: question.id.clone(),
                    violation,
                }
            })?;
        }
        Ok(())
    }
}
