//! The smallest useful form: one required text question and an optional
//! six-point scale.

use questionnaire_types::{Form, FormQuestion, Question, QuestionType};

pub const QUICK_CHECK_FORM_ID: &str = "form-quick-check";

pub fn quick_check_questions() -> Vec<Question> {
    vec![
        Question::new("q-how", "How was your week?", QuestionType::Text).required(true),
        Question::new("q-energy", "Energy level", QuestionType::Scale)
            .with_options(QuestionType::scale_options(0..=5))
            .with_description("0 is exhausted, 5 is full of energy"),
    ]
}

pub fn quick_check_form() -> Form {
    Form::new("Quick check-in")
        .with_id(QUICK_CHECK_FORM_ID)
        .with_questions(vec![
            FormQuestion::new("q-how", 1, true),
            FormQuestion::new("q-energy", 2, false),
        ])
}
