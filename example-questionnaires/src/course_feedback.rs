use questionnaire_types::{Form, FormQuestion, Question, QuestionType, ValidationRules};

pub const COURSE_FORM_ID: &str = "form-course-feedback";

pub fn course_feedback_questions() -> Vec<Question> {
    vec![
        Question::new("q-course-code", "Course code", QuestionType::Text)
            .with_validation(ValidationRules {
                required: true,
                pattern: Some("[A-Z]{2,4}[0-9]{3}".to_string()),
                ..Default::default()
            }),
        Question::new("q-rating", "Overall rating", QuestionType::Scale),
        Question::new("q-highlights", "What worked well?", QuestionType::Checkbox)
            .with_choices([
                ("Lectures", "lectures"),
                ("Labs", "labs"),
                ("Reading list", "reading"),
            ]),
        Question::new("q-suggestion", "One thing to improve", QuestionType::Text)
            .with_validation(ValidationRules {
                min_length: Some(10),
                max_length: Some(280),
                ..Default::default()
            }),
    ]
}

/// End-of-term feedback. No assigned users: every respondent gets it.
pub fn course_feedback_form() -> Form {
    Form::new("Course feedback")
        .with_id(COURSE_FORM_ID)
        .with_questions(vec![
            FormQuestion::new("q-course-code", 1, true),
            FormQuestion::new("q-rating", 2, true),
            FormQuestion::new("q-highlights", 3, false),
            FormQuestion::new("q-suggestion", 4, false),
        ])
}
