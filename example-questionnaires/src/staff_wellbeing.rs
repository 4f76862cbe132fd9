use questionnaire_types::{Form, FormQuestion, Question, QuestionType, UserRef, ValidationRules};

pub const WELLBEING_FORM_ID: &str = "form-wellbeing";

/// One question of every type.
pub fn wellbeing_questions() -> Vec<Question> {
    vec![
        Question::new("q-department", "Department", QuestionType::Dropdown)
            .with_choices([
                ("Administration", "administration"),
                ("Teaching", "teaching"),
                ("Research", "research"),
                ("Facilities", "facilities"),
            ])
            .required(true),
        Question::new("q-workload", "How manageable is your workload?", QuestionType::Scale)
            .with_options(QuestionType::scale_options(1..=5))
            .with_description("1 is unmanageable, 5 is comfortable"),
        Question::new("q-contract", "Contract type", QuestionType::MultipleChoice)
            .with_choices([
                ("Full time", "full_time"),
                ("Part time", "part_time"),
                ("Fixed term", "fixed_term"),
            ]),
        Question::new("q-support", "Which support would help you?", QuestionType::Checkbox)
            .with_choices([
                ("Flexible hours", "flexible_hours"),
                ("Mentoring", "mentoring"),
                ("Training budget", "training"),
                ("Quiet workspace", "workspace"),
            ]),
        Question::new("q-last-leave", "When did you last take leave?", QuestionType::Date),
        Question::new("q-comments", "Anything else you want to tell us?", QuestionType::Text)
            .with_validation(ValidationRules {
                max_length: Some(500),
                ..Default::default()
            }),
    ]
}

/// The wellbeing survey, assigned to two staff members.
///
/// The workload question is required on this form even though the question
/// itself is optional.
pub fn wellbeing_form() -> Form {
    let mut form = Form::new("Staff wellbeing survey")
        .with_id(WELLBEING_FORM_ID)
        .with_description("Anonymous yearly survey. Takes about five minutes.")
        .with_questions(vec![
            FormQuestion::new("q-department", 1, true),
            FormQuestion::new("q-workload", 2, true),
            FormQuestion::new("q-contract", 3, false),
            FormQuestion::new("q-support", 4, false),
            FormQuestion::new("q-last-leave", 5, false),
            FormQuestion::new("q-comments", 6, false),
        ]);
    form.assigned_users = vec![
        UserRef::new("u-ada").with_name("Ada"),
        UserRef::new("u-grace").with_name("Grace"),
    ];
    form
}
