use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AnswerValue, AnswerViolation, IntegrityError, OptionsViolation, QuestionOption};

/// The scale a freshly created scale question offers.
pub const DEFAULT_SCALE_RANGE: RangeInclusive<i64> = 0..=10;

/// Date format accepted for date answers.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The supported question types.
///
/// Each type decides whether the question carries options and what shape its
/// answers take; see [`QuestionType::rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Free text answer.
    Text,

    /// Pick exactly one option.
    MultipleChoice,

    /// Pick any number of options, in selection order.
    Checkbox,

    /// Pick exactly one option from a collapsed list.
    Dropdown,

    /// Pick one point on an ordered integer scale.
    Scale,

    /// A calendar date.
    Date,
}

/// Whether a question type carries options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsRule {
    /// The question must not have options.
    Forbidden,

    /// At least one option, values unique within the question.
    Required,

    /// Like `Required`, and the values form a contiguous ascending integer run.
    RequiredNumeric,
}

/// The shape of an answer for a question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    /// Any string.
    FreeText,

    /// An ISO calendar date string.
    Date,

    /// A single string equal to one option's value.
    SingleOption,

    /// An ordered sequence of distinct option values.
    MultipleOptions,
}

/// Everything a question type imposes on its questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRules {
    pub options: OptionsRule,
    pub answer: AnswerShape,
}

impl QuestionType {
    const ALL: [QuestionType; 6] = [
        Self::Text,
        Self::MultipleChoice,
        Self::Checkbox,
        Self::Dropdown,
        Self::Scale,
        Self::Date,
    ];

    /// All question types, in the order a type picker shows them.
    pub fn all() -> &'static [QuestionType] {
        &Self::ALL
    }

    /// The wire tag of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::MultipleChoice => "multiple_choice",
            Self::Checkbox => "checkbox",
            Self::Dropdown => "dropdown",
            Self::Scale => "scale",
            Self::Date => "date",
        }
    }

    /// Human-readable name for pickers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::MultipleChoice => "Multiple choice",
            Self::Checkbox => "Checkboxes",
            Self::Dropdown => "Dropdown",
            Self::Scale => "Scale",
            Self::Date => "Date",
        }
    }

    pub fn rules(self) -> TypeRules {
        let (options, answer) = match self {
            Self::Text => (OptionsRule::Forbidden, AnswerShape::FreeText),
            Self::Date => (OptionsRule::Forbidden, AnswerShape::Date),
            Self::MultipleChoice | Self::Dropdown => {
                (OptionsRule::Required, AnswerShape::SingleOption)
            }
            Self::Checkbox => (OptionsRule::Required, AnswerShape::MultipleOptions),
            Self::Scale => (OptionsRule::RequiredNumeric, AnswerShape::SingleOption),
        };
        TypeRules { options, answer }
    }

    pub fn takes_options(self) -> bool {
        self.rules().options != OptionsRule::Forbidden
    }

    /// The options a freshly created question of this type starts with.
    ///
    /// Scales get `0..=10`; choice types get two placeholders so the new
    /// question is valid before the author edits it.
    pub fn default_options(self) -> Vec<QuestionOption> {
        match self.rules().options {
            OptionsRule::Forbidden => Vec::new(),
            OptionsRule::Required => vec![
                QuestionOption::new("Option 1", "option_1"),
                QuestionOption::new("Option 2", "option_2"),
            ],
            OptionsRule::RequiredNumeric => Self::scale_options(DEFAULT_SCALE_RANGE),
        }
    }

    /// One option per integer in `range`, label and value both the number.
    pub fn scale_options(range: RangeInclusive<i64>) -> Vec<QuestionOption> {
        range
            .map(|point| {
                let point = point.to_string();
                QuestionOption::new(point.clone(), point)
            })
            .collect()
    }

    /// Check an option list against this type's [`OptionsRule`].
    pub fn validate_options(self, options: &[QuestionOption]) -> Result<(), OptionsViolation> {
        let rule = self.rules().options;
        if rule == OptionsRule::Forbidden {
            return if options.is_empty() {
                Ok(())
            } else {
                Err(OptionsViolation::Forbidden(self))
            };
        }

        if options.is_empty() {
            return Err(OptionsViolation::Missing(self));
        }

        let mut seen = HashSet::new();
        for option in options {
            if !seen.insert(option.value.as_str()) {
                return Err(OptionsViolation::DuplicateValue(option.value.clone()));
            }
        }

        if rule == OptionsRule::RequiredNumeric {
            let mut previous: Option<i64> = None;
            for option in options {
                let point: i64 = option
                    .value
                    .trim()
                    .parse()
                    .map_err(|_| OptionsViolation::NotNumeric(option.value.clone()))?;
                if let Some(previous) = previous
                    && point != previous + 1
                {
                    return Err(OptionsViolation::NotContiguous {
                        previous,
                        found: point,
                    });
                }
                previous = Some(point);
            }
        }

        Ok(())
    }

    /// Check a non-empty answer against this type's [`AnswerShape`].
    pub fn validate_answer(
        self,
        options: &[QuestionOption],
        value: &AnswerValue,
    ) -> Result<(), AnswerViolation> {
        let actual = value.question_type();
        if actual != self {
            return Err(AnswerViolation::TypeMismatch {
                expected: self,
                actual,
            });
        }

        let is_option = |candidate: &str| options.iter().any(|option| option.value == candidate);

        match (self.rules().answer, value) {
            (AnswerShape::FreeText, _) => Ok(()),
            (AnswerShape::Date, AnswerValue::Date(date)) => {
                NaiveDate::parse_from_str(date, DATE_FORMAT)
                    .map(|_| ())
                    .map_err(|_| AnswerViolation::InvalidDate(date.clone()))
            }
            (AnswerShape::MultipleOptions, AnswerValue::Checkbox(selected)) => {
                let mut seen = HashSet::new();
                for choice in selected {
                    if !is_option(choice) {
                        return Err(AnswerViolation::UnknownOption(choice.clone()));
                    }
                    if !seen.insert(choice.as_str()) {
                        return Err(AnswerViolation::DuplicateSelection(choice.clone()));
                    }
                }
                Ok(())
            }
            (AnswerShape::SingleOption, _) => match value.as_str() {
                Some(choice) if is_option(choice) => Ok(()),
                Some(choice) => Err(AnswerViolation::UnknownOption(choice.to_string())),
                None => Err(AnswerViolation::TypeMismatch {
                    expected: self,
                    actual,
                }),
            },
            _ => Err(AnswerViolation::TypeMismatch {
                expected: self,
                actual,
            }),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = IntegrityError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| IntegrityError::UnknownQuestionType(tag.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> Vec<QuestionOption> {
        values
            .iter()
            .map(|value| QuestionOption::new(*value, *value))
            .collect()
    }

    #[test]
    fn scale_defaults_run_zero_to_ten() {
        let defaults = QuestionType::Scale.default_options();
        assert_eq!(defaults.len(), 11);
        assert_eq!(defaults.first().map(|o| o.value.as_str()), Some("0"));
        assert_eq!(defaults.last().map(|o| o.value.as_str()), Some("10"));
        assert!(QuestionType::Scale.validate_options(&defaults).is_ok());
    }

    #[test]
    fn every_default_option_set_is_valid() {
        for kind in QuestionType::all() {
            assert!(kind.validate_options(&kind.default_options()).is_ok(), "{kind}");
        }
    }

    #[test]
    fn text_and_date_forbid_options() {
        assert_eq!(
            QuestionType::Text.validate_options(&options(&["a"])),
            Err(OptionsViolation::Forbidden(QuestionType::Text))
        );
        assert!(QuestionType::Date.validate_options(&[]).is_ok());
    }

    #[test]
    fn choice_types_require_unique_options() {
        assert_eq!(
            QuestionType::Dropdown.validate_options(&[]),
            Err(OptionsViolation::Missing(QuestionType::Dropdown))
        );
        assert_eq!(
            QuestionType::Checkbox.validate_options(&options(&["a", "b", "a"])),
            Err(OptionsViolation::DuplicateValue("a".to_string()))
        );
    }

    #[test]
    fn scale_options_must_be_contiguous_integers() {
        assert_eq!(
            QuestionType::Scale.validate_options(&options(&["1", "2", "4"])),
            Err(OptionsViolation::NotContiguous {
                previous: 2,
                found: 4
            })
        );
        assert_eq!(
            QuestionType::Scale.validate_options(&options(&["1", "two"])),
            Err(OptionsViolation::NotNumeric("two".to_string()))
        );
    }

    #[test]
    fn single_option_answers_must_match_an_option() {
        let opts = options(&["yes", "no"]);
        assert!(
            QuestionType::MultipleChoice
                .validate_answer(&opts, &AnswerValue::MultipleChoice("yes".into()))
                .is_ok()
        );
        assert_eq!(
            QuestionType::Dropdown.validate_answer(&opts, &AnswerValue::Dropdown("maybe".into())),
            Err(AnswerViolation::UnknownOption("maybe".to_string()))
        );
    }

    #[test]
    fn checkbox_answers_reject_repeats() {
        let opts = options(&["a", "b"]);
        assert_eq!(
            QuestionType::Checkbox.validate_answer(
                &opts,
                &AnswerValue::Checkbox(vec!["b".into(), "b".into()])
            ),
            Err(AnswerViolation::DuplicateSelection("b".to_string()))
        );
    }

    #[test]
    fn answer_variant_must_match_type() {
        assert_eq!(
            QuestionType::Text.validate_answer(&[], &AnswerValue::Date("2024-01-01".into())),
            Err(AnswerViolation::TypeMismatch {
                expected: QuestionType::Text,
                actual: QuestionType::Date
            })
        );
    }

    #[test]
    fn dates_are_parsed() {
        assert!(
            QuestionType::Date
                .validate_answer(&[], &AnswerValue::Date("2024-02-29".into()))
                .is_ok()
        );
        assert!(
            QuestionType::Date
                .validate_answer(&[], &AnswerValue::Date("2023-02-29".into()))
                .is_err()
        );
    }

    #[test]
    fn unknown_tags_are_integrity_faults() {
        assert_eq!(
            "matrix".parse::<QuestionType>(),
            Err(IntegrityError::UnknownQuestionType("matrix".to_string()))
        );
        assert_eq!(
            "multiple_choice".parse::<QuestionType>(),
            Ok(QuestionType::MultipleChoice)
        );
    }
}
