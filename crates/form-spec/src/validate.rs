use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerMap, custom_id, details_id};
use crate::spec::form::FormSchema;
use crate::spec::question::{InputType, Question};

static FIELD_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("field key pattern is valid")
});

/// A problem found in a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub code: String,
    pub message: String,
}

/// Result of [`check_schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReport {
    pub issues: Vec<SchemaIssue>,
}

impl SchemaReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, question: Option<&Question>, code: &str, message: String) {
        self.issues.push(SchemaIssue {
            question_id: question.map(|question| question.id.clone()),
            code: code.into(),
            message,
        });
    }
}

/// Checks the invariants the renderer relies on. Never mutates or rejects the schema.
pub fn check_schema(schema: &FormSchema) -> SchemaReport {
    let mut report = SchemaReport::default();
    if schema.is_empty() {
        report.push(None, "no_sections", "schema declares no sections".into());
    }

    let mut seen = BTreeSet::new();
    for question in schema.questions() {
        if !seen.insert(question.id.as_str()) {
            report.push(
                Some(question),
                "duplicate_id",
                format!("question id '{}' is used more than once", question.id),
            );
        }
        if !FIELD_KEY.is_match(&question.id) {
            report.push(
                Some(question),
                "invalid_id",
                format!(
                    "question id '{}' must only contain letters, digits, '-' or '_'",
                    question.id
                ),
            );
        }
        check_question(question, &mut report);
    }

    for question in schema.questions() {
        let derived = match question.input_type {
            InputType::DropdownWithCustom => Some(custom_id(&question.id)),
            _ if question.input_type.is_conditional() => Some(details_id(&question.id)),
            _ => None,
        };
        if let Some(derived) = derived
            && seen.contains(derived.as_str())
        {
            report.push(
                Some(question),
                "derived_id_collision",
                format!(
                    "derived answer key '{}' collides with a declared question id",
                    derived
                ),
            );
        }
    }

    report
}

fn check_question(question: &Question, report: &mut SchemaReport) {
    if question.input_type.has_options() && question.options.is_empty() {
        report.push(
            Some(question),
            "missing_options",
            format!(
                "{} question '{}' declares no options",
                question.input_type.as_str(),
                question.id
            ),
        );
    }
    if question.input_type == InputType::DropdownWithConditional {
        match &question.conditional_option {
            None => report.push(
                Some(question),
                "missing_conditional_option",
                format!("'{}' has no conditional_option", question.id),
            ),
            Some(option) if !question.has_option(option) => report.push(
                Some(question),
                "unreachable_conditional_option",
                format!(
                    "conditional_option '{}' of '{}' is not one of its options",
                    option, question.id
                ),
            ),
            Some(_) => {}
        }
        if question.child_type.as_deref() == Some("dropdown") && question.child_options.is_empty() {
            report.push(
                Some(question),
                "missing_child_options",
                format!("'{}' declares a dropdown child without child_options", question.id),
            );
        }
    }
}

/// Outcome of the per-section validation hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Validation hook run before advancing. Currently accepts every section.
pub fn validate_section(
    _schema: &FormSchema,
    _index: usize,
    _answers: &AnswerMap,
) -> ValidationResult {
    ValidationResult {
        valid: true,
        errors: Vec::new(),
    }
}
