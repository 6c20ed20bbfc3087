use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Option value that reveals the free-text field on `dropdown_with_custom`.
pub const OTHER_OPTION: &str = "Other";

/// Radio value that reveals the child on the `radio_then_*` family.
pub const YES_OPTION: &str = "Yes";

const FILE_MARKER_PREFIX: &str = "Files attached: ";

/// A stored answer: plain text (including file markers) or a multiselect list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            AnswerValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AnswerValue::List(items) => Some(items),
            AnswerValue::Text(_) => None,
        }
    }

    /// Whether this answer selects `option`, either as the scalar value or as a list member.
    pub fn selects(&self, option: &str) -> bool {
        match self {
            AnswerValue::Text(text) => text == option,
            AnswerValue::List(items) => items.iter().any(|item| item == option),
        }
    }

    /// Flattens the value for delivery; lists are joined with `", "`.
    pub fn to_field_text(&self) -> String {
        match self {
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        AnswerValue::List(value)
    }
}

pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// The persisted snapshot of all answers plus the current section index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    #[serde(default)]
    pub answers: AnswerMap,
    #[serde(default, rename = "currentSectionIndex")]
    pub current_section_index: usize,
}

impl DraftRecord {
    /// Reads a stored record field by field: a malformed index falls back to 0 and a
    /// malformed answer is dropped, without discarding the rest. Fails only on invalid JSON.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        let answers = value
            .get("answers")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(id, answer)| {
                        AnswerValue::deserialize(answer)
                            .ok()
                            .map(|answer| (id.clone(), answer))
                    })
                    .collect()
            })
            .unwrap_or_default();
        let current_section_index = value
            .get("currentSectionIndex")
            .and_then(Value::as_u64)
            .and_then(|index| usize::try_from(index).ok())
            .unwrap_or(0);
        Ok(Self {
            answers,
            current_section_index,
        })
    }
}

/// Answer key of a conditional child.
pub fn details_id(id: &str) -> String {
    format!("{}_details", id)
}

/// Answer key of the free-text field shown when "Other" is chosen.
pub fn custom_id(id: &str) -> String {
    format!("{}_custom", id)
}

/// Textual marker stored in place of attached files.
pub fn file_marker<S: AsRef<str>>(names: &[S]) -> String {
    let joined = names
        .iter()
        .map(|name| name.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}{}", FILE_MARKER_PREFIX, joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_parse_falls_back_per_field() {
        let record =
            DraftRecord::parse(r#"{"answers":{"company_name":"Acme"},"currentSectionIndex":null}"#)
                .expect("parse");
        assert_eq!(record.answers.get("company_name"), Some(&AnswerValue::from("Acme")));
        assert_eq!(record.current_section_index, 0);

        let record = DraftRecord::parse(
            r#"{"answers":{"budget":"10k","bad":42,"tags":["a"]},"currentSectionIndex":2}"#,
        )
        .expect("parse");
        assert_eq!(record.answers.len(), 2);
        assert_eq!(
            record.answers.get("tags").and_then(AnswerValue::as_list),
            Some(["a".to_string()].as_slice())
        );
        assert_eq!(record.current_section_index, 2);

        let record = DraftRecord::parse(r#"{"answers":"oops","currentSectionIndex":"1"}"#)
            .expect("parse");
        assert_eq!(record, DraftRecord::default());
        assert!(DraftRecord::parse("{not json").is_err());
    }

    #[test]
    fn draft_record_uses_camel_case_index() {
        let mut answers = AnswerMap::new();
        answers.insert("budget".into(), AnswerValue::from("10k"));
        answers.insert(
            "platforms".into(),
            AnswerValue::from(vec!["Web".to_string(), "iOS".to_string()]),
        );
        let record = DraftRecord {
            answers,
            current_section_index: 2,
        };
        let json = serde_json::to_value(&record).expect("encode");
        assert_eq!(json["currentSectionIndex"], 2);
        assert_eq!(json["answers"]["platforms"][1], "iOS");
    }

    #[test]
    fn draft_record_defaults_missing_fields() {
        let record: DraftRecord = serde_json::from_str("{}").expect("decode");
        assert!(record.answers.is_empty());
        assert_eq!(record.current_section_index, 0);
    }

    #[test]
    fn list_values_flatten_with_comma() {
        let value = AnswerValue::from(vec!["A".to_string(), "C".to_string()]);
        assert_eq!(value.to_field_text(), "A, C");
        assert!(value.selects("C"));
        assert!(!value.selects("B"));
    }

    #[test]
    fn marker_lists_file_names() {
        assert_eq!(
            file_marker(&["brief.pdf", "logo.png"]),
            "Files attached: brief.pdf, logo.png"
        );
        assert_eq!(details_id("has_brand"), "has_brand_details");
        assert_eq!(custom_id("industry"), "industry_custom");
    }
}
