use form_spec::{AnswerMap, FormSchema, check_schema, document_schema, validate_section};
use serde_json::json;

fn fixture() -> FormSchema {
    serde_json::from_str(include_str!("fixtures/requirements_form.json")).expect("deserialize")
}

#[test]
fn fixture_passes_schema_checks() {
    let report = check_schema(&fixture());
    assert!(report.is_clean(), "{:?}", report.issues);
}

#[test]
fn reports_duplicates_and_derived_collisions() {
    let schema: FormSchema = serde_json::from_value(json!({
        "sections": [
            { "title": "One", "questions": [
                { "id": "team", "label": "Team", "input_type": "radio_then_text", "options": ["Yes", "No"] },
                { "id": "team_details", "label": "Team details", "input_type": "text" }
            ]},
            { "title": "Two", "questions": [
                { "id": "team", "label": "Again", "input_type": "text" },
                { "id": "bad id", "label": "Spaces", "input_type": "dropdown" }
            ]}
        ]
    }))
    .expect("deserialize");
    let report = check_schema(&schema);
    let codes = report
        .issues
        .iter()
        .map(|issue| issue.code.as_str())
        .collect::<Vec<_>>();
    assert!(codes.contains(&"duplicate_id"));
    assert!(codes.contains(&"derived_id_collision"));
    assert!(codes.contains(&"invalid_id"));
    assert!(codes.contains(&"missing_options"));
}

#[test]
fn conditional_dropdown_needs_trigger() {
    let schema: FormSchema = serde_json::from_value(json!({
        "sections": [{ "title": "One", "questions": [
            { "id": "host", "label": "Host", "input_type": "dropdown_with_conditional",
              "options": ["A"], "child_type": "dropdown" }
        ]}]
    }))
    .expect("deserialize");
    let codes = check_schema(&schema)
        .issues
        .into_iter()
        .map(|issue| issue.code)
        .collect::<Vec<_>>();
    assert_eq!(
        codes,
        vec!["missing_conditional_option", "missing_child_options"]
    );
}

#[test]
fn unknown_input_type_fails_to_parse() {
    let result: Result<FormSchema, _> = serde_json::from_value(json!({
        "sections": [{ "title": "One", "questions": [
            { "id": "x", "label": "X", "input_type": "slider" }
        ]}]
    }));
    assert!(result.is_err());
}

#[test]
fn section_hook_always_passes() {
    let result = validate_section(&fixture(), 1, &AnswerMap::new());
    assert!(result.valid);
    assert!(result.errors.is_empty());
}

#[test]
fn document_schema_describes_sections() {
    let schema = document_schema();
    assert!(schema["properties"].get("sections").is_some());
}
