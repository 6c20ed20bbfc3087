use form_spec::{
    AnswerStore, AnswerValue, FieldInput, FieldTarget, FormSchema, InputError, MemoryKeyValueStore,
    Question, apply_input,
};

const KEY: &str = "project_requirements_v1";

fn fixture() -> FormSchema {
    serde_json::from_str(include_str!("fixtures/requirements_form.json")).expect("deserialize")
}

fn question<'a>(schema: &'a FormSchema, id: &str) -> &'a Question {
    schema.question(id).expect("question exists")
}

fn select(value: &str) -> FieldInput {
    FieldInput::Select(value.into())
}

fn text(value: &str) -> FieldInput {
    FieldInput::Text(value.into())
}

fn toggle(option: &str, checked: bool) -> FieldInput {
    FieldInput::Toggle {
        option: option.into(),
        checked,
    }
}

#[test]
fn persisted_record_reloads_to_identical_state() {
    let schema = fixture();
    let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);
    apply_input(question(&schema, "company_name"), FieldTarget::Question, text("Ac"), &mut store)
        .expect("input");
    apply_input(question(&schema, "company_name"), FieldTarget::Question, text("Acme"), &mut store)
        .expect("input");
    apply_input(question(&schema, "industry"), FieldTarget::Question, select("Other"), &mut store)
        .expect("input");
    apply_input(question(&schema, "industry"), FieldTarget::Custom, text("Robotics"), &mut store)
        .expect("input");
    apply_input(
        question(&schema, "platforms"),
        FieldTarget::Question,
        toggle("B", true),
        &mut store,
    )
    .expect("input");
    apply_input(
        question(&schema, "brief"),
        FieldTarget::Question,
        FieldInput::Files(vec!["brief.pdf".into()]),
        &mut store,
    )
    .expect("input");
    store.set_section_index(2).expect("navigate");

    let expected = store.snapshot();
    let reloaded = AnswerStore::restore(store.into_backend(), KEY);
    assert_eq!(reloaded.snapshot(), expected);
    assert_eq!(reloaded.section_index(), 2);
    assert_eq!(reloaded.text("brief"), Some("Files attached: brief.pdf"));
}

#[test]
fn other_reveals_custom_and_leaving_deletes_it() {
    let schema = fixture();
    let industry = question(&schema, "industry");
    let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);

    apply_input(industry, FieldTarget::Question, select("Other"), &mut store).expect("select");
    apply_input(industry, FieldTarget::Custom, text("Robotics"), &mut store).expect("custom");
    assert_eq!(store.text("industry_custom"), Some("Robotics"));

    apply_input(industry, FieldTarget::Question, select("Retail"), &mut store).expect("select");
    assert!(store.get("industry_custom").is_none());
    let reloaded = AnswerStore::restore(store.backend().clone(), KEY);
    assert!(reloaded.get("industry_custom").is_none());

    apply_input(industry, FieldTarget::Question, select("Other"), &mut store).expect("select");
    assert!(store.get("industry_custom").is_none());
}

#[test]
fn custom_input_requires_other_selected() {
    let schema = fixture();
    let industry = question(&schema, "industry");
    let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);
    apply_input(industry, FieldTarget::Question, select("Finance"), &mut store).expect("select");
    let err = apply_input(industry, FieldTarget::Custom, text("nope"), &mut store)
        .expect_err("custom hidden");
    assert!(matches!(err, InputError::CustomHidden(_)));
}

#[test]
fn hiding_radio_child_keeps_its_answer() {
    let schema = fixture();
    let brand = question(&schema, "has_brand");
    let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);

    let applied =
        apply_input(brand, FieldTarget::Question, select("Yes"), &mut store).expect("yes");
    assert!(applied.conditional.expect("conditional").after.is_visible());
    apply_input(brand, FieldTarget::Child, text("Navy palette"), &mut store).expect("child");

    let applied = apply_input(brand, FieldTarget::Question, select("No"), &mut store).expect("no");
    assert!(applied.conditional.expect("conditional").hid_child());
    assert_eq!(store.text("has_brand_details"), Some("Navy palette"));

    let err = apply_input(brand, FieldTarget::Child, text("more"), &mut store)
        .expect_err("child hidden");
    assert!(matches!(err, InputError::ChildHidden(_)));
}

#[test]
fn multiselect_keeps_declaration_order() {
    let schema = fixture();
    let platforms = question(&schema, "platforms");
    let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);

    apply_input(platforms, FieldTarget::Question, toggle("C", true), &mut store).expect("c");
    apply_input(platforms, FieldTarget::Question, toggle("A", true), &mut store).expect("a");
    assert_eq!(
        store.get("platforms"),
        Some(&AnswerValue::List(vec!["A".into(), "C".into()]))
    );

    apply_input(platforms, FieldTarget::Question, toggle("A", false), &mut store).expect("a off");
    assert_eq!(
        store.get("platforms"),
        Some(&AnswerValue::List(vec!["C".into()]))
    );
}

#[test]
fn conditional_dropdown_child_accepts_child_options_only() {
    let schema = fixture();
    let hosting = question(&schema, "hosting");
    let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);
    apply_input(hosting, FieldTarget::Question, select("Self-hosted"), &mut store).expect("select");
    apply_input(hosting, FieldTarget::Child, select("GCP"), &mut store).expect("child");
    assert_eq!(store.text("hosting_details"), Some("GCP"));
    let err = apply_input(hosting, FieldTarget::Child, select("Heroku"), &mut store)
        .expect_err("unknown option");
    assert!(matches!(err, InputError::UnknownOption { .. }));
}

#[test]
fn file_child_stores_marker_and_empty_selection_is_ignored() {
    let schema = fixture();
    let mockups = question(&schema, "has_mockups");
    let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);
    apply_input(mockups, FieldTarget::Question, select("Yes"), &mut store).expect("yes");
    let applied = apply_input(mockups, FieldTarget::Child, FieldInput::Files(vec![]), &mut store)
        .expect("empty");
    assert!(applied.key.is_none());
    assert!(store.get("has_mockups_details").is_none());
    apply_input(
        mockups,
        FieldTarget::Child,
        FieldInput::Files(vec!["home.png".into(), "about.png".into()]),
        &mut store,
    )
    .expect("files");
    assert_eq!(
        store.text("has_mockups_details"),
        Some("Files attached: home.png, about.png")
    );
}

#[test]
fn rejects_inputs_a_control_cannot_emit() {
    let schema = fixture();
    let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);
    let err = apply_input(
        question(&schema, "priority"),
        FieldTarget::Question,
        select("Urgent"),
        &mut store,
    )
    .expect_err("unknown");
    assert!(matches!(err, InputError::UnknownOption { .. }));

    let err = apply_input(
        question(&schema, "notes"),
        FieldTarget::Question,
        toggle("A", true),
        &mut store,
    )
    .expect_err("unsupported");
    assert!(matches!(err, InputError::Unsupported { .. }));
    assert!(store.answers().is_empty());
}

#[test]
fn dropdown_placeholder_stores_empty_text() {
    let schema = fixture();
    let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);
    apply_input(question(&schema, "budget"), FieldTarget::Question, select(""), &mut store)
        .expect("placeholder");
    assert_eq!(store.text("budget"), Some(""));
}
