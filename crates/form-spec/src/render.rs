use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Map, Value, json};

use crate::{
    answers::{AnswerMap, AnswerValue},
    conditional::{child_view, custom_view},
    spec::{
        form::FormSchema,
        question::{InputType, Question, TextKind},
    },
};

const SELECT_PLACEHOLDER: &str = "Select an option...";
const UPLOAD_PROMPT: &str = "Click to Upload or drag files";

/// Files currently held by live file controls, keyed by input id.
pub type LiveFiles = BTreeMap<String, Vec<PathBuf>>;

/// Inputs the renderer reads from; rendered views never own state.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub answers: &'a AnswerMap,
    pub files: &'a LiveFiles,
    pub submitting: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(answers: &'a AnswerMap, files: &'a LiveFiles) -> Self {
        Self {
            answers,
            files,
            submitting: false,
        }
    }

    pub fn with_submitting(mut self, submitting: bool) -> Self {
        self.submitting = submitting;
        self
    }
}

/// One option of a radio or checkbox set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub checked: bool,
}

/// Interactive control built for a question.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    TextInput {
        kind: TextKind,
        value: String,
        placeholder: Option<String>,
    },
    TextArea {
        value: String,
        placeholder: Option<String>,
    },
    Dropdown {
        placeholder: String,
        options: Vec<String>,
        selected: Option<String>,
    },
    RadioGroup {
        options: Vec<Choice>,
    },
    CheckboxGroup {
        options: Vec<Choice>,
    },
    FileUpload {
        status: String,
        preview: Option<String>,
    },
}

impl Control {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Control::TextInput { .. } => "text_input",
            Control::TextArea { .. } => "text_area",
            Control::Dropdown { .. } => "dropdown",
            Control::RadioGroup { .. } => "radio_group",
            Control::CheckboxGroup { .. } => "checkbox_group",
            Control::FileUpload { .. } => "file_upload",
        }
    }
}

/// Free-text field revealed by "Other".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomField {
    pub id: String,
    pub placeholder: String,
    pub value: String,
}

/// Revealed conditional container. `control` is `None` when the declared child kind is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildField {
    pub id: String,
    pub label: Option<String>,
    pub control: Option<Control>,
}

/// A question rendered for display.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub id: String,
    pub label: String,
    pub input_type: InputType,
    pub explanation: Option<String>,
    pub control: Control,
    pub custom: Option<CustomField>,
    pub conditional: Option<ChildField>,
}

/// Label on the advance action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceLabel {
    Next,
    Submit,
    Sending,
}

impl AdvanceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvanceLabel::Next => "Next",
            AdvanceLabel::Submit => "Submit",
            AdvanceLabel::Sending => "Sending...",
        }
    }
}

/// Everything shown for the current section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub progress_percent: f64,
    pub fields: Vec<FieldView>,
    pub back_visible: bool,
    pub advance: AdvanceLabel,
}

impl SectionView {
    pub fn indicator(&self) -> String {
        format!("Section {} of {}", self.index + 1, self.total)
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }

    pub fn field(&self, id: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.id == id)
    }
}

/// `(index + 1) / total * 100`.
pub fn progress_percent(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (index + 1) as f64 / total as f64 * 100.0
}

/// Builds the view for section `index`, or `None` when it does not exist.
pub fn render_section(
    schema: &FormSchema,
    index: usize,
    ctx: &RenderContext<'_>,
) -> Option<SectionView> {
    let section = schema.section(index)?;
    let total = schema.len();
    let is_last = index + 1 == total;
    let advance = if ctx.submitting {
        AdvanceLabel::Sending
    } else if is_last {
        AdvanceLabel::Submit
    } else {
        AdvanceLabel::Next
    };
    Some(SectionView {
        index,
        total,
        title: section.title.clone(),
        progress_percent: progress_percent(index, total),
        fields: section
            .questions
            .iter()
            .map(|question| render_field(question, ctx))
            .collect(),
        back_visible: index > 0,
        advance,
    })
}

/// Builds the control for one question and restores its stored value, custom field and child.
pub fn render_field(question: &Question, ctx: &RenderContext<'_>) -> FieldView {
    let stored = ctx.answers.get(&question.id);
    let control = match question.input_type {
        InputType::Text
        | InputType::Email
        | InputType::Url
        | InputType::Number
        | InputType::Date => Control::TextInput {
            kind: question.input_type.text_kind().unwrap_or(TextKind::Text),
            value: stored_text(stored),
            placeholder: question.placeholder.clone(),
        },
        InputType::Textarea => Control::TextArea {
            value: stored_text(stored),
            placeholder: question.placeholder.clone(),
        },
        InputType::Dropdown
        | InputType::DropdownWithCustom
        | InputType::DropdownWithConditional => Control::Dropdown {
            placeholder: SELECT_PLACEHOLDER.to_string(),
            options: question.options.clone(),
            selected: stored
                .and_then(AnswerValue::as_text)
                .filter(|value| question.has_option(value))
                .map(str::to_string),
        },
        InputType::Radio
        | InputType::RadioThenText
        | InputType::RadioThenList
        | InputType::RadioThenFile => Control::RadioGroup {
            options: choices(question, stored),
        },
        InputType::Multiselect => Control::CheckboxGroup {
            options: choices(question, stored),
        },
        InputType::FileUpload => file_control(
            &question.id,
            stored.and_then(AnswerValue::as_text),
            ctx,
        ),
    };

    FieldView {
        id: question.id.clone(),
        label: question.label.clone(),
        input_type: question.input_type,
        explanation: question.explanation.clone(),
        control,
        custom: custom_view(question, ctx),
        conditional: child_view(question, ctx),
    }
}

fn stored_text(value: Option<&AnswerValue>) -> String {
    value
        .and_then(AnswerValue::as_text)
        .unwrap_or_default()
        .to_string()
}

fn choices(question: &Question, stored: Option<&AnswerValue>) -> Vec<Choice> {
    question
        .options
        .iter()
        .map(|option| Choice {
            label: option.clone(),
            checked: stored.is_some_and(|value| value.selects(option)),
        })
        .collect()
}

/// File picker preview: live file names when present, otherwise the stored marker.
pub(crate) fn file_control(id: &str, marker: Option<&str>, ctx: &RenderContext<'_>) -> Control {
    match ctx.files.get(id).filter(|files| !files.is_empty()) {
        Some(files) => {
            let names = files
                .iter()
                .map(|path| {
                    path.file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string())
                })
                .collect::<Vec<_>>();
            Control::FileUpload {
                status: format!("{} file(s) selected", files.len()),
                preview: Some(names.join(", ")),
            }
        }
        None => Control::FileUpload {
            status: UPLOAD_PROMPT.to_string(),
            preview: marker.map(str::to_string),
        },
    }
}

/// Render the section as a structured JSON-friendly value.
pub fn render_json_ui(view: &SectionView) -> Value {
    let fields = view.fields.iter().map(field_json).collect::<Vec<_>>();
    json!({
        "indicator": view.indicator(),
        "index": view.index,
        "total": view.total,
        "title": view.title,
        "progress": view.progress_percent,
        "back_visible": view.back_visible,
        "advance_label": view.advance.as_str(),
        "fields": fields,
    })
}

fn field_json(field: &FieldView) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), Value::String(field.id.clone()));
    map.insert("label".into(), Value::String(field.label.clone()));
    map.insert(
        "input_type".into(),
        Value::String(field.input_type.as_str().to_string()),
    );
    if let Some(explanation) = &field.explanation {
        map.insert("explanation".into(), Value::String(explanation.clone()));
    }
    map.insert("control".into(), control_json(&field.control));
    if let Some(custom) = &field.custom {
        map.insert(
            "custom".into(),
            json!({
                "id": custom.id,
                "placeholder": custom.placeholder,
                "value": custom.value,
            }),
        );
    }
    if let Some(child) = &field.conditional {
        map.insert(
            "conditional".into(),
            json!({
                "id": child.id,
                "label": child.label,
                "control": child.control.as_ref().map(control_json),
            }),
        );
    }
    Value::Object(map)
}

fn control_json(control: &Control) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), Value::String(control.kind_label().into()));
    match control {
        Control::TextInput {
            kind,
            value,
            placeholder,
        } => {
            map.insert("input".into(), Value::String(kind.as_str().into()));
            map.insert("value".into(), Value::String(value.clone()));
            if let Some(placeholder) = placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
        }
        Control::TextArea { value, placeholder } => {
            map.insert("value".into(), Value::String(value.clone()));
            if let Some(placeholder) = placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
        }
        Control::Dropdown {
            placeholder,
            options,
            selected,
        } => {
            map.insert("placeholder".into(), Value::String(placeholder.clone()));
            map.insert("options".into(), json!(options));
            map.insert(
                "selected".into(),
                selected.clone().map(Value::String).unwrap_or(Value::Null),
            );
        }
        Control::RadioGroup { options } | Control::CheckboxGroup { options } => {
            let options = options
                .iter()
                .map(|choice| json!({ "label": choice.label, "checked": choice.checked }))
                .collect::<Vec<_>>();
            map.insert("options".into(), Value::Array(options));
        }
        Control::FileUpload { status, preview } => {
            map.insert("status".into(), Value::String(status.clone()));
            map.insert(
                "preview".into(),
                preview.clone().map(Value::String).unwrap_or(Value::Null),
            );
        }
    }
    Value::Object(map)
}

/// Render the section as human-friendly text.
pub fn render_text(view: &SectionView) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{}: {}", view.indicator(), view.title));
    lines.push(format!("Progress: {:.0}%", view.progress_percent));
    for field in &view.fields {
        let mut entry = format!(" - {} ({})", field.label, field.id);
        if field.explanation.is_some() {
            entry.push_str(" [?]");
        }
        if let Some(value) = control_display(&field.control) {
            entry.push_str(&format!(" = {}", value));
        }
        lines.push(entry);
        if let Some(custom) = &field.custom {
            lines.push(format!("     {}: {}", custom.placeholder, custom.value));
        }
        if let Some(child) = &field.conditional {
            let label = child.label.as_deref().unwrap_or("Details");
            let value = child
                .control
                .as_ref()
                .and_then(control_display)
                .unwrap_or_default();
            lines.push(format!("     {}: {}", label, value));
        }
    }
    let mut actions = Vec::new();
    if view.back_visible {
        actions.push("Back");
    }
    actions.push(view.advance.as_str());
    lines.push(format!("Actions: {}", actions.join(" | ")));
    lines.join("\n")
}

/// Current value of a control as shown to the user, if any.
pub fn control_display(control: &Control) -> Option<String> {
    match control {
        Control::TextInput { value, .. } | Control::TextArea { value, .. } => {
            (!value.is_empty()).then(|| value.clone())
        }
        Control::Dropdown { selected, .. } => selected.clone(),
        Control::RadioGroup { options } | Control::CheckboxGroup { options } => {
            let checked = options
                .iter()
                .filter(|choice| choice.checked)
                .map(|choice| choice.label.as_str())
                .collect::<Vec<_>>();
            (!checked.is_empty()).then(|| checked.join(", "))
        }
        Control::FileUpload { preview, .. } => preview.clone(),
    }
}
