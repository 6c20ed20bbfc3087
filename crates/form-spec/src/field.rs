use thiserror::Error;
use tracing::debug;

use crate::{
    answers::{AnswerValue, OTHER_OPTION, custom_id, details_id, file_marker},
    conditional::{self, ConditionalChange},
    spec::question::{ChildKind, InputType, Question},
    store::{AnswerStore, KeyValueStore, StoreError},
};

/// Which part of a question an input event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    /// The question's own control.
    Question,
    /// The "Other" free-text field.
    Custom,
    /// The revealed conditional child.
    Child,
}

/// A change emitted by a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    /// Typed text (single-line inputs and text areas).
    Text(String),
    /// Dropdown or radio selection. An empty string is the dropdown placeholder.
    Select(String),
    /// A checkbox changed state.
    Toggle { option: String, checked: bool },
    /// File names chosen in a file picker.
    Files(Vec<String>),
}

impl FieldInput {
    fn label(&self) -> &'static str {
        match self {
            FieldInput::Text(_) => "text",
            FieldInput::Select(_) => "select",
            FieldInput::Toggle { .. } => "toggle",
            FieldInput::Files(_) => "files",
        }
    }
}

/// Inputs a rendered control could never have produced.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("'{option}' is not an option of '{id}'")]
    UnknownOption { id: String, option: String },
    #[error("'{id}' ({input_type}) does not accept {input} input")]
    Unsupported {
        id: String,
        input_type: &'static str,
        input: &'static str,
    },
    #[error("'{0}' has no custom field showing")]
    CustomHidden(String),
    #[error("'{0}' has no conditional field showing")]
    ChildHidden(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What an accepted input changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Applied {
    /// Answer key written, if anything was stored.
    pub key: Option<String>,
    /// Child visibility transition for conditional parents.
    pub conditional: Option<ConditionalChange>,
}

impl Applied {
    fn stored(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            conditional: None,
        }
    }
}

/// Applies one control change to the store, running custom and conditional side effects.
pub fn apply_input<S: KeyValueStore>(
    question: &Question,
    target: FieldTarget,
    input: FieldInput,
    store: &mut AnswerStore<S>,
) -> Result<Applied, InputError> {
    debug!(id = %question.id, ?target, input = input.label(), "applying input");
    match target {
        FieldTarget::Question => apply_to_question(question, input, store),
        FieldTarget::Custom => apply_to_custom(question, input, store),
        FieldTarget::Child => apply_to_child(question, input, store),
    }
}

fn apply_to_question<S: KeyValueStore>(
    question: &Question,
    input: FieldInput,
    store: &mut AnswerStore<S>,
) -> Result<Applied, InputError> {
    let id = question.id.as_str();
    match (question.input_type, input) {
        (
            InputType::Text
            | InputType::Email
            | InputType::Url
            | InputType::Number
            | InputType::Date
            | InputType::Textarea,
            FieldInput::Text(value),
        ) => {
            store.set(id, value)?;
            Ok(Applied::stored(id))
        }
        (InputType::Dropdown, FieldInput::Select(value)) => {
            ensure_dropdown_option(id, &question.options, &value)?;
            store.set(id, value)?;
            Ok(Applied::stored(id))
        }
        (InputType::DropdownWithCustom, FieldInput::Select(value)) => {
            ensure_dropdown_option(id, &question.options, &value)?;
            let previous = store.text(id).map(str::to_string);
            store.set(id, value.as_str())?;
            conditional::sync_custom(question, previous.as_deref(), &value, store)?;
            Ok(Applied::stored(id))
        }
        (InputType::DropdownWithConditional, FieldInput::Select(value)) => {
            ensure_dropdown_option(id, &question.options, &value)?;
            select_conditional(question, value, store)
        }
        (InputType::Radio, FieldInput::Select(value)) => {
            ensure_option(id, &question.options, &value)?;
            store.set(id, value)?;
            Ok(Applied::stored(id))
        }
        (
            InputType::RadioThenText | InputType::RadioThenList | InputType::RadioThenFile,
            FieldInput::Select(value),
        ) => {
            ensure_option(id, &question.options, &value)?;
            select_conditional(question, value, store)
        }
        (InputType::Multiselect, FieldInput::Toggle { option, checked }) => {
            ensure_option(id, &question.options, &option)?;
            let current = store.get(id).cloned();
            let selected = question
                .options
                .iter()
                .filter(|candidate| {
                    if **candidate == option {
                        checked
                    } else {
                        current
                            .as_ref()
                            .is_some_and(|value| value.selects(candidate))
                    }
                })
                .cloned()
                .collect::<Vec<_>>();
            store.set(id, AnswerValue::List(selected))?;
            Ok(Applied::stored(id))
        }
        (InputType::FileUpload, FieldInput::Files(names)) => store_files(id, &names, store),
        (input_type, input) => Err(InputError::Unsupported {
            id: id.to_string(),
            input_type: input_type.as_str(),
            input: input.label(),
        }),
    }
}

fn select_conditional<S: KeyValueStore>(
    question: &Question,
    value: String,
    store: &mut AnswerStore<S>,
) -> Result<Applied, InputError> {
    let previous = store.text(&question.id).map(str::to_string);
    store.set(&question.id, value.as_str())?;
    let change = conditional::on_parent_change(question, previous.as_deref(), &value);
    Ok(Applied {
        key: Some(question.id.clone()),
        conditional: Some(change),
    })
}

fn apply_to_custom<S: KeyValueStore>(
    question: &Question,
    input: FieldInput,
    store: &mut AnswerStore<S>,
) -> Result<Applied, InputError> {
    if question.input_type != InputType::DropdownWithCustom
        || store.text(&question.id) != Some(OTHER_OPTION)
    {
        return Err(InputError::CustomHidden(question.id.clone()));
    }
    match input {
        FieldInput::Text(value) => {
            let key = custom_id(&question.id);
            store.set(&key, value)?;
            Ok(Applied::stored(key))
        }
        other => Err(InputError::Unsupported {
            id: custom_id(&question.id),
            input_type: "text",
            input: other.label(),
        }),
    }
}

fn apply_to_child<S: KeyValueStore>(
    question: &Question,
    input: FieldInput,
    store: &mut AnswerStore<S>,
) -> Result<Applied, InputError> {
    let visible = conditional::stored_visibility(question, store.get(&question.id));
    let kind = match question.child_kind() {
        Some(kind) if visible.is_visible() => kind,
        _ => return Err(InputError::ChildHidden(question.id.clone())),
    };
    let key = details_id(&question.id);
    match (kind, input) {
        (ChildKind::TextArea, FieldInput::Text(value)) => {
            store.set(&key, value)?;
            Ok(Applied::stored(key))
        }
        (ChildKind::Dropdown, FieldInput::Select(value)) => {
            ensure_dropdown_option(&key, &question.child_options, &value)?;
            store.set(&key, value)?;
            Ok(Applied::stored(key))
        }
        (ChildKind::File, FieldInput::Files(names)) => store_files(&key, &names, store),
        (kind, input) => Err(InputError::Unsupported {
            id: key,
            input_type: match kind {
                ChildKind::TextArea => "textarea",
                ChildKind::File => "file_upload",
                ChildKind::Dropdown => "dropdown",
            },
            input: input.label(),
        }),
    }
}

fn store_files<S: KeyValueStore>(
    key: &str,
    names: &[String],
    store: &mut AnswerStore<S>,
) -> Result<Applied, InputError> {
    if names.is_empty() {
        return Ok(Applied::default());
    }
    store.set(key, file_marker(names))?;
    Ok(Applied::stored(key))
}

fn ensure_option(id: &str, options: &[String], value: &str) -> Result<(), InputError> {
    if options.iter().any(|option| option == value) {
        Ok(())
    } else {
        Err(InputError::UnknownOption {
            id: id.to_string(),
            option: value.to_string(),
        })
    }
}

fn ensure_dropdown_option(id: &str, options: &[String], value: &str) -> Result<(), InputError> {
    if value.is_empty() {
        return Ok(());
    }
    ensure_option(id, options, value)
}
