//! Conditional sub-fields: the `radio_then_*` children, the secondary dropdown of
//! `dropdown_with_conditional`, and the "Other" free-text field of `dropdown_with_custom`.

use crate::answers::{AnswerValue, OTHER_OPTION, YES_OPTION, custom_id, details_id};
use crate::render::{ChildField, Control, CustomField, RenderContext, file_control};
use crate::spec::question::{ChildKind, InputType, Question};
use crate::store::{AnswerStore, KeyValueStore, StoreError};

const DETAILS_PLACEHOLDER: &str = "Please provide details...";
const CHILD_SELECT_PLACEHOLDER: &str = "Select...";
const CUSTOM_PLACEHOLDER: &str = "Please specify...";

/// Whether a conditional child is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// Visibility before and after a parent answer changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalChange {
    pub before: Visibility,
    pub after: Visibility,
}

impl ConditionalChange {
    pub fn hid_child(&self) -> bool {
        self.before.is_visible() && !self.after.is_visible()
    }
}

/// Decides the child state for `value` selected on `question`.
pub fn evaluate(question: &Question, value: Option<&str>) -> Visibility {
    let Some(value) = value else {
        return Visibility::Hidden;
    };
    let show = match question.input_type {
        InputType::RadioThenText | InputType::RadioThenList | InputType::RadioThenFile => {
            value == YES_OPTION
        }
        InputType::DropdownWithConditional => {
            question.conditional_option.as_deref() == Some(value)
        }
        _ => false,
    };
    if show {
        Visibility::Visible
    } else {
        Visibility::Hidden
    }
}

/// Child state derived from the stored parent answer.
pub fn stored_visibility(question: &Question, value: Option<&AnswerValue>) -> Visibility {
    evaluate(question, value.and_then(AnswerValue::as_text))
}

/// Builds the revealed child, restoring its stored value. `None` while hidden.
pub fn child_view(question: &Question, ctx: &RenderContext<'_>) -> Option<ChildField> {
    if !question.input_type.is_conditional()
        || !stored_visibility(question, ctx.answers.get(&question.id)).is_visible()
    {
        return None;
    }
    let id = details_id(&question.id);
    let stored = ctx.answers.get(&id).and_then(AnswerValue::as_text);
    let control = question.child_kind().map(|kind| match kind {
        ChildKind::TextArea => Control::TextArea {
            value: stored.unwrap_or_default().to_string(),
            placeholder: Some(DETAILS_PLACEHOLDER.to_string()),
        },
        ChildKind::File => file_control(&id, stored, ctx),
        ChildKind::Dropdown => Control::Dropdown {
            placeholder: CHILD_SELECT_PLACEHOLDER.to_string(),
            options: question.child_options.clone(),
            selected: stored
                .filter(|value| question.child_options.iter().any(|option| option == value))
                .map(str::to_string),
        },
    });
    Some(ChildField {
        id,
        label: question.child_label.clone(),
        control,
    })
}

/// The free-text field shown while "Other" is selected on a `dropdown_with_custom`.
pub fn custom_view(question: &Question, ctx: &RenderContext<'_>) -> Option<CustomField> {
    if question.input_type != InputType::DropdownWithCustom {
        return None;
    }
    let selected = ctx.answers.get(&question.id).and_then(AnswerValue::as_text);
    if selected != Some(OTHER_OPTION) {
        return None;
    }
    let id = custom_id(&question.id);
    let value = ctx
        .answers
        .get(&id)
        .and_then(AnswerValue::as_text)
        .unwrap_or_default()
        .to_string();
    Some(CustomField {
        id,
        placeholder: question
            .custom_label
            .clone()
            .unwrap_or_else(|| CUSTOM_PLACEHOLDER.to_string()),
        value,
    })
}

/// Reacts to a new parent selection. The child's stored answer is left in place even when it hides.
pub fn on_parent_change(
    question: &Question,
    previous: Option<&str>,
    value: &str,
) -> ConditionalChange {
    ConditionalChange {
        before: evaluate(question, previous),
        after: evaluate(question, Some(value)),
    }
}

/// Keeps `{id}_custom` in sync with the dropdown: leaving "Other" deletes the custom answer.
pub fn sync_custom<S: KeyValueStore>(
    question: &Question,
    previous: Option<&str>,
    value: &str,
    store: &mut AnswerStore<S>,
) -> Result<(), StoreError> {
    if previous == Some(OTHER_OPTION) && value != OTHER_OPTION {
        store.remove(&custom_id(&question.id))?;
    }
    Ok(())
}
