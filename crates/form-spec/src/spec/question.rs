use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input type tag carried by every question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Email,
    Url,
    Number,
    Date,
    Textarea,
    Dropdown,
    DropdownWithCustom,
    DropdownWithConditional,
    Radio,
    RadioThenText,
    RadioThenList,
    RadioThenFile,
    Multiselect,
    FileUpload,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Email => "email",
            InputType::Url => "url",
            InputType::Number => "number",
            InputType::Date => "date",
            InputType::Textarea => "textarea",
            InputType::Dropdown => "dropdown",
            InputType::DropdownWithCustom => "dropdown_with_custom",
            InputType::DropdownWithConditional => "dropdown_with_conditional",
            InputType::Radio => "radio",
            InputType::RadioThenText => "radio_then_text",
            InputType::RadioThenList => "radio_then_list",
            InputType::RadioThenFile => "radio_then_file",
            InputType::Multiselect => "multiselect",
            InputType::FileUpload => "file_upload",
        }
    }

    /// Types whose control offers a fixed list of options.
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            InputType::Dropdown
                | InputType::DropdownWithCustom
                | InputType::DropdownWithConditional
                | InputType::Radio
                | InputType::RadioThenText
                | InputType::RadioThenList
                | InputType::RadioThenFile
                | InputType::Multiselect
        )
    }

    /// The `radio_then_*` family.
    pub fn is_radio_then(&self) -> bool {
        matches!(
            self,
            InputType::RadioThenText | InputType::RadioThenList | InputType::RadioThenFile
        )
    }

    /// Types that drive the conditional engine on change.
    pub fn is_conditional(&self) -> bool {
        self.is_radio_then() || matches!(self, InputType::DropdownWithConditional)
    }

    /// Single-line input flavour, if this is one.
    pub fn text_kind(&self) -> Option<TextKind> {
        match self {
            InputType::Text => Some(TextKind::Text),
            InputType::Email => Some(TextKind::Email),
            InputType::Url => Some(TextKind::Url),
            InputType::Number => Some(TextKind::Number),
            InputType::Date => Some(TextKind::Date),
            _ => None,
        }
    }
}

/// HTML-style flavour of a single-line input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Text,
    Email,
    Url,
    Number,
    Date,
}

impl TextKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextKind::Text => "text",
            TextKind::Email => "email",
            TextKind::Url => "url",
            TextKind::Number => "number",
            TextKind::Date => "date",
        }
    }
}

/// Control built for a revealed conditional child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    TextArea,
    File,
    Dropdown,
}

/// One schema-declared input unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub id: String,
    pub label: String,
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_options: Vec<String>,
}

impl Question {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }

    /// Child control declared for the conditional variants.
    pub fn child_kind(&self) -> Option<ChildKind> {
        match self.input_type {
            InputType::RadioThenText | InputType::RadioThenList => Some(ChildKind::TextArea),
            InputType::RadioThenFile => Some(ChildKind::File),
            InputType::DropdownWithConditional
                if self.child_type.as_deref() == Some("dropdown") =>
            {
                Some(ChildKind::Dropdown)
            }
            _ => None,
        }
    }
}
