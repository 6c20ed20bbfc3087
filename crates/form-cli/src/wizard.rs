use clap::ValueEnum;
use form_runtime::{ThankYouView, Toast, ToastKind, Transition};
use form_spec::{
    ChildField, Control, CustomField, FieldView, InputError, SectionView, StoreError,
    render::control_display, render_json_ui, render_text,
};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: section header and prompts only.
    Clean,
    /// Verbose output: control kinds, stored values and transitions.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// How a section is printed before its prompts.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RenderMode {
    Text,
    Json,
}

/// Prints sections, prompts and notifications for the terminal session.
pub struct WizardPresenter {
    verbosity: Verbosity,
    mode: RenderMode,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, mode: RenderMode) -> Self {
        Self { verbosity, mode }
    }

    pub fn show_section(&self, view: &SectionView) {
        match self.mode {
            RenderMode::Text => println!("{}", render_text(view)),
            RenderMode::Json => match serde_json::to_string_pretty(&render_json_ui(view)) {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize section: {}", err),
            },
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.title);
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        if prompt.has_explanation {
            line.push_str(" (? for help)");
        }
        println!("{}", line);
        if let Some(placeholder) = &prompt.placeholder {
            println!("  {}", placeholder);
        }
        if !prompt.choices.is_empty() {
            for (position, choice) in prompt.choices.iter().enumerate() {
                println!("  {}) {}", position + 1, choice);
            }
        }
        if self.verbosity.is_verbose() {
            println!("  [{}]", prompt.control_kind);
        }
    }

    pub fn show_banner(&self, text: &str) {
        println!("i {}", text);
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_input_error(&self, error: &InputError) {
        eprintln!("Invalid answer: {}", error);
    }

    pub fn show_toast(&self, toast: &Toast) {
        match toast.kind {
            ToastKind::Success => println!("[{}] {}", toast.kind.as_str(), toast.message),
            ToastKind::Error => eprintln!("[{}] {}", toast.kind.as_str(), toast.message),
        }
    }

    pub fn show_storage_error(&self, error: &StoreError) {
        eprintln!("Could not save draft: {}", error);
    }

    pub fn show_transition(&self, transition: Transition) {
        if self.verbosity.is_verbose() {
            println!(
                "--- section {} -> {} ---",
                transition.from + 1,
                transition.to + 1
            );
        } else {
            println!("---");
        }
    }

    pub fn show_thank_you(&self, view: &ThankYouView) {
        println!("Progress: 100%");
        println!("{}", view.heading);
        println!("{}", view.message);
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub hint: Option<String>,
    pub placeholder: Option<String>,
    pub choices: Vec<String>,
    pub current: Option<String>,
    pub control_kind: &'static str,
    pub has_explanation: bool,
}

impl PromptContext {
    pub fn for_field(field: &FieldView, position: usize, total: usize) -> Self {
        Self::new(
            &field.label,
            &field.control,
            position,
            total,
            field.explanation.is_some(),
        )
    }

    pub fn for_custom(custom: &CustomField, position: usize, total: usize) -> Self {
        Self {
            index: position + 1,
            total,
            title: custom.placeholder.clone(),
            hint: None,
            placeholder: None,
            choices: Vec::new(),
            current: (!custom.value.is_empty()).then(|| custom.value.clone()),
            control_kind: "text_input",
            has_explanation: false,
        }
    }

    pub fn for_child(
        child: &ChildField,
        control: &Control,
        position: usize,
        total: usize,
    ) -> Self {
        let title = child.label.clone().unwrap_or_else(|| "Details".to_string());
        Self::new(&title, control, position, total, false)
    }

    fn new(
        title: &str,
        control: &Control,
        position: usize,
        total: usize,
        has_explanation: bool,
    ) -> Self {
        let (hint, placeholder, choices) = match control {
            Control::TextInput {
                kind, placeholder, ..
            } => (
                Some(format!("({})", kind.as_str())),
                placeholder.clone(),
                Vec::new(),
            ),
            Control::TextArea { placeholder, .. } => {
                (Some("(text)".to_string()), placeholder.clone(), Vec::new())
            }
            Control::Dropdown {
                placeholder,
                options,
                ..
            } => (
                Some("(number or option, - to clear)".to_string()),
                Some(placeholder.clone()),
                options.clone(),
            ),
            Control::RadioGroup { options } => (
                Some("(number or option)".to_string()),
                None,
                options.iter().map(|choice| choice.label.clone()).collect(),
            ),
            Control::CheckboxGroup { options } => (
                Some("(comma-separated numbers or options, - for none)".to_string()),
                None,
                options.iter().map(|choice| choice.label.clone()).collect(),
            ),
            Control::FileUpload { status, .. } => (
                Some("(comma-separated file paths)".to_string()),
                Some(status.clone()),
                Vec::new(),
            ),
        };
        Self {
            index: position + 1,
            total,
            title: title.to_string(),
            hint,
            placeholder,
            choices,
            current: control_display(control),
            control_kind: control.kind_label(),
            has_explanation,
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}
