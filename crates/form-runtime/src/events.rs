use std::collections::VecDeque;
use std::path::PathBuf;

use form_spec::{FieldInput, FieldTarget};

/// User interaction delivered to a [`FormSession`](crate::session::FormSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// A control on the current section changed.
    Input {
        id: String,
        target: FieldTarget,
        input: FieldInput,
    },
    /// Files picked in a file control; the paths stay live until the control is torn down.
    Attach {
        id: String,
        target: FieldTarget,
        paths: Vec<PathBuf>,
    },
    ShowExplanation {
        id: String,
    },
    DismissExplanation,
    SaveProgress,
    Next,
    Back,
    StartOver,
}

impl FormEvent {
    pub fn input(id: impl Into<String>, input: FieldInput) -> Self {
        FormEvent::Input {
            id: id.into(),
            target: FieldTarget::Question,
            input,
        }
    }

    pub fn custom(id: impl Into<String>, value: impl Into<String>) -> Self {
        FormEvent::Input {
            id: id.into(),
            target: FieldTarget::Custom,
            input: FieldInput::Text(value.into()),
        }
    }

    pub fn child(id: impl Into<String>, input: FieldInput) -> Self {
        FormEvent::Input {
            id: id.into(),
            target: FieldTarget::Child,
            input,
        }
    }
}

/// FIFO of pending events, consumed one at a time.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<FormEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: FormEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<FormEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
