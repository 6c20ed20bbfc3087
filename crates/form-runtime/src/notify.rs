use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    shown_at: Instant,
}

/// Transient toast messages; a newer toast replaces the current one.
#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Toast>,
    duration: Duration,
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.show_at(message, kind, Instant::now());
    }

    pub fn show_at(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        self.current = Some(Toast {
            message: message.into(),
            kind,
            shown_at: now,
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(message, ToastKind::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(message, ToastKind::Error);
    }

    /// The toast still on screen at `now`.
    pub fn current_at(&self, now: Instant) -> Option<&Toast> {
        self.current
            .as_ref()
            .filter(|toast| now.duration_since(toast.shown_at) < self.duration)
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current_at(Instant::now())
    }

    /// Hands the pending toast to a presenter that shows each toast once.
    pub fn take(&mut self) -> Option<Toast> {
        self.current.take()
    }
}

/// Dismissible banner with per-question help text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplanationBanner {
    text: Option<String>,
}

impl ExplanationBanner {
    pub fn show(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn hide(&mut self) {
        self.text = None;
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.text.is_some()
    }
}
