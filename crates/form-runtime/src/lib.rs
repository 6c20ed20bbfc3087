pub mod config;
pub mod events;
pub mod loader;
pub mod notify;
pub mod session;
pub mod submit;

pub use config::{ConfigError, FormConfig};
pub use events::{EventQueue, FormEvent};
pub use loader::{LOAD_FAILED_MESSAGE, LoadError, SchemaSource, load_schema, parse_schema};
pub use notify::{ExplanationBanner, Notifier, Toast, ToastKind};
pub use session::{
    Effect, FormSession, Screen, SessionError, SessionView, THANK_YOU, ThankYouView, Transition,
};
pub use submit::{
    FilePart, HttpTransport, SubmissionClient, SubmissionPayload, SubmitOutcome, SubmitResponse,
    Transport, TransportError,
};
