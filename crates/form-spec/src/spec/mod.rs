pub mod form;
pub mod question;

pub use form::{FormSchema, Section};
pub use question::{ChildKind, InputType, Question, TextKind};
