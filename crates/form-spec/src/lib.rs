#![allow(missing_docs)]

pub mod answers;
pub mod conditional;
pub mod field;
pub mod render;
pub mod spec;
pub mod store;
pub mod validate;

pub use answers::{AnswerMap, AnswerValue, DraftRecord, custom_id, details_id, file_marker};
pub use conditional::{ConditionalChange, Visibility};
pub use field::{Applied, FieldInput, FieldTarget, InputError, apply_input};
pub use render::{
    AdvanceLabel, ChildField, Choice, Control, CustomField, FieldView, LiveFiles, RenderContext,
    SectionView, render_field, render_json_ui, render_section, render_text,
};
pub use spec::{ChildKind, FormSchema, InputType, Question, Section, TextKind};
pub use store::{AnswerStore, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreError};
pub use validate::{SchemaIssue, SchemaReport, ValidationResult, check_schema, validate_section};

/// JSON Schema describing the schema document format.
pub fn document_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(FormSchema)).unwrap_or_default()
}
