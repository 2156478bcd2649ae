//! Agriforms Schema - Declarative form definitions
//!
//! Pure value objects describing the dynamic forms attached to benefit
//! requests and complaints:
//! - Ordered, typed fields with an optional single visibility condition
//! - Round-trip JSON serialization for storage and the authoring tool
//! - Conversion from the flat field rows stored per benefit type
//! - Load-time diagnostics for schema authoring mistakes
//!
//! # Evaluation
//!
//! ```text
//! FormSchema ──► condition::evaluate_all(schema, answers) ──► VisibilitySet
//!                         ▲
//!                         │ re-run on every answer change
//!                    AnswerMap
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod condition;
pub mod field;
pub mod legacy;
pub mod lint;
pub mod schema;

pub use answer::{AnswerMap, AnswerValue, RelatedRecord, UploadedFile};
pub use condition::{
    evaluate_all, evaluate_visibility, index_fields, FieldIndex, VisibilityEvaluator, VisibilitySet,
};
pub use field::{
    Condition, ConditionOperator, FieldKind, FieldOption, FileSpec, FormField, Relation,
};
pub use legacy::LegacyFieldRow;
pub use lint::{lint, SchemaWarning};
pub use schema::FormSchema;

use thiserror::Error;

/// Schema error type
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema text is not a valid schema document
    #[error("malformed schema: {0}")]
    Parse(#[source] serde_json::Error),

    /// The schema could not be written out
    #[error("cannot serialize schema: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Two fields share the same name
    #[error("duplicate field name: {0}")]
    DuplicateField(String),
}

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;
