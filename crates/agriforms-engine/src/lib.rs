//! Agriforms Engine
//!
//! Renders a [`FormSchema`](agriforms_schema::FormSchema) into typed
//! controls, applies user inputs through a single reducer and collects the
//! answers of the fields that are currently shown.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FormHandle                           │
//! │                  (mpsc ──► FormActor task)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       FormInstance                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐   │
//! │  │ FieldControl │  │  AnswerMap   │  │  VisibilitySet   │   │
//! │  │ (per field)  │  │ (live state) │  │ (per input)      │   │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ AttachmentValidator │ SchemaStore │ Lookup │ SubmissionSink │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actor;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod input;
pub mod instance;
pub mod lookup;
pub mod sink;
pub mod store;
pub mod submission;

pub use actor::{FormActor, FormHandle};
pub use config::EngineConfig;
pub use control::{ControlKind, FieldControl, UploadControl};
pub use error::{
    ConfigError, FieldViolation, FormError, FormResult, LookupError, SinkError, StoreError, UploadError,
    ViolationReason,
};
pub use events::FormEvent;
pub use input::{FieldInput, InputValue};
pub use instance::{FormBuilder, FormInstance};
pub use lookup::{InMemoryRelationshipLookup, RelatedPerson, RelationshipLookup};
pub use sink::{InMemorySubmissionSink, SubmissionSink};
pub use store::{DirectorySchemaStore, InMemorySchemaStore, SchemaStore};
pub use submission::Submission;
