//! Typed input controls, one per field

use crate::error::{FormError, FormResult};
use crate::input::InputValue;
use crate::lookup::RelatedPerson;
use agriforms_attach::AcceptList;
use agriforms_schema::{AnswerValue, FieldKind, FieldOption, FormField, Relation};
use chrono::NaiveDate;
use serde_json::Value;

/// A rendered field: its definition plus the control state built for it
#[derive(Debug, Clone)]
pub struct FieldControl {
    /// Field definition from the schema
    pub field: FormField,
    /// Kind-specific state
    pub kind: ControlKind,
}

/// Control state per field kind
#[derive(Debug, Clone)]
pub enum ControlKind {
    /// Text input
    Text {
        /// Rendered as a textarea
        multiline: bool,
    },
    /// Number input
    Number,
    /// Date picker
    Date,
    /// Single choice
    Select {
        /// Offered options
        options: Vec<FieldOption>,
    },
    /// Multiple choice
    MultiSelect {
        /// Offered options
        options: Vec<FieldOption>,
    },
    /// Checkbox
    Checkbox,
    /// File upload
    Upload(UploadControl),
    /// Static text, never collected
    Label,
    /// Choice among the member's relatives
    Lookup {
        /// Relation the records were fetched for
        relation: Relation,
        /// Records offered, empty without a parent member
        records: Vec<RelatedPerson>,
    },
}

/// Limits of an upload control, with schema values or engine defaults applied
#[derive(Debug, Clone)]
pub struct UploadControl {
    /// Most files the field holds
    pub max_files: u32,
    /// Accepted-type list as written
    pub accepted: String,
    /// Parsed form of `accepted`
    pub accept_list: AcceptList,
}

/// Engine defaults for file fields
#[derive(Debug, Clone)]
pub(crate) struct UploadDefaults {
    pub max_files: u32,
    pub accepted_types: String,
}

impl FieldControl {
    /// Build the control for `field`. Lookup records are filled in by the builder.
    pub(crate) fn new(field: FormField, defaults: &UploadDefaults) -> Self {
        let kind = match &field.kind {
            FieldKind::Text => ControlKind::Text { multiline: false },
            FieldKind::TextArea => ControlKind::Text { multiline: true },
            FieldKind::Number => ControlKind::Number,
            FieldKind::Date => ControlKind::Date,
            FieldKind::Select { options } => ControlKind::Select { options: options.clone() },
            FieldKind::MultiSelect { options } => ControlKind::MultiSelect { options: options.clone() },
            FieldKind::Checkbox => ControlKind::Checkbox,
            FieldKind::File(spec) => {
                let accepted = spec
                    .accepted_file_types
                    .clone()
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| defaults.accepted_types.clone());
                ControlKind::Upload(UploadControl {
                    max_files: spec.max_files.unwrap_or(defaults.max_files),
                    accept_list: AcceptList::parse(&accepted),
                    accepted,
                })
            }
            FieldKind::Label => ControlKind::Label,
            FieldKind::Lookup(relation) => ControlKind::Lookup {
                relation: *relation,
                records: Vec::new(),
            },
        };
        Self { field, kind }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Whether the control contributes to the submission
    pub fn is_collected(&self) -> bool {
        !matches!(self.kind, ControlKind::Label)
    }

    /// Value submitted for a visible field that has no answer
    pub fn default_value(&self) -> Option<AnswerValue> {
        match &self.kind {
            ControlKind::Text { .. } => Some(AnswerValue::Text(String::new())),
            ControlKind::Checkbox => Some(AnswerValue::Bool(false)),
            ControlKind::Upload(_) => Some(AnswerValue::Files(Vec::new())),
            ControlKind::MultiSelect { .. } => Some(AnswerValue::Choices(Vec::new())),
            ControlKind::Number
            | ControlKind::Date
            | ControlKind::Select { .. }
            | ControlKind::Label
            | ControlKind::Lookup { .. } => None,
        }
    }

    /// Kind of input the control takes, for error messages
    pub fn expects(&self) -> &'static str {
        match &self.kind {
            ControlKind::Text { .. } => "text",
            ControlKind::Number => "number",
            ControlKind::Date => "date",
            ControlKind::Select { .. } => "choice",
            ControlKind::MultiSelect { .. } => "choices",
            ControlKind::Checkbox => "checked",
            ControlKind::Upload(_) => "file",
            ControlKind::Label => "no",
            ControlKind::Lookup { .. } => "record id",
        }
    }

    /// Records offered by a lookup control
    pub fn records(&self) -> &[RelatedPerson] {
        match &self.kind {
            ControlKind::Lookup { records, .. } => records,
            _ => &[],
        }
    }

    /// Interpret a JSON value as input for this control.
    ///
    /// Files are not expressible in JSON and are rejected here.
    pub fn input_from_json(&self, value: &Value) -> FormResult<InputValue> {
        let parsed = match (&self.kind, value) {
            (ControlKind::Text { .. }, Value::String(s)) => Some(InputValue::Text(s.clone())),
            (ControlKind::Text { .. }, Value::Null) => Some(InputValue::Text(String::new())),
            (ControlKind::Number, Value::Number(n)) => n.as_f64().map(|n| InputValue::Number(Some(n))),
            (ControlKind::Number, Value::Null) => Some(InputValue::Number(None)),
            (ControlKind::Date, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| InputValue::Date(Some(d))),
            (ControlKind::Date, Value::Null) => Some(InputValue::Date(None)),
            (ControlKind::Select { .. }, Value::String(s)) => Some(InputValue::Choice(Some(s.clone()))),
            (ControlKind::Select { .. }, Value::Null) => Some(InputValue::Choice(None)),
            (ControlKind::MultiSelect { .. }, Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(InputValue::Choices),
            (ControlKind::Checkbox, Value::Bool(b)) => Some(InputValue::Checked(*b)),
            (ControlKind::Lookup { .. }, Value::Number(n)) => n.as_i64().map(|id| InputValue::Lookup(Some(id))),
            (ControlKind::Lookup { .. }, Value::Null) => Some(InputValue::Lookup(None)),
            _ => None,
        };
        parsed.ok_or_else(|| FormError::InputMismatch {
            field: self.field.name.clone(),
            expected: self.expects(),
        })
    }
}

impl UploadControl {
    /// Whether the accepted-type list covers the file
    pub fn permits(&self, filename: &str, content_type: &str) -> bool {
        self.accept_list.permits(filename, content_type)
    }
}
