//! Field definitions
//!
//! The wire format is flat (`type` plus optional `options`, `maxFiles`,
//! `acceptedFileTypes`); in memory each kind carries only its own payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// Field
// =============================================================================

/// One named, typed unit of user input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawField", into = "RawField")]
pub struct FormField {
    /// Stable identifier, used as the answer-map key
    pub name: String,
    /// Human label
    pub label: Option<String>,
    /// Input placeholder
    pub placeholder: Option<String>,
    /// Whether a visible field must be answered before submit
    pub required: bool,
    /// Visibility condition
    pub condition: Option<Condition>,
    /// Display order (absent sorts last)
    pub order: Option<i32>,
    /// Kind and kind-specific payload
    pub kind: FieldKind,
}

impl FormField {
    /// Create a field of the given kind with no label, condition or order
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            placeholder: None,
            required: false,
            condition: None,
            order: None,
            kind,
        }
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the display order
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Attach a visibility condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Label shown to the user, falling back to the name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Canonical sort key: order ascending (absent last), then name
    pub fn sort_key(&self) -> (i64, &str) {
        let order = self.order.map(i64::from).unwrap_or(i64::MAX);
        (order, self.name.as_str())
    }
}

// =============================================================================
// Kinds
// =============================================================================

/// Field kind with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Multi-line text
    TextArea,
    /// Numeric input
    Number,
    /// Calendar date
    Date,
    /// Single choice among options
    Select {
        /// Available options
        options: Vec<FieldOption>,
    },
    /// Several choices among options
    MultiSelect {
        /// Available options
        options: Vec<FieldOption>,
    },
    /// Boolean checkbox
    Checkbox,
    /// File attachments
    File(FileSpec),
    /// Static section heading, never collected
    Label,
    /// Record picked from a member's relations
    Lookup(Relation),
}

impl FieldKind {
    /// Wire `type` string
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TextArea => "textarea",
            Self::Number => "number",
            Self::Date => "date",
            Self::Select { .. } => "select",
            Self::MultiSelect { .. } => "multiselect",
            Self::Checkbox => "checkbox",
            Self::File(_) => "file",
            Self::Label => "label",
            Self::Lookup(relation) => relation.type_name(),
        }
    }

    /// Build a kind from the flat wire attributes.
    ///
    /// Type names are case-insensitive; unknown or absent names give `Text`.
    pub fn from_wire(
        type_name: Option<&str>,
        options: Vec<FieldOption>,
        max_files: Option<u32>,
        accepted_file_types: Option<String>,
    ) -> Self {
        let type_name = type_name.map(str::to_ascii_lowercase);
        match type_name.as_deref() {
            Some("textarea") => Self::TextArea,
            Some("number") => Self::Number,
            Some("date") => Self::Date,
            Some("select") => Self::Select { options },
            Some("multiselect") => Self::MultiSelect { options },
            Some("checkbox") => Self::Checkbox,
            Some("file") => Self::File(FileSpec {
                max_files,
                accepted_file_types,
            }),
            Some("label") => Self::Label,
            Some("enfant") => Self::Lookup(Relation::Enfant),
            Some("conjoint") => Self::Lookup(Relation::Conjoint),
            Some("text") | None => Self::Text,
            Some(other) => {
                tracing::debug!(field_type = other, "unrecognized field type, using text");
                Self::Text
            }
        }
    }

    /// Options for choice kinds
    pub fn options(&self) -> &[FieldOption] {
        match self {
            Self::Select { options } | Self::MultiSelect { options } => options,
            _ => &[],
        }
    }

    /// Whether this kind produces an answer
    pub fn is_collected(&self) -> bool {
        !matches!(self, Self::Label)
    }
}

/// Configuration of a file field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSpec {
    /// Maximum number of files
    pub max_files: Option<u32>,
    /// Accepted types, e.g. `.pdf,.doc,image/*`
    pub accepted_file_types: Option<String>,
}

/// Relationship a lookup field is populated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Children of the member
    Enfant,
    /// Spouses of the member
    Conjoint,
}

impl Relation {
    /// Wire `type` string
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Enfant => "enfant",
            Self::Conjoint => "conjoint",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

// =============================================================================
// Options & conditions
// =============================================================================

/// Value/label pair of a choice field. Equality is by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldOption {
    /// Stored value
    pub value: String,
    /// Displayed label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FieldOption {
    /// Create an option
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: Some(label.into()),
        }
    }

    /// Label, falling back to the value
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

impl PartialEq for FieldOption {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for FieldOption {}

impl Hash for FieldOption {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for FieldOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_label())
    }
}

/// Single predicate over another field's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Name of the referenced field
    pub field: String,
    /// Comparison operator
    pub operator: ConditionOperator,
    /// Target value
    pub value: Option<String>,
}

impl Condition {
    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: ConditionOperator::Eq,
            value: Some(value.into()),
        }
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: ConditionOperator::Ne,
            value: Some(value.into()),
        }
    }
}

/// Condition operator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Operator this version does not know; kept verbatim
    Unknown(String),
}

impl ConditionOperator {
    /// Wire string
    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Unknown(op) => op,
        }
    }
}

impl From<&str> for ConditionOperator {
    fn from(op: &str) -> Self {
        match op {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            other => Self::Unknown(other.to_string()),
        }
    }
}

// =============================================================================
// Wire representation
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<RawCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_files: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accepted_file_types: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl From<RawField> for FormField {
    fn from(raw: RawField) -> Self {
        let condition = raw.condition.and_then(|c| match (c.field, c.operator) {
            (Some(field), Some(operator)) => Some(Condition {
                field,
                operator: ConditionOperator::from(operator.as_str()),
                value: c.value,
            }),
            _ => None,
        });
        let kind = FieldKind::from_wire(
            raw.field_type.as_deref(),
            raw.options.unwrap_or_default(),
            raw.max_files,
            raw.accepted_file_types,
        );

        Self {
            name: raw.name,
            label: raw.label,
            placeholder: raw.placeholder,
            required: raw.required.unwrap_or(false),
            condition,
            order: raw.order,
            kind,
        }
    }
}

impl From<FormField> for RawField {
    fn from(field: FormField) -> Self {
        let field_type = Some(field.kind.type_name().to_string());
        let (options, max_files, accepted_file_types) = match field.kind {
            FieldKind::Select { options } | FieldKind::MultiSelect { options } => {
                (Some(options), None, None)
            }
            FieldKind::File(spec) => (None, spec.max_files, spec.accepted_file_types),
            _ => (None, None, None),
        };

        Self {
            name: field.name,
            label: field.label,
            field_type,
            placeholder: field.placeholder,
            required: field.required.then_some(true),
            options,
            condition: field.condition.map(|c| RawCondition {
                field: Some(c.field),
                operator: Some(c.operator.as_str().to_string()),
                value: c.value,
            }),
            order: field.order,
            max_files,
            accepted_file_types,
        }
    }
}
