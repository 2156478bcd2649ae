//! Input messages

use chrono::NaiveDate;
use std::fmt;

/// One change to one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInput {
    /// Target field name
    pub field: String,
    /// New value
    pub value: InputValue,
}

impl FieldInput {
    /// Input carrying any value
    pub fn new(field: impl Into<String>, value: InputValue) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    /// Text or textarea input
    pub fn text(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(field, InputValue::Text(text.into()))
    }

    /// Select one option
    pub fn choice(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, InputValue::Choice(Some(value.into())))
    }

    /// Tick or untick a checkbox
    pub fn checked(field: impl Into<String>, checked: bool) -> Self {
        Self::new(field, InputValue::Checked(checked))
    }

    /// Upload one file
    pub fn file(
        field: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self::new(
            field,
            InputValue::AddFile {
                filename: filename.into(),
                content_type: content_type.into(),
                bytes,
            },
        )
    }
}

/// Value carried by an input. `None` clears the answer.
#[derive(Clone, PartialEq)]
pub enum InputValue {
    /// Text or textarea; stored even when empty
    Text(String),
    /// Finite number
    Number(Option<f64>),
    /// Calendar date
    Date(Option<NaiveDate>),
    /// Select
    Choice(Option<String>),
    /// Multi-select; an empty list clears
    Choices(Vec<String>),
    /// Checkbox state
    Checked(bool),
    /// Id of a record offered by a lookup control
    Lookup(Option<i64>),
    /// Append an upload to a file field
    AddFile {
        /// Client-side file name
        filename: String,
        /// Declared MIME type
        content_type: String,
        /// Raw content
        bytes: Vec<u8>,
    },
    /// Remove the file at this index
    RemoveFile(usize),
}

impl fmt::Debug for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Self::Choice(c) => f.debug_tuple("Choice").field(c).finish(),
            Self::Choices(c) => f.debug_tuple("Choices").field(c).finish(),
            Self::Checked(b) => f.debug_tuple("Checked").field(b).finish(),
            Self::Lookup(id) => f.debug_tuple("Lookup").field(id).finish(),
            Self::AddFile {
                filename,
                content_type,
                bytes,
            } => f
                .debug_struct("AddFile")
                .field("filename", filename)
                .field("content_type", content_type)
                .field("size", &bytes.len())
                .finish(),
            Self::RemoveFile(index) => f.debug_tuple("RemoveFile").field(index).finish(),
        }
    }
}
