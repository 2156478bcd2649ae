//! Collected answers ready for persistence

use agriforms_schema::AnswerValue;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use uuid::Uuid;

/// Answers of the visible fields, in canonical field order.
///
/// Serializes as a JSON object whose keys keep that order. A `None` value
/// is a visible field with no answer and no default (`null`).
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Unique submission id
    pub id: Uuid,
    /// Key of the submitted schema
    pub form_key: String,
    /// Time of submission
    pub submitted_at: DateTime<Utc>,
    entries: Vec<(String, Option<AnswerValue>)>,
}

impl Submission {
    pub(crate) fn new(form_key: impl Into<String>, entries: Vec<(String, Option<AnswerValue>)>) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_key: form_key.into(),
            submitted_at: Utc::now(),
            entries,
        }
    }

    /// Value for `field`; `None` when the field was not submitted
    pub fn get(&self, field: &str) -> Option<Option<&AnswerValue>> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_ref())
    }

    /// Whether `field` was submitted
    pub fn contains(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == field)
    }

    /// Submitted field names, in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Name and value pairs, in order
    pub fn entries(&self) -> &[(String, Option<AnswerValue>)] {
        &self.entries
    }

    /// Number of submitted fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No field was submitted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compact JSON object, keys in canonical order
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Indented JSON object, keys in canonical order
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Payload handed to a [`SubmissionSink`](crate::SubmissionSink)
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for Submission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
