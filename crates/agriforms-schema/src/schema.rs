//! Form schema aggregate

use crate::field::FormField;
use crate::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A form: identifier key, title and fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Identifier the schema is stored under
    pub key: String,
    /// Human title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Fields, in authoring order (see [`FormSchema::ordered_fields`])
    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl FormSchema {
    /// Create an empty schema
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: None,
            fields: Vec::new(),
        }
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(SchemaError::Parse)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(SchemaError::Serialize)
    }

    /// Fields in canonical display order
    pub fn ordered_fields(&self) -> Vec<&FormField> {
        let mut fields: Vec<&FormField> = self.fields.iter().collect();
        fields.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        fields
    }

    /// Copy of this schema with fields stored in canonical order
    pub fn canonicalized(&self) -> Self {
        Self {
            key: self.key.clone(),
            title: self.title.clone(),
            fields: self.ordered_fields().into_iter().cloned().collect(),
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First name that appears more than once
    pub fn find_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .find(|name| !seen.insert(*name))
    }

    /// Fail on duplicate field names
    pub fn ensure_unique_names(&self) -> Result<()> {
        match self.find_duplicate() {
            Some(name) => Err(SchemaError::DuplicateField(name.to_string())),
            None => Ok(()),
        }
    }

    /// Append a field. A field without an order goes after the current last one.
    pub fn push_field(&mut self, mut field: FormField) {
        if field.order.is_none() {
            let max_order = self
                .fields
                .iter()
                .filter_map(|f| f.order)
                .max()
                .unwrap_or(0)
                .max(0);
            field.order = Some(max_order + 1);
        }
        self.fields.push(field);
    }

    /// Replace the field named `name`. Returns false when there is none.
    pub fn replace_field(&mut self, name: &str, field: FormField) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(slot) => {
                *slot = field;
                true
            }
            None => false,
        }
    }

    /// Remove and return the field named `name`
    pub fn remove_field(&mut self, name: &str) -> Option<FormField> {
        let pos = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(pos))
    }
}
