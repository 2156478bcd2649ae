//! Flat field rows stored per benefit type
//!
//! Each benefit type keeps its form as rows of
//! `colonne / label / fieldtype / valeurs / condition / ordre / required`.
//! Options are packed as `v1,v2` or `v1:Label 1;v2:Label 2`, conditions as
//! `field,operator,value`.

use crate::field::{Condition, ConditionOperator, FieldKind, FieldOption, FileSpec, FormField, Relation};
use crate::schema::FormSchema;
use serde::{Deserialize, Serialize};

/// One stored field row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyFieldRow {
    /// Column name, becomes the field name
    pub colonne: String,
    /// Label
    #[serde(default)]
    pub label: Option<String>,
    /// Stored type name
    #[serde(default)]
    pub fieldtype: Option<String>,
    /// Packed options
    #[serde(default)]
    pub valeurs: Option<String>,
    /// Packed condition
    #[serde(default)]
    pub condition: Option<String>,
    /// Display order
    #[serde(default)]
    pub ordre: Option<i32>,
    /// Required flag
    #[serde(default)]
    pub required: bool,
}

/// Map a stored type name to a wire type name
pub fn canonical_type_name(fieldtype: Option<&str>) -> &'static str {
    let Some(fieldtype) = fieldtype else {
        return "text";
    };
    match fieldtype.to_lowercase().as_str() {
        "chiffre" | "number" | "integer" | "decimal" => "number",
        "texte" | "text" | "string" => "text",
        "textarea" | "text_area" => "textarea",
        "label" => "label",
        "enfant" => "enfant",
        "conjoint" => "conjoint",
        "multioption" | "multiselect" => "multiselect",
        "checkbox" | "boolean" => "checkbox",
        "date" => "date",
        "option" | "select" | "dropdown" | "combo" => "select",
        "file" | "upload" => "file",
        _ => "text",
    }
}

/// Stored type name for a kind
pub fn stored_type_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Number => "Chiffre",
        FieldKind::Text => "Texte",
        FieldKind::TextArea => "Textarea",
        FieldKind::Label => "Label",
        FieldKind::Lookup(Relation::Enfant) => "Enfant",
        FieldKind::Lookup(Relation::Conjoint) => "Conjoint",
        FieldKind::Checkbox => "Checkbox",
        FieldKind::MultiSelect { .. } => "MultiOption",
        FieldKind::Date => "Date",
        FieldKind::Select { .. } => "Option",
        FieldKind::File(_) => "File",
    }
}

/// Unpack `valeurs`
pub fn parse_options(valeurs: &str) -> Vec<FieldOption> {
    let separator = if valeurs.contains(';') { ';' } else { ',' };
    valeurs
        .split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once(':') {
            Some((value, label)) => FieldOption::new(value.trim(), label.trim()),
            None => FieldOption::new(part, part),
        })
        .collect()
}

/// Pack options into `valeurs`
pub fn format_options(options: &[FieldOption]) -> String {
    options
        .iter()
        .map(|opt| {
            let label = opt.display_label();
            if label == opt.value {
                opt.value.clone()
            } else {
                format!("{}:{}", opt.value, label)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Unpack a `field,operator,value` condition
pub fn parse_condition(packed: &str) -> Option<Condition> {
    let mut parts = packed.splitn(3, ',');
    let field = parts.next()?.trim();
    let operator = parts.next()?.trim();
    let value = parts.next().map(|v| v.trim().to_string());
    Some(Condition {
        field: field.to_string(),
        operator: ConditionOperator::from(operator),
        value,
    })
}

/// Pack a condition
pub fn format_condition(condition: &Condition) -> String {
    [
        condition.field.as_str(),
        condition.operator.as_str(),
        condition.value.as_deref().unwrap_or(""),
    ]
    .join(",")
}

impl From<&LegacyFieldRow> for FormField {
    fn from(row: &LegacyFieldRow) -> Self {
        let options = row
            .valeurs
            .as_deref()
            .map(parse_options)
            .unwrap_or_default();
        let kind = match canonical_type_name(row.fieldtype.as_deref()) {
            "file" => FieldKind::File(FileSpec::default()),
            type_name => FieldKind::from_wire(Some(type_name), options, None, None),
        };

        Self {
            name: row.colonne.clone(),
            label: row.label.clone(),
            placeholder: None,
            required: row.required,
            condition: row
                .condition
                .as_deref()
                .filter(|c| !c.is_empty())
                .and_then(parse_condition),
            order: row.ordre,
            kind,
        }
    }
}

impl From<&FormField> for LegacyFieldRow {
    fn from(field: &FormField) -> Self {
        let options = field.kind.options();
        Self {
            colonne: field.name.clone(),
            label: field.label.clone(),
            fieldtype: Some(stored_type_name(&field.kind).to_string()),
            valeurs: (!options.is_empty()).then(|| format_options(options)),
            condition: field.condition.as_ref().map(format_condition),
            ordre: Some(field.order.unwrap_or(0)),
            required: field.required,
        }
    }
}

impl FormSchema {
    /// Build a schema from stored rows
    pub fn from_legacy_rows(
        key: impl Into<String>,
        title: Option<String>,
        rows: &[LegacyFieldRow],
    ) -> Self {
        Self {
            key: key.into(),
            title,
            fields: rows.iter().map(FormField::from).collect(),
        }
    }

    /// Flatten into stored rows
    pub fn to_legacy_rows(&self) -> Vec<LegacyFieldRow> {
        self.fields.iter().map(LegacyFieldRow::from).collect()
    }
}
