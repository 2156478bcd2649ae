//! Schema authoring diagnostics
//!
//! None of these stop a form from rendering except a duplicate name, which
//! the engine rejects on its own.

use crate::field::{ConditionOperator, FieldKind};
use crate::schema::FormSchema;
use std::collections::HashSet;
use thiserror::Error;

/// Authoring warning
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaWarning {
    /// Condition references a field the schema does not define; the field is always hidden
    #[error("field `{field}` depends on unknown field `{depends_on}` and will never be shown")]
    UnknownConditionField {
        /// Conditioned field
        field: String,
        /// Missing reference
        depends_on: String,
    },

    /// Field conditioned on itself
    #[error("field `{0}` depends on itself and will never be shown")]
    SelfReferencingCondition(String),

    /// Name used by more than one field
    #[error("field name `{0}` is used more than once")]
    DuplicateFieldName(String),

    /// Select or multiselect without options
    #[error("choice field `{0}` has no options")]
    ChoiceWithoutOptions(String),

    /// Operator other than `eq`/`ne`; the field is always shown
    #[error("field `{field}` uses unknown operator `{operator}` and will always be shown")]
    UnknownOperator {
        /// Conditioned field
        field: String,
        /// Operator as written
        operator: String,
    },

    /// Labels are never collected, so `required` has no effect
    #[error("label `{0}` is marked required; the flag is ignored")]
    RequiredLabel(String),
}

/// Collect authoring warnings, in field storage order
pub fn lint(schema: &FormSchema) -> Vec<SchemaWarning> {
    let names: HashSet<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut warnings = Vec::new();

    for field in &schema.fields {
        if !seen.insert(field.name.as_str()) && reported.insert(field.name.as_str()) {
            warnings.push(SchemaWarning::DuplicateFieldName(field.name.clone()));
        }

        match &field.kind {
            FieldKind::Select { options } | FieldKind::MultiSelect { options }
                if options.is_empty() =>
            {
                warnings.push(SchemaWarning::ChoiceWithoutOptions(field.name.clone()));
            }
            FieldKind::Label if field.required => {
                warnings.push(SchemaWarning::RequiredLabel(field.name.clone()));
            }
            _ => {}
        }

        let Some(condition) = &field.condition else {
            continue;
        };
        if condition.field == field.name {
            warnings.push(SchemaWarning::SelfReferencingCondition(field.name.clone()));
        } else if !names.contains(condition.field.as_str()) {
            warnings.push(SchemaWarning::UnknownConditionField {
                field: field.name.clone(),
                depends_on: condition.field.clone(),
            });
        }
        if let ConditionOperator::Unknown(op) = &condition.operator {
            warnings.push(SchemaWarning::UnknownOperator {
                field: field.name.clone(),
                operator: op.clone(),
            });
        }
    }

    warnings
}
