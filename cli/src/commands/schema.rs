//! Schema commands

use super::read_text;
use crate::{output::OutputFormat, SchemaCommands};
use agriforms_engine::{DirectorySchemaStore, EngineConfig, SchemaStore};
use agriforms_schema::{FormSchema, LegacyFieldRow, SchemaWarning};
use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
pub struct WarningRow {
    pub field: String,
    pub warning: String,
}

impl From<&SchemaWarning> for WarningRow {
    fn from(warning: &SchemaWarning) -> Self {
        let field = match warning {
            SchemaWarning::UnknownConditionField { field, .. } | SchemaWarning::UnknownOperator { field, .. } => {
                field.clone()
            }
            SchemaWarning::SelfReferencingCondition(field)
            | SchemaWarning::DuplicateFieldName(field)
            | SchemaWarning::ChoiceWithoutOptions(field)
            | SchemaWarning::RequiredLabel(field) => field.clone(),
        };
        Self {
            field,
            warning: warning.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct SchemaRow {
    pub key: String,
    #[tabled(display_with = "display_title")]
    pub title: Option<String>,
    pub fields: usize,
}

fn display_title(title: &Option<String>) -> String {
    title.clone().unwrap_or_default()
}

pub async fn handle(action: SchemaCommands, engine: &EngineConfig, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        SchemaCommands::Check { file } => check(&file, format),
        SchemaCommands::Fmt { file, write } => fmt(&file, write),
        SchemaCommands::ImportLegacy { rows, key, title } => import_legacy(&rows, key, title),
        SchemaCommands::List => list(engine, format).await,
    }
}

fn load(path: &Path) -> anyhow::Result<FormSchema> {
    FormSchema::from_json(&read_text(path)?).with_context(|| format!("parsing {}", path.display()))
}

fn check(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let schema = load(path)?;
    let warnings = agriforms_schema::lint(&schema);
    let rows: Vec<WarningRow> = warnings.iter().map(WarningRow::from).collect();
    format.print_rows(&rows)?;

    schema.ensure_unique_names()?;

    let summary = format!(
        "{}: {} fields, {} warnings",
        schema.key,
        schema.fields.len(),
        warnings.len()
    );
    if warnings.is_empty() {
        eprintln!("{} {}", "ok".green().bold(), summary);
    } else {
        eprintln!("{} {}", "warning".yellow().bold(), summary);
    }
    Ok(())
}

fn fmt(path: &Path, write: bool) -> anyhow::Result<()> {
    let formatted = load(path)?.canonicalized().to_json_pretty()?;
    if write {
        std::fs::write(path, format!("{formatted}\n")).with_context(|| format!("writing {}", path.display()))?;
        eprintln!("{} {}", "formatted".green().bold(), path.display());
    } else {
        println!("{formatted}");
    }
    Ok(())
}

fn import_legacy(path: &Path, key: String, title: Option<String>) -> anyhow::Result<()> {
    let rows: Vec<LegacyFieldRow> =
        serde_json::from_str(&read_text(path)?).with_context(|| format!("parsing rows in {}", path.display()))?;
    let schema = FormSchema::from_legacy_rows(key, title, &rows);
    for warning in agriforms_schema::lint(&schema) {
        eprintln!("{} {}", "warning".yellow().bold(), warning);
    }
    println!("{}", schema.canonicalized().to_json_pretty()?);
    Ok(())
}

async fn list(engine: &EngineConfig, format: OutputFormat) -> anyhow::Result<()> {
    let store = DirectorySchemaStore::new(&engine.schema_dir);
    let mut rows = Vec::new();
    for key in store.keys().await? {
        let schema = store.load(&key).await.with_context(|| format!("loading schema `{key}`"))?;
        rows.push(SchemaRow {
            key,
            title: schema.title,
            fields: schema.fields.len(),
        });
    }
    format.print_rows(&rows)
}
