//! Fill command: replay inputs through an offline form instance

use super::read_text;
use crate::output::OutputFormat;
use agriforms_engine::{EngineConfig, FieldInput, FormBuilder, FormError, FormInstance, InputValue};
use agriforms_schema::FormSchema;
use anyhow::Context;
use colored::Colorize;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One recorded input
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    File {
        field: String,
        file: PathBuf,
        #[serde(default, rename = "contentType")]
        content_type: Option<String>,
    },
    Remove {
        field: String,
        remove: usize,
    },
    Value {
        field: String,
        #[serde(default)]
        value: Value,
    },
}

impl InputSpec {
    fn field(&self) -> &str {
        match self {
            Self::File { field, .. } | Self::Remove { field, .. } | Self::Value { field, .. } => field,
        }
    }
}

pub fn handle(schema: &Path, inputs: &Path, engine: &EngineConfig, format: OutputFormat) -> anyhow::Result<()> {
    let schema = FormSchema::from_json(&read_text(schema)?)
        .with_context(|| format!("parsing {}", schema.display()))?;
    let specs: Vec<InputSpec> = serde_json::from_str(&read_text(inputs)?)
        .with_context(|| format!("parsing inputs in {}", inputs.display()))?;
    let base = inputs.parent().unwrap_or_else(|| Path::new("."));

    let mut form = FormBuilder::new(schema).with_config(engine).build_offline()?;
    for warning in form.warnings() {
        eprintln!("{} {}", "warning".yellow().bold(), warning);
    }

    for (i, spec) in specs.into_iter().enumerate() {
        let field = spec.field().to_string();
        if let Err(e) = replay(&mut form, spec, base) {
            eprintln!("{} input #{} ({}): {:#}", "skipped".yellow().bold(), i + 1, field, e);
        }
    }

    let submission = form.submit()?;
    format.print(&submission)
}

/// Apply one input. Errors leave the form unchanged.
fn replay(form: &mut FormInstance, spec: InputSpec, base: &Path) -> anyhow::Result<()> {
    let input = match spec {
        InputSpec::File {
            field,
            file,
            content_type,
        } => {
            let path = base.join(&file);
            let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let filename = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&filename).into());
            FieldInput::file(field, filename, content_type, bytes)
        }
        InputSpec::Remove { field, remove } => FieldInput::new(field, InputValue::RemoveFile(remove)),
        InputSpec::Value { field, value } => {
            let control = form
                .control(&field)
                .ok_or_else(|| FormError::UnknownField(field.clone()))?;
            let value = control.input_from_json(&value)?;
            FieldInput::new(field, value)
        }
    };
    form.apply(input)?;
    Ok(())
}

fn guess_content_type(filename: &str) -> &'static str {
    match agriforms_attach::extension_of(filename).as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
