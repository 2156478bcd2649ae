//! Attachment commands

use crate::{output::OutputFormat, AttachCommands};
use agriforms_attach::{format_size, AttachmentValidator};
use agriforms_engine::EngineConfig;
use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
pub struct CheckRow {
    pub file: String,
    pub size: String,
    pub result: String,
    pub detail: String,
}

pub fn handle(action: AttachCommands, engine: &EngineConfig, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        AttachCommands::Check { file, mime, max_bytes } => {
            let mut settings = engine.attachments.clone();
            if let Some(max_bytes) = max_bytes {
                settings.max_bytes = max_bytes;
            }
            let validator = AttachmentValidator::new(&settings)?;
            check(&validator, &file, &mime, format)
        }
    }
}

fn check(validator: &AttachmentValidator, path: &Path, mime: &str, format: OutputFormat) -> anyhow::Result<()> {
    let content = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let outcome = validator.validate(&filename, mime, &content);
    let row = CheckRow {
        file: filename,
        size: format_size(content.len()),
        result: match &outcome {
            Ok(()) => "accepted".into(),
            Err(rejection) => rejection.code().into(),
        },
        detail: match &outcome {
            Ok(()) => String::new(),
            Err(rejection) => rejection.to_string(),
        },
    };
    format.print_rows(&[row])?;

    match outcome {
        Ok(()) => {
            eprintln!("{} {}", "accepted".green().bold(), path.display());
            Ok(())
        }
        Err(rejection) => Err(anyhow::Error::new(rejection).context(format!("{} rejected", path.display()))),
    }
}
