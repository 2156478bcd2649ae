//! CLI Commands

pub mod attach;
pub mod fill;
pub mod schema;

use anyhow::Context;
use std::path::Path;

pub(crate) fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
