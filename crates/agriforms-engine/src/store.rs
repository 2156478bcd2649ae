//! Schema stores

use crate::error::StoreError;
use agriforms_schema::FormSchema;
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};

/// Where form schemas come from
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Load the schema stored under `key`
    async fn load(&self, key: &str) -> Result<FormSchema, StoreError>;

    /// Store a schema under its own key
    async fn save(&self, schema: &FormSchema) -> Result<(), StoreError>;

    /// Stored keys, sorted
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Keys become file names, so they may not contain path components
fn check_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains(|c: char| c == '/' || c == '\\' || c == '\0');
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Schemas as `<dir>/<key>.json`
pub struct DirectorySchemaStore {
    dir: PathBuf,
}

impl DirectorySchemaStore {
    /// Store rooted at `dir`, created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl SchemaStore for DirectorySchemaStore {
    async fn load(&self, key: &str) -> Result<FormSchema, StoreError> {
        let path = self.path_for(key)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(key, path = %path.display(), "schema loaded");
        Ok(FormSchema::from_json(&content)?)
    }

    async fn save(&self, schema: &FormSchema) -> Result<(), StoreError> {
        let path = self.path_for(&schema.key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, schema.to_json_pretty()?).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-memory schema store (for testing and development)
pub struct InMemorySchemaStore {
    schemas: DashMap<String, FormSchema>,
}

impl InMemorySchemaStore {
    /// Empty store
    pub fn new() -> Self {
        Self {
            schemas: DashMap::new(),
        }
    }
}

impl Default for InMemorySchemaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaStore for InMemorySchemaStore {
    async fn load(&self, key: &str) -> Result<FormSchema, StoreError> {
        self.schemas
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn save(&self, schema: &FormSchema) -> Result<(), StoreError> {
        check_key(&schema.key)?;
        self.schemas.insert(schema.key.clone(), schema.clone());
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self.schemas.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}
