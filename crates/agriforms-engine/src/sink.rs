//! Submission sinks

use crate::error::SinkError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

/// Storage for submitted answer maps
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Persist one submission of `form_key`
    async fn persist(&self, form_key: &str, payload: Value) -> Result<(), SinkError>;
}

/// In-memory submission sink (for testing and development)
pub struct InMemorySubmissionSink {
    submissions: DashMap<String, Vec<Value>>,
}

impl InMemorySubmissionSink {
    /// Empty sink
    pub fn new() -> Self {
        Self {
            submissions: DashMap::new(),
        }
    }

    /// Payloads persisted for `form_key`, oldest first
    pub fn submissions(&self, form_key: &str) -> Vec<Value> {
        self.submissions
            .get(form_key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

impl Default for InMemorySubmissionSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionSink for InMemorySubmissionSink {
    async fn persist(&self, form_key: &str, payload: Value) -> Result<(), SinkError> {
        if !payload.is_object() {
            return Err(SinkError::Rejected("payload must be a JSON object".into()));
        }
        self.submissions
            .entry(form_key.to_string())
            .or_default()
            .push(payload);
        Ok(())
    }
}
