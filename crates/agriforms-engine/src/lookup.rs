//! Relationship lookups for `enfant` and `conjoint` fields

use crate::error::LookupError;
use agriforms_schema::{RelatedRecord, Relation};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A child or spouse of a member, as offered by a lookup field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedPerson {
    /// Registry id
    pub id: i64,
    /// Family name
    pub nom: String,
    /// Given name
    pub prenom: String,
    /// Birth date, when known
    pub date_naissance: Option<NaiveDate>,
}

impl RelatedPerson {
    /// Person without a known birth date
    pub fn new(id: i64, nom: impl Into<String>, prenom: impl Into<String>) -> Self {
        Self {
            id,
            nom: nom.into(),
            prenom: prenom.into(),
            date_naissance: None,
        }
    }

    /// Set the birth date
    pub fn born(mut self, date: NaiveDate) -> Self {
        self.date_naissance = Some(date);
        self
    }

    /// `NOM PRENOM`, followed by ` (né le YYYY-MM-DD)` when the birth date is known
    pub fn display_label(&self) -> String {
        match self.date_naissance {
            Some(date) => format!("{} {} (né le {})", self.nom, self.prenom, date.format("%Y-%m-%d")),
            None => format!("{} {}", self.nom, self.prenom),
        }
    }

    /// Projection stored in the answer map
    pub fn to_record(&self) -> RelatedRecord {
        RelatedRecord {
            id: self.id,
            nom: self.nom.clone(),
            prenom: self.prenom.clone(),
        }
    }
}

/// Source of a member's children and spouses
#[async_trait]
pub trait RelationshipLookup: Send + Sync {
    /// Records related to `parent`
    async fn related(&self, parent: i64, relation: Relation) -> Result<Vec<RelatedPerson>, LookupError>;
}

/// In-memory relationship lookup (for testing and development)
pub struct InMemoryRelationshipLookup {
    records: RwLock<HashMap<(i64, Relation), Vec<RelatedPerson>>>,
}

impl InMemoryRelationshipLookup {
    /// Empty lookup
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Register a relation of `parent`
    pub fn add(&self, parent: i64, relation: Relation, person: RelatedPerson) {
        self.records
            .write()
            .entry((parent, relation))
            .or_default()
            .push(person);
    }
}

impl Default for InMemoryRelationshipLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelationshipLookup for InMemoryRelationshipLookup {
    async fn related(&self, parent: i64, relation: Relation) -> Result<Vec<RelatedPerson>, LookupError> {
        Ok(self
            .records
            .read()
            .get(&(parent, relation))
            .cloned()
            .unwrap_or_default())
    }
}
