//! Storage boundary for converted documents.
//!
//! The pipeline hands a finished [`Value`] to a [`Store`], which performs an
//! idempotent upsert keyed by a [`DocId`]: callers either supply an id
//! (update) or let the store generate one (insert). The strict insert-only
//! path is exposed separately so implementations backed by a real database
//! can try it first and degrade to an update when another writer races the
//! same id in.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use kvitto_document::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocId(String);

impl DocId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        DocId(Uuid::new_v4().to_string())
    }

    /// Validates a caller-supplied id.
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        Uuid::parse_str(text)
            .map(|id| DocId(id.to_string()))
            .map_err(|err| StoreError::InvalidId {
                id: text.to_string(),
                reason: err.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid document id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },
    #[error("duplicate document id {0}")]
    DuplicateId(DocId),
    #[error("store file {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("store file {path} is not valid JSON: {source}")]
    Format {
        path: String,
        source: serde_json::Error,
    },
}

/// Outcome of an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted(DocId),
    Updated(DocId),
}

impl SaveOutcome {
    pub fn id(&self) -> &DocId {
        match self {
            SaveOutcome::Inserted(id) | SaveOutcome::Updated(id) => id,
        }
    }
}

/// What the conversion pipeline requires of document storage.
pub trait Store {
    /// Idempotent upsert: inserts under `id` (generated when absent) or
    /// updates the existing document.
    fn save(&mut self, id: Option<DocId>, document: Value) -> Result<SaveOutcome, StoreError>;

    fn find(&self, id: &DocId) -> Option<&Value>;

    /// All stored documents in insertion order.
    fn all(&self) -> Vec<(&DocId, &Value)>;
}

/// In-memory store with JSON-file persistence.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    documents: IndexMap<DocId, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Strict insert: fails on an existing id instead of updating.
    pub fn insert_new(&mut self, id: DocId, document: Value) -> Result<(), StoreError> {
        if self.documents.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        self.documents.insert(id, document);
        Ok(())
    }

    /// Loads a store file; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(err) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source: err,
                });
            }
        };
        serde_json::from_str(&text).map_err(|err| StoreError::Format {
            path: path.display().to_string(),
            source: err,
        })
    }

    pub fn persist(&self, path: &Path) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(self).map_err(|err| StoreError::Format {
            path: path.display().to_string(),
            source: err,
        })?;
        fs::write(path, text).map_err(|err| StoreError::Io {
            path: path.display().to_string(),
            source: err,
        })
    }
}

impl Store for MemoryStore {
    fn save(&mut self, id: Option<DocId>, document: Value) -> Result<SaveOutcome, StoreError> {
        let id = id.unwrap_or_else(DocId::generate);
        let replaced = self.documents.insert(id.clone(), document);
        Ok(match replaced {
            None => SaveOutcome::Inserted(id),
            Some(_) => SaveOutcome::Updated(id),
        })
    }

    fn find(&self, id: &DocId) -> Option<&Value> {
        self.documents.get(id)
    }

    fn all(&self) -> Vec<(&DocId, &Value)> {
        self.documents.iter().collect()
    }
}
