//! Storage seams for case files and knowledge-base objects.
//!
//! The pipeline only ever talks to these traits; production uses the local
//! filesystem implementations, tests use the in-memory stores below.

pub mod local;

pub use local::{LocalCaseStore, LocalKbStore};

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use crate::models::CaseFile;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Read/write access to one case's namespace.
///
/// Writes are idempotent overwrites by artifact name under the case's
/// `outputs/` sub-namespace; listing excludes that namespace and folder
/// markers.
pub trait CaseStore {
    /// All source objects under the case namespace, in a stable discovery
    /// order. Empty vec means the case has no files (a clean terminal state
    /// for the pipeline, not an error).
    fn list_case_files(&self, case_id: &str) -> Result<Vec<CaseFile>, StorageError>;

    fn write_text(
        &self,
        case_id: &str,
        artifact: &str,
        text: &str,
        content_type: &str,
    ) -> Result<(), StorageError>;

    fn write_json(
        &self,
        case_id: &str,
        artifact: &str,
        value: &serde_json::Value,
    ) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(value)?;
        self.write_text(case_id, artifact, &text, "application/json; charset=utf-8")
    }
}

/// Write access to the knowledge base, keyed by object path.
pub trait KbStore {
    fn put_text(&self, path: &str, text: &str, content_type: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// In-memory stores (test doubles, exported like the other mock seams)
// ---------------------------------------------------------------------------

/// In-memory case store: a fixed file listing plus captured writes.
#[derive(Default)]
pub struct MemoryCaseStore {
    pub files: Vec<CaseFile>,
    writes: Mutex<HashMap<String, String>>,
}

impl MemoryCaseStore {
    pub fn new(files: Vec<CaseFile>) -> Self {
        Self {
            files,
            writes: Mutex::new(HashMap::new()),
        }
    }

    /// Artifact text written under `{case_id}/outputs/{artifact}`, if any.
    pub fn written(&self, case_id: &str, artifact: &str) -> Option<String> {
        self.writes
            .lock()
            .unwrap()
            .get(&format!("{case_id}/outputs/{artifact}"))
            .cloned()
    }
}

impl CaseStore for MemoryCaseStore {
    fn list_case_files(&self, _case_id: &str) -> Result<Vec<CaseFile>, StorageError> {
        Ok(self.files.clone())
    }

    fn write_text(
        &self,
        case_id: &str,
        artifact: &str,
        text: &str,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.writes
            .lock()
            .unwrap()
            .insert(format!("{case_id}/outputs/{artifact}"), text.to_string());
        Ok(())
    }
}

/// In-memory KB store recording every object written.
#[derive(Default)]
pub struct MemoryKbStore {
    objects: Mutex<HashMap<String, String>>,
}

impl MemoryKbStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, path: &str) -> Option<String> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl KbStore for MemoryKbStore {
    fn put_text(&self, path: &str, text: &str, _content_type: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), text.to_string());
        Ok(())
    }
}

/// KB store that always fails, for overlay failure-isolation tests.
pub struct FailingKbStore;

impl KbStore for FailingKbStore {
    fn put_text(&self, _path: &str, _text: &str, _content_type: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("injected failure".into()))
    }
}
