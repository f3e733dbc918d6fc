//! Filesystem-backed stores.
//!
//! A case lives under `{root}/cases/{case_id}/`; generated artifacts go to
//! the `outputs/` subdirectory of the case, which is excluded from discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{CaseFile, MimeKind};

use super::{CaseStore, KbStore, StorageError};

fn io_err(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub struct LocalCaseStore {
    root: PathBuf,
}

impl LocalCaseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn case_dir(&self, case_id: &str) -> PathBuf {
        self.root.join("cases").join(case_id)
    }

    fn collect_files(
        &self,
        case_dir: &Path,
        dir: &Path,
        out: &mut Vec<CaseFile>,
    ) -> Result<(), StorageError> {
        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(|e| io_err(dir, e))?
            .collect::<Result<_, _>>()
            .map_err(|e| io_err(dir, e))?;
        // Stable discovery order regardless of readdir order.
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                if file_name == "outputs" {
                    continue;
                }
                self.collect_files(case_dir, &path, out)?;
                continue;
            }
            if file_name == ".keep" {
                continue;
            }
            let name = path
                .strip_prefix(case_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            out.push(CaseFile {
                uri: path.display().to_string(),
                mime: MimeKind::from_name(&name),
                name,
            });
        }
        Ok(())
    }
}

impl CaseStore for LocalCaseStore {
    fn list_case_files(&self, case_id: &str) -> Result<Vec<CaseFile>, StorageError> {
        let case_dir = self.case_dir(case_id);
        if !case_dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        self.collect_files(&case_dir, &case_dir, &mut files)?;
        Ok(files)
    }

    fn write_text(
        &self,
        case_id: &str,
        artifact: &str,
        text: &str,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let outputs = self.case_dir(case_id).join("outputs");
        fs::create_dir_all(&outputs).map_err(|e| io_err(&outputs, e))?;
        let path = outputs.join(artifact);
        fs::write(&path, text).map_err(|e| io_err(&path, e))
    }
}

pub struct LocalKbStore {
    root: PathBuf,
}

impl LocalKbStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl KbStore for LocalKbStore {
    fn put_text(&self, path: &str, text: &str, _content_type: &str) -> Result<(), StorageError> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        fs::write(&full, text).map_err(|e| io_err(&full, e))
    }
}
