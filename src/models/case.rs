use serde::{Deserialize, Serialize};

/// Media type of a discovered case file. Derived from the file extension;
/// anything unrecognized is treated as PDF, matching the intake convention
/// that scanned bills arrive as PDFs unless the name says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeKind {
    Pdf,
    Png,
    Jpeg,
}

impl MimeKind {
    pub fn from_name(name: &str) -> Self {
        let low = name.to_lowercase();
        if low.ends_with(".png") {
            MimeKind::Png
        } else if low.ends_with(".jpg") || low.ends_with(".jpeg") {
            MimeKind::Jpeg
        } else {
            MimeKind::Pdf
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            MimeKind::Pdf => "application/pdf",
            MimeKind::Png => "image/png",
            MimeKind::Jpeg => "image/jpeg",
        }
    }
}

/// Semantic category of a billing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocKind {
    Eob,
    Itemized,
    Statement,
    Unknown,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Eob => "EOB",
            DocKind::Itemized => "ITEMIZED",
            DocKind::Statement => "STATEMENT",
            DocKind::Unknown => "UNKNOWN",
        }
    }
}

/// One discovered object belonging to a case.
///
/// Constructed once per discovery pass and never mutated; `uri` is unique
/// within the case. The semantic kind is a pure function of `name` and is
/// computed by the classifier, not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFile {
    /// Opaque location string (absolute path or remote URI).
    pub uri: String,
    /// Object name relative to the case namespace. Used for classification
    /// and for the shortest-name tie-break during selection.
    pub name: String,
    pub mime: MimeKind,
}

impl CaseFile {
    /// Last path segment, the only part the classifier looks at.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// The chosen representative file per named kind. UNKNOWN files are carried
/// along as a list and never reduced to one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedDocuments {
    pub eob: Option<CaseFile>,
    pub itemized: Option<CaseFile>,
    pub statement: Option<CaseFile>,
    pub unknown: Option<Vec<CaseFile>>,
}

impl SelectedDocuments {
    pub fn get(&self, kind: DocKind) -> Option<&CaseFile> {
        match kind {
            DocKind::Eob => self.eob.as_ref(),
            DocKind::Itemized => self.itemized.as_ref(),
            DocKind::Statement => self.statement.as_ref(),
            DocKind::Unknown => None,
        }
    }
}
