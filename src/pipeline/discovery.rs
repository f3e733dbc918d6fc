//! File classification and candidate selection.
//!
//! Classification is a pure function of the base name. EOB is tested before
//! STATEMENT because EOB filenames frequently also contain "summary"-like
//! words, which would otherwise misclassify them.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{CaseFile, DocKind, SelectedDocuments};

// "eob" bounded by non-alphanumerics. Deliberately not `\b`: underscores are
// word characters to the regex engine but separators in filenames, and
// "eob_summary_2024.pdf" must still count as an EOB.
static EOB_PAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[^a-z0-9])eob([^a-z0-9]|$)").unwrap());
static ITEMIZED_PAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)itemized|itemised|detail").unwrap());
static STATEMENT_PAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)statement|summary").unwrap());

/// Semantic kind of a file, from its base name only. Total and deterministic.
pub fn classify(name: &str) -> DocKind {
    let base = name.rsplit('/').next().unwrap_or(name);
    if EOB_PAT.is_match(base) {
        DocKind::Eob
    } else if ITEMIZED_PAT.is_match(base) {
        DocKind::Itemized
    } else if STATEMENT_PAT.is_match(base) {
        DocKind::Statement
    } else {
        DocKind::Unknown
    }
}

/// One representative file per named kind.
///
/// Within a kind the file with the shortest object name wins — root-level
/// paths are more likely the primary document, longer paths tend to be nested
/// or duplicate copies. Ties keep discovery order (stable sort). UNKNOWN
/// files are carried as the full list, never reduced.
pub fn pick_best_per_kind(files: &[CaseFile]) -> SelectedDocuments {
    let mut eob = Vec::new();
    let mut itemized = Vec::new();
    let mut statement = Vec::new();
    let mut unknown = Vec::new();

    for f in files {
        match classify(&f.name) {
            DocKind::Eob => eob.push(f),
            DocKind::Itemized => itemized.push(f),
            DocKind::Statement => statement.push(f),
            DocKind::Unknown => unknown.push(f.clone()),
        }
    }

    fn choose(mut group: Vec<&CaseFile>) -> Option<CaseFile> {
        group.sort_by_key(|f| f.name.len());
        group.first().map(|f| (*f).clone())
    }

    SelectedDocuments {
        eob: choose(eob),
        itemized: choose(itemized),
        statement: choose(statement),
        unknown: (!unknown.is_empty()).then_some(unknown),
    }
}
