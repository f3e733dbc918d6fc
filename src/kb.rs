//! Global knowledge-base loader.
//!
//! The findings prompt is grounded in a local corpus of non-PHI reference
//! documents (charity-care policies, 501(r) notes, price tables). They are
//! concatenated in sorted filename order with one header per file so the
//! model can cite them by name.

use std::path::{Path, PathBuf};

/// Concatenated corpus text: all `*.md` files first, then all `*.csv`, each
/// preceded by a `# FILE: <relative path>` header. A missing directory or an
/// unreadable file contributes nothing.
pub fn load_global_text(base: &Path) -> String {
    if !base.exists() {
        return String::new();
    }

    let mut parts = Vec::new();
    for ext in ["md", "csv"] {
        for path in sorted_files_with_ext(base, ext) {
            let Ok(content) = std::fs::read_to_string(&path) else {
                tracing::warn!(path = %path.display(), "Skipping unreadable KB file");
                continue;
            };
            let rel = path.strip_prefix(base).unwrap_or(&path);
            parts.push(format!("\n\n# FILE: {}\n", rel.display()));
            parts.push(content);
        }
    }
    parts.join("\n")
}

fn sorted_files_with_ext(base: &Path, ext: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect(base, ext, &mut found);
    found.sort();
    found
}

fn collect(dir: &Path, ext: &str, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, ext, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some(ext) {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dir_yields_empty() {
        assert_eq!(load_global_text(Path::new("/nonexistent/kb")), "");
    }

    #[test]
    fn concatenates_md_before_csv_in_sorted_order() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b_policy.md"), "policy B").unwrap();
        std::fs::write(tmp.path().join("a_policy.md"), "policy A").unwrap();
        std::fs::write(tmp.path().join("prices.csv"), "code,price").unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub/extra.md"), "extra").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let text = load_global_text(tmp.path());

        let a = text.find("# FILE: a_policy.md").unwrap();
        let b = text.find("# FILE: b_policy.md").unwrap();
        let csv = text.find("# FILE: prices.csv").unwrap();
        assert!(a < b && b < csv);
        assert!(text.contains("# FILE: sub/extra.md"));
        assert!(!text.contains("ignored"));
    }
}
