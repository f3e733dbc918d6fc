//! Deterministic identifiers for hospitals and payers.
//!
//! Overlay entries are keyed by these ids, so the same real-world entity must
//! always map to the same slug no matter which document it was read from.
//! A small alias table folds known name variants (campus suffixes, payer
//! abbreviations) onto one canonical display name before slugging.

use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Known hospital name variants. Grown by explicit entries only; unmatched
/// names pass through to slugging unchanged.
const HOSPITAL_ALIASES: &[(&str, &str)] = &[
    (
        "ascension se wisconsin hospital - franklin campus",
        "Ascension SE Wisconsin",
    ),
    (
        "ascension se wisconsin hospital - elmbrook campus",
        "Ascension SE Wisconsin",
    ),
    ("ascension se wisconsin hospital", "Ascension SE Wisconsin"),
    (
        "froedtert memorial lutheran hospital",
        "Froedtert Hospital",
    ),
    ("froedtert & mcw froedtert hospital", "Froedtert Hospital"),
];

/// Known payer name variants.
const PAYER_ALIASES: &[(&str, &str)] = &[
    ("uhc", "UnitedHealthcare"),
    ("united healthcare", "UnitedHealthcare"),
    ("united health care", "UnitedHealthcare"),
    ("bcbs", "Blue Cross Blue Shield"),
    ("blue cross and blue shield", "Blue Cross Blue Shield"),
    ("anthem bcbs", "Anthem Blue Cross Blue Shield"),
];

/// Lowercase, collapse any run of non `[a-z0-9]` to a single `_`, strip
/// leading/trailing `_`. Empty input yields the fixed sentinel.
pub fn slug(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let collapsed = NON_ALNUM.replace_all(&lowered, "_");
    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Case/whitespace-insensitive exact lookup key.
fn alias_key(name: &str) -> String {
    WHITESPACE
        .replace_all(name.trim(), " ")
        .to_lowercase()
}

fn resolve_alias(name: &str, table: &[(&str, &str)]) -> String {
    let key = alias_key(name);
    for (alias, canonical) in table {
        if *alias == key {
            return (*canonical).to_string();
        }
    }
    name.to_string()
}

/// Canonical hospital display name after alias resolution.
pub fn canonical_hospital_name(provider_name: &str) -> String {
    resolve_alias(provider_name, HOSPITAL_ALIASES)
}

/// Canonical payer display name after alias resolution.
pub fn canonical_payer_name(payer_name: &str) -> String {
    resolve_alias(payer_name, PAYER_ALIASES)
}

/// Deterministic hospital id: `{slug(state)}_{slug(canonical name)}`, or just
/// the name slug when no state is known.
pub fn hospital_id(provider_name: &str, state: Option<&str>) -> String {
    let base = slug(&canonical_hospital_name(provider_name));
    match state {
        Some(st) if !st.trim().is_empty() => format!("{}_{}", slug(st), base),
        _ => base,
    }
}

/// Deterministic payer id, or None when no payer name is known.
pub fn payer_id(payer_name: Option<&str>, plan_name: Option<&str>) -> Option<String> {
    let payer = payer_name?;
    let base = slug(&canonical_payer_name(payer));
    Some(match plan_name {
        Some(plan) if !plan.trim().is_empty() => format!("{}_{}", base, slug(plan)),
        _ => base,
    })
}
