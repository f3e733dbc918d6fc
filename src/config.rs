use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "medbill";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "info,medbill=debug".to_string()
}

/// Default case root when CASE_ROOT is not set explicitly:
/// ~/medbill/cases (user-visible on all platforms).
pub fn default_case_root() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join("medbill").join("cases"))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    Missing(&'static str),

    #[error("setting {name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Process-wide configuration, built once at startup and passed by reference.
///
/// There is deliberately no global settings proxy: everything that needs
/// configuration receives it explicitly, so tests can run with synthetic
/// configs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory holding `cases/{case_id}/` trees.
    pub case_root: PathBuf,
    /// Knowledge-base root for overlay entries. Absent disables the overlay
    /// step entirely.
    pub kb_root: Option<PathBuf>,
    /// Local corpus of non-PHI reference documents fed into the findings
    /// prompt. Absent means no global KB text.
    pub rag_base_dir: Option<PathBuf>,

    pub project_id: String,
    pub vertex_location: String,
    pub docai_location: String,
    pub model_id: String,
    /// Model used for the PII redaction pass over the hospital letter.
    pub redaction_model_id: String,
    pub ocr_processor_id: String,
    pub access_token: String,

    // User-declared case facts. These are authoritative and are applied on
    // top of document extraction, never the other way around.
    pub household_size: Option<u32>,
    pub annual_income_range: Option<String>,
    pub annual_income_usd: Option<f64>,
    pub patient_name: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let case_root = match env_opt("CASE_ROOT") {
            Some(v) => PathBuf::from(v),
            None => default_case_root().ok_or(ConfigError::Missing("CASE_ROOT"))?,
        };

        Ok(Self {
            case_root,
            kb_root: env_opt("KB_ROOT").map(PathBuf::from),
            rag_base_dir: env_opt("RAG_BASE_DIR").map(PathBuf::from),
            project_id: env_required("PROJECT_ID")?,
            vertex_location: env_opt("VERTEX_LOCATION")
                .unwrap_or_else(|| "us-central1".to_string()),
            docai_location: env_opt("DOCAI_LOCATION").unwrap_or_else(|| "us".to_string()),
            model_id: env_opt("MODEL_ID").unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            redaction_model_id: env_opt("REDACTION_MODEL_ID")
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            ocr_processor_id: env_required("OCR_PROCESSOR_ID")?,
            access_token: env_required("GCP_ACCESS_TOKEN")?,
            household_size: parse_opt("HOUSEHOLD_SIZE")?,
            annual_income_range: env_opt("ANNUAL_INCOME_RANGE"),
            annual_income_usd: parse_opt("ANNUAL_INCOME_USD")?,
            patient_name: env_opt("PATIENT_NAME"),
        })
    }
}

fn env_opt(name: &'static str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_required(name: &'static str) -> Result<String, ConfigError> {
    env_opt(name).ok_or(ConfigError::Missing(name))
}

fn parse_opt<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env_opt(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name,
                value: raw,
                reason: e.to_string(),
            }),
    }
}

/// A config with every external-service field stubbed out. Intended for
/// tests that wire mock collaborators.
#[cfg(test)]
pub fn test_config(case_root: PathBuf) -> Config {
    Config {
        case_root,
        kb_root: None,
        rag_base_dir: None,
        project_id: "test-project".into(),
        vertex_location: "us-central1".into(),
        docai_location: "us".into(),
        model_id: "test-model".into(),
        redaction_model_id: "test-model".into(),
        ocr_processor_id: "test-processor".into(),
        access_token: "test-token".into(),
        household_size: None,
        annual_income_range: None,
        annual_income_usd: None,
        patient_name: None,
    }
}
