use serde::{Deserialize, Deserializer, Serialize};

/// One document's structured-field guess, produced by the extraction stage.
/// Every field is independently nullable — the model is told to answer null
/// when unsure, and we never trust it to be complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialExtraction {
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub provider_state: Option<String>,
    #[serde(default)]
    pub payer_name: Option<String>,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub dos_from: Option<String>,
    #[serde(default)]
    pub dos_to: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_charge: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub patient_responsibility: Option<f64>,
    #[serde(default)]
    pub is_out_of_network_mentioned: Option<bool>,
}

/// Accept a JSON number, a currency-ish string ("$1,234.56"), or null.
/// Models flip between the first two freely; unparsable strings become null
/// rather than failing the whole extraction.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_amount))
}

/// Parse a JSON value as a dollar amount, tolerating string formatting.
pub fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

/// Object names of the representative file chosen per kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PickedFiles {
    pub eob: Option<String>,
    pub itemized: Option<String>,
    pub statement: Option<String>,
}

/// The fused, authoritative record for one case. Built once per pipeline run,
/// immutable once handed to the generation stage, persisted as `meta.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseMetadata {
    pub provider_name: Option<String>,
    pub provider_state: Option<String>,
    pub payer_name: Option<String>,
    pub plan_name: Option<String>,
    pub dos_from: Option<String>,
    pub dos_to: Option<String>,
    pub total_charge: Option<f64>,
    pub patient_responsibility: Option<f64>,

    /// User-supplied, authoritative. Never derived from documents.
    pub household_size: Option<u32>,
    /// User-supplied income bracket string (e.g. "30k-45k").
    pub annual_income_range: Option<String>,
    /// Fallback when only a numeric income was configured; deliberately kept
    /// separate from the range field instead of being coerced into it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_income_usd: Option<f64>,

    pub hospital_id: Option<String>,
    pub payer_id: Option<String>,

    pub files_detected: Vec<String>,
    pub picked: PickedFiles,
    pub doc_types_detected: Vec<String>,
    pub overlay_warning: Option<String>,
}

/// One reduction angle the model identified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub evidence_quotes: Vec<String>,
    #[serde(default)]
    pub next_actions: Vec<String>,
    /// Free-text amount estimate ("$1,200" etc.), tallied for the hospital
    /// letter but never promised to the patient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_reduction_amount: Option<String>,
}

/// Typed findings record. Parsed leniently: malformed entries in the
/// `findings` array are dropped rather than failing the stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Findings {
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub summary: String,
}

impl Findings {
    /// Build from a raw model JSON object, skipping array items that do not
    /// deserialize.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let findings = obj
            .get("findings")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        let summary = obj
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Some(Self { findings, summary })
    }
}

/// Terminal summary returned by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub case_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<CaseMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<Findings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub saved: bool,
}

impl CaseOutcome {
    pub fn no_files(case_id: &str, message: String) -> Self {
        Self {
            case_id: case_id.to_string(),
            meta: None,
            findings: None,
            error: Some(message),
            saved: false,
        }
    }
}
