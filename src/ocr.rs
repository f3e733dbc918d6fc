//! OCR seam: one file in, extracted text out.
//!
//! Production posts the file to a Document AI processor over REST; the
//! endpoint host is keyed by region (`us` → `us-documentai.googleapis.com`).

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::models::CaseFile;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("cannot reach the OCR endpoint at {0}")]
    Connection(String),

    #[error("OCR endpoint returned error (status {status}): {body}")]
    Endpoint { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("response parsing error: {0}")]
    ResponseParsing(String),
}

pub trait OcrEngine {
    /// Extracted text for one file, empty string when the document carries no
    /// recognizable text.
    fn extract_text(&self, file: &CaseFile) -> Result<String, OcrError>;
}

/// Document AI `process` REST client.
pub struct DocAiClient {
    base_url: String,
    processor_name: String,
    access_token: String,
    client: reqwest::blocking::Client,
}

impl DocAiClient {
    pub fn new(base_url: &str, cfg: &Config, timeout_secs: u64) -> Result<Self, OcrError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OcrError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            processor_name: format!(
                "projects/{}/locations/{}/processors/{}",
                cfg.project_id, cfg.docai_location, cfg.ocr_processor_id
            ),
            access_token: cfg.access_token.clone(),
            client,
        })
    }

    /// Region-keyed production endpoint.
    pub fn from_config(cfg: &Config) -> Result<Self, OcrError> {
        let base = format!("https://{}-documentai.googleapis.com", cfg.docai_location);
        Self::new(&base, cfg, 300)
    }
}

#[derive(Serialize)]
struct ProcessRequest {
    #[serde(rename = "rawDocument")]
    raw_document: RawDocument,
}

#[derive(Serialize)]
struct RawDocument {
    /// Base64-encoded file bytes.
    content: String,
    #[serde(rename = "mimeType")]
    mime_type: &'static str,
}

#[derive(Deserialize)]
struct ProcessResponse {
    document: Option<ProcessedDocument>,
}

#[derive(Deserialize)]
struct ProcessedDocument {
    #[serde(default)]
    text: String,
}

impl OcrEngine for DocAiClient {
    fn extract_text(&self, file: &CaseFile) -> Result<String, OcrError> {
        let bytes = std::fs::read(&file.uri).map_err(|e| OcrError::ReadFile {
            path: file.uri.clone(),
            source: e,
        })?;

        let url = format!("{}/v1/{}:process", self.base_url, self.processor_name);
        let body = ProcessRequest {
            raw_document: RawDocument {
                content: base64::engine::general_purpose::STANDARD.encode(&bytes),
                mime_type: file.mime.as_mime(),
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    OcrError::Connection(self.base_url.clone())
                } else {
                    OcrError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OcrError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ProcessResponse = response
            .json()
            .map_err(|e| OcrError::ResponseParsing(e.to_string()))?;

        Ok(parsed.document.map(|d| d.text).unwrap_or_default())
    }
}

/// Mock OCR engine answering by file base name, for pipeline tests.
#[derive(Default)]
pub struct MockOcrEngine {
    texts: std::collections::HashMap<String, String>,
    fail_all: bool,
}

impl MockOcrEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the text returned for a given base name.
    pub fn with_text(mut self, base_name: &str, text: &str) -> Self {
        self.texts.insert(base_name.to_string(), text.to_string());
        self
    }

    /// Every call fails, for degradation tests.
    pub fn failing() -> Self {
        Self {
            texts: Default::default(),
            fail_all: true,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn extract_text(&self, file: &CaseFile) -> Result<String, OcrError> {
        if self.fail_all {
            return Err(OcrError::HttpClient("injected OCR failure".into()));
        }
        Ok(self
            .texts
            .get(file.base_name())
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MimeKind;

    #[test]
    fn process_response_without_document_is_empty() {
        let parsed: ProcessResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.document.is_none());
    }

    #[test]
    fn mock_returns_registered_text() {
        let ocr = MockOcrEngine::new().with_text("eob.pdf", "EOB TEXT");
        let file = CaseFile {
            uri: "/x/eob.pdf".into(),
            name: "eob.pdf".into(),
            mime: MimeKind::Pdf,
        };
        assert_eq!(ocr.extract_text(&file).unwrap(), "EOB TEXT");
    }

    #[test]
    fn mock_failing_fails() {
        let ocr = MockOcrEngine::failing();
        let file = CaseFile {
            uri: "/x/eob.pdf".into(),
            name: "eob.pdf".into(),
            mime: MimeKind::Pdf,
        };
        assert!(ocr.extract_text(&file).is_err());
    }
}
