use serde::{Deserialize, Serialize};

use super::LlmError;
use crate::config::Config;

/// Opaque language-model invocation seam. The pipeline never looks past this
/// trait; production talks to Vertex over REST, tests use [`MockLlmClient`].
pub trait LlmClient {
    fn generate_text(&self, prompt: &str) -> Result<String, LlmError>;

    /// Structured variant: the endpoint is asked for `application/json` and
    /// the response text must parse, otherwise `LlmError::MalformedJson`.
    /// The caller decides whether that is fatal for its stage.
    fn generate_json(&self, prompt: &str) -> Result<serde_json::Value, LlmError>;

    /// Same call against the (usually faster) redaction model.
    fn generate_text_redaction(&self, prompt: &str) -> Result<String, LlmError> {
        self.generate_text(prompt)
    }
}

/// Vertex AI `generateContent` REST client.
pub struct VertexClient {
    base_url: String,
    project_id: String,
    location: String,
    model_id: String,
    redaction_model_id: String,
    access_token: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl VertexClient {
    pub fn new(base_url: &str, cfg: &Config, timeout_secs: u64) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: cfg.project_id.clone(),
            location: cfg.vertex_location.clone(),
            model_id: cfg.model_id.clone(),
            redaction_model_id: cfg.redaction_model_id.clone(),
            access_token: cfg.access_token.clone(),
            client,
            timeout_secs,
        })
    }

    /// Production endpoint with a 5-minute timeout.
    pub fn from_config(cfg: &Config) -> Result<Self, LlmError> {
        Self::new("https://aiplatform.googleapis.com", cfg, 300)
    }

    fn model_url(&self, model_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.base_url, self.project_id, self.location, model_id
        )
    }

    fn generate(&self, model_id: &str, prompt: &str, json_mode: bool) -> Result<String, LlmError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: json_mode.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        let response = self
            .client
            .post(self.model_url(model_id))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    LlmError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        parsed.first_text().ok_or(LlmError::EmptyResponse)
    }
}

impl LlmClient for VertexClient {
    fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        self.generate(&self.model_id, prompt, false)
    }

    fn generate_json(&self, prompt: &str) -> Result<serde_json::Value, LlmError> {
        let text = self.generate(&self.model_id, prompt, true)?;
        serde_json::from_str(&text).map_err(|e| LlmError::MalformedJson(e.to_string()))
    }

    fn generate_text_redaction(&self, prompt: &str) -> Result<String, LlmError> {
        self.generate(&self.redaction_model_id, prompt, false)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        if parts.is_empty() {
            return None;
        }
        Some(
            parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join(""),
        )
    }
}

// ---------------------------------------------------------------------------
// Mock client
// ---------------------------------------------------------------------------

/// Mock client returning canned responses, in order, one per call. Text and
/// JSON calls draw from the same queue; redaction calls do too.
pub struct MockLlmClient {
    responses: std::sync::Mutex<std::collections::VecDeque<String>>,
    fallback: String,
}

impl MockLlmClient {
    /// Always answer with the same response.
    pub fn new(response: &str) -> Self {
        Self {
            responses: std::sync::Mutex::new(Default::default()),
            fallback: response.to_string(),
        }
    }

    /// Answer with the given responses in order, then keep repeating the
    /// last one.
    pub fn with_sequence(responses: &[&str]) -> Self {
        let fallback = responses.last().map(|s| s.to_string()).unwrap_or_default();
        Self {
            responses: std::sync::Mutex::new(
                responses.iter().map(|s| s.to_string()).collect(),
            ),
            fallback,
        }
    }

    fn next(&self) -> String {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl LlmClient for MockLlmClient {
    fn generate_text(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(self.next())
    }

    fn generate_json(&self, _prompt: &str) -> Result<serde_json::Value, LlmError> {
        let text = self.next();
        serde_json::from_str(&text).map_err(|e| LlmError::MalformedJson(e.to_string()))
    }
}
