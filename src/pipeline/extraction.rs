//! Per-document structured field extraction.
//!
//! One OCR text blob in, one [`PartialExtraction`] out. The model is asked
//! for JSON only; a malformed response is an error here, but the orchestrator
//! treats it as "this document contributes nothing" rather than aborting the
//! run.

use crate::llm::{LlmClient, LlmError};
use crate::models::PartialExtraction;

use super::prompts::EXTRACT_PROMPT;

pub struct FieldExtractor<'a> {
    llm: &'a dyn LlmClient,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm }
    }

    pub fn extract(&self, text: &str) -> Result<PartialExtraction, LlmError> {
        let prompt = format!("{EXTRACT_PROMPT}\n\n[DOCUMENT_TEXT]\n{text}");
        let value = self.llm.generate_json(&prompt)?;
        // Unknown keys are ignored, missing keys stay null; only a non-object
        // response is unusable.
        serde_json::from_value(value).map_err(|e| LlmError::MalformedJson(e.to_string()))
    }
}
