//! Case processing orchestrator.
//!
//! Single entry point that drives the full case pipeline:
//! discover → classify/select → OCR → extract → fuse → overlay → persist →
//! generate findings → generate derived artifacts.
//!
//! Uses trait-based DI for all seams (CaseStore, OcrEngine, LlmClient) so the
//! orchestrator remains fully testable with mock implementations.
//!
//! Failure policy, encoded in the types: per-document OCR/extraction and the
//! overlay step degrade ([`StageResult`]); storage and generation failures
//! are fatal; an empty case is a clean terminal outcome, not an error.

use uuid::Uuid;

use crate::config::Config;
use crate::llm::{LlmClient, LlmError};
use crate::models::{
    CaseFile, CaseMetadata, CaseOutcome, DocKind, Findings, PartialExtraction, PickedFiles,
    SelectedDocuments,
};
use crate::ocr::OcrEngine;
use crate::storage::{CaseStore, StorageError};

use super::extraction::FieldExtractor;
use super::overlay::OverlayRegistrar;
use super::{discovery, fusion, prompts, PipelineError, StageResult};

/// Fixed text artifact names under the case's `outputs/` namespace.
const TEXT_ARTIFACTS: [(DocKind, &str); 3] = [
    (DocKind::Eob, "eob_text.txt"),
    (DocKind::Itemized, "itemized_text.txt"),
    (DocKind::Statement, "statement_text.txt"),
];

pub struct CaseProcessor {
    store: Box<dyn CaseStore + Send + Sync>,
    ocr: Box<dyn OcrEngine + Send + Sync>,
    llm: Box<dyn LlmClient + Send + Sync>,
    /// None when no knowledge base is configured; overlay registration is
    /// skipped silently and both ids stay null.
    registrar: Option<OverlayRegistrar>,
    /// Non-PHI reference corpus text for the findings prompt.
    global_kb: String,
    config: Config,
}

impl CaseProcessor {
    pub fn new(
        store: Box<dyn CaseStore + Send + Sync>,
        ocr: Box<dyn OcrEngine + Send + Sync>,
        llm: Box<dyn LlmClient + Send + Sync>,
        registrar: Option<OverlayRegistrar>,
        global_kb: String,
        config: Config,
    ) -> Self {
        Self {
            store,
            ocr,
            llm,
            registrar,
            global_kb,
            config,
        }
    }

    /// Run the full pipeline for one case, start to finish.
    pub fn process_case(&self, case_id: &str) -> Result<CaseOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        let _span =
            tracing::info_span!("process_case", case_id = %case_id, run_id = %run_id).entered();

        // Stage 1: discover
        let files = self.store.list_case_files(case_id)?;
        if files.is_empty() {
            tracing::info!("No files found for case");
            let message = format!("No files found under cases/{case_id}/");
            self.store.write_json(
                case_id,
                "findings.json",
                &serde_json::json!({ "case_id": case_id, "error": message }),
            )?;
            return Ok(CaseOutcome::no_files(case_id, message));
        }
        tracing::info!(file_count = files.len(), "Discovered case files");

        // Stage 2: classify & select
        let picked = discovery::pick_best_per_kind(&files);

        // Stage 3: acquire text, persisting each blob immediately so the
        // debug trail survives whatever happens downstream.
        let mut texts: Vec<(DocKind, String)> = Vec::with_capacity(3);
        for (kind, artifact) in TEXT_ARTIFACTS {
            let text = self.acquire_text(kind, picked.get(kind)).ok_or_default();
            self.store
                .write_text(case_id, artifact, &text, "text/plain; charset=utf-8")?;
            texts.push((kind, text));
        }

        // Stage 4: extract, in fixed EOB → ITEMIZED → STATEMENT order. Each
        // result stays tagged by its kind, so fusion precedence can never
        // depend on call-completion order.
        let extractor = FieldExtractor::new(self.llm.as_ref());
        let mut extracted: Vec<PartialExtraction> = Vec::new();
        for (kind, text) in &texts {
            if text.trim().is_empty() {
                continue;
            }
            if let Some(partial) = self.extract_one(&extractor, *kind, text).ok() {
                extracted.push(partial);
            }
        }

        // Stage 5: fuse, then overlay user-declared facts.
        let mut meta = fusion::fuse(&extracted);
        fusion::apply_user_inputs(&mut meta, &self.config);
        meta.files_detected = files.iter().map(|f| f.name.clone()).collect();
        meta.picked = picked_names(&picked);

        // Stage 6: overlay registration, best effort.
        self.register_overlays(&mut meta);

        // Stage 7: persist metadata before any generation call, so partial
        // progress survives a later failure.
        let meta_value = serde_json::to_value(&meta).map_err(StorageError::from)?;
        self.store.write_json(case_id, "meta.json", &meta_value)?;

        // Stage 8: findings.
        let findings = self.generate_findings(case_id, &meta, &texts)?;

        // Stage 9: derived artifacts, sequential; redaction consumes the
        // letter produced in the same pass.
        self.generate_derived(case_id, &meta, &findings)?;

        tracing::info!(
            findings = findings.findings.len(),
            "Case processing complete"
        );

        Ok(CaseOutcome {
            case_id: case_id.to_string(),
            meta: Some(meta),
            findings: Some(findings),
            error: None,
            saved: true,
        })
    }

    /// OCR one selected document. Absent selection and OCR failure both
    /// degrade to empty text; only the latter is worth a warning.
    fn acquire_text(&self, kind: DocKind, file: Option<&CaseFile>) -> StageResult<String> {
        let Some(file) = file else {
            return StageResult::Ok(String::new());
        };
        match self.ocr.extract_text(file) {
            Ok(text) => StageResult::Ok(text),
            Err(e) => {
                tracing::warn!(
                    kind = kind.as_str(),
                    file = %file.name,
                    error = %e,
                    "OCR failed, document contributes no text"
                );
                StageResult::Degraded(format!("ocr failed for {}: {e}", kind.as_str()))
            }
        }
    }

    /// Extract structured fields from one document's text. Failure means the
    /// document contributes no fields, the same as an all-null extraction.
    fn extract_one(
        &self,
        extractor: &FieldExtractor,
        kind: DocKind,
        text: &str,
    ) -> StageResult<PartialExtraction> {
        match extractor.extract(text) {
            Ok(partial) => StageResult::Ok(partial),
            Err(e) => {
                tracing::warn!(
                    kind = kind.as_str(),
                    error = %e,
                    "Extraction failed, document contributes no fields"
                );
                StageResult::Degraded(format!("extraction failed for {}: {e}", kind.as_str()))
            }
        }
    }

    /// Register hospital/payer overlay entries. Never fatal: each id is
    /// assigned as soon as its upsert succeeds, so a payer failure cannot
    /// discard an already-registered hospital id. The first failure records
    /// a short diagnostic on the metadata and stops further registration.
    fn register_overlays(&self, meta: &mut CaseMetadata) {
        let Some(registrar) = &self.registrar else {
            return;
        };

        if let Some(provider) = meta.provider_name.clone() {
            match registrar.ensure_hospital_overlay(&provider, meta.provider_state.as_deref()) {
                Ok(hid) => meta.hospital_id = Some(hid),
                Err(e) => {
                    let reason = format!("overlay skipped due to error: {e}");
                    tracing::warn!(reason = %reason, "Overlay registration skipped");
                    meta.overlay_warning = Some(reason);
                    return;
                }
            }
        }
        if let Some(payer) = meta.payer_name.clone() {
            match registrar.ensure_payer_overlay(&payer, meta.plan_name.as_deref()) {
                Ok(pid) => meta.payer_id = pid,
                Err(e) => {
                    let reason = format!("overlay skipped due to error: {e}");
                    tracing::warn!(reason = %reason, "Payer overlay registration skipped");
                    meta.overlay_warning = Some(reason);
                }
            }
        }
    }

    /// Stage 8: findings generation. Malformed model output is fatal for the
    /// run but carries its own error kind, so callers can tell "model
    /// produced unusable output" apart from transport failures.
    fn generate_findings(
        &self,
        case_id: &str,
        meta: &CaseMetadata,
        texts: &[(DocKind, String)],
    ) -> Result<Findings, PipelineError> {
        let text_for = |kind: DocKind| -> &str {
            texts
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, t)| t.as_str())
                .unwrap_or("")
        };

        // TODO: feed overlay KB text for hospital_id/payer_id once overlay
        // entries carry documents, not just markers.
        let overlay_kb = "";

        let prompt = prompts::build_findings_prompt(
            meta,
            text_for(DocKind::Eob),
            text_for(DocKind::Itemized),
            text_for(DocKind::Statement),
            &self.global_kb,
            overlay_kb,
        );

        let value = self.llm.generate_json(&prompt).map_err(|e| match e {
            LlmError::MalformedJson(msg) => PipelineError::MalformedFindings(msg),
            other => PipelineError::Generation(other),
        })?;
        let findings = Findings::from_value(&value).ok_or_else(|| {
            PipelineError::MalformedFindings("top-level findings value is not an object".into())
        })?;

        let findings_value = serde_json::to_value(&findings).map_err(StorageError::from)?;
        self.store
            .write_json(case_id, "findings.json", &findings_value)?;
        tracing::info!(findings = findings.findings.len(), "Findings persisted");
        Ok(findings)
    }

    /// Stage 9: report, patient email, hospital letter, redacted letter.
    /// All fatal on failure; the redaction input is the letter produced in
    /// this very call, so it can never run without it.
    fn generate_derived(
        &self,
        case_id: &str,
        meta: &CaseMetadata,
        findings: &Findings,
    ) -> Result<(), PipelineError> {
        let report = self
            .llm
            .generate_text(&prompts::build_report_prompt(case_id, meta, findings))?;
        self.store
            .write_text(case_id, "report.md", &report, "text/markdown; charset=utf-8")?;

        let email = self.llm.generate_text(&prompts::build_email_prompt(
            self.config.patient_name.as_deref(),
            findings,
            meta,
        ))?;
        self.store.write_text(
            case_id,
            "email_draft.txt",
            &email,
            "text/plain; charset=utf-8",
        )?;

        let letter = self
            .llm
            .generate_text(&prompts::build_hospital_letter_prompt(meta, findings))?;
        self.store.write_text(
            case_id,
            "hospital_letter_for_docs.txt",
            &letter,
            "text/plain; charset=utf-8",
        )?;

        let redacted = self.llm.generate_text_redaction(&format!(
            "{}\n\n[LETTER]\n{letter}",
            prompts::REDACTION_PROMPT
        ))?;
        self.store.write_text(
            case_id,
            "hospital_letter_for_docs_redacted.txt",
            &redacted,
            "text/plain; charset=utf-8",
        )?;

        Ok(())
    }
}

fn picked_names(picked: &SelectedDocuments) -> PickedFiles {
    PickedFiles {
        eob: picked.eob.as_ref().map(|f| f.name.clone()),
        itemized: picked.itemized.as_ref().map(|f| f.name.clone()),
        statement: picked.statement.as_ref().map(|f| f.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::llm::MockLlmClient;
    use crate::models::MimeKind;
    use crate::ocr::MockOcrEngine;
    use crate::storage::{
        CaseStore, FailingKbStore, KbStore, MemoryCaseStore, MemoryKbStore, StorageError,
    };
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // -- Shared-store adapters ---------------------------------------------

    struct SharedStore(Arc<MemoryCaseStore>);

    impl CaseStore for SharedStore {
        fn list_case_files(&self, case_id: &str) -> Result<Vec<CaseFile>, StorageError> {
            self.0.list_case_files(case_id)
        }

        fn write_text(
            &self,
            case_id: &str,
            artifact: &str,
            text: &str,
            content_type: &str,
        ) -> Result<(), StorageError> {
            self.0.write_text(case_id, artifact, text, content_type)
        }
    }

    struct SharedKb(Arc<MemoryKbStore>);

    impl KbStore for SharedKb {
        fn put_text(&self, path: &str, text: &str, content_type: &str) -> Result<(), StorageError> {
            self.0.put_text(path, text, content_type)
        }
    }

    /// KB store where only the payers prefix is down.
    struct PayerFailingKb(Arc<MemoryKbStore>);

    impl KbStore for PayerFailingKb {
        fn put_text(&self, path: &str, text: &str, content_type: &str) -> Result<(), StorageError> {
            if path.starts_with("10_dynamic_inputs/payers/") {
                return Err(StorageError::Unavailable("payer prefix down".into()));
            }
            self.0.put_text(path, text, content_type)
        }
    }

    /// LLM double driven by a script of per-call results.
    struct ScriptedLlm {
        script: Mutex<VecDeque<Result<String, String>>>,
    }

    impl ScriptedLlm {
        fn new(script: Vec<Result<&str, &str>>) -> Self {
            Self {
                script: Mutex::new(
                    script
                        .into_iter()
                        .map(|r| r.map(String::from).map_err(String::from))
                        .collect(),
                ),
            }
        }

        fn next(&self) -> Result<String, LlmError> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("script exhausted".to_string()))
                .map_err(LlmError::HttpClient)
        }
    }

    impl LlmClient for ScriptedLlm {
        fn generate_text(&self, _prompt: &str) -> Result<String, LlmError> {
            self.next()
        }

        fn generate_json(&self, _prompt: &str) -> Result<serde_json::Value, LlmError> {
            let text = self.next()?;
            serde_json::from_str(&text).map_err(|e| LlmError::MalformedJson(e.to_string()))
        }
    }

    // -- Fixtures ----------------------------------------------------------

    fn file(name: &str) -> CaseFile {
        CaseFile {
            uri: format!("/cases/ba47/{name}"),
            name: name.to_string(),
            mime: MimeKind::from_name(name),
        }
    }

    fn eob_extraction() -> &'static str {
        r#"{"doc_type": "EOB", "provider_name": "Froedtert Hospital",
            "provider_state": "WI", "payer_name": "UHC",
            "total_charge": 12480.0, "patient_responsibility": 2300.75}"#
    }

    fn itemized_extraction() -> &'static str {
        r#"{"doc_type": "ITEMIZED", "provider_name": "SHOULD NOT WIN",
            "dos_from": "2024-03-02", "dos_to": "2024-03-02"}"#
    }

    fn findings_response() -> &'static str {
        r#"{"findings": [{"type": "SelfPayDiscount", "confidence": 0.7,
             "evidence_quotes": ["(STATEMENT: ...)"], "next_actions": ["call billing"],
             "estimated_reduction_amount": "$1,200"}],
            "summary": "one angle"}"#
    }

    fn default_ocr() -> MockOcrEngine {
        MockOcrEngine::new()
            .with_text("eob.pdf", "EOB raw text")
            .with_text("itemized_bill.pdf", "Itemized raw text")
    }

    struct Fixture {
        store: Arc<MemoryCaseStore>,
        kb: Arc<MemoryKbStore>,
        processor: CaseProcessor,
    }

    fn fixture(
        files: Vec<CaseFile>,
        ocr: MockOcrEngine,
        llm: Box<dyn LlmClient + Send + Sync>,
        kb_failing: bool,
    ) -> Fixture {
        let store = Arc::new(MemoryCaseStore::new(files));
        let kb = Arc::new(MemoryKbStore::new());
        let registrar = if kb_failing {
            OverlayRegistrar::new(Box::new(FailingKbStore))
        } else {
            OverlayRegistrar::new(Box::new(SharedKb(kb.clone())))
        };
        let mut config = test_config(PathBuf::from("/unused"));
        config.household_size = Some(4);
        config.annual_income_range = Some("30k-45k".into());

        let processor = CaseProcessor::new(
            Box::new(SharedStore(store.clone())),
            Box::new(ocr),
            llm,
            Some(registrar),
            "global kb text".into(),
            config,
        );
        Fixture {
            store,
            kb,
            processor,
        }
    }

    // -- Tests -------------------------------------------------------------

    #[test]
    fn full_pipeline_success() {
        let llm = ScriptedLlm::new(vec![
            Ok(eob_extraction()),
            Ok(itemized_extraction()),
            Ok(findings_response()),
            Ok("# report"),
            Ok("email body"),
            Ok("letter body"),
            Ok("letter body [REDACTED]"),
        ]);
        let f = fixture(
            vec![file("eob.pdf"), file("itemized_bill.pdf")],
            default_ocr(),
            Box::new(llm),
            false,
        );

        let outcome = f.processor.process_case("ba47").unwrap();
        assert!(outcome.saved);
        assert!(outcome.error.is_none());

        let meta = outcome.meta.unwrap();
        // EOB wins shared fields, itemized fills what the EOB left null.
        assert_eq!(meta.provider_name.as_deref(), Some("Froedtert Hospital"));
        assert_eq!(meta.dos_from.as_deref(), Some("2024-03-02"));
        // User-declared facts applied after fusion.
        assert_eq!(meta.household_size, Some(4));
        assert_eq!(meta.annual_income_range.as_deref(), Some("30k-45k"));
        // Overlay succeeded: alias-resolved deterministic ids.
        assert_eq!(meta.hospital_id.as_deref(), Some("wi_froedtert_hospital"));
        assert_eq!(meta.payer_id.as_deref(), Some("unitedhealthcare"));
        assert!(meta.overlay_warning.is_none());
        assert_eq!(meta.doc_types_detected, vec!["EOB", "ITEMIZED"]);

        // Every fixed artifact exists.
        for artifact in [
            "eob_text.txt",
            "itemized_text.txt",
            "statement_text.txt",
            "meta.json",
            "findings.json",
            "report.md",
            "email_draft.txt",
            "hospital_letter_for_docs.txt",
            "hospital_letter_for_docs_redacted.txt",
        ] {
            assert!(
                f.store.written("ba47", artifact).is_some(),
                "missing artifact {artifact}"
            );
        }
        // Overlay entries landed in the KB.
        assert!(f
            .kb
            .object("10_dynamic_inputs/hospitals/wi_froedtert_hospital/meta.json")
            .is_some());

        let findings = outcome.findings.unwrap();
        assert_eq!(findings.findings.len(), 1);
        assert_eq!(findings.summary, "one angle");
    }

    #[test]
    fn empty_case_is_clean_terminal() {
        let f = fixture(
            vec![],
            MockOcrEngine::new(),
            Box::new(MockLlmClient::new("unused")),
            false,
        );

        let outcome = f.processor.process_case("ba47").unwrap();
        assert!(!outcome.saved);
        assert!(outcome.error.as_deref().unwrap().contains("No files found"));
        assert!(outcome.meta.is_none());
        assert!(outcome.findings.is_none());

        // An explicit error artifact, and nothing else.
        let findings = f.store.written("ba47", "findings.json").unwrap();
        assert!(findings.contains("No files found"));
        assert!(f.store.written("ba47", "report.md").is_none());
        assert!(f.store.written("ba47", "meta.json").is_none());
    }

    #[test]
    fn ocr_failure_degrades_to_absent_documents() {
        // All OCR calls fail, so no texts and no extraction calls; the first
        // scripted response is the findings call.
        let llm = ScriptedLlm::new(vec![
            Ok(findings_response()),
            Ok("# report"),
            Ok("email"),
            Ok("letter"),
            Ok("redacted"),
        ]);
        let f = fixture(
            vec![file("eob.pdf"), file("statement.pdf")],
            MockOcrEngine::failing(),
            Box::new(llm),
            false,
        );

        let outcome = f.processor.process_case("ba47").unwrap();
        assert!(outcome.saved);

        let meta = outcome.meta.unwrap();
        assert!(meta.provider_name.is_none());
        assert!(meta.doc_types_detected.is_empty());
        // Text artifacts still persisted (empty), keeping the debug trail.
        assert_eq!(f.store.written("ba47", "eob_text.txt").unwrap(), "");
    }

    #[test]
    fn one_bad_extraction_does_not_abort_siblings() {
        let llm = ScriptedLlm::new(vec![
            Ok("model refused to answer with JSON"), // EOB extraction
            Ok(itemized_extraction()),
            Ok(findings_response()),
            Ok("# report"),
            Ok("email"),
            Ok("letter"),
            Ok("redacted"),
        ]);
        let f = fixture(
            vec![file("eob.pdf"), file("itemized_bill.pdf")],
            default_ocr(),
            Box::new(llm),
            false,
        );

        let outcome = f.processor.process_case("ba47").unwrap();
        let meta = outcome.meta.unwrap();
        // EOB contributed nothing, the itemized extraction fills the fields.
        assert_eq!(meta.provider_name.as_deref(), Some("SHOULD NOT WIN"));
        assert_eq!(meta.doc_types_detected, vec!["ITEMIZED"]);
    }

    #[test]
    fn overlay_failure_is_isolated_and_recorded() {
        let llm = ScriptedLlm::new(vec![
            Ok(eob_extraction()),
            Ok(itemized_extraction()),
            Ok(findings_response()),
            Ok("# report"),
            Ok("email"),
            Ok("letter"),
            Ok("redacted"),
        ]);
        let f = fixture(
            vec![file("eob.pdf"), file("itemized_bill.pdf")],
            default_ocr(),
            Box::new(llm),
            true, // failing KB store
        );

        let outcome = f.processor.process_case("ba47").unwrap();
        assert!(outcome.saved);

        let meta = outcome.meta.unwrap();
        assert!(meta.hospital_id.is_none());
        assert!(meta.payer_id.is_none());
        assert!(meta
            .overlay_warning
            .as_deref()
            .unwrap()
            .contains("overlay skipped due to error"));
        // Findings generation still proceeded.
        assert!(outcome.findings.is_some());
        assert!(f.store.written("ba47", "findings.json").is_some());
    }

    #[test]
    fn payer_overlay_failure_keeps_hospital_id() {
        let llm = ScriptedLlm::new(vec![
            Ok(eob_extraction()),
            Ok(findings_response()),
            Ok("# report"),
            Ok("email"),
            Ok("letter"),
            Ok("redacted"),
        ]);
        let store = Arc::new(MemoryCaseStore::new(vec![file("eob.pdf")]));
        let kb = Arc::new(MemoryKbStore::new());
        let registrar = OverlayRegistrar::new(Box::new(PayerFailingKb(kb.clone())));
        let processor = CaseProcessor::new(
            Box::new(SharedStore(store.clone())),
            Box::new(default_ocr()),
            Box::new(llm),
            Some(registrar),
            String::new(),
            test_config(PathBuf::from("/unused")),
        );

        let outcome = processor.process_case("ba47").unwrap();
        let meta = outcome.meta.unwrap();
        // The hospital upsert already succeeded; its id survives the payer
        // failure, which only contributes the warning.
        assert_eq!(meta.hospital_id.as_deref(), Some("wi_froedtert_hospital"));
        assert!(meta.payer_id.is_none());
        assert!(meta
            .overlay_warning
            .as_deref()
            .unwrap()
            .contains("payer prefix down"));
        assert!(kb
            .object("10_dynamic_inputs/hospitals/wi_froedtert_hospital/meta.json")
            .is_some());
        // Findings generation still proceeded.
        assert!(outcome.findings.is_some());
    }

    #[test]
    fn no_registrar_means_silent_skip() {
        let llm = ScriptedLlm::new(vec![
            Ok(eob_extraction()),
            Ok(findings_response()),
            Ok("# report"),
            Ok("email"),
            Ok("letter"),
            Ok("redacted"),
        ]);
        let store = Arc::new(MemoryCaseStore::new(vec![file("eob.pdf")]));
        let processor = CaseProcessor::new(
            Box::new(SharedStore(store.clone())),
            Box::new(default_ocr()),
            Box::new(llm),
            None,
            String::new(),
            test_config(PathBuf::from("/unused")),
        );

        let outcome = processor.process_case("ba47").unwrap();
        let meta = outcome.meta.unwrap();
        assert!(meta.hospital_id.is_none());
        assert!(meta.payer_id.is_none());
        assert!(meta.overlay_warning.is_none());
    }

    #[test]
    fn malformed_findings_is_a_distinct_fatal_error() {
        let llm = ScriptedLlm::new(vec![
            Ok(eob_extraction()),
            Ok("absolutely not json"), // findings call
        ]);
        let f = fixture(vec![file("eob.pdf")], default_ocr(), Box::new(llm), false);

        let err = f.processor.process_case("ba47").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedFindings(_)));
        // Metadata was persisted before the failing generation call.
        assert!(f.store.written("ba47", "meta.json").is_some());
        assert!(f.store.written("ba47", "report.md").is_none());
    }

    #[test]
    fn redacted_letter_requires_letter_success() {
        let llm = ScriptedLlm::new(vec![
            Ok(eob_extraction()),
            Ok(findings_response()),
            Ok("# report"),
            Ok("email"),
            Err("letter generation unavailable"),
        ]);
        let f = fixture(vec![file("eob.pdf")], default_ocr(), Box::new(llm), false);

        let err = f.processor.process_case("ba47").unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));

        // Artifacts up to the failure survive; the letter and its redacted
        // copy were never written.
        assert!(f.store.written("ba47", "report.md").is_some());
        assert!(f.store.written("ba47", "email_draft.txt").is_some());
        assert!(f
            .store
            .written("ba47", "hospital_letter_for_docs.txt")
            .is_none());
        assert!(f
            .store
            .written("ba47", "hospital_letter_for_docs_redacted.txt")
            .is_none());
    }

    #[test]
    fn picked_names_reflect_selection() {
        let llm = ScriptedLlm::new(vec![
            Ok(eob_extraction()),
            Ok(findings_response()),
            Ok("# report"),
            Ok("email"),
            Ok("letter"),
            Ok("redacted"),
        ]);
        // Two EOBs: the shorter name must be picked and recorded.
        let f = fixture(
            vec![file("archive/duplicate_eob_copy.pdf"), file("eob.pdf")],
            default_ocr(),
            Box::new(llm),
            false,
        );

        let outcome = f.processor.process_case("ba47").unwrap();
        let meta = outcome.meta.unwrap();
        assert_eq!(meta.picked.eob.as_deref(), Some("eob.pdf"));
        assert!(meta.picked.itemized.is_none());
        assert_eq!(meta.files_detected.len(), 2);
    }
}
