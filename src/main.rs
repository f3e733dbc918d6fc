//! CLI entry point: process one case end to end and print a short JSON
//! summary. Full artifacts land under the case's `outputs/` directory.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use medbill::config::{self, Config};
use medbill::kb;
use medbill::llm::VertexClient;
use medbill::ocr::DocAiClient;
use medbill::pipeline::overlay::OverlayRegistrar;
use medbill::pipeline::processor::CaseProcessor;
use medbill::storage::{LocalCaseStore, LocalKbStore};

/// Stdout stays a summary; the detail already lives in outputs/.
const SUMMARY_LIMIT: usize = 2000;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let Some(case_id) = case_id_from_args_or_env() else {
        eprintln!("usage: medbill <case-id>   (or set CASE_ID)");
        return ExitCode::from(2);
    };

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    match run(&case_id, &cfg) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(case_id = %case_id, error = %e, "Case processing failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn case_id_from_args_or_env() -> Option<String> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CASE_ID").ok())
        .filter(|s| !s.trim().is_empty())
}

fn run(case_id: &str, cfg: &Config) -> Result<String, Box<dyn std::error::Error>> {
    let store = LocalCaseStore::new(cfg.case_root.clone());
    let ocr = DocAiClient::from_config(cfg)?;
    let llm = VertexClient::from_config(cfg)?;
    let registrar = cfg
        .kb_root
        .as_ref()
        .map(|root| OverlayRegistrar::new(Box::new(LocalKbStore::new(root.clone()))));
    let global_kb = cfg
        .rag_base_dir
        .as_deref()
        .map(kb::load_global_text)
        .unwrap_or_default();

    let processor = CaseProcessor::new(
        Box::new(store),
        Box::new(ocr),
        Box::new(llm),
        registrar,
        global_kb,
        cfg.clone(),
    );

    let outcome = processor.process_case(case_id)?;
    let rendered = serde_json::to_string_pretty(&outcome)?;
    Ok(rendered.chars().take(SUMMARY_LIMIT).collect())
}
