pub mod discovery;
pub mod extraction;
pub mod fusion;
pub mod overlay;
pub mod processor;
pub mod prompts;

use thiserror::Error;

use crate::llm::LlmError;
use crate::storage::StorageError;

/// Fatal pipeline failures. Soft failures never reach this type — they
/// degrade through [`StageResult`] instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("generation failed: {0}")]
    Generation(LlmError),

    #[error("findings output was not usable JSON: {0}")]
    MalformedFindings(String),
}

impl From<LlmError> for PipelineError {
    fn from(e: LlmError) -> Self {
        PipelineError::Generation(e)
    }
}

/// Outcome of a best-effort stage.
///
/// `Ok` carries the stage's value; `Degraded` means the stage contributed
/// nothing, with a short human-readable reason. Fatal failures use
/// `Err(PipelineError)` at the orchestrator instead, so the failure policy of
/// every stage is visible in its signature rather than inferred from
/// surrounding catch blocks.
#[derive(Debug)]
pub enum StageResult<T> {
    Ok(T),
    Degraded(String),
}

impl<T> StageResult<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            StageResult::Ok(v) => Some(v),
            StageResult::Degraded(_) => None,
        }
    }

    pub fn ok_or_default(self) -> T
    where
        T: Default,
    {
        match self {
            StageResult::Ok(v) => v,
            StageResult::Degraded(_) => T::default(),
        }
    }
}
