pub mod config;
pub mod ids;
pub mod kb;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod storage;
