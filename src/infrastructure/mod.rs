pub mod llm;
pub mod observability;
pub mod pdf;
pub mod persistence;
pub mod storage;
