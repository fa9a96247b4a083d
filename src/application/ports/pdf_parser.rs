use async_trait::async_trait;

use crate::domain::TextBlock;

/// External PDF parser: raw bytes in, ordered per-page text blocks with
/// coordinates out. Implementations must preserve reading order within
/// each page and produce deterministic block ids for identical input.
#[async_trait]
pub trait PdfParser: Send + Sync {
    async fn extract_blocks(&self, data: &[u8]) -> Result<Vec<TextBlock>, PdfParserError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PdfParserError {
    #[error("failed to parse document: {0}")]
    ParseFailed(String),
    #[error("document contains zero pages")]
    EmptyDocument,
    #[error("no extractable text in document")]
    NoTextFound,
    #[error("extraction timed out")]
    TimedOut,
}
