use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::application::ports::{PdfParser, PdfParserError};
use crate::domain::TextBlock;

/// Scripted parser for tests: returns a fixed block set and counts calls,
/// so cache short-circuiting can be asserted on.
pub struct MockPdfParser {
    blocks: Vec<TextBlock>,
    calls: AtomicUsize,
}

impl MockPdfParser {
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        Self {
            blocks,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfParser for MockPdfParser {
    async fn extract_blocks(&self, _data: &[u8]) -> Result<Vec<TextBlock>, PdfParserError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.blocks.is_empty() {
            return Err(PdfParserError::NoTextFound);
        }
        Ok(self.blocks.clone())
    }
}
