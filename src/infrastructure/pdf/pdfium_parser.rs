use std::time::Duration;

use async_trait::async_trait;
use pdfium_render::prelude::*;

use crate::application::ports::{PdfParser, PdfParserError};
use crate::domain::{BoundingBox, TextBlock};

use super::text_sanitizer::sanitize_block_text;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// PDF parser over the system pdfium library. Emits one block per text
/// segment, in reading order per page, with page-space coordinates.
#[derive(Default)]
pub struct PdfiumParser;

impl PdfiumParser {
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(data: &[u8]) -> Result<Vec<TextBlock>, PdfParserError> {
        let pdfium = Pdfium::new(
            Pdfium::bind_to_system_library()
                .map_err(|e| PdfParserError::ParseFailed(format!("pdfium bind failed: {e}")))?,
        );

        let doc = pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|e| PdfParserError::ParseFailed(format!("pdfium open failed: {e}")))?;

        let pages = doc.pages();
        if pages.len() == 0 {
            return Err(PdfParserError::EmptyDocument);
        }

        let mut blocks = Vec::new();
        for (page_index, page) in pages.iter().enumerate() {
            let text_page = page.text().map_err(|e| {
                PdfParserError::ParseFailed(format!("text extraction failed on page {page_index}: {e}"))
            })?;

            for segment in text_page.segments().iter() {
                let text = sanitize_block_text(&segment.text());
                if text.is_empty() {
                    continue;
                }

                let bounds = segment.bounds();
                let bbox = BoundingBox::new(
                    bounds.left.value,
                    bounds.bottom.value,
                    bounds.right.value,
                    bounds.top.value,
                );

                // Block index is document-wide so ids stay unique and
                // deterministic across re-extraction.
                blocks.push(TextBlock::new(page_index as u32 + 1, blocks.len(), bbox, text));
            }
        }

        if blocks.is_empty() {
            return Err(PdfParserError::NoTextFound);
        }

        Ok(blocks)
    }
}

#[async_trait]
impl PdfParser for PdfiumParser {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn extract_blocks(&self, data: &[u8]) -> Result<Vec<TextBlock>, PdfParserError> {
        let owned = data.to_vec();

        let blocks = tokio::time::timeout(
            EXTRACTION_TIMEOUT,
            tokio::task::spawn_blocking(move || Self::extract_sync(&owned)),
        )
        .await
        .map_err(|_| PdfParserError::TimedOut)?
        .map_err(|e| PdfParserError::ParseFailed(format!("task join error: {e}")))??;

        tracing::info!(blocks = blocks.len(), "PDF block extraction complete");
        Ok(blocks)
    }
}
