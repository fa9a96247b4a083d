mod mock_parser;
mod pdfium_parser;
mod text_sanitizer;

pub use mock_parser::MockPdfParser;
pub use pdfium_parser::PdfiumParser;
pub use text_sanitizer::sanitize_block_text;
