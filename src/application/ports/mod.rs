mod blob_store;
mod cache_store;
mod chat_turn_repository;
mod document_repository;
mod embedder;
mod finding_repository;
mod llm_client;
mod pdf_parser;
mod repository_error;
mod vector_index;

pub use blob_store::{BlobStore, BlobStoreError};
pub use cache_store::CacheStore;
pub use chat_turn_repository::ChatTurnRepository;
pub use document_repository::DocumentRepository;
pub use embedder::{Embedder, EmbedderError};
pub use finding_repository::{FindingFilter, FindingRepository};
pub use llm_client::{LlmClient, LlmClientError};
pub use pdf_parser::{PdfParser, PdfParserError};
pub use repository_error::RepositoryError;
pub use vector_index::{ScoredChunk, VectorIndex, VectorIndexError};
