mod cache_store;
mod chat_turn_repository;
mod document_repository;
mod finding_repository;
mod memory_index;
mod pool;

pub use cache_store::SqliteCacheStore;
pub use chat_turn_repository::SqliteChatTurnRepository;
pub use document_repository::SqliteDocumentRepository;
pub use finding_repository::SqliteFindingRepository;
pub use memory_index::InMemoryVectorIndex;
pub use pool::{connect, init_schema};
