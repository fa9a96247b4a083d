mod analysis_status;
mod chat_turn;
mod chunk;
mod document;
mod embedding;
mod finding;
mod text_block;

pub use analysis_status::AnalysisStatus;
pub use chat_turn::{ChatRole, ChatTurn, ChatTurnId};
pub use chunk::{Chunk, ChunkId};
pub use document::{Document, DocumentId};
pub use embedding::Embedding;
pub use finding::{ConcernCategory, Finding, FindingId, Severity};
pub use text_block::{BlockId, BoundingBox, TextBlock};
