mod analyzer;
mod chat;
mod chunker;
mod deduplicator;
mod extraction;
mod lifecycle;
mod pipeline;
mod token_counter;

pub use analyzer::{AnalyzerError, ConcernAnalyzer, RetryPolicy};
pub use chat::{ChatError, ChatResponse, ChatService};
pub use chunker::BlockChunker;
pub use deduplicator::{Deduplicator, JaccardSimilarity, SummarySimilarity, normalize_summary};
pub use extraction::{ExtractionError, ExtractionService};
pub use lifecycle::{LifecycleTracker, ProgressSnapshot, TransitionError};
pub use pipeline::{AnalysisPipeline, IngestError, PipelineConfig};
pub use token_counter::count_tokens;
