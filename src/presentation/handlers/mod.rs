mod analysis;
mod chat;
mod findings;
mod health;
mod ingest;
mod pdf;
mod progress;

pub use analysis::analysis_handler;
pub use chat::chat_handler;
pub use findings::findings_handler;
pub use health::health_handler;
pub use ingest::ingest_handler;
pub use pdf::pdf_handler;
pub use progress::progress_handler;
