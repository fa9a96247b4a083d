mod groq_client;
mod http_embedder;
mod mock_embedder;
mod mock_llm_client;

pub use groq_client::GroqClient;
pub use http_embedder::HttpEmbedder;
pub use mock_embedder::MockEmbedder;
pub use mock_llm_client::{MockLlmClient, ScriptedReply};
