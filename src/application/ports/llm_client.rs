use async_trait::async_trait;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends a complete prompt and returns the model's raw text reply.
    async fn complete(&self, prompt: &str) -> Result<String, LlmClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmClientError {
    /// Transport-class failures worth retrying; a malformed response body
    /// is not one of them.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmClientError::ApiRequestFailed(_) | LlmClientError::RateLimited
        )
    }
}
