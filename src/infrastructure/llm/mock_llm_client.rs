use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{LlmClient, LlmClientError};

/// Scripted replies for one mock LLM call.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Reply(String),
    TransportFailure(String),
    RateLimited,
}

/// Test double that plays back a script of replies, then repeats a default
/// answer. Counts calls so retry behavior can be asserted on.
pub struct MockLlmClient {
    script: Mutex<VecDeque<ScriptedReply>>,
    default_reply: String,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: default_reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_script(script: Vec<ScriptedReply>, default_reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default_reply: default_reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.script.lock().await.pop_front() {
            Some(ScriptedReply::Reply(text)) => Ok(text),
            Some(ScriptedReply::TransportFailure(reason)) => {
                Err(LlmClientError::ApiRequestFailed(reason))
            }
            Some(ScriptedReply::RateLimited) => Err(LlmClientError::RateLimited),
            None => Ok(self.default_reply.clone()),
        }
    }
}
