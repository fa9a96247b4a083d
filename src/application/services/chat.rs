use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::ports::{
    ChatTurnRepository, Embedder, EmbedderError, FindingRepository, LlmClient, LlmClientError,
    RepositoryError, VectorIndex, VectorIndexError,
};
use crate::domain::{ChatRole, ChatTurn, Chunk, Finding, FindingId};

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub answer: String,
}

/// Answers follow-up questions scoped to one finding.
///
/// Context comes from retrieval only: the finding's originating chunk plus
/// its nearest neighbors within the same document. When retrieval comes
/// back empty the call fails rather than letting the model answer from
/// parametric knowledge alone. Concurrent questions on the same finding
/// are serialized so turn order matches arrival order; different findings
/// proceed independently.
pub struct ChatService {
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    findings: Arc<dyn FindingRepository>,
    turns: Arc<dyn ChatTurnRepository>,
    top_k: usize,
    finding_locks: FindingLocks,
}

impl ChatService {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        findings: Arc<dyn FindingRepository>,
        turns: Arc<dyn ChatTurnRepository>,
        top_k: usize,
    ) -> Self {
        Self {
            llm,
            embedder,
            index,
            findings,
            turns,
            top_k,
            finding_locks: FindingLocks::new(),
        }
    }

    #[tracing::instrument(skip(self, question), fields(finding_id = %finding_id))]
    pub async fn ask(
        &self,
        finding_id: FindingId,
        question: &str,
    ) -> Result<ChatResponse, ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::Validation("empty question".to_string()));
        }

        let lock = self.finding_locks.acquire(finding_id).await;
        let result = {
            let _serialized = lock.lock().await;
            self.answer(finding_id, question).await
        };
        self.finding_locks.release(finding_id, lock).await;
        result
    }

    async fn answer(
        &self,
        finding_id: FindingId,
        question: &str,
    ) -> Result<ChatResponse, ChatError> {
        let finding = self
            .findings
            .get_by_id(finding_id)
            .await?
            .ok_or(ChatError::FindingNotFound(finding_id))?;

        let history = self.turns.list_for_finding(finding_id).await?;
        let context = self.retrieve_context(&finding, question).await?;

        let prompt = build_chat_prompt(&finding, &context, &history, question);
        let answer = self
            .llm
            .complete(&prompt)
            .await
            .map_err(ChatError::Completion)?;

        self.turns
            .append(&ChatTurn::new(finding_id, ChatRole::User, question.to_string()))
            .await?;
        self.turns
            .append(&ChatTurn::new(finding_id, ChatRole::Assistant, answer.clone()))
            .await?;

        tracing::info!(context_chunks = context.len(), "Chat turn answered");
        Ok(ChatResponse { answer })
    }

    async fn retrieve_context(
        &self,
        finding: &Finding,
        question: &str,
    ) -> Result<Vec<Chunk>, ChatError> {
        let query = self
            .embedder
            .embed(question)
            .await
            .map_err(ChatError::Embedding)?;

        // Originating chunk first, then neighbors from the same document.
        let mut context = self.index.fetch(&[finding.chunk_id]).await?;
        let neighbors = self
            .index
            .search(&finding.document_id, &query, self.top_k)
            .await?;

        for scored in neighbors {
            if context.iter().all(|c| c.id != scored.chunk.id) {
                context.push(scored.chunk);
            }
        }

        if context.is_empty() {
            return Err(ChatError::ContextUnavailable);
        }

        Ok(context)
    }
}

/// Per-finding mutexes handed out to in-flight questions.
///
/// Entries live only while at least one question holds a clone of the
/// lock: `release` evicts the entry once the map's reference is the last
/// one, so the registry does not grow with every finding ever chatted.
struct FindingLocks {
    inner: Mutex<HashMap<FindingId, Arc<Mutex<()>>>>,
}

impl FindingLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, finding_id: FindingId) -> Arc<Mutex<()>> {
        let mut locks = self.inner.lock().await;
        Arc::clone(locks.entry(finding_id).or_default())
    }

    async fn release(&self, finding_id: FindingId, lock: Arc<Mutex<()>>) {
        drop(lock);
        let mut locks = self.inner.lock().await;
        if let Some(entry) = locks.get(&finding_id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(&finding_id);
            }
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

fn build_chat_prompt(
    finding: &Finding,
    context: &[Chunk],
    history: &[ChatTurn],
    question: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are an expert insurance consultant. Answer the question using only the finding and policy excerpts below.\n\n");
    prompt.push_str("FINDING:\n");
    prompt.push_str(&format!("- Category: {}\n", finding.category));
    prompt.push_str(&format!("- Severity: {}\n", finding.severity));
    prompt.push_str(&format!("- Summary: {}\n", finding.summary));
    if let Some(recommendation) = &finding.recommendation {
        prompt.push_str(&format!("- Recommendation: {}\n", recommendation));
    }

    prompt.push_str("\nPOLICY EXCERPTS:\n");
    for chunk in context {
        prompt.push_str(&format!(
            "[pages {}-{}] {}\n",
            chunk.page_start, chunk.page_end, chunk.text
        ));
    }

    if !history.is_empty() {
        prompt.push_str("\nCONVERSATION SO FAR:\n");
        for turn in history {
            prompt.push_str(&format!("{}: {}\n", turn.role, turn.content));
        }
    }

    prompt.push_str(&format!("\nQUESTION: {}\n", question));
    prompt.push_str("\nAnswer based only on the finding and excerpts above. If they do not contain the answer, say so.");
    prompt
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Retrieval produced zero chunks; answering would not be grounded.
    #[error("no retrievable context for this finding")]
    ContextUnavailable,
    #[error("finding not found: {0}")]
    FindingNotFound(FindingId),
    #[error("validation: {0}")]
    Validation(String),
    #[error("embedding: {0}")]
    Embedding(EmbedderError),
    #[error("retrieval: {0}")]
    Retrieval(#[from] VectorIndexError),
    #[error("completion: {0}")]
    Completion(LlmClientError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::FindingLocks;
    use crate::domain::FindingId;

    #[tokio::test]
    async fn given_released_lock_then_registry_entry_is_evicted() {
        let locks = FindingLocks::new();
        let id = FindingId::new();

        let lock = locks.acquire(id).await;
        {
            let _guard = lock.lock().await;
        }
        locks.release(id, lock).await;

        assert_eq!(locks.len().await, 0);
    }

    #[tokio::test]
    async fn given_concurrent_holder_then_entry_survives_until_last_release() {
        let locks = FindingLocks::new();
        let id = FindingId::new();

        let first = locks.acquire(id).await;
        let second = locks.acquire(id).await;
        assert!(Arc::ptr_eq(&first, &second));

        locks.release(id, first).await;
        assert_eq!(locks.len().await, 1);

        locks.release(id, second).await;
        assert_eq!(locks.len().await, 0);
    }

    #[tokio::test]
    async fn given_evicted_finding_when_asked_again_then_fresh_entry_works() {
        let locks = FindingLocks::new();
        let id = FindingId::new();

        let lock = locks.acquire(id).await;
        locks.release(id, lock).await;

        let again = locks.acquire(id).await;
        assert_eq!(locks.len().await, 1);
        locks.release(id, again).await;
        assert_eq!(locks.len().await, 0);
    }
}
