use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::application::ports::{CacheStore, LlmClient, LlmClientError};
use crate::domain::{Chunk, ConcernCategory, Finding, FindingId, Severity};

/// Bounded retry with exponential backoff, applied only to transport
/// failures against the LLM service.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Runs one chunk through the LLM concern detector and turns the verdict
/// into zero or one finding.
///
/// A malformed or out-of-taxonomy response skips the chunk; it never
/// aborts the document. Only exhausting the retry budget on transport
/// failures surfaces an error, which the pipeline escalates separately.
pub struct ConcernAnalyzer {
    llm: Arc<dyn LlmClient>,
    cache: Arc<dyn CacheStore>,
    retry: RetryPolicy,
}

/// Structured shape the model is asked to produce. Unknown fields are
/// ignored; enum membership is validated after parsing.
#[derive(Debug, Serialize, Deserialize)]
struct ChunkVerdict {
    is_concern: bool,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    recommendation: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

impl ConcernAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>, cache: Arc<dyn CacheStore>, retry: RetryPolicy) -> Self {
        Self { llm, cache, retry }
    }

    #[tracing::instrument(skip(self, chunk), fields(chunk_id = %chunk.id, pages = ?(chunk.page_start..=chunk.page_end)))]
    pub async fn analyze(&self, chunk: &Chunk) -> Result<Option<Finding>, AnalyzerError> {
        let cache_key = verdict_cache_key(&chunk.text);

        let verdict = match self.cached_verdict(&cache_key).await {
            Some(v) => v,
            None => {
                let raw = match self.complete_with_retry(&build_prompt(&chunk.text)).await {
                    Ok(raw) => raw,
                    Err(AnalyzerError::ResponseRejected(reason)) => {
                        tracing::warn!(reason = %reason, "Skipping chunk on unusable LLM reply");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };
                match parse_verdict(&raw) {
                    Ok(v) => {
                        self.store_verdict(&cache_key, &v).await;
                        v
                    }
                    Err(reason) => {
                        tracing::warn!(reason = %reason, "Rejected unparseable concern verdict");
                        return Ok(None);
                    }
                }
            }
        };

        Ok(self.to_finding(chunk, verdict))
    }

    async fn cached_verdict(&self, key: &str) -> Option<ChunkVerdict> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Verdict cache read failed");
                None
            }
        }
    }

    async fn store_verdict(&self, key: &str, verdict: &ChunkVerdict) {
        let Ok(serialized) = serde_json::to_string(verdict) else {
            return;
        };
        if let Err(e) = self.cache.put(key, &serialized).await {
            tracing::warn!(error = %e, "Verdict cache write failed");
        }
    }

    async fn complete_with_retry(&self, prompt: &str) -> Result<String, AnalyzerError> {
        let mut attempt = 0;
        loop {
            match self.llm.complete(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient LLM failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(AnalyzerError::ServiceUnavailable(e.to_string()));
                }
                Err(e) => {
                    // Non-transport failure from the client itself; treat
                    // like a malformed response and skip the chunk.
                    tracing::warn!(error = %e, "LLM client rejected request");
                    return Err(AnalyzerError::ResponseRejected(e.to_string()));
                }
            }
        }
    }

    fn to_finding(&self, chunk: &Chunk, verdict: ChunkVerdict) -> Option<Finding> {
        if !verdict.is_concern {
            return None;
        }

        let category = match verdict.category.as_deref().map(ConcernCategory::from_str) {
            Some(Ok(c)) => c,
            _ => {
                tracing::warn!(category = ?verdict.category, "Verdict category outside taxonomy, skipping chunk");
                return None;
            }
        };
        let severity = match verdict.severity.as_deref().map(Severity::from_str) {
            Some(Ok(s)) => s,
            _ => {
                tracing::warn!(severity = ?verdict.severity, "Verdict severity outside scale, skipping chunk");
                return None;
            }
        };
        let summary = match verdict.summary {
            Some(s) if !s.trim().is_empty() => s,
            _ => {
                tracing::warn!("Verdict missing summary, skipping chunk");
                return None;
            }
        };

        let confidence = match verdict.confidence {
            Some(raw) => raw.clamp(0.0, 1.0) as f32,
            None => heuristic_confidence(&chunk.text, severity),
        };

        let recommendation = verdict
            .recommendation
            .filter(|r| !r.trim().is_empty());

        tracing::info!(category = %category, severity = %severity, confidence, "Concern detected");

        Some(Finding {
            id: FindingId::new(),
            document_id: chunk.document_id.clone(),
            chunk_id: chunk.id,
            category,
            severity,
            summary,
            recommendation,
            confidence,
            page_start: chunk.page_start,
            page_end: chunk.page_end,
            region: chunk.region,
            text_content: chunk.text.clone(),
            created_at: Utc::now(),
        })
    }
}

fn verdict_cache_key(chunk_text: &str) -> String {
    let digest = Sha256::digest(chunk_text.as_bytes());
    format!("analysis:{}", hex::encode(digest))
}

fn build_prompt(chunk_text: &str) -> String {
    let categories = ConcernCategory::ALL
        .iter()
        .map(|c| format!("- {}: {}", c.as_str(), c.description()))
        .collect::<Vec<_>>()
        .join("\n");
    let category_values = ConcernCategory::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("/");

    format!(
        r#"You are an expert insurance policy analyst with 20+ years of experience.
Analyze the following text for potential policyholder concerns.

CONCERN CATEGORIES:
{categories}

RESPONSE FORMAT (JSON only, no additional text):
{{
    "is_concern": true/false,
    "category": "{category_values}",
    "severity": "CRITICAL/HIGH/MEDIUM/LOW",
    "summary": "One-sentence summary for a layperson",
    "recommendation": "Action item for the policyholder",
    "confidence": 0.0
}}

TEXT TO ANALYZE:
{chunk_text}

Respond with ONLY valid JSON, no other text."#
    )
}

/// Strips optional markdown code fences and parses the verdict JSON.
fn parse_verdict(raw: &str) -> Result<ChunkVerdict, String> {
    let mut text = raw.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        text = stripped;
    } else if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped;
    }

    serde_json::from_str(text.trim()).map_err(|e| e.to_string())
}

const LEGAL_TERMS: [&str; 6] = [
    "excluded",
    "not covered",
    "limitation",
    "deductible",
    "copayment",
    "waiting period",
];

/// Lexical confidence estimate used when the model gives no confidence
/// signal: longer passages and legal-term density read as stronger
/// evidence, high severities get a small boost.
fn heuristic_confidence(text: &str, severity: Severity) -> f32 {
    let mut confidence = 0.5f32;

    if text.len() > 100 {
        confidence += 0.1;
    }

    let lowered = text.to_lowercase();
    let term_hits = LEGAL_TERMS.iter().filter(|t| lowered.contains(*t)).count();
    confidence += (term_hits as f32 * 0.1).min(0.3);

    if severity >= Severity::High {
        confidence += 0.1;
    }

    confidence.min(1.0)
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// Retry budget exhausted against the LLM transport. The pipeline
    /// escalates runs of these to a document-level failure.
    #[error("llm service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The service answered but the reply was unusable. Recovered locally
    /// by skipping the chunk.
    #[error("llm response rejected: {0}")]
    ResponseRejected(String),
}

impl AnalyzerError {
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, AnalyzerError::ServiceUnavailable(_))
    }
}
