use std::sync::Arc;

use futures::StreamExt;

use crate::application::ports::{
    BlobStore, BlobStoreError, DocumentRepository, Embedder, FindingRepository, RepositoryError,
    VectorIndex,
};
use crate::application::services::{
    BlockChunker, ConcernAnalyzer, Deduplicator, ExtractionError, ExtractionService,
    LifecycleTracker, TransitionError,
};
use crate::domain::{AnalysisStatus, Chunk, Document, DocumentId, Finding};

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Upper bound on concurrent per-chunk LLM calls.
    pub max_concurrency: usize,
    /// Consecutive chunks allowed to exhaust their retry budget before the
    /// whole document is failed.
    pub failure_threshold: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            failure_threshold: 5,
        }
    }
}

/// Ingestion coordinator: one background run per document, never two for
/// the same id. Extraction, chunking, indexing and analysis each advance
/// the lifecycle tracker; findings are deduplicated and persisted at the
/// end of the run.
pub struct AnalysisPipeline {
    extraction: Arc<ExtractionService>,
    chunker: Arc<BlockChunker>,
    analyzer: Arc<ConcernAnalyzer>,
    deduplicator: Arc<Deduplicator>,
    tracker: Arc<LifecycleTracker>,
    documents: Arc<dyn DocumentRepository>,
    findings: Arc<dyn FindingRepository>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    blobs: Arc<dyn BlobStore>,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extraction: Arc<ExtractionService>,
        chunker: Arc<BlockChunker>,
        analyzer: Arc<ConcernAnalyzer>,
        deduplicator: Arc<Deduplicator>,
        tracker: Arc<LifecycleTracker>,
        documents: Arc<dyn DocumentRepository>,
        findings: Arc<dyn FindingRepository>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        blobs: Arc<dyn BlobStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extraction,
            chunker,
            analyzer,
            deduplicator,
            tracker,
            documents,
            findings,
            embedder,
            index,
            blobs,
            config,
        }
    }

    /// Accepts an upload, registers the document and starts the background
    /// analysis run. Byte-identical re-uploads return the existing
    /// document id: completed runs are not repeated, in-flight runs are
    /// coalesced, only failed runs start over.
    #[tracing::instrument(skip(self, data), fields(filename = %filename, bytes = data.len()))]
    pub async fn ingest(
        self: &Arc<Self>,
        data: Vec<u8>,
        filename: String,
    ) -> Result<(DocumentId, AnalysisStatus), IngestError> {
        if data.is_empty() {
            return Err(IngestError::Validation("empty file".to_string()));
        }
        if !data.starts_with(b"%PDF") {
            return Err(IngestError::Validation(
                "file is not a PDF document".to_string(),
            ));
        }

        let id = DocumentId::from_bytes(&data);

        if let Some(existing) = self.documents.get_by_id(&id).await? {
            match existing.status {
                AnalysisStatus::Completed => {
                    tracing::info!(document_id = %id, "Re-ingest of completed document, returning existing record");
                    return Ok((id, AnalysisStatus::Completed));
                }
                AnalysisStatus::Failed => {
                    tracing::info!(document_id = %id, "Re-ingest of failed document, restarting analysis");
                }
                status => {
                    tracing::info!(document_id = %id, status = %status, "Analysis already in flight, coalescing");
                    return Ok((id, status));
                }
            }
        }

        if !self.tracker.try_begin(&id).await {
            // Lost the race against a concurrent upload of the same bytes.
            tracing::info!(document_id = %id, "Coalesced into concurrent run");
            let status = self
                .documents
                .get_by_id(&id)
                .await?
                .map(|d| d.status)
                .unwrap_or(AnalysisStatus::Pending);
            return Ok((id, status));
        }

        if let Err(e) = self.register(&id, &data, filename).await {
            // No background run was spawned; free the slot so a retry
            // upload can start over instead of coalescing into nothing.
            self.tracker.release(&id).await;
            return Err(e);
        }

        let pipeline = Arc::clone(self);
        let task_id = id.clone();
        tokio::spawn(async move {
            pipeline.run(task_id, data).await;
        });

        Ok((id, AnalysisStatus::Pending))
    }

    async fn register(
        &self,
        id: &DocumentId,
        data: &[u8],
        filename: String,
    ) -> Result<(), IngestError> {
        self.blobs.put(id, data).await?;
        self.documents
            .create(&Document::new(id.clone(), filename))
            .await?;
        Ok(())
    }

    async fn run(self: Arc<Self>, id: DocumentId, data: Vec<u8>) {
        if let Err(e) = self.run_stages(&id, &data).await {
            if let Err(fail_err) = self.tracker.fail(&id, &e.to_string()).await {
                tracing::error!(document_id = %id, error = %fail_err, "Failed to record document failure");
            }
        }
    }

    async fn run_stages(&self, id: &DocumentId, data: &[u8]) -> Result<(), DocumentRunError> {
        self.tracker.advance(id, AnalysisStatus::Extracting).await?;
        let blocks = self.extraction.extract(id, data).await?;

        let total_pages = blocks.iter().map(|b| b.page_num).max().unwrap_or(0);
        self.documents.set_total_pages(id, total_pages).await?;

        self.tracker.advance(id, AnalysisStatus::Chunking).await?;
        let chunks: Vec<Chunk> = self.chunker.chunks(id, &blocks).collect();
        self.tracker.set_total_chunks(id, chunks.len() as u32).await;
        tracing::info!(document_id = %id, chunks = chunks.len(), total_pages, "Document chunked");

        self.tracker.advance(id, AnalysisStatus::Embedding).await?;
        self.spawn_indexing(id.clone(), chunks.clone());

        self.tracker.advance(id, AnalysisStatus::Analyzing).await?;
        let candidates = self.analyze_chunks(id, chunks).await?;

        let findings = self.deduplicator.deduplicate(candidates);
        self.findings.insert_all(&findings).await?;
        tracing::info!(document_id = %id, findings = findings.len(), "Findings persisted");

        self.tracker.advance(id, AnalysisStatus::Completed).await?;
        Ok(())
    }

    /// Indexing runs independently of concern analysis and may finish
    /// before, during, or after it. Failures degrade chat retrieval but
    /// never the analysis run.
    fn spawn_indexing(&self, id: DocumentId, chunks: Vec<Chunk>) {
        let embedder = Arc::clone(&self.embedder);
        let index = Arc::clone(&self.index);

        tokio::spawn(async move {
            if chunks.is_empty() {
                return;
            }
            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            let embeddings = match embedder.embed_batch(&texts).await {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(document_id = %id, error = %e, "Chunk embedding failed, chat retrieval degraded");
                    return;
                }
            };
            if let Err(e) = index.upsert(&chunks, &embeddings).await {
                tracing::warn!(document_id = %id, error = %e, "Vector indexing failed, chat retrieval degraded");
            } else {
                tracing::info!(document_id = %id, chunks = chunks.len(), "Chunks indexed");
            }
        });
    }

    async fn analyze_chunks(
        &self,
        id: &DocumentId,
        chunks: Vec<Chunk>,
    ) -> Result<Vec<Finding>, DocumentRunError> {
        let mut results = futures::stream::iter(chunks.into_iter().map(|chunk| {
            let analyzer = Arc::clone(&self.analyzer);
            async move { analyzer.analyze(&chunk).await }
        }))
        .buffer_unordered(self.config.max_concurrency.max(1));

        let mut candidates = Vec::new();
        let mut consecutive_failures = 0u32;

        while let Some(result) = results.next().await {
            self.tracker.record_chunk_analyzed(id).await;

            match result {
                Ok(Some(finding)) => {
                    consecutive_failures = 0;
                    candidates.push(finding);
                }
                Ok(None) => {
                    consecutive_failures = 0;
                }
                Err(e) if e.is_service_unavailable() => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        document_id = %id,
                        consecutive_failures,
                        error = %e,
                        "Chunk skipped after exhausting retry budget"
                    );
                    if consecutive_failures >= self.config.failure_threshold {
                        return Err(DocumentRunError::ServiceUnavailable(e.to_string()));
                    }
                }
                Err(e) => {
                    tracing::warn!(document_id = %id, error = %e, "Chunk skipped");
                }
            }
        }

        Ok(candidates)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("storage: {0}")]
    Storage(#[from] BlobStoreError),
}

#[derive(Debug, thiserror::Error)]
enum DocumentRunError {
    #[error("extraction: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("llm service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("lifecycle: {0}")]
    Lifecycle(#[from] TransitionError),
}
