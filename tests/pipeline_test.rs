use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::Mutex;

use policylens::application::ports::{
    BlobStore, BlobStoreError, DocumentRepository, FindingRepository,
};
use policylens::application::services::{
    AnalysisPipeline, BlockChunker, ConcernAnalyzer, Deduplicator, ExtractionService,
    IngestError, JaccardSimilarity, LifecycleTracker, PipelineConfig, RetryPolicy,
};
use policylens::domain::{
    AnalysisStatus, BoundingBox, ConcernCategory, DocumentId, Severity, TextBlock,
};
use policylens::infrastructure::llm::{MockEmbedder, MockLlmClient, ScriptedReply};
use policylens::infrastructure::pdf::MockPdfParser;
use policylens::infrastructure::persistence::{
    InMemoryVectorIndex, SqliteCacheStore, SqliteDocumentRepository, SqliteFindingRepository,
    init_schema,
};

#[derive(Default)]
struct MemoryBlobStore {
    blobs: Mutex<HashMap<DocumentId, Vec<u8>>>,
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, id: &DocumentId, data: &[u8]) -> Result<(), BlobStoreError> {
        self.blobs.lock().await.insert(id.clone(), data.to_vec());
        Ok(())
    }

    async fn fetch(&self, id: &DocumentId) -> Result<Vec<u8>, BlobStoreError> {
        self.blobs
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(id.to_string()))
    }
}

/// Blob store whose first `failures` puts report a full disk, then
/// behaves like `MemoryBlobStore`.
struct FlakyBlobStore {
    inner: MemoryBlobStore,
    failures_left: Mutex<u32>,
}

impl FlakyBlobStore {
    fn failing(failures: u32) -> Self {
        Self {
            inner: MemoryBlobStore::default(),
            failures_left: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put(&self, id: &DocumentId, data: &[u8]) -> Result<(), BlobStoreError> {
        let mut failures_left = self.failures_left.lock().await;
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(BlobStoreError::WriteFailed("no space left".to_string()));
        }
        drop(failures_left);
        self.inner.put(id, data).await
    }

    async fn fetch(&self, id: &DocumentId) -> Result<Vec<u8>, BlobStoreError> {
        self.inner.fetch(id).await
    }
}

async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();
    pool
}

fn block(page: u32, index: usize, text: &str) -> TextBlock {
    TextBlock::new(
        page,
        index,
        BoundingBox::new(10.0, 10.0, 500.0, 40.0),
        text.to_string(),
    )
}

/// Five blocks over three pages; the small token budget splits them into
/// at least two chunks.
fn sample_blocks() -> Vec<TextBlock> {
    vec![
        block(1, 0, "This policy covers hospital treatment for the insured person."),
        block(1, 1, "Cosmetic procedures are excluded from coverage entirely."),
        block(2, 2, "A waiting period of six months applies to dental treatment."),
        block(2, 3, "An annual deductible of five hundred dollars applies."),
        block(3, 4, "Claims must be submitted within thirty days of treatment."),
    ]
}

const CONCERN_REPLY: &str = r#"{
    "is_concern": true,
    "category": "EXCLUSION",
    "severity": "HIGH",
    "summary": "Cosmetic procedures are excluded from coverage",
    "recommendation": "Plan for cosmetic costs out of pocket",
    "confidence": 0.9
}"#;

const NO_CONCERN_REPLY: &str = r#"{"is_concern": false}"#;

struct Harness {
    pipeline: Arc<AnalysisPipeline>,
    tracker: Arc<LifecycleTracker>,
    documents: Arc<SqliteDocumentRepository>,
    findings: Arc<SqliteFindingRepository>,
    parser: Arc<MockPdfParser>,
    llm: Arc<MockLlmClient>,
}

async fn harness(blocks: Vec<TextBlock>, llm: MockLlmClient, retry: RetryPolicy) -> Harness {
    harness_with(
        blocks,
        llm,
        retry,
        Arc::new(MemoryBlobStore::default()),
        PipelineConfig {
            max_concurrency: 2,
            failure_threshold: 1,
        },
    )
    .await
}

async fn harness_with(
    blocks: Vec<TextBlock>,
    llm: MockLlmClient,
    retry: RetryPolicy,
    blobs: Arc<dyn BlobStore>,
    config: PipelineConfig,
) -> Harness {
    let pool = memory_pool().await;
    let documents = Arc::new(SqliteDocumentRepository::new(pool.clone()));
    let findings = Arc::new(SqliteFindingRepository::new(pool.clone()));
    let cache = Arc::new(SqliteCacheStore::new(pool));

    let parser = Arc::new(MockPdfParser::new(blocks));
    let llm = Arc::new(llm);
    let tracker = Arc::new(LifecycleTracker::new(Arc::clone(&documents) as _));

    let pipeline = Arc::new(AnalysisPipeline::new(
        Arc::new(ExtractionService::new(
            Arc::clone(&parser) as _,
            Arc::clone(&cache) as _,
        )),
        Arc::new(BlockChunker::new(25, 1)),
        Arc::new(ConcernAnalyzer::new(
            Arc::clone(&llm) as _,
            Arc::clone(&cache) as _,
            retry,
        )),
        Arc::new(Deduplicator::new(Box::new(JaccardSimilarity), 0.82)),
        Arc::clone(&tracker),
        Arc::clone(&documents) as _,
        Arc::clone(&findings) as _,
        Arc::new(MockEmbedder::new()),
        Arc::new(InMemoryVectorIndex::new()),
        blobs,
        config,
    ));

    Harness {
        pipeline,
        tracker,
        documents,
        findings,
        parser,
        llm,
    }
}

async fn wait_for_terminal(tracker: &LifecycleTracker, id: &DocumentId) -> AnalysisStatus {
    for _ in 0..500 {
        if let Some(snapshot) = tracker.snapshot(id).await {
            if snapshot.status.is_terminal() {
                return snapshot.status;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("analysis run never reached a terminal state");
}

#[tokio::test]
async fn given_valid_pdf_when_ingesting_then_run_completes_with_findings() {
    let h = harness(
        sample_blocks(),
        MockLlmClient::new(CONCERN_REPLY),
        RetryPolicy::new(3, Duration::from_millis(1)),
    )
    .await;

    let data = b"%PDF-1.4 sample policy".to_vec();
    let (id, status) = h.pipeline.ingest(data, "policy.pdf".to_string()).await.unwrap();
    assert_eq!(status, AnalysisStatus::Pending);

    assert_eq!(wait_for_terminal(&h.tracker, &id).await, AnalysisStatus::Completed);

    let document = h.documents.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(document.status, AnalysisStatus::Completed);
    assert_eq!(document.total_pages, 3);
    assert!(document.analysis_completed_at.is_some());

    // Every chunk reports the same exclusion, and the block overlap makes
    // consecutive chunks share pages, so deduplication must merge some of
    // the repeated verdicts.
    let chunks_total = h.tracker.snapshot(&id).await.unwrap().chunks_total.unwrap();
    let count = h.findings.count_for_document(&id).await.unwrap();
    assert!(count >= 1);
    assert!((count as u32) < chunks_total);

    let listed = h
        .findings
        .list_for_document(&id, Default::default())
        .await
        .unwrap();
    assert!(listed.iter().all(|f| f.category == ConcernCategory::Exclusion));
}

#[tokio::test]
async fn given_completed_document_when_reingesting_then_existing_id_returned_without_rerun() {
    let h = harness(
        sample_blocks(),
        MockLlmClient::new(CONCERN_REPLY),
        RetryPolicy::new(3, Duration::from_millis(1)),
    )
    .await;

    let data = b"%PDF-1.4 sample policy".to_vec();
    let (id, _) = h.pipeline.ingest(data.clone(), "policy.pdf".to_string()).await.unwrap();
    wait_for_terminal(&h.tracker, &id).await;
    let parser_calls = h.parser.call_count();

    let (second_id, second_status) = h
        .pipeline
        .ingest(data, "renamed.pdf".to_string())
        .await
        .unwrap();

    assert_eq!(second_id, id);
    assert_eq!(second_status, AnalysisStatus::Completed);
    assert_eq!(h.parser.call_count(), parser_calls);
}

#[tokio::test]
async fn given_non_pdf_bytes_when_ingesting_then_rejected_before_any_work() {
    let h = harness(
        sample_blocks(),
        MockLlmClient::new(CONCERN_REPLY),
        RetryPolicy::new(3, Duration::from_millis(1)),
    )
    .await;

    let result = h
        .pipeline
        .ingest(b"plain text file".to_vec(), "notes.txt".to_string())
        .await;

    assert!(matches!(result, Err(IngestError::Validation(_))));
    assert_eq!(h.parser.call_count(), 0);
}

#[tokio::test]
async fn given_empty_upload_when_ingesting_then_rejected() {
    let h = harness(
        sample_blocks(),
        MockLlmClient::new(CONCERN_REPLY),
        RetryPolicy::new(3, Duration::from_millis(1)),
    )
    .await;

    let result = h.pipeline.ingest(Vec::new(), "empty.pdf".to_string()).await;

    assert!(matches!(result, Err(IngestError::Validation(_))));
}

#[tokio::test]
async fn given_pdf_with_no_text_when_ingesting_then_run_fails_with_reason() {
    let h = harness(
        Vec::new(),
        MockLlmClient::new(CONCERN_REPLY),
        RetryPolicy::new(3, Duration::from_millis(1)),
    )
    .await;

    let (id, _) = h
        .pipeline
        .ingest(b"%PDF-1.4 scanned".to_vec(), "scan.pdf".to_string())
        .await
        .unwrap();

    assert_eq!(wait_for_terminal(&h.tracker, &id).await, AnalysisStatus::Failed);

    let document = h.documents.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(document.status, AnalysisStatus::Failed);
    assert!(document.failure_reason.is_some());
}

#[tokio::test]
async fn given_llm_outage_when_analyzing_then_document_fails_not_hangs() {
    let script = vec![ScriptedReply::RateLimited; 16];
    let h = harness(
        sample_blocks(),
        MockLlmClient::with_script(script, CONCERN_REPLY),
        RetryPolicy::new(1, Duration::from_millis(1)),
    )
    .await;

    let (id, _) = h
        .pipeline
        .ingest(b"%PDF-1.4 outage".to_vec(), "policy.pdf".to_string())
        .await
        .unwrap();

    assert_eq!(wait_for_terminal(&h.tracker, &id).await, AnalysisStatus::Failed);
    assert!(h.llm.call_count() >= 1);

    let document = h.documents.get_by_id(&id).await.unwrap().unwrap();
    assert!(
        document
            .failure_reason
            .as_deref()
            .unwrap_or("")
            .contains("unavailable")
    );
}

#[tokio::test]
async fn given_failed_document_when_reingesting_then_analysis_restarts() {
    // One rate-limited reply fails the first run; the rerun only sees the
    // default concern reply and succeeds.
    let script = vec![ScriptedReply::RateLimited];
    let h = harness(
        sample_blocks(),
        MockLlmClient::with_script(script, CONCERN_REPLY),
        RetryPolicy::new(1, Duration::from_millis(1)),
    )
    .await;

    let data = b"%PDF-1.4 recovering".to_vec();
    let (id, _) = h.pipeline.ingest(data.clone(), "policy.pdf".to_string()).await.unwrap();
    assert_eq!(wait_for_terminal(&h.tracker, &id).await, AnalysisStatus::Failed);

    let (second_id, _) = h.pipeline.ingest(data, "policy.pdf".to_string()).await.unwrap();
    assert_eq!(second_id, id);
    assert_eq!(wait_for_terminal(&h.tracker, &id).await, AnalysisStatus::Completed);
}

#[tokio::test]
async fn given_blob_write_failure_when_ingesting_then_retry_upload_starts_fresh_run() {
    let h = harness_with(
        sample_blocks(),
        MockLlmClient::new(CONCERN_REPLY),
        RetryPolicy::new(3, Duration::from_millis(1)),
        Arc::new(FlakyBlobStore::failing(1)),
        PipelineConfig {
            max_concurrency: 2,
            failure_threshold: 1,
        },
    )
    .await;

    let data = b"%PDF-1.4 flaky disk".to_vec();
    let result = h.pipeline.ingest(data.clone(), "policy.pdf".to_string()).await;
    assert!(matches!(result, Err(IngestError::Storage(_))));

    // The failed registration must not leave a phantom run behind for
    // later uploads of the same bytes to coalesce into.
    let id = DocumentId::from_bytes(&data);
    assert!(h.tracker.snapshot(&id).await.is_none());
    assert!(h.documents.get_by_id(&id).await.unwrap().is_none());

    let (second_id, status) = h.pipeline.ingest(data, "policy.pdf".to_string()).await.unwrap();
    assert_eq!(second_id, id);
    assert_eq!(status, AnalysisStatus::Pending);
    assert_eq!(wait_for_terminal(&h.tracker, &id).await, AnalysisStatus::Completed);
}

/// Two blocks each near the 25-token budget, so the chunker emits exactly
/// one chunk per block.
fn two_chunk_blocks() -> Vec<TextBlock> {
    vec![
        block(
            1,
            0,
            "Cosmetic procedures and any treatment arising from them are excluded from coverage under this policy without exception.",
        ),
        block(
            2,
            1,
            "Premiums are payable monthly in advance and a receipt is issued for every payment made by the insured person.",
        ),
    ]
}

#[tokio::test]
async fn given_one_concerning_and_one_clean_chunk_then_exactly_one_finding() {
    // Sequential analysis maps the scripted replies onto the two chunks
    // in block order: the exclusion chunk first, the clean chunk second.
    let script = vec![
        ScriptedReply::Reply(CONCERN_REPLY.to_string()),
        ScriptedReply::Reply(NO_CONCERN_REPLY.to_string()),
    ];
    let h = harness_with(
        two_chunk_blocks(),
        MockLlmClient::with_script(script, NO_CONCERN_REPLY),
        RetryPolicy::new(3, Duration::from_millis(1)),
        Arc::new(MemoryBlobStore::default()),
        PipelineConfig {
            max_concurrency: 1,
            failure_threshold: 5,
        },
    )
    .await;

    let (id, _) = h
        .pipeline
        .ingest(b"%PDF-1.4 two chunks".to_vec(), "policy.pdf".to_string())
        .await
        .unwrap();
    assert_eq!(wait_for_terminal(&h.tracker, &id).await, AnalysisStatus::Completed);
    assert_eq!(h.tracker.snapshot(&id).await.unwrap().chunks_total, Some(2));

    let listed = h
        .findings
        .list_for_document(&id, Default::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].category, ConcernCategory::Exclusion);
    assert_eq!(listed[0].severity, Severity::High);
    assert_eq!(listed[0].page_start, 1);
    assert_eq!(listed[0].page_end, 1);
}
