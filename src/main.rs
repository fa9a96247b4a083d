use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use policylens::application::services::{
    AnalysisPipeline, BlockChunker, ChatService, ConcernAnalyzer, Deduplicator, ExtractionService,
    JaccardSimilarity, LifecycleTracker, PipelineConfig, RetryPolicy,
};
use policylens::infrastructure::llm::{GroqClient, HttpEmbedder};
use policylens::infrastructure::observability::{TracingConfig, init_tracing};
use policylens::infrastructure::pdf::PdfiumParser;
use policylens::infrastructure::persistence::{
    InMemoryVectorIndex, SqliteCacheStore, SqliteChatTurnRepository, SqliteDocumentRepository,
    SqliteFindingRepository, connect, init_schema,
};
use policylens::infrastructure::storage::LocalBlobStore;
use policylens::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    init_tracing(TracingConfig::default(), settings.server.port);

    let pool = connect(&settings.database.url).await?;
    init_schema(&pool).await?;

    let documents = Arc::new(SqliteDocumentRepository::new(pool.clone()));
    let findings = Arc::new(SqliteFindingRepository::new(pool.clone()));
    let turns = Arc::new(SqliteChatTurnRepository::new(pool.clone()));
    let cache = Arc::new(SqliteCacheStore::new(pool));

    let blobs = Arc::new(LocalBlobStore::new(PathBuf::from(
        &settings.storage.pdf_dir,
    ))?);

    let llm = Arc::new(GroqClient::new(
        settings.llm.base_url.clone(),
        settings.llm.api_key.clone(),
        settings.llm.model.clone(),
        settings.llm.temperature,
        settings.llm.max_tokens,
    ));
    let embedder = Arc::new(HttpEmbedder::new(
        settings.embeddings.base_url.clone(),
        settings.llm.api_key.clone(),
        settings.embeddings.model.clone(),
    ));

    let parser = Arc::new(PdfiumParser::new());
    let index = Arc::new(InMemoryVectorIndex::new());

    let extraction = Arc::new(ExtractionService::new(parser, Arc::clone(&cache) as _));
    let chunker = Arc::new(BlockChunker::new(
        settings.chunking.max_tokens,
        settings.chunking.overlap_blocks,
    ));
    let analyzer = Arc::new(ConcernAnalyzer::new(
        Arc::clone(&llm) as _,
        Arc::clone(&cache) as _,
        RetryPolicy::new(
            settings.analysis.retry_max_attempts,
            Duration::from_millis(settings.analysis.retry_base_delay_ms),
        ),
    ));
    let deduplicator = Arc::new(Deduplicator::new(
        Box::new(JaccardSimilarity),
        settings.analysis.dedup_threshold,
    ));
    let tracker = Arc::new(LifecycleTracker::new(Arc::clone(&documents) as _));

    let pipeline = Arc::new(AnalysisPipeline::new(
        extraction,
        chunker,
        analyzer,
        deduplicator,
        Arc::clone(&tracker),
        Arc::clone(&documents) as _,
        Arc::clone(&findings) as _,
        Arc::clone(&embedder) as _,
        Arc::clone(&index) as _,
        Arc::clone(&blobs) as _,
        PipelineConfig {
            max_concurrency: settings.analysis.max_concurrency,
            failure_threshold: settings.analysis.failure_threshold,
        },
    ));

    let chat_service = Arc::new(ChatService::new(
        llm,
        embedder,
        index,
        Arc::clone(&findings) as _,
        turns,
        settings.chat.top_k,
    ));

    let addr = SocketAddr::new(settings.server.host.parse()?, settings.server.port);

    let state = AppState {
        pipeline,
        tracker,
        chat_service,
        documents,
        findings,
        blobs,
        settings,
    };

    let router = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
