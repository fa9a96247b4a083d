use std::sync::Arc;

use crate::application::ports::{BlobStore, DocumentRepository, FindingRepository};
use crate::application::services::{AnalysisPipeline, ChatService, LifecycleTracker};
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub tracker: Arc<LifecycleTracker>,
    pub chat_service: Arc<ChatService>,
    pub documents: Arc<dyn DocumentRepository>,
    pub findings: Arc<dyn FindingRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub settings: Settings,
}
