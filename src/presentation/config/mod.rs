mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AnalysisSettings, ChatSettings, ChunkingSettings, DatabaseSettings, EmbeddingsSettings,
    LlmSettings, ServerSettings, Settings, SettingsError, StorageSettings,
};
