use std::str::FromStr;

use super::Environment;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub llm: LlmSettings,
    pub embeddings: EmbeddingsSettings,
    pub chunking: ChunkingSettings,
    pub analysis: AnalysisSettings,
    pub chat: ChatSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub pdf_dir: String,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsSettings {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ChunkingSettings {
    pub max_tokens: usize,
    pub overlap_blocks: usize,
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub max_concurrency: usize,
    pub failure_threshold: u32,
    pub dedup_threshold: f32,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub top_k: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let environment = Environment::try_from(
            std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()),
        )
        .map_err(SettingsError::Invalid)?;

        Ok(Self {
            environment,
            server: ServerSettings {
                host: var_or("SERVER_HOST", "0.0.0.0"),
                port: parse_or("SERVER_PORT", 8000)?,
            },
            database: DatabaseSettings {
                url: var_or("DATABASE_URL", "sqlite://policylens.db"),
            },
            storage: StorageSettings {
                pdf_dir: var_or("PDF_STORAGE_DIR", "uploaded_pdfs"),
                max_file_size_mb: parse_or("MAX_FILE_SIZE_MB", 50)?,
            },
            llm: LlmSettings {
                api_key: std::env::var("GROQ_API_KEY")
                    .map_err(|_| SettingsError::Missing("GROQ_API_KEY".to_string()))?,
                base_url: var_or("GROQ_BASE_URL", "https://api.groq.com/openai/v1"),
                model: var_or("GROQ_MODEL", "llama-3.3-70b-versatile"),
                temperature: parse_or("LLM_TEMPERATURE", 0.1)?,
                max_tokens: parse_or("LLM_MAX_TOKENS", 1024)?,
            },
            embeddings: EmbeddingsSettings {
                base_url: var_or("EMBEDDINGS_BASE_URL", "https://api.groq.com/openai/v1"),
                model: var_or("EMBEDDINGS_MODEL", "text-embedding-3-small"),
            },
            chunking: ChunkingSettings {
                max_tokens: parse_or("CHUNK_MAX_TOKENS", 500)?,
                overlap_blocks: parse_or("CHUNK_OVERLAP_BLOCKS", 1)?,
            },
            analysis: AnalysisSettings {
                max_concurrency: parse_or("ANALYSIS_MAX_CONCURRENCY", 4)?,
                failure_threshold: parse_or("ANALYSIS_FAILURE_THRESHOLD", 5)?,
                dedup_threshold: parse_or("DEDUP_SIMILARITY_THRESHOLD", 0.82)?,
                retry_max_attempts: parse_or("LLM_RETRY_MAX_ATTEMPTS", 3)?,
                retry_base_delay_ms: parse_or("LLM_RETRY_BASE_DELAY_MS", 500)?,
            },
            chat: ChatSettings {
                top_k: parse_or("CHAT_TOP_K", 3)?,
            },
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T, SettingsError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|_| SettingsError::Invalid(format!(
            "Invalid value for {}: {}",
            name, value
        ))),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required environment variable: {0}")]
    Missing(String),
    #[error("{0}")]
    Invalid(String),
}
