use async_trait::async_trait;

use super::RepositoryError;

/// Opaque key/value memoization store. Keys carry their own namespace
/// prefix (`blocks:`, `analysis:`), values are serialized JSON.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;

    async fn put(&self, key: &str, value: &str) -> Result<(), RepositoryError>;
}
