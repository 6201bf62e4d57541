//! Persistent key-value storage for client-side counters.
//!
//! The session only sees `Arc<dyn KeyValueStore>`; the backend is chosen at
//! startup (Redis when `REDIS_URL` is set, otherwise a JSON file).

use async_trait::async_trait;
use thiserror::Error;

pub mod file;
pub mod memory;
pub mod redis;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Corrupt store file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Minimal integer key-value store with `get`/`set`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;

    async fn set(&self, key: &str, value: u64) -> Result<(), StoreError>;

    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}
