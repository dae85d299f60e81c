//! Key-value persistence for per-visitor state.
//!
//! [`SessionStorage`] stores values in the visitor's tower-sessions session
//! (persisted in `PostgreSQL`); [`MemoryStorage`] keeps them in a map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tower_sessions::Session;

/// Errors reading or writing a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The session backend failed.
    #[error("session storage error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// String values stored under string keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// The value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// [`KeyValueStore`] backed by the request's session.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    session: Session,
}

impl SessionStorage {
    /// Wrap a session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl KeyValueStore for SessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.session.get::<String>(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.session.insert(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.session.remove_value(key).await?;
        Ok(())
    }
}

/// [`KeyValueStore`] backed by a shared map. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

#[derive(Debug, Default)]
struct MemoryStorageInner {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding `value` under `key`.
    #[must_use]
    pub fn with_value(key: &str, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage
            .state()
            .values
            .insert(key.to_string(), value.into());
        storage
    }

    fn state(&self) -> MutexGuard<'_, MemoryStorageInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raw value under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.state().values.get(key).cloned()
    }

    /// Number of `set` and `remove` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state().writes
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.state().values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut state = self.state();
        state.writes += 1;
        state.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut state = self.state();
        state.writes += 1;
        state.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").await.unwrap(), None);

        storage.set("k", "v".to_string()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));

        storage.remove("k").await.unwrap();
        storage.remove("k").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
        assert_eq!(storage.writes(), 3);
    }

    #[tokio::test]
    async fn test_session_storage() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let storage = SessionStorage::new(session.clone());

        storage.set("cart", "{}".to_string()).await.unwrap();
        assert_eq!(session.get::<String>("cart").await.unwrap().as_deref(), Some("{}"));

        storage.remove("cart").await.unwrap();
        assert_eq!(storage.get("cart").await.unwrap(), None);
    }
}
