use super::Error;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Debug, thiserror::Error)]
#[error("cached value for key {key:?} has a different type")]
pub struct TypeMismatch {
    pub key: String,
}

/// In-memory memoization of producer results, keyed by string.
///
/// Entries are never updated or evicted. Concurrent misses on the same key
/// are not deduplicated: each runs its own producer and the last write wins.
#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch_or_compute<K, V, F, Fut>(
        &self,
        key: K,
        producer: F,
    ) -> Result<Arc<V>, Error>
    where
        K: Into<String>,
        V: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, Error>>,
    {
        let key = key.into();
        if let Some(value) = self.get(&key)? {
            tracing::trace!(key = %key, "cache hit");
            return Ok(value);
        }
        tracing::trace!(key = %key, "cache miss");
        let value = Arc::new(producer().await?);
        self.lock().insert(key, value.clone());
        Ok(value)
    }

    pub fn get<V>(&self, key: &str) -> Result<Option<Arc<V>>, Error>
    where
        V: Send + Sync + 'static,
    {
        let Some(entry) = self.lock().get(key).cloned() else {
            return Ok(None);
        };
        entry.downcast().map(Some).map_err(|_| {
            Error::unexpected(TypeMismatch {
                key: key.to_owned(),
            })
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("keys", &self.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}
