//! A per-request, deduplicating key → value loader.
//!
//! Concurrent `load` calls for the same key share one fetch: the first caller
//! runs it, the rest wait on the same cell. Successful values are cached for
//! the life of the loader; a failed fetch is not cached, so a later call
//! retries.

use std::{collections::HashMap, future::Future, hash::Hash, sync::Arc};

use tokio::sync::{Mutex, OnceCell};

pub struct Loader<K, V> {
  name:  &'static str,
  cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Loader<K, V>
where
  K: Eq + Hash + Clone + std::fmt::Debug,
  V: Clone,
{
  pub fn new(name: &'static str) -> Self {
    Self { name, cells: Mutex::new(HashMap::new()) }
  }

  /// Return the cached value for `key`, or run `fetch` to produce it.
  pub async fn load<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
  where
    F: FnOnce(K) -> Fut,
    Fut: Future<Output = Result<V, E>>,
  {
    let cell = {
      let mut cells = self.cells.lock().await;
      Arc::clone(cells.entry(key.clone()).or_default())
    };

    if let Some(value) = cell.get() {
      tracing::trace!(loader = self.name, ?key, "cache hit");
      return Ok(value.clone());
    }

    let value = cell
      .get_or_try_init(|| {
        tracing::trace!(loader = self.name, ?key, "fetching");
        fetch(key)
      })
      .await?;
    Ok(value.clone())
  }
}
