//! Keyed query cache with request deduplication and prefix invalidation.
//!
//! Each cache entry is addressed by a [`QueryKey`] and moves through
//! `idle -> pending -> success | error`. A terminal state re-enters `pending`
//! only when a never-fetched (or stale-marked) key gains an observer, or when
//! an invalidation matches the key.
//!
//! # Example
//!
//! ```ignore
//! let cache = QueryCache::new();
//! let client = client.clone();
//! let mut handle = cache.observe(QueryKey::new(["projects"]), move || {
//!     let client = client.clone();
//!     async move { client.list_projects(Page::default()).await }
//! });
//!
//! let projects = handle.resolve().await?;
//!
//! // After a mutation:
//! cache.invalidate(&QueryKey::new(["projects"]));
//! let refreshed = handle.resolve().await?;
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::key::QueryKey;
use super::state::{QueryError, QueryState};

/// Type-erased cached value.
type BoxedValue = Arc<dyn Any + Send + Sync>;

/// A factory function that creates fetch futures for one entry.
type BoxedFetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<BoxedValue, String>> + Send + Sync>;

struct Entry {
  state: QueryState<BoxedValue>,
  /// Refetches reuse the fetcher registered by the most recent observer.
  fetcher: Option<BoxedFetcher>,
  /// Incremented per fetch; completions from older epochs are discarded.
  epoch: u64,
  stale: bool,
  observers: usize,
  /// Cancels the in-flight fetch when it is superseded or abandoned.
  cancel: CancellationToken,
  /// Bumped on every state change.
  tx: watch::Sender<u64>,
}

impl Entry {
  fn new() -> Self {
    let (tx, _rx) = watch::channel(0);
    Self {
      state: QueryState::Idle,
      fetcher: None,
      epoch: 0,
      stale: false,
      observers: 0,
      cancel: CancellationToken::new(),
      tx,
    }
  }
}

type Entries = HashMap<QueryKey, Entry>;

/// Shared in-memory query cache.
///
/// Clones share the same store. The cache holds no network state of its own;
/// it only coordinates the fetchers handed to [`QueryCache::observe`].
#[derive(Clone)]
pub struct QueryCache {
  entries: Arc<Mutex<Entries>>,
}

impl QueryCache {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Entries> {
    // The map stays consistent across a panic in a holder; keep the guard.
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Observe `key`, registering `fetcher` for it.
  ///
  /// The first observer of a never-fetched or stale key starts a fetch;
  /// concurrent observers of the same key share the in-flight request. While
  /// any observer remains, a matching invalidation triggers an immediate
  /// refetch. Must be called within a Tokio runtime.
  pub fn observe<T, E, F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryHandle<T>
  where
    T: Send + Sync + 'static,
    E: fmt::Display + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let fetcher: BoxedFetcher = Arc::new(move || {
      let fut = fetcher();
      Box::pin(async move {
        fut
          .await
          .map(|data| Arc::new(data) as BoxedValue)
          .map_err(|e| e.to_string())
      })
    });

    let (needs_fetch, rx) = {
      let mut entries = self.lock();
      let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
      entry.observers += 1;
      entry.fetcher = Some(fetcher);
      let needs_fetch = matches!(entry.state, QueryState::Idle) || entry.stale;
      (needs_fetch, entry.tx.subscribe())
    };

    if needs_fetch {
      self.start_fetch(&key);
    }

    QueryHandle {
      key,
      cache: self.clone(),
      rx,
      _marker: PhantomData,
    }
  }

  /// Mark every entry whose key equals or is prefixed by `prefix` stale.
  ///
  /// Observed entries refetch immediately; unobserved entries refetch on
  /// their next observation.
  pub fn invalidate(&self, prefix: &QueryKey) {
    let refetch: Vec<QueryKey> = {
      let mut entries = self.lock();
      let mut refetch = Vec::new();
      for (key, entry) in entries.iter_mut() {
        if !key.matches_prefix(prefix) {
          continue;
        }
        entry.stale = true;
        if entry.observers > 0 && entry.fetcher.is_some() {
          refetch.push(key.clone());
        }
      }
      refetch
    };

    for key in refetch {
      debug!(key = %key, "invalidated, refetching");
      self.start_fetch(&key);
    }
  }

  /// Start a fetch for `key`, superseding any fetch already in flight.
  fn start_fetch(&self, key: &QueryKey) {
    let (fetcher, epoch, cancel) = {
      let mut entries = self.lock();
      let Some(entry) = entries.get_mut(key) else {
        return;
      };
      let Some(fetcher) = entry.fetcher.clone() else {
        return;
      };
      entry.cancel.cancel();
      entry.cancel = CancellationToken::new();
      entry.epoch += 1;
      entry.stale = false;
      entry.state = QueryState::Pending;
      entry.tx.send_replace(entry.epoch);
      (fetcher, entry.epoch, entry.cancel.clone())
    };

    debug!(key = %key, epoch, "fetching");
    let cache = self.clone();
    let key = key.clone();
    tokio::spawn(async move {
      let fut = (fetcher)();
      let result = tokio::select! {
        _ = cancel.cancelled() => return,
        result = fut => result,
      };
      cache.complete(&key, epoch, result);
    });
  }

  /// Record the outcome of the fetch started at `epoch`.
  fn complete(&self, key: &QueryKey, epoch: u64, result: Result<BoxedValue, String>) {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(key) else {
      return;
    };
    if entry.epoch != epoch {
      // A newer fetch superseded this one; its result decides the state.
      return;
    }
    entry.state = match result {
      Ok(data) => QueryState::Success(data),
      Err(message) => QueryState::Error(message),
    };
    entry.tx.send_replace(entry.epoch);
  }
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

/// Live observation of one cache entry.
///
/// Dropping the handle releases the observation; when the last observer of a
/// pending entry drops, the in-flight fetch is cancelled and the entry
/// returns to idle.
pub struct QueryHandle<T> {
  key: QueryKey,
  cache: QueryCache,
  rx: watch::Receiver<u64>,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> QueryHandle<T> {
  /// Snapshot of the entry state.
  pub fn state(&self) -> QueryState<Arc<T>> {
    let entries = self.cache.lock();
    match entries.get(&self.key) {
      None => QueryState::Idle,
      Some(entry) => match &entry.state {
        QueryState::Idle => QueryState::Idle,
        QueryState::Pending => QueryState::Pending,
        QueryState::Error(message) => QueryState::Error(message.clone()),
        QueryState::Success(data) => match data.clone().downcast::<T>() {
          Ok(data) => QueryState::Success(data),
          Err(_) => QueryState::Error(format!(
            "cached value for {} has an unexpected type",
            self.key
          )),
        },
      },
    }
  }

  /// Wait until the entry reaches a terminal state and return it.
  ///
  /// After an invalidation the entry re-enters pending; calling this again
  /// returns the refetched result.
  pub async fn resolve(&mut self) -> Result<Arc<T>, QueryError> {
    loop {
      match self.state() {
        QueryState::Success(data) => return Ok(data),
        QueryState::Error(message) => return Err(QueryError(message)),
        QueryState::Idle | QueryState::Pending => {
          if self.rx.changed().await.is_err() {
            return Err(QueryError(format!("query {} was dropped", self.key)));
          }
        }
      }
    }
  }

  /// Force a refetch, superseding any in-flight request.
  pub fn refetch(&self) {
    self.cache.start_fetch(&self.key);
  }
}

impl<T> Drop for QueryHandle<T> {
  fn drop(&mut self) {
    let mut entries = self.cache.lock();
    if let Some(entry) = entries.get_mut(&self.key) {
      entry.observers = entry.observers.saturating_sub(1);
      if entry.observers == 0 && entry.state.is_pending() {
        // No consumer remains; abandon the in-flight request.
        entry.cancel.cancel();
        entry.epoch += 1;
        entry.state = QueryState::Idle;
        entry.tx.send_replace(entry.epoch);
      }
    }
  }
}
