//! Mutation bindings: a mutation paired with the cache keys it invalidates.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::cache::QueryCache;
use super::key::QueryKey;

type RunFn<I, O, E> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, E>> + Send + Sync>;

/// Binds a mutation to the cache entries that go stale when it succeeds.
///
/// The invalidation set is declared up front with [`MutationBinding::invalidates`];
/// each declared key is treated as a prefix, so invalidating `["projects"]`
/// also covers every `["projects", ..]` entry.
pub struct MutationBinding<I, O, E> {
  cache: QueryCache,
  run: RunFn<I, O, E>,
  invalidates: Vec<QueryKey>,
}

impl<I, O, E> MutationBinding<I, O, E> {
  pub fn new<F, Fut>(cache: QueryCache, run: F) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
  {
    Self {
      cache,
      run: Arc::new(move |input| Box::pin(run(input))),
      invalidates: Vec::new(),
    }
  }

  /// Declare a key prefix to invalidate when the mutation succeeds.
  pub fn invalidates(mut self, key: QueryKey) -> Self {
    self.invalidates.push(key);
    self
  }

  /// Run the mutation.
  ///
  /// On success every declared prefix is invalidated before returning; on
  /// failure the cache is left untouched and the error goes to the caller.
  pub async fn mutate(&self, input: I) -> Result<O, E> {
    let output = (self.run)(input).await?;
    for key in &self.invalidates {
      self.cache.invalidate(key);
    }
    Ok(output)
  }

  /// Run the mutation and call `on_success` once invalidation is scheduled.
  ///
  /// The hook runs before any triggered refetch completes.
  pub async fn mutate_then<F>(&self, input: I, on_success: F) -> Result<O, E>
  where
    F: FnOnce(&O),
  {
    let output = self.mutate(input).await?;
    on_success(&output);
    Ok(output)
  }
}

impl<I, O, E> Clone for MutationBinding<I, O, E> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
      run: Arc::clone(&self.run),
      invalidates: self.invalidates.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn list_fetcher(
    counter: Arc<AtomicU32>,
  ) -> impl Fn() -> futures::future::BoxFuture<'static, Result<u32, String>> + Send + Sync {
    move || {
      let counter = counter.clone();
      Box::pin(async move { Ok(counter.fetch_add(1, Ordering::SeqCst)) })
    }
  }

  #[tokio::test]
  async fn test_successful_mutation_invalidates_declared_keys() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let key = QueryKey::new(["projects"]);

    let mut handle = cache.observe(key.clone(), list_fetcher(counter.clone()));
    assert_eq!(*handle.resolve().await.unwrap(), 0);

    let binding: MutationBinding<String, String, String> =
      MutationBinding::new(cache.clone(), |name: String| async move { Ok(name) })
        .invalidates(key);

    let created = binding.mutate("Groceries".to_string()).await.unwrap();
    assert_eq!(created, "Groceries");
    assert_eq!(*handle.resolve().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_failed_mutation_leaves_cache_untouched() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let key = QueryKey::new(["projects"]);

    let mut handle = cache.observe(key.clone(), list_fetcher(counter.clone()));
    assert_eq!(*handle.resolve().await.unwrap(), 0);

    let binding: MutationBinding<String, String, String> =
      MutationBinding::new(cache.clone(), |_: String| async move {
        Err("HTTP error status: 404".to_string())
      })
      .invalidates(key);

    let err = binding.mutate("missing".to_string()).await.unwrap_err();
    assert!(err.contains("404"));
    assert!(handle.state().is_success());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_on_success_hook_runs_after_invalidation() {
    let cache = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));
    let key = QueryKey::new(["projects"]);

    let mut handle = cache.observe(key.clone(), list_fetcher(counter.clone()));
    handle.resolve().await.unwrap();

    let binding: MutationBinding<(), (), String> =
      MutationBinding::new(cache.clone(), |_| async move { Ok(()) }).invalidates(key);

    let mut hook_ran = false;
    binding
      .mutate_then((), |_| {
        hook_ran = true;
      })
      .await
      .unwrap();
    assert!(hook_ran);
    assert_eq!(*handle.resolve().await.unwrap(), 1);
  }
}
