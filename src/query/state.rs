//! Query entry states.

use thiserror::Error;

/// The state of a cached query entry.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// No fetch has been started for this entry
  Idle,
  /// A fetch is in flight
  Pending,
  /// The last fetch resolved with data
  Success(T),
  /// The last fetch failed
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_pending(&self) -> bool {
    matches!(self, QueryState::Pending)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// Error returned when resolving a query whose fetch failed.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct QueryError(pub String);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_accessors_follow_the_active_state() {
    let success: QueryState<u32> = QueryState::Success(7);
    assert!(success.is_success());
    assert_eq!(success.data(), Some(&7));
    assert_eq!(success.error(), None);

    let error: QueryState<u32> = QueryState::Error("HTTP error status: 401".to_string());
    assert!(error.is_error());
    assert_eq!(error.data(), None);
    assert_eq!(error.error(), Some("HTTP error status: 401"));

    assert!(QueryState::<u32>::Pending.is_pending());
    assert!(!QueryState::<u32>::Idle.is_pending());
  }
}
