//! Hierarchical cache keys.

use std::fmt;

/// Ordered tuple of segments identifying a cached query result.
///
/// Keys form a hierarchy through their segments: `["projects"]` is a prefix
/// of `["projects", "p1", "tasks"]`, so invalidating the former also covers
/// the latter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
  pub fn new<I, S>(segments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(segments.into_iter().map(Into::into).collect())
  }

  /// Whether this key equals `prefix` or starts with all of its segments.
  pub fn matches_prefix(&self, prefix: &QueryKey) -> bool {
    self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.join("/"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_equal_key_matches() {
    let key = QueryKey::new(["projects"]);
    assert!(key.matches_prefix(&QueryKey::new(["projects"])));
  }

  #[test]
  fn test_nested_key_matches_parent_prefix() {
    let key = QueryKey::new(["projects", "p1", "tasks"]);
    assert!(key.matches_prefix(&QueryKey::new(["projects"])));
    assert!(key.matches_prefix(&QueryKey::new(["projects", "p1"])));
    assert!(key.matches_prefix(&QueryKey::new(["projects", "p1", "tasks"])));
  }

  #[test]
  fn test_sibling_key_does_not_match() {
    let key = QueryKey::new(["projects", "p1", "tasks"]);
    assert!(!key.matches_prefix(&QueryKey::new(["projects", "p2"])));
    assert!(!key.matches_prefix(&QueryKey::new(["tasks"])));
  }

  #[test]
  fn test_shorter_key_does_not_match_longer_prefix() {
    let key = QueryKey::new(["projects"]);
    assert!(!key.matches_prefix(&QueryKey::new(["projects", "p1"])));
  }

  #[test]
  fn test_display_joins_segments() {
    let key = QueryKey::new(["projects", "p1", "tasks"]);
    assert_eq!(key.to_string(), "projects/p1/tasks");
  }
}
