//! Domain types for the task/project API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project owned by the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
  pub id: String,
  pub name: String,
}

/// A task within a project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
  pub id: String,
  pub name: String,
  /// Set once the task has been completed.
  #[serde(default)]
  pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
  pub fn is_completed(&self) -> bool {
    self.completed_at.is_some()
  }
}

/// Payload for creating a project.
#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
  pub name: String,
  pub color: String,
}

impl NewProject {
  /// New project with the default color.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      color: "default".to_string(),
    }
  }
}

/// Pagination window for list calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub limit: u32,
  pub offset: u32,
}

impl Page {
  pub fn new(limit: u32, offset: u32) -> Self {
    Self { limit, offset }
  }

  /// Next window of the same size.
  pub fn next(self) -> Self {
    Self {
      limit: self.limit,
      offset: self.offset + self.limit,
    }
  }
}

impl Default for Page {
  // The server-side default window.
  fn default() -> Self {
    Self {
      limit: 10,
      offset: 0,
    }
  }
}
