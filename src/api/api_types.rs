//! Serde-deserializable types matching API responses.
//!
//! Wire envelopes are separate from domain types so deserialization stays
//! strict while domain types stay focused on application needs. A list body
//! is accepted only if the wrapping field is an array and every element
//! matches the entity shape; any missing field, wrong type, or failing
//! element rejects the whole payload.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::ApiError;
use super::types::{Project, Task};

/// Wrapped list body of `GET /projects`.
#[derive(Debug, Deserialize)]
pub struct ProjectsBody {
  pub projects: Vec<Project>,
  /// More pages remain after this window.
  #[serde(default, alias = "hasNext")]
  pub has_next: bool,
}

/// Wrapped list body of `GET /projects/{id}/tasks`.
#[derive(Debug, Deserialize)]
pub struct TasksBody {
  pub tasks: Vec<Task>,
  #[serde(default, alias = "hasNext")]
  pub has_next: bool,
}

/// Error body the server attaches to non-success responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
  pub message: String,
}

/// Decode a JSON body, mapping shape failures to [`ApiError::Validation`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
  serde_json::from_slice(bytes).map_err(|e| ApiError::Validation(e.to_string()))
}
