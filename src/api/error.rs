//! Error kinds surfaced by the API client.

use thiserror::Error;

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The server answered with a non-success status.
  #[error("HTTP error status: {status}{}", detail(.message))]
  Http {
    status: u16,
    /// Message from the server's error body, when one was decodable.
    message: Option<String>,
  },

  /// The response body decoded but did not match the expected shape.
  #[error("invalid response body: {0}")]
  Validation(String),

  /// The request could not be sent or completed.
  #[error("network error: {0}")]
  Network(String),
}

impl ApiError {
  /// HTTP status for `Http` errors.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Http { status, .. } => Some(*status),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    Self::Network(err.to_string())
  }
}

fn detail(message: &Option<String>) -> String {
  match message {
    Some(m) => format!(" ({m})"),
    None => String::new(),
  }
}
