//! Error types. Collaborator failures are normalized to placeholder values in
//! `logic`; the remaining errors are caller mistakes reported back to the client.

use thiserror::Error;

/// Failure of one request/response cycle against the hosted model.
#[derive(Debug, Error)]
pub enum CollaboratorError {
  /// No API key configured. Detected before any network attempt.
  #[error("model credential missing (OPENAI_API_KEY not set)")]
  ConfigurationMissing,

  #[error("transport error: {0}")]
  Transport(String),

  #[error("model HTTP {status}: {message}")]
  Http { status: u16, message: String },

  /// Body arrived but did not match the expected schema.
  #[error("response parse error: {0}")]
  Parse(String),

  #[error("model call timed out")]
  Timeout,
}

impl From<reqwest::Error> for CollaboratorError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      CollaboratorError::Timeout
    } else if e.is_decode() {
      CollaboratorError::Parse(e.to_string())
    } else {
      CollaboratorError::Transport(e.to_string())
    }
  }
}

impl From<serde_json::Error> for CollaboratorError {
  fn from(e: serde_json::Error) -> Self {
    CollaboratorError::Parse(e.to_string())
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
  #[error("unknown question id: {0}")]
  UnknownQuestion(u32),
  #[error("answer is empty")]
  EmptyAnswer,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DebateError {
  #[error("unknown argument id: {0}")]
  UnknownArgument(String),
}
