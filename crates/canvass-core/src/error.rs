//! Error types for `canvass-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown message status: {0:?}")]
  UnknownMessageStatus(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("script_options must contain at least one script")]
  EmptyScriptOptions,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
