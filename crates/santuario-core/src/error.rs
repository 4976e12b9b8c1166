//! Error types for `santuario-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("mood must be between 0 and 5, got {0}")]
  InvalidMood(u8),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
