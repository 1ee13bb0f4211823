use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelsError {
    #[error("Failed to load audio {path}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("Failed to decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LevelsError>;
