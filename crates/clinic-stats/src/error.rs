//! Error types for clinic-stats

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Size mismatch: {left} vs {right} observations")]
    SizeMismatch { left: usize, right: usize },

    #[error("Computation failed: {0}")]
    Computation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
