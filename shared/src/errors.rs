//! Shared error types for the band campaign system

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid band identifier: {input}")]
    InvalidBand { input: String },

    #[error("Invalid combination identity: {input}")]
    InvalidCombination { input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
