#![forbid(unsafe_code)]

use thiserror::Error;

use crate::media::MediaError;

#[derive(Debug, Error)]
pub enum WadError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid wad: {0}")]
    Format(String),

    #[error("manifest line {line}: {reason}")]
    Manifest { line: usize, reason: String },

    #[error("conversion: {0}")]
    Conversion(#[from] MediaError),
}

pub type WadResult<T> = Result<T, WadError>;
