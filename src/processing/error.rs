use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Invalid source file name: {}", .0.display())]
    InvalidFileName(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProcessingResult<T> = std::result::Result<T, ProcessingError>;
