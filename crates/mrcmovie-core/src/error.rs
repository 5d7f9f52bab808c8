use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MovieError {
    #[error("Invalid input {}: {reason}", path.display())]
    Input { path: PathBuf, reason: String },

    #[error("Slice index {index} out of range (depth: {depth})")]
    SliceIndexOutOfRange { index: usize, depth: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Estimated peak memory {estimated_bytes} bytes exceeds available budget {available_bytes} bytes"
    )]
    MemoryBudgetExceeded {
        estimated_bytes: u64,
        available_bytes: u64,
    },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Coarse error category, used in logs and batch reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Config,
    MemoryBudget,
    Processing,
    Output,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "InputError"),
            Self::Config => write!(f, "ConfigError"),
            Self::MemoryBudget => write!(f, "MemoryBudgetExceeded"),
            Self::Processing => write!(f, "ProcessingError"),
            Self::Output => write!(f, "OutputError"),
        }
    }
}

impl MovieError {
    pub fn input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Input {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Readers map their own I/O failures to `Input`, so a bare `Io` or
    /// `Image` error always comes from a sink.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input { .. } | Self::SliceIndexOutOfRange { .. } => ErrorKind::Input,
            Self::Config(_) => ErrorKind::Config,
            Self::MemoryBudgetExceeded { .. } => ErrorKind::MemoryBudget,
            Self::Processing(_) => ErrorKind::Processing,
            Self::Output(_) | Self::Io(_) | Self::Image(_) => ErrorKind::Output,
        }
    }
}

pub type Result<T> = std::result::Result<T, MovieError>;
