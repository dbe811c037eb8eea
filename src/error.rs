//! Application error type.
//!
//! Every failure in the pipeline is one of a handful of kinds. Each kind maps to
//! a stable process exit code so scripts can tell "bad input" apart from
//! "model missing" without parsing messages.

use thiserror::Error;

#[derive(Clone, Error)]
pub enum AppError {
    /// Bad flags or configuration.
    #[error("{0}")]
    Usage(String),
    /// Missing file, unparseable date/quantity, empty product slice, bad artifact.
    #[error("{0}")]
    Data(String),
    /// No persisted model for the requested product.
    #[error("{0}")]
    NotFound(String),
    /// Failure inside model fitting or prediction.
    #[error("{0}")]
    Library(String),
    /// Failure writing an output artifact or driving the terminal.
    #[error("{0}")]
    Io(String),
}

impl AppError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn library(message: impl Into<String>) -> Self {
        Self::Library(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 2,
            Self::Data(_) => 3,
            Self::NotFound(_) => 4,
            Self::Library(_) => 5,
            Self::Io(_) => 6,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::Data(_) => "data",
            Self::NotFound(_) => "not_found",
            Self::Library(_) => "library",
            Self::Io(_) => "io",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Usage(m) | Self::Data(m) | Self::NotFound(m) | Self::Library(m) | Self::Io(m) => m,
        }
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind_name())
            .field("exit_code", &self.exit_code())
            .field("message", &self.message())
            .finish()
    }
}
