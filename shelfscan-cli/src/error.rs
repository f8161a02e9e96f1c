//! CLI-specific error types and exit code mapping

use shelfscan_core::error::ShelfscanError;
use shelfscan_lookup::LookupError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The product database has no product for the code.
    #[error("not found: {0}")]
    NotFound(String),

    /// The product database could not be reached or answered with an error.
    #[error("product database error: {0}")]
    Api(String),

    /// The scanner failed.
    #[error("scanner error: {0}")]
    Scanner(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from shelfscan-core.
    #[error("{0}")]
    Core(#[from] ShelfscanError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                              |
    /// |------|--------------------------------------|
    /// | 0    | Success                              |
    /// | 1    | General / command error              |
    /// | 2    | Configuration error                  |
    /// | 4    | Product not found                    |
    /// | 5    | Product database error               |
    /// | 10   | IO error                             |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::NotFound(_) => 4,
            Self::Api(_) => 5,
            Self::Io(_) => 10,
            Self::Core(ShelfscanError::Config(_)) => 2,
            Self::Core(ShelfscanError::Api(_)) => 5,
            Self::Core(ShelfscanError::Io(_)) => 10,
            Self::JsonSerialize(_)
            | Self::Command(_)
            | Self::Scanner(_)
            | Self::Core(ShelfscanError::Scanner(_)) => 1,
        }
    }
}

impl From<LookupError> for CliError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::InvalidCode { .. } => Self::Command(e.to_string()),
            LookupError::NotFound { code } => Self::NotFound(code),
            LookupError::Api(_) | LookupError::ClientInit(_) => Self::Api(e.to_string()),
            LookupError::Config { .. } => Self::Config(e.to_string()),
            LookupError::Scanner(_) => Self::Scanner(e.to_string()),
        }
    }
}

impl From<shelfscan_core::error::ScannerError> for CliError {
    fn from(e: shelfscan_core::error::ScannerError) -> Self {
        Self::Scanner(e.to_string())
    }
}
