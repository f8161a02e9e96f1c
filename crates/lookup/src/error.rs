//! Lookup domain errors.
//!
//! [`LookupError`] covers everything that can go wrong between a typed or
//! scanned barcode and a rendered product. `From<LookupError> for ShelfscanError`
//! lets callers propagate it with `?` into the top-level error type.

use shelfscan_core::error::{ApiError, ConfigError, ScannerError, ShelfscanError};

/// Errors raised by the lookup crate.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The submitted barcode failed local validation.
    #[error("invalid barcode '{input}': {reason}")]
    InvalidCode {
        /// Raw input as submitted.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The product database answered, but has no product for this code.
    #[error("product not found: {code}")]
    NotFound {
        /// Barcode that was looked up.
        code: String,
    },

    /// Communication with the product database failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The scanner adapter failed.
    #[error(transparent)]
    Scanner(#[from] ScannerError),

    /// Configuration rejected by the lookup crate.
    #[error("config error: {field}: {reason}")]
    Config {
        /// Offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("http client init failed: {0}")]
    ClientInit(String),
}

impl From<LookupError> for ShelfscanError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Api(e) => ShelfscanError::Api(e),
            LookupError::Scanner(e) => ShelfscanError::Scanner(e),
            LookupError::Config { field, reason } => {
                ShelfscanError::Config(ConfigError::InvalidValue { field, reason })
            }
            LookupError::ClientInit(reason) => ShelfscanError::Api(ApiError::Transport(reason)),
            LookupError::InvalidCode { input, reason } => {
                ShelfscanError::Config(ConfigError::InvalidValue {
                    field: "barcode".to_owned(),
                    reason: format!("'{input}': {reason}"),
                })
            }
            LookupError::NotFound { code } => ShelfscanError::Api(ApiError::Reported {
                endpoint: "product".to_owned(),
                message: format!("product not found: {code}"),
            }),
        }
    }
}
