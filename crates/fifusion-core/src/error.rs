//! Error types for Fi-Fusion

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A raw record field is missing or malformed
    #[error("Validation error on `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    /// A cross-field rule is broken (goal overshoot, inverted budget period, ...)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Amount or date outside the supported range
    #[error("Range error: {0}")]
    Range(String),

    /// The ledger store could not be read
    #[error("Ledger store unavailable: {0}")]
    UpstreamUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The view assembler was handed an absent input
    #[error("Incomplete data: missing {0}")]
    IncompleteData(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Wrap any store-side failure so callers see a single upstream error kind
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::UpstreamUnavailable(Box::new(err))
    }

    /// Whether the normalizer's skip policy may drop the offending record
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InvariantViolation(_) | Self::Range(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
