use thiserror::Error;

/// Database errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Record not found: {0} with key {1}")]
    NotFound(String, String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Other(String),
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' contains an invalid value: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Validation error: {0}")]
    Custom(String),
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        Self::Required {
            field: field.to_string(),
        }
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn custom(message: &str) -> Self {
        Self::Custom(message.to_string())
    }
}

/// Errors raised by the PDF compression policy.
///
/// Classification failures are never represented here: structural inspection
/// falls back to the scanned path instead of failing. Everything else aborts
/// the whole compression run; no partial output is ever persisted.
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("failed to open document: {0}")]
    InvalidDocument(String),

    #[error("failed to decode embedded image {index} on page {page}: {reason}")]
    ImageDecode {
        page: u32,
        index: usize,
        reason: String,
    },

    #[error("failed to re-encode embedded image {index} on page {page}: {reason}")]
    ImageEncode {
        page: u32,
        index: usize,
        reason: String,
    },

    #[error("failed to serialize output document: {0}")]
    Serialize(String),
}

/// Domain-level errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Entity not found: {0} with key {1}")]
    EntityNotFound(String, String),

    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("PDF structure error: {0}")]
    Pdf(String),

    #[error("File error: {0}")]
    File(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External error: {0}")]
    External(String),
}

/// Service-level errors (application specific)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<ValidationError> for ServiceError {
    fn from(error: ValidationError) -> Self {
        ServiceError::Domain(DomainError::Validation(error))
    }
}
