use thiserror::Error;

/// Application-wide error types for Bazaar.
#[derive(Error, Debug)]
pub enum AppError {
    /// No credentials were presented.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials were presented but do not grant access.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request data failed validation (bad id, bad price, missing field).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Token could not be signed or decoded.
    #[error("Token error: {0}")]
    TokenError(String),

    /// Payment provider rejected the request.
    #[error("Payment provider error (HTTP {status_code}): {message}")]
    PaymentError { message: String, status_code: u16 },

    /// No payment provider is configured.
    #[error("Payments are not configured")]
    PaymentsUnavailable,

    /// Outbound HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if the error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Unauthorized(_)
                | AppError::Forbidden(_)
                | AppError::NotFound(_)
                | AppError::InvalidInput(_)
                | AppError::SerializationError(_)
        )
    }
}
