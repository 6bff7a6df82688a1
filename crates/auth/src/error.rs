use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Password exceeds {0} bytes")]
    PasswordTooLong(usize),

    #[error("Token generation failed: {0}")]
    TokenGenerationError(String),

    /// Malformed, forged, wrongly-signed or expired token. Deliberately carries no detail.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Unknown username or wrong password. Deliberately carries no detail.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("user not found")]
    NotFound,

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, AuthError>;
