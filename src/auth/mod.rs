pub mod password;
pub mod token;

use thiserror::Error;

pub use password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
pub use token::{Claims, TokenService};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("account has no password set")]
    CredentialNotSet,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("stored credential is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    #[error("invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}
