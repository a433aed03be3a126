use crate::accounts::StoreError;

use super::TokenError;

/// Failures surfaced by the authentication pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown username and wrong password are deliberately the same error.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token is invalid (logged out)")]
    TokenRevoked,

    #[error("Authorization header is not a bearer token")]
    MalformedAuthHeader,

    #[error("Failed to issue token: {0}")]
    Issue(#[source] TokenError),

    #[error("Authentication backend unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Unavailable(err.to_string())
    }
}
