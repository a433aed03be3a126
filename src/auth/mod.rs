//! Authentication module for the token gate
//!
//! Provides stateless bearer-token authentication.
//! - HS256 JWT issuance and verification
//! - Credential checks against the account store
//! - Revocation tracking for logged-out tokens

mod credentials;
mod error;
mod jwt;
mod revocation;
mod service;

pub use credentials::CredentialVerifier;
pub use error::AuthError;
pub use jwt::{fingerprint, Claims, SigningContext, TokenCodec, TokenError};
pub use revocation::{schedule_sweep, RevocationStore};
pub use service::AuthService;
