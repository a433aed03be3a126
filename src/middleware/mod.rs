//! Middleware for the token gate API
//!
//! Bearer-token interception plus the extractors handlers use to demand an identity.

pub mod auth;

pub use auth::{authenticate, bearer_token, AdminUser, AuthenticatedUser, OptionalUser};
