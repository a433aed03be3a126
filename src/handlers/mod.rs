//! API handlers for the token gate

pub mod auth;
pub mod user;

pub use auth::{login, logout, register, LoginCredentials};
pub use user::{delete_user, get_user, list_users, me, update_can_manage};

use crate::middleware::OptionalUser;

pub async fn root(OptionalUser(identity): OptionalUser) -> String {
    match identity {
        Some(identity) => format!("Token Gate API Server (signed in as {})", identity.subject),
        None => "Token Gate API Server".to_string(),
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
