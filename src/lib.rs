//! Token Gate Library
//!
//! Stateless bearer-token authentication for HTTP services: token issuance,
//! per-request verification, and logout revocation.

pub mod accounts;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
