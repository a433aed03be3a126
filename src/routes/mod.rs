//! Route definitions for the token gate API

mod auth;
mod user;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::handlers::{health_check, root};
use crate::middleware::authenticate;

pub use auth::auth_routes;
pub use user::user_routes;

/// Assemble every route behind the bearer-token interceptor.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(auth_routes())
        .merge(user_routes())
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
