use axum::{
    routing::{get, put},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::{delete_user, get_user, list_users, me, update_can_manage};

// Profile and account management routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(me))
        .route("/api/users", get(list_users))
        .route("/api/users/:id", get(get_user).delete(delete_user))
        .route("/api/users/:id/canManage", put(update_can_manage))
}
