//! Profile and account management endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{AccountView, ApiResponse, ManageFlagQuery};
use crate::services::UserService;

/// Current caller's account
pub async fn me(
    State(user_service): State<Arc<UserService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let account = user_service.find_by_id(identity.account_id).await?;
    Ok(Json(ApiResponse::ok(account.into())))
}

pub async fn list_users(
    State(user_service): State<Arc<UserService>>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<AccountView>>>, ApiError> {
    let accounts = user_service.list().await?;
    Ok(Json(ApiResponse::ok(
        accounts.into_iter().map(AccountView::from).collect(),
    )))
}

pub async fn get_user(
    State(user_service): State<Arc<UserService>>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let account = user_service.find_by_id(id).await?;
    Ok(Json(ApiResponse::ok(account.into())))
}

pub async fn update_can_manage(
    State(user_service): State<Arc<UserService>>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ManageFlagQuery>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let account = user_service
        .set_can_manage(id, query.can_manage_users)
        .await?;
    Ok(Json(ApiResponse::ok(account.into())))
}

pub async fn delete_user(
    State(user_service): State<Arc<UserService>>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
