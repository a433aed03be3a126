//! Login, logout and registration endpoints

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Query, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::Utc;

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::middleware::bearer_token;
use crate::models::{AccountView, ApiResponse, LoginParams, RegisterRequest, TokenResponse};
use crate::services::UserService;

/// Username and password taken from a JSON body, a form body, or the query string.
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

#[async_trait]
impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let params = if content_type.starts_with("application/json") {
            let Json(params) = Json::<LoginParams>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            params
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(params) = Form::<LoginParams>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            params
        } else {
            let Query(params) = Query::<LoginParams>::try_from_uri(req.uri())
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            params
        };

        let username = params.username.ok_or_else(|| missing_parameter("username"))?;
        let password = params.password.ok_or_else(|| missing_parameter("password"))?;

        Ok(LoginCredentials { username, password })
    }
}

fn missing_parameter(name: &str) -> ApiError {
    ApiError::BadRequest(format!("Missing required parameter: {}", name))
}

/// Exchange credentials for a bearer token
pub async fn login(
    State(auth_service): State<Arc<AuthService>>,
    credentials: LoginCredentials,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = auth_service
        .login(&credentials.username, &credentials.password, Utc::now())
        .await?;

    Ok(Json(TokenResponse { token }))
}

/// Revoke the presented bearer token
pub async fn logout(State(auth_service): State<Arc<AuthService>>, headers: HeaderMap) -> Response {
    match bearer_token(&headers) {
        Ok(token) => {
            auth_service.logout(token, Utc::now());
            (StatusCode::OK, "Logged out successfully!").into_response()
        }
        Err(_) => (StatusCode::BAD_REQUEST, "Invalid token").into_response(),
    }
}

/// Register a new account
pub async fn register(
    State(user_service): State<Arc<UserService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let account = user_service.register(request).await?;
    Ok(Json(ApiResponse::ok(account.into())))
}
