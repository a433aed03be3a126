//! Request interceptor and identity extractors.
//!
//! `authenticate` runs once per request. It reads `Authorization: Bearer <token>`,
//! rejects revoked tokens with 401, and otherwise attaches the caller's
//! `Identity` to the request when the token checks out. Every other outcome
//! continues anonymously; handlers state what they need through
//! `AuthenticatedUser`, `AdminUser`, or `OptionalUser`.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::app_state::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::models::Identity;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-sensitively with exactly one space, and an
/// empty token counts as malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedAuthHeader)
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // No usable header means an anonymous request, not a failure.
    let token = bearer_token(request.headers()).ok().map(str::to_string);
    let Some(token) = token else {
        return next.run(request).await;
    };

    match state.auth_service.authenticate(&token, Utc::now()).await {
        Ok(Some(identity)) => {
            request.extensions_mut().insert(identity);
        }
        Ok(None) => {}
        Err(e) => return ApiError::from(e).into_response(),
    }

    next.run(request).await
}

/// Identity of the caller; rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// Identity of the caller if one was established.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<Identity>().cloned()))
    }
}

/// Caller holding the manage-users capability; 401 when anonymous, 403 otherwise.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(identity) =
            AuthenticatedUser::from_request_parts(parts, state).await?;

        if !identity.can_manage_users {
            return Err(ApiError::Forbidden(
                "Manage-users capability required".to_string(),
            ));
        }

        Ok(AdminUser(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracts_value() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_rejects_other_forms() {
        assert!(bearer_token(&HeaderMap::new()).is_err());

        for value in ["NotBearer xyz", "bearer abc", "Bearer", "Bearer ", "Basic dXNlcjpwdw=="] {
            assert!(
                matches!(
                    bearer_token(&headers(value)),
                    Err(AuthError::MalformedAuthHeader)
                ),
                "accepted {:?}",
                value
            );
        }
    }

    #[test]
    fn test_bearer_token_keeps_remaining_text_verbatim() {
        // Everything after the prefix is the token, as on the wire.
        assert_eq!(bearer_token(&headers("Bearer  padded")).unwrap(), " padded");
    }
}
