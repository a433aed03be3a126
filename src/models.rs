//! Data models for the token gate API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::accounts::Account;

/// Caller identity established from a verified token for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: Uuid,
    pub subject: String,
    pub can_manage_users: bool,
}

impl From<&Account> for Identity {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            subject: account.username.clone(),
            can_manage_users: account.can_manage_users,
        }
    }
}

/// Login parameters, accepted from JSON, form, or query string
#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login response body
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: String,
    pub can_manage_users: Option<bool>,
}

/// Query for updating the manage-users capability
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageFlagQuery {
    pub can_manage_users: bool,
}

/// Account as exposed over the API; never carries the password hash
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub can_manage_users: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            can_manage_users: account.can_manage_users,
            created_at: account.created_at,
        }
    }
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            email: Some("admin@example.com".to_string()),
            password_hash: "$2b$04$secret-hash".to_string(),
            can_manage_users: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_view_omits_hash() {
        let json = serde_json::to_value(AccountView::from(account())).unwrap();

        assert_eq!(json["username"], "admin");
        assert_eq!(json["canManageUsers"], true);
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("secret-hash"));
    }

    #[test]
    fn test_identity_from_account() {
        let account = account();
        let identity = Identity::from(&account);

        assert_eq!(identity.account_id, account.id);
        assert_eq!(identity.subject, "admin");
        assert!(identity.can_manage_users);
    }

    #[test]
    fn test_register_request_validation() {
        let valid: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret1",
            "canManageUsers": false
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let short: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "al",
            "password": "123"
        }))
        .unwrap();
        let errors = short.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));

        let bad_email: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "alice",
            "email": "not-an-email",
            "password": "secret1"
        }))
        .unwrap();
        assert!(bad_email.validate().is_err());
    }
}
