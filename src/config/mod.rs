//! Process configuration loaded once at startup.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::auth::SigningContext;

const DEFAULT_JWT_SECRET: &str = "change-me-secret";
const DEFAULT_JWT_EXPIRATION_MS: u64 = 86_400_000;
const MIN_JWT_EXPIRATION_MS: u64 = 1_000;
// 100 years
const MAX_JWT_EXPIRATION_MS: u64 = 100 * 365 * 86_400_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

/// Credentials for the account created at startup when none exists yet.
#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_expiration_ms: u64,
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub cors_allowed_origins: Vec<String>,
    pub revocation_sweep_interval: Duration,
    pub bcrypt_cost: u32,
    pub admin_seed: Option<AdminSeed>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_ms", &self.jwt_expiration_ms)
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("revocation_sweep_interval", &self.revocation_sweep_interval)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field(
                "admin_seed",
                &self.admin_seed.as_ref().map(|seed| seed.username.as_str()),
            )
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        let _ = dotenvy::dotenv();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            Ok(_) => {
                return Err(ConfigError::InvalidValue(
                    "JWT_SECRET".to_string(),
                    "cannot be empty".to_string(),
                ))
            }
            Err(_) => {
                tracing::warn!("JWT_SECRET not set; using the built-in development secret");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let jwt_expiration_ms = check_expiration_ms(parse_var(
            "JWT_EXPIRATION_MS",
            DEFAULT_JWT_EXPIRATION_MS,
        )?)?;

        let host: IpAddr = parse_var("BIND_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port: u16 = parse_var("PORT", 8080)?;

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let sweep_secs: u64 = parse_var("REVOCATION_SWEEP_INTERVAL_SECS", 60)?;
        if sweep_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "REVOCATION_SWEEP_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let bcrypt_cost: u32 = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue(
                "BCRYPT_COST".to_string(),
                "must be between 4 and 31".to_string(),
            ));
        }

        let admin_seed = if parse_var("SEED_ADMIN", true)? {
            Some(AdminSeed {
                username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
                password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
                email: env::var("ADMIN_EMAIL")
                    .unwrap_or_else(|_| "admin@example.com".to_string()),
            })
        } else {
            None
        };

        Ok(Self {
            jwt_secret,
            jwt_expiration_ms,
            bind_addr: SocketAddr::new(host, port),
            database_url,
            cors_allowed_origins,
            revocation_sweep_interval: Duration::from_secs(sweep_secs),
            bcrypt_cost,
            admin_seed,
        })
    }

    /// Freeze the token settings into the context shared by the codec and issuer.
    pub fn signing_context(&self) -> SigningContext {
        let lifetime_ms = self.jwt_expiration_ms.min(MAX_JWT_EXPIRATION_MS);
        SigningContext::new(
            self.jwt_secret.as_bytes(),
            chrono::Duration::milliseconds(i64::try_from(lifetime_ms).unwrap_or(i64::MAX)),
        )
    }
}

fn check_expiration_ms(value: u64) -> Result<u64, ConfigError> {
    if !(MIN_JWT_EXPIRATION_MS..=MAX_JWT_EXPIRATION_MS).contains(&value) {
        return Err(ConfigError::InvalidValue(
            "JWT_EXPIRATION_MS".to_string(),
            format!(
                "must be between {} and {}",
                MIN_JWT_EXPIRATION_MS, MAX_JWT_EXPIRATION_MS
            ),
        ));
    }
    Ok(value)
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::ParseError(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        let value: u64 = parse_var("TOKENGATE_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_var_reports_variable_name() {
        env::set_var("TOKENGATE_TEST_BAD_NUMBER", "not-a-number");
        let err = parse_var::<u64>("TOKENGATE_TEST_BAD_NUMBER", 1).unwrap_err();
        env::remove_var("TOKENGATE_TEST_BAD_NUMBER");
        assert!(err.to_string().contains("TOKENGATE_TEST_BAD_NUMBER"));
    }

    #[test]
    fn test_expiration_bounds() {
        assert!(check_expiration_ms(999).is_err());
        assert_eq!(check_expiration_ms(1_000).unwrap(), 1_000);
        assert_eq!(
            check_expiration_ms(MAX_JWT_EXPIRATION_MS).unwrap(),
            MAX_JWT_EXPIRATION_MS
        );
        assert!(check_expiration_ms(MAX_JWT_EXPIRATION_MS + 1).is_err());
        assert!(check_expiration_ms(10_000_000_000_000_000).is_err());
        assert!(check_expiration_ms(u64::MAX).is_err());
    }

    #[test]
    fn test_from_env_rejects_oversized_expiration() {
        env::set_var("JWT_EXPIRATION_MS", "10000000000000000");
        let result = AppConfig::from_env();
        env::remove_var("JWT_EXPIRATION_MS");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("JWT_EXPIRATION_MS"));
    }

    #[test]
    fn test_signing_context_lifetime_at_upper_bound() {
        let config = AppConfig {
            jwt_secret: "secret".to_string(),
            jwt_expiration_ms: MAX_JWT_EXPIRATION_MS,
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            database_url: None,
            cors_allowed_origins: vec![],
            revocation_sweep_interval: Duration::from_secs(60),
            bcrypt_cost: 4,
            admin_seed: None,
        };

        let context = config.signing_context();
        assert_eq!(context.lifetime(), chrono::Duration::days(100 * 365));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig {
            jwt_secret: "super-secret-value".to_string(),
            jwt_expiration_ms: 1_000,
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            database_url: Some("postgres://user:pw@db/app".to_string()),
            cors_allowed_origins: vec![],
            revocation_sweep_interval: Duration::from_secs(60),
            bcrypt_cost: 4,
            admin_seed: Some(AdminSeed {
                username: "admin".to_string(),
                password: "admin123".to_string(),
                email: "admin@example.com".to_string(),
            }),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("pw@db"));
        assert!(!rendered.contains("admin123"));
    }
}
