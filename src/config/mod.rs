use crate::error::AppError;
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use uuid::Uuid;

/// Process-wide configuration, loaded once at startup. A missing secret or
/// external endpoint is a fatal configuration error, never a per-request one.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub gate: GateConfig,
    pub access: AccessConfig,
    pub catalog: CatalogConfig,
    pub smtp: SmtpConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub jwt_secret: Secret<String>,
}

/// Site-wide password gate: the shared preview password, the signing key for
/// the stateless proof-of-password token, and the cookie it travels in.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub password: Secret<String>,
    pub token_secret: Secret<String>,
    pub token_window_seconds: u64,
    pub cookie_name: String,
    pub safe_redirect_path: String,
}

#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub hub_id: Uuid,
    pub allowed_tiers: Vec<String>,
    pub admin_email: String,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub client_id_cookie_name: String,
    pub general_enquiry_limit: u32,
    pub general_enquiry_window_seconds: u64,
    pub password_access_limit: u32,
    pub password_access_window_seconds: u64,
    pub password_check_limit: u32,
    pub password_check_window_seconds: u64,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = PortalConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("dealroom-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            },
            redis: RedisConfig {
                url: get_env("REDIS_URL", None, is_prod)?,
            },
            session: SessionConfig {
                jwt_secret: Secret::new(get_env("SESSION_JWT_SECRET", None, is_prod)?),
            },
            gate: GateConfig {
                password: Secret::new(get_env("GATE_PASSWORD", None, is_prod)?),
                token_secret: Secret::new(get_env("GATE_TOKEN_SECRET", None, is_prod)?),
                token_window_seconds: parse_env("GATE_TOKEN_WINDOW_SECONDS", "3600", is_prod)?,
                cookie_name: get_env(
                    "GATE_COOKIE_NAME",
                    Some("password_access_token"),
                    is_prod,
                )?,
                safe_redirect_path: get_env("SAFE_REDIRECT_PATH", Some("/protected"), is_prod)?,
            },
            access: AccessConfig {
                hub_id: get_env("HUB_ID", None, is_prod)?
                    .parse()
                    .map_err(|e: uuid::Error| {
                        AppError::ConfigError(anyhow::anyhow!("Invalid HUB_ID: {}", e))
                    })?,
                allowed_tiers: get_env("ALLOWED_TIERS", Some("bronze,silver"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect(),
                admin_email: get_env("ADMIN_EMAIL", None, is_prod)?,
            },
            catalog: CatalogConfig {
                base_url: get_env("CATALOG_BASE_URL", None, is_prod)?,
                api_key: Secret::new(get_env("CATALOG_API_KEY", None, is_prod)?),
            },
            smtp: SmtpConfig {
                enabled: get_env("SMTP_ENABLED", Some("true"), is_prod)?
                    .parse()
                    .unwrap_or(true),
                host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                port: parse_env("SMTP_PORT", "587", is_prod)?,
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@localhost"), is_prod)?,
            },
            rate_limit: RateLimitConfig {
                client_id_cookie_name: get_env(
                    "RATE_LIMIT_CLIENT_ID_COOKIE",
                    Some("dr_client_id"),
                    is_prod,
                )?,
                general_enquiry_limit: parse_env("RATE_LIMIT_ENQUIRY_LIMIT", "3", is_prod)?,
                general_enquiry_window_seconds: parse_env(
                    "RATE_LIMIT_ENQUIRY_WINDOW_SECONDS",
                    "60",
                    is_prod,
                )?,
                password_access_limit: parse_env("RATE_LIMIT_ACCESS_LIMIT", "3", is_prod)?,
                password_access_window_seconds: parse_env(
                    "RATE_LIMIT_ACCESS_WINDOW_SECONDS",
                    "3600",
                    is_prod,
                )?,
                password_check_limit: parse_env("RATE_LIMIT_PASSWORD_CHECK_LIMIT", "8", is_prod)?,
                password_check_window_seconds: parse_env(
                    "RATE_LIMIT_PASSWORD_CHECK_WINDOW_SECONDS",
                    "60",
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.gate.token_window_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATE_TOKEN_WINDOW_SECONDS must be positive"
            )));
        }

        if self.access.allowed_tiers.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ALLOWED_TIERS must name at least one tier"
            )));
        }

        if !self.gate.safe_redirect_path.starts_with('/') {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SAFE_REDIRECT_PATH must be an absolute same-origin path"
            )));
        }

        if self.environment == Environment::Prod && self.allowed_origins.iter().any(|o| o == "*") {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        if self.environment == Environment::Prod && !self.smtp.enabled {
            tracing::warn!(
                "SMTP disabled in production; enquiries and admin alerts will only be logged"
            );
        }

        Ok(())
    }

    pub fn is_prod(&self) -> bool {
        self.environment == Environment::Prod
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
    })
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
