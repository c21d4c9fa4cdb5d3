use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;

use crate::services::MAX_TOKEN_EXPIRY_MINUTES;
use std::env;
use std::str::FromStr;

const MIN_PROD_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct BookhubConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerMode,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, PartialEq)]
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

/// Token signing settings. The secret is read once at startup.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub token_expiry_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub allow_admin_signup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwaggerMode {
    Public,
    Disabled,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub signin_attempts: u32,
    pub signin_window_seconds: u64,
    pub signup_attempts: u32,
    pub signup_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
    /// Key limits on `X-Forwarded-For` instead of the peer address. Only for
    /// deployments behind a proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl BookhubConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: Environment = lookup("ENVIRONMENT")
            .unwrap_or_else(|| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let get_env = |key: &str, default: Option<&str>| resolve(&lookup, key, default, is_prod);

        let config = BookhubConfig {
            common,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("bookhub-service"))?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: get_env("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None)?,
                max_connections: parse("DATABASE_MAX_CONNECTIONS", get_env(
                    "DATABASE_MAX_CONNECTIONS",
                    Some("10"),
                )?)?,
                min_connections: parse("DATABASE_MIN_CONNECTIONS", get_env(
                    "DATABASE_MIN_CONNECTIONS",
                    Some("1"),
                )?)?,
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", None)?),
                token_expiry_minutes: parse(
                    "JWT_EXPIRY_MINUTES",
                    get_env("JWT_EXPIRY_MINUTES", Some("60"))?,
                )?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"))?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_admin_signup: parse(
                    "ALLOW_ADMIN_SIGNUP",
                    get_env("ALLOW_ADMIN_SIGNUP", Some("false"))?,
                )?,
            },
            swagger: get_env("ENABLE_SWAGGER", Some("public"))?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            rate_limit: RateLimitConfig {
                signin_attempts: parse(
                    "RATE_LIMIT_SIGNIN_ATTEMPTS",
                    get_env("RATE_LIMIT_SIGNIN_ATTEMPTS", Some("5"))?,
                )?,
                signin_window_seconds: parse(
                    "RATE_LIMIT_SIGNIN_WINDOW_SECONDS",
                    get_env("RATE_LIMIT_SIGNIN_WINDOW_SECONDS", Some("900"))?,
                )?,
                signup_attempts: parse(
                    "RATE_LIMIT_SIGNUP_ATTEMPTS",
                    get_env("RATE_LIMIT_SIGNUP_ATTEMPTS", Some("3"))?,
                )?,
                signup_window_seconds: parse(
                    "RATE_LIMIT_SIGNUP_WINDOW_SECONDS",
                    get_env("RATE_LIMIT_SIGNUP_WINDOW_SECONDS", Some("3600"))?,
                )?,
                global_ip_limit: parse(
                    "RATE_LIMIT_GLOBAL_IP_LIMIT",
                    get_env("RATE_LIMIT_GLOBAL_IP_LIMIT", Some("100"))?,
                )?,
                global_ip_window_seconds: parse(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    get_env("RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS", Some("60"))?,
                )?,
                trust_forwarded_for: parse(
                    "RATE_LIMIT_TRUST_FORWARDED_FOR",
                    get_env("RATE_LIMIT_TRUST_FORWARDED_FOR", Some("false"))?,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(config_error("PORT must be greater than 0"));
        }

        if self.jwt.token_expiry_minutes <= 0 {
            return Err(config_error("JWT_EXPIRY_MINUTES must be positive"));
        }
        if self.jwt.token_expiry_minutes > MAX_TOKEN_EXPIRY_MINUTES {
            return Err(config_error(format!(
                "JWT_EXPIRY_MINUTES must not exceed {} (30 days)",
                MAX_TOKEN_EXPIRY_MINUTES
            )));
        }

        if self.jwt.secret.expose_secret().is_empty() {
            return Err(config_error("JWT_SECRET must not be empty"));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(config_error(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS",
            ));
        }

        let limits = &self.rate_limit;
        if limits.signin_attempts == 0 || limits.signup_attempts == 0 || limits.global_ip_limit == 0
        {
            return Err(config_error("Rate limit attempts must be greater than 0"));
        }
        if limits.signin_window_seconds == 0
            || limits.signup_window_seconds == 0
            || limits.global_ip_window_seconds == 0
        {
            return Err(config_error("Rate limit windows must be greater than 0"));
        }

        if self.environment == Environment::Prod {
            if self.jwt.secret.expose_secret().len() < MIN_PROD_SECRET_BYTES {
                return Err(config_error(format!(
                    "JWT_SECRET must be at least {} bytes in production",
                    MIN_PROD_SECRET_BYTES
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(config_error("Wildcard CORS origin not allowed in production"));
            }

            if self.security.allow_admin_signup {
                tracing::warn!("Admin self-registration is enabled in production");
            }

            if self.swagger == SwaggerMode::Public {
                tracing::warn!("Swagger UI is publicly accessible in production");
            }
        }

        Ok(())
    }
}

fn config_error(msg: impl std::fmt::Display) -> AppError {
    AppError::ConfigError(anyhow::anyhow!("{}", msg))
}

/// In production every variable must be set explicitly; elsewhere the
/// default applies when one exists.
fn resolve<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None if is_prod => Err(config_error(format!(
            "{} is required in production but not set",
            key
        ))),
        None => default
            .map(str::to_string)
            .ok_or_else(|| config_error(format!("{} is required but not set", key))),
    }
}

fn parse<T>(key: &str, raw: String) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| config_error(format!("{} has an invalid value '{}': {}", key, raw, e)))
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl FromStr for SwaggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SwaggerMode::Public),
            "disabled" => Ok(SwaggerMode::Disabled),
            _ => Err(format!("Invalid swagger mode: {}", s)),
        }
    }
}
