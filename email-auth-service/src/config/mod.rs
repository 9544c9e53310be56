use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Shortest signing secret accepted in production.
const MIN_PROD_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub token: TokenConfig,
    pub mail: MailConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// `None` only in dev with `SMTP_ENABLED=false`.
    pub smtp: Option<SmtpConfig>,
    pub dispatch_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl AuthConfig {
    /// Load from the process environment. Any missing required setting is fatal.
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let var = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let smtp_enabled = match var("SMTP_ENABLED", Some("true"))?.as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "SMTP_ENABLED must be 'true' or 'false', got '{}'",
                    other
                )))
            }
        };

        let smtp = if smtp_enabled {
            Some(SmtpConfig {
                host: var("SMTP_HOST", None)?,
                port: parse_number("SMTP_PORT", var("SMTP_PORT", None)?)?,
                user: var("SMTP_USER", None)?,
                password: SecretString::new(var("SMTP_PASS", None)?),
                from: var("SMTP_FROM", None)?,
            })
        } else {
            None
        };

        let config = AuthConfig {
            common,
            environment: environment.clone(),
            service_name: var("SERVICE_NAME", Some("email-auth-service"))?,
            service_version: var("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: var("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|s| !s.is_empty()),
            token: TokenConfig {
                // Required in every environment.
                secret: SecretString::new(get_env_required(&lookup, "AUTH_JWT_SECRET")?),
            },
            mail: MailConfig {
                smtp,
                dispatch_timeout_seconds: parse_number(
                    "MAIL_DISPATCH_TIMEOUT_SECONDS",
                    var("MAIL_DISPATCH_TIMEOUT_SECONDS", Some("10"))?,
                )?,
            },
            security: SecurityConfig {
                allowed_origins: var("ALLOWED_ORIGINS", Some("http://localhost:3000"))?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.mail.dispatch_timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MAIL_DISPATCH_TIMEOUT_SECONDS must be positive"
            )));
        }

        if self.token.secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "AUTH_JWT_SECRET must not be empty"
            )));
        }

        if self.environment == Environment::Prod {
            if self.token.secret.expose_secret().len() < MIN_PROD_SECRET_LEN {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "AUTH_JWT_SECRET must be at least {} bytes in production",
                    MIN_PROD_SECRET_LEN
                )));
            }

            if self.mail.smtp.is_none() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "SMTP cannot be disabled in production"
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        }

        Ok(())
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_env_required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::ConfigError(anyhow::anyhow!("{} is required but not set", key)))
}

fn parse_number<T>(key: &str, raw: String) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} is not a valid number: {}", key, e))
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
