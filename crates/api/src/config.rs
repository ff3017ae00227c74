//! Process configuration, read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use menuhub_catalog::PricingRules;
use menuhub_catalog::pricing::DEFAULT_VARIANT_CATEGORIES;
use menuhub_infra::SmtpSettings;
use menuhub_observability::LogFormat;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} is required when {because} is set")]
    Missing {
        var: &'static str,
        because: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub jwt_secret: String,
    pub token_ttl: Option<Duration>,
    pub database_url: Option<String>,
    pub media_root: PathBuf,
    pub media_url: String,
    pub smtp: Option<SmtpSettings>,
    pub variant_categories: Vec<String>,
    pub bootstrap_admin: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = parse_var("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR, |raw| {
            raw.parse::<SocketAddr>().map_err(|e| e.to_string())
        })?;

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|e| ConfigError::Invalid {
                var: "LOG_FORMAT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => LogFormat::default(),
        };

        let token_ttl = match get("TOKEN_TTL_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                Ok(_) => return Err(invalid("TOKEN_TTL_SECS", &raw, "must be greater than 0")),
                Err(e) => return Err(invalid("TOKEN_TTL_SECS", &raw, e.to_string())),
            },
            None => None,
        };

        let smtp = match get("SMTP_HOST") {
            Some(host) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw
                        .parse::<u16>()
                        .map_err(|e| invalid("SMTP_PORT", &raw, e.to_string()))?,
                    None => DEFAULT_SMTP_PORT,
                };
                let from_address = get("SMTP_FROM").or_else(|| get("SMTP_USERNAME")).ok_or(
                    ConfigError::Missing {
                        var: "SMTP_FROM",
                        because: "SMTP_HOST",
                    },
                )?;
                Some(SmtpSettings {
                    host,
                    port,
                    username: get("SMTP_USERNAME"),
                    password: get("SMTP_PASSWORD"),
                    from_address,
                })
            }
            None => None,
        };

        let variant_categories = match get("VARIANT_PRICING_CATEGORIES") {
            Some(raw) => parse_list(&raw),
            None => DEFAULT_VARIANT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        };

        let bootstrap_admin = match get("BOOTSTRAP_ADMIN") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| invalid("BOOTSTRAP_ADMIN", &raw, "expected a boolean"))?,
            None => true,
        };

        Ok(Self {
            bind_addr,
            log_format,
            jwt_secret: get("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            token_ttl,
            database_url: get("DATABASE_URL"),
            media_root: get("MEDIA_ROOT").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("media")),
            media_url: get("MEDIA_URL").unwrap_or_else(|| "/media/".to_string()),
            smtp,
            variant_categories,
            bootstrap_admin,
        })
    }

    pub fn pricing_rules(&self) -> PricingRules {
        PricingRules::with_variant_categories(&self.variant_categories)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_var<T>(
    var: &'static str,
    raw: Option<String>,
    default: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    let raw = raw.unwrap_or_else(|| default.to_string());
    parse(&raw).map_err(|reason| invalid(var, &raw, reason))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
