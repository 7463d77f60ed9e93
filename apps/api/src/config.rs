use anyhow::{Context, Result};

use crate::report::email::EmailConfig;

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Application configuration loaded from environment variables.
/// Only numeric values are validated at startup; email credentials are optional
/// and checked when a send is attempted.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub default_threshold: f32,
    pub default_top_n: usize,
    pub max_upload_bytes: usize,
    pub embedding_model: String,
    pub email: EmailConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_threshold = parse_or(&lookup, "DEFAULT_THRESHOLD", 0.5_f32)?;
        if !(0.0..=1.0).contains(&default_threshold) {
            anyhow::bail!("DEFAULT_THRESHOLD must be within [0, 1], got {default_threshold}");
        }

        let default_top_n = parse_or(&lookup, "DEFAULT_TOP_N", 5_usize)?;
        if default_top_n == 0 {
            anyhow::bail!("DEFAULT_TOP_N must be at least 1");
        }

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080_u16)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            default_threshold,
            default_top_n,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 25 * 1024 * 1024_usize)?,
            embedding_model: lookup("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            email: EmailConfig {
                smtp_host: lookup("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                sender: non_empty(lookup("EMAIL_SENDER")),
                password: non_empty(lookup("EMAIL_PASSWORD")),
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
