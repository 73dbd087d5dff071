use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::delivery::SmtpSettings;
use crate::form::catalog::DEFAULT_ADMIRED_LIFE_SLOTS;
use crate::llm_client::{LlmSettings, DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

const MIN_ADMIRED_LIFE_SLOTS: usize = 3;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 3600;
const MAX_ADMIRED_LIFE_SLOTS: usize = 4;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub pdf_renderer_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_sender: String,
    pub admired_life_slots: usize,
    pub external_call_timeout: Duration,
    pub session_idle_ttl: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let smtp_username = require_env("SMTP_USERNAME")?;

        let admired_life_slots = parse_env("ADMIRED_LIFE_SLOTS", DEFAULT_ADMIRED_LIFE_SLOTS)?;
        if !(MIN_ADMIRED_LIFE_SLOTS..=MAX_ADMIRED_LIFE_SLOTS).contains(&admired_life_slots) {
            bail!(
                "ADMIRED_LIFE_SLOTS must be between {MIN_ADMIRED_LIFE_SLOTS} and {MAX_ADMIRED_LIFE_SLOTS}"
            );
        }

        let timeout_secs: u64 = parse_env("EXTERNAL_CALL_TIMEOUT_SECS", 120)?;
        if timeout_secs == 0 {
            bail!("EXTERNAL_CALL_TIMEOUT_SECS must be greater than zero");
        }

        let idle_ttl_secs: u64 = parse_env("SESSION_IDLE_TTL_SECS", DEFAULT_SESSION_IDLE_TTL_SECS)?;
        if idle_ttl_secs == 0 {
            bail!("SESSION_IDLE_TTL_SECS must be greater than zero");
        }

        Ok(Config {
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_api_url: optional_env("LLM_API_URL", DEFAULT_API_URL),
            llm_model: optional_env("LLM_MODEL", DEFAULT_MODEL),
            llm_temperature: parse_env("LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            pdf_renderer_url: require_env("PDF_RENDERER_URL")?,
            smtp_host: require_env("SMTP_HOST")?,
            smtp_port: parse_env("SMTP_PORT", 465)?,
            smtp_sender: optional_env("SMTP_SENDER", &smtp_username),
            smtp_username,
            smtp_password: require_env("SMTP_PASSWORD")?,
            admired_life_slots,
            external_call_timeout: Duration::from_secs(timeout_secs),
            session_idle_ttl: Duration::from_secs(idle_ttl_secs),
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_key: self.llm_api_key.clone(),
            api_url: self.llm_api_url.clone(),
            model: self.llm_model.clone(),
            temperature: self.llm_temperature,
            request_timeout: self.external_call_timeout,
        }
    }

    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            sender: self.smtp_sender.clone(),
            timeout: smtp_io_timeout(self.external_call_timeout),
        }
    }
}

/// Per-operation SMTP socket timeout. Kept well under the pipeline deadline, which
/// cannot cancel a send already running on the blocking pool.
fn smtp_io_timeout(call_timeout: Duration) -> Duration {
    (call_timeout / 4).max(Duration::from_secs(1))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
