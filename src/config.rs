use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-002";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,https://savour-sagee.vercel.app";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 6001;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Settings for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

/// Process configuration, built once at startup and handed to the router.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub bind_addr: SocketAddr,
    pub allowed_origins: Vec<HeaderValue>,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load from `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset and empty values are the same.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("GOOGLE_API_KEY")
            .context("GOOGLE_API_KEY must be set (Google API Key is required)")?;

        let model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = get("GEMINI_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = match get("GEMINI_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("GEMINI_TIMEOUT_SECS is not a number: {}", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {}", raw))?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{}:{}", host.trim(), port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

        let origins_raw =
            get("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());
        let allowed_origins = parse_origins(&origins_raw)?;

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_BYTES is not a number: {}", raw))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            gemini: GeminiConfig {
                api_key,
                model,
                api_base,
                timeout: Duration::from_secs(timeout_secs),
            },
            bind_addr,
            allowed_origins,
            max_upload_bytes,
        })
    }
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>> {
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<Result<Vec<_>>>()?;

    if origins.is_empty() {
        anyhow::bail!("ALLOWED_ORIGINS must list at least one origin");
    }

    Ok(origins)
}
