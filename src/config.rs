use crate::error::{PortalError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Settings for the text-completion API, loaded from the environment.
///
/// | Variable             | Default                     |
/// |----------------------|-----------------------------|
/// | `ANTHROPIC_API_KEY`  | unset (comparator uses text matching only) |
/// | `ANTHROPIC_BASE_URL` | `https://api.anthropic.com` |
/// | `ANTHROPIC_MODEL`    | `claude-sonnet-4-5`         |
/// | `BROKERDESK_LOG`     | `warn`                      |
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let base_url = optional_env("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(PortalError::ValidationError(format!(
                "ANTHROPIC_BASE_URL must be an http(s) URL, got '{base_url}'"
            )));
        }

        Ok(Config {
            api_key: optional_env("ANTHROPIC_API_KEY"),
            base_url,
            model: optional_env("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            log_filter: optional_env("BROKERDESK_LOG")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
