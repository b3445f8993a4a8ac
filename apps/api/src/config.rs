use anyhow::{Context, Result};

const DEFAULT_PORT: &str = "8000";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_port(std::env::var("PORT").ok().as_deref())?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_port(raw: Option<&str>) -> Result<u16> {
    raw.unwrap_or(DEFAULT_PORT)
        .parse::<u16>()
        .context("PORT must be a valid port number")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_defaults_to_8000() {
        assert_eq!(parse_port(None).unwrap(), 8000);
    }

    #[test]
    fn test_port_parses_override() {
        assert_eq!(parse_port(Some("9090")).unwrap(), 9090);
    }

    #[test]
    fn test_port_rejects_garbage() {
        assert!(parse_port(Some("not-a-port")).is_err());
        assert!(parse_port(Some("70000")).is_err());
    }

    #[test]
    fn test_require_env_reports_missing_key() {
        let err = require_env("SKILLBRIDGE_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(err.to_string().contains("SKILLBRIDGE_TEST_DEFINITELY_UNSET"));
    }
}
