use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_JWT_EXPIRES_IN: &str = "24h";
const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_AI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_AI_TIMEOUT_MS: u64 = 60_000;

/// Everything this service reads from the environment, parsed once at
/// startup. Components take the parsed struct; none of them reach for
/// `std::env` on their own.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Some(dir) enables the rolling file appender.
    pub log_dir: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_expires_in: String,
    /// Universal premium unlock code, already normalized to uppercase.
    pub premium_master_code: Option<String>,
    pub skip_schema_bootstrap: bool,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_api_endpoint: String,
    pub ai_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_string("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let host = env_string("HOST")
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let log_dir = parse_flag(env_string("ENABLE_FILE_LOGS").as_deref())
            .then(|| env_string("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()));

        let ai_timeout_ms = env_string("AI_TIMEOUT")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_AI_TIMEOUT_MS);

        Self {
            host,
            port,
            log_level: env_string("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_dir,
            jwt_secret: env_string("JWT_SECRET"),
            jwt_expires_in: env_string("JWT_EXPIRES_IN")
                .unwrap_or_else(|| DEFAULT_JWT_EXPIRES_IN.to_string()),
            premium_master_code: env_string("PREMIUM_MASTER_CODE").map(|v| v.to_uppercase()),
            skip_schema_bootstrap: parse_flag(env_string("SKIP_SCHEMA_BOOTSTRAP").as_deref()),
            ai_api_key: env_string("AI_API_KEY"),
            ai_model: env_string("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            ai_api_endpoint: env_string("AI_API_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_AI_ENDPOINT.to_string()),
            ai_timeout: Duration::from_millis(ai_timeout_ms),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1"))
}

#[cfg(test)]
impl Config {
    /// A fully-populated config for unit tests; no environment involved.
    pub(crate) fn test_default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            log_dir: None,
            jwt_secret: Some("test-secret".to_string()),
            jwt_expires_in: DEFAULT_JWT_EXPIRES_IN.to_string(),
            premium_master_code: Some("C7YP81".to_string()),
            skip_schema_bootstrap: false,
            ai_api_key: None,
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_api_endpoint: DEFAULT_AI_ENDPOINT.to_string(),
            ai_timeout: Duration::from_millis(DEFAULT_AI_TIMEOUT_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_accepts_true_and_one_only() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("yes")));
        assert!(!parse_flag(Some("0")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_bind_addr_combines_host_and_port() {
        let mut config = Config::test_default();
        config.port = 8080;
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
    }
}
