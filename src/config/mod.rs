use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub route_cache_ttl_secs: u64,
    pub route_cache_capacity: Option<usize>,
    pub route_timeout_ms: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            api_base_uri: "/api/v1".to_string(),
            route_cache_ttl_secs: 300,
            route_cache_capacity: None,
            route_timeout_ms: 5000,
            rate_limit_window_secs: 60,
            rate_limit_requests: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let defaults = Config::default();
        Ok(Config {
            database_url: optional_var("DATABASE_URL")?,
            redis_url: optional_var("REDIS_URL")?,
            server_host: optional_var("SERVER_HOST")?.unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT")?.unwrap_or(defaults.server_port),
            api_base_uri: optional_var("API_BASE_URI")?.unwrap_or(defaults.api_base_uri),
            route_cache_ttl_secs: positive_or(
                "ROUTE_CACHE_TTL",
                parse_var("ROUTE_CACHE_TTL")?,
                defaults.route_cache_ttl_secs,
            ),
            route_cache_capacity: parse_var("ROUTE_CACHE_CAPACITY")?,
            route_timeout_ms: parse_var("ROUTE_TIMEOUT_MS")?.unwrap_or(defaults.route_timeout_ms),
            rate_limit_window_secs: parse_var("RATE_LIMIT_WINDOW")?
                .unwrap_or(defaults.rate_limit_window_secs),
            rate_limit_requests: parse_var("RATE_LIMIT_REQUESTS")?
                .unwrap_or(defaults.rate_limit_requests),
        })
    }

    pub fn route_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.route_cache_ttl_secs)
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_millis(self.route_timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

// 未设置或为空时返回 None，非 UTF-8 的值视为错误
fn optional_var(key: &str) -> Result<Option<String>, env::VarError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e),
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, env::VarError> {
    Ok(optional_var(key)?.and_then(|value| match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring unparsable value for {}: {}", key, value);
            None
        }
    }))
}

// 0 秒的缓存过期时间没有意义，回退到默认值
fn positive_or(key: &str, value: Option<u64>, default: u64) -> u64 {
    match value {
        Some(0) => {
            tracing::warn!("{} must be positive, using default {}", key, default);
            default
        }
        Some(value) => value,
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.route_cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.route_timeout(), Duration::from_secs(5));
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.rate_limit_requests, 10);
        assert_eq!(config.api_base_uri, "/api/v1");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn zero_cache_ttl_falls_back_to_default() {
        assert_eq!(positive_or("ROUTE_CACHE_TTL", Some(0), 300), 300);
        assert_eq!(positive_or("ROUTE_CACHE_TTL", Some(30), 300), 30);
        assert_eq!(positive_or("ROUTE_CACHE_TTL", None, 300), 300);
    }
}
