use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Secret used to sign session tokens
    pub app_secret_key: String,

    /// PostgreSQL connection URL; the in-memory store is used when unset
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    /// TMDB API key
    pub api_key: String,

    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    #[serde(default = "default_metadata_timeout_secs")]
    pub metadata_timeout_secs: u64,

    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,

    /// Mark cookies `Secure`; enable behind TLS
    #[serde(default)]
    pub secure_cookies: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_max_connections() -> u32 {
    5
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_metadata_timeout_secs() -> u64 {
    10
}

fn default_session_ttl_secs() -> i64 {
    24 * 60 * 60
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from the environment, reading `.env` first if present
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.app_secret_key.trim().is_empty() {
            anyhow::bail!("APP_SECRET_KEY must not be empty");
        }
        if self.api_key.trim().is_empty() {
            anyhow::bail!("API_KEY must not be empty");
        }
        if self.session_ttl_secs <= 0 {
            anyhow::bail!("SESSION_TTL_SECS must be positive");
        }
        Ok(())
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_apply_when_only_required_vars_set() {
        let config =
            Config::from_vars(vars(&[("APP_SECRET_KEY", "secret"), ("API_KEY", "tmdb")])).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.tmdb_api_url, "https://api.themoviedb.org/3");
        assert_eq!(config.metadata_timeout(), Duration::from_secs(10));
        assert_eq!(config.session_ttl_secs, 86400);
        assert!(!config.secure_cookies);
        assert_eq!(config.bind_address(), ("127.0.0.1".to_string(), 8080));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = Config::from_vars(vars(&[
            ("APP_SECRET_KEY", "secret"),
            ("API_KEY", "tmdb"),
            ("DATABASE_URL", "postgres://localhost/cinelist"),
            ("PORT", "9000"),
            ("SECURE_COOKIES", "true"),
            ("METADATA_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/cinelist")
        );
        assert_eq!(config.port, 9000);
        assert!(config.secure_cookies);
        assert_eq!(config.metadata_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_missing_or_blank_secret_is_rejected() {
        assert!(Config::from_vars(vars(&[("API_KEY", "tmdb")])).is_err());
        assert!(Config::from_vars(vars(&[("APP_SECRET_KEY", " "), ("API_KEY", "tmdb")])).is_err());
    }
}
