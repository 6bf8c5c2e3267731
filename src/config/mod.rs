use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PROXY_URL is not set")]
    MissingProxyUrl,

    #[error("PROXY_URL is not a valid URL: {0}")]
    InvalidProxyUrl(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub proxy: ProxyConfig,
    pub retry: RetryConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Downstream SCIM endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Base URL, request paths are appended to it verbatim
    pub url: String,
    /// Hostname sent as the `host` header downstream
    pub host: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Extra attempts after a 429 response
    pub max_retries: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let proxy_url = env::var("PROXY_URL").map_err(|_| ConfigError::MissingProxyUrl)?;

        Ok(Self::new(environment, &proxy_url)?.with_env_overrides())
    }

    /// Tiered defaults for `environment`, pointed at `proxy_url`
    pub fn new(environment: Environment, proxy_url: &str) -> Result<Self, ConfigError> {
        let proxy = ProxyConfig::parse(proxy_url)?;

        // Set defaults based on environment, specific env vars are applied by from_env
        Ok(match environment {
            Environment::Production => Self::production(proxy),
            Environment::Staging => Self::staging(proxy),
            Environment::Development => Self::development(proxy),
        })
    }

    fn with_env_overrides(mut self) -> Self {
        // Listener overrides
        if let Some(port) = env::var("SCIM_BRIDGE_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Downstream overrides
        if let Ok(v) = env::var("REQUEST_TIMEOUT_SECS") {
            self.proxy.request_timeout_secs = v.parse().unwrap_or(self.proxy.request_timeout_secs);
        }
        if let Ok(v) = env::var("RETRY_MAX_RETRIES") {
            self.retry.max_retries = v.parse().unwrap_or(self.retry.max_retries);
        }
        if let Ok(v) = env::var("RETRY_DELAY_MS") {
            self.retry.delay_ms = v.parse().unwrap_or(self.retry.delay_ms);
        }

        self
    }

    fn development(proxy: ProxyConfig) -> Self {
        Self {
            environment: Environment::Development,
            proxy: ProxyConfig {
                request_timeout_secs: 60,
                ..proxy
            },
            retry: RetryConfig {
                max_retries: 3,
                delay_ms: 1000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
        }
    }

    fn staging(proxy: ProxyConfig) -> Self {
        Self {
            environment: Environment::Staging,
            proxy: ProxyConfig {
                request_timeout_secs: 30,
                ..proxy
            },
            retry: RetryConfig {
                max_retries: 3,
                delay_ms: 1000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
        }
    }

    fn production(proxy: ProxyConfig) -> Self {
        Self {
            environment: Environment::Production,
            proxy: ProxyConfig {
                request_timeout_secs: 30,
                ..proxy
            },
            retry: RetryConfig {
                max_retries: 3,
                delay_ms: 1000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
        }
    }
}

impl ProxyConfig {
    fn parse(proxy_url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(proxy_url).map_err(|e| ConfigError::InvalidProxyUrl(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ConfigError::InvalidProxyUrl(format!("{} has no host", proxy_url)))?
            .to_string();

        Ok(Self {
            url: proxy_url.trim_end_matches('/').to_string(),
            host,
            request_timeout_secs: 30,
        })
    }
}
