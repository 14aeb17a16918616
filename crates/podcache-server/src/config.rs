use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Caller identity extraction
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.request_timeout_ms == Some(0) {
            return Err("server.request_timeout_ms must be > 0 when set".into());
        }
        // Cache validations
        if self.cache.ttl_secs == 0 {
            return Err("cache.ttl_secs must be > 0".into());
        }
        // Upstream validations
        if self.upstream.timeout_ms == Some(0) {
            return Err("upstream.timeout_ms must be > 0 when set".into());
        }
        // A request deadline must leave room for the refresh to finish and
        // publish, otherwise the entry is never updated.
        if let Some(request_ms) = self.server.request_timeout_ms {
            match self.upstream.timeout_ms {
                Some(upstream_ms) if upstream_ms < request_ms => {}
                Some(_) => {
                    return Err(
                        "server.request_timeout_ms must be greater than upstream.timeout_ms".into(),
                    );
                }
                None => {
                    return Err(
                        "server.request_timeout_ms requires upstream.timeout_ms to be set".into(),
                    );
                }
            }
        }
        // Auth validation
        if self.auth.user_header.trim().is_empty() {
            return Err("auth.user_header must not be empty".into());
        }
        if HeaderName::from_bytes(self.auth.user_header.as_bytes()).is_err() {
            return Err(format!(
                "auth.user_header '{}' is not a valid header name",
                self.auth.user_header
            ));
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.server.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole request, including a blocking upstream refresh.
    /// Unset by default; must exceed `upstream.timeout_ms` when set.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: None,
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Per-user cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a snapshot stays fresh after it was fetched
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Let concurrent readers of the same stale user wait for one refresh
    /// instead of each calling upstream.
    /// Default: false
    #[serde(default)]
    pub coalesce_refreshes: bool,
}

fn default_cache_ttl_secs() -> u64 {
    60
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            coalesce_refreshes: false,
        }
    }
}

/// Upstream (Kubernetes API) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamConfig {
    /// Explicit kubeconfig path. If unset, in-cluster configuration is tried
    /// first and then the local kubeconfig.
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// Deadline for one pod listing in milliseconds. Unset means no deadline.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the opaque caller identity
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

fn default_user_header() -> String {
    "X-User-ID".into()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: default_user_header(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "podcache.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., PODCACHE__CACHE__TTL_SECS=30
        builder = builder.add_source(
            Environment::with_prefix("PODCACHE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.cache.ttl(), Duration::from_secs(60));
        assert!(!cfg.cache.coalesce_refreshes);
        assert_eq!(cfg.upstream.timeout(), None);
        assert_eq!(cfg.request_timeout(), None);
        assert_eq!(cfg.auth.user_header, "X-User-ID");
        assert_eq!(cfg.addr().port(), 8080);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.cache.ttl_secs = 0;
        assert!(cfg.validate().unwrap_err().contains("ttl_secs"));
    }

    #[test]
    fn zero_upstream_timeout_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.upstream.timeout_ms = Some(0);
        assert!(cfg.validate().unwrap_err().contains("timeout_ms"));
    }

    #[test]
    fn request_timeout_must_outlast_upstream_timeout() {
        let mut cfg = AppConfig::default();
        cfg.server.request_timeout_ms = Some(1_000);
        assert!(cfg.validate().unwrap_err().contains("requires upstream.timeout_ms"));

        cfg.upstream.timeout_ms = Some(1_000);
        assert!(cfg.validate().unwrap_err().contains("greater than"));

        cfg.upstream.timeout_ms = Some(500);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(1)));

        cfg.server.request_timeout_ms = Some(0);
        assert!(cfg.validate().unwrap_err().contains("request_timeout_ms"));
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.auth.user_header = "x user id".into();
        assert!(cfg.validate().unwrap_err().contains("not a valid header name"));

        cfg.auth.user_header = "  ".into();
        assert!(cfg.validate().unwrap_err().contains("must not be empty"));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unparsable_host_falls_back_to_any() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not-an-ip".into();
        assert!(cfg.addr().ip().is_unspecified());
    }
}
