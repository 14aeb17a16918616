pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod observability;
pub mod server;

pub use cache::{CacheSettings, CacheStats, CachedSnapshot, UserCacheStore};
pub use config::{AppConfig, AuthConfig, CacheConfig, ServerConfig, UpstreamConfig};
pub use error::{ApiError, StartupError};
pub use middleware::UserIdentity;
pub use observability::init_tracing;
pub use server::{AppState, PodcacheServer, ServerBuilder, build_app};
