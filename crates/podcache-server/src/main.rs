use std::fmt;
use std::process::ExitCode;

use podcache_server::config::loader::{DEFAULT_CONFIG_FILE, load_config};
use podcache_server::{ServerBuilder, metrics, observability};

const CONFIG_ENV: &str = "PODCACHE_CONFIG";

/// Config errors and cluster client failures.
const EXIT_STARTUP: u8 = 2;
const EXIT_RUNTIME: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    observability::init_tracing();

    let location = ConfigLocation::resolve(std::env::args().skip(1), std::env::var(CONFIG_ENV).ok());
    let cfg = match load_config(Some(location.path())) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("podcache: bad configuration in {location}: {e}");
            return ExitCode::from(EXIT_STARTUP);
        }
    };
    tracing::info!(config = %location, "Configuration loaded");

    observability::apply_logging_level(&cfg.logging);
    if cfg.metrics.enabled {
        metrics::init_metrics();
    }

    let server = match ServerBuilder::new().with_config(cfg).build().await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("podcache: startup failed: {e}");
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server stopped with error");
            ExitCode::from(EXIT_RUNTIME)
        }
    }
}

/// `.env` is optional; a file that exists but does not parse is reported
/// and skipped.
fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("podcache: ignoring .env: {e}");
        }
    }
}

/// Where the config file path came from: `--config`, then `PODCACHE_CONFIG`,
/// then `podcache.toml` in the working directory.
#[derive(Debug, PartialEq, Eq)]
enum ConfigLocation {
    Flag(String),
    Env(String),
    Default,
}

impl ConfigLocation {
    fn resolve(mut args: impl Iterator<Item = String>, env_path: Option<String>) -> Self {
        while let Some(arg) = args.next() {
            if let Some(path) = arg.strip_prefix("--config=") {
                return Self::Flag(path.to_string());
            }
            if arg == "--config" {
                if let Some(path) = args.next() {
                    return Self::Flag(path);
                }
            }
        }
        match env_path {
            Some(path) if !path.is_empty() => Self::Env(path),
            _ => Self::Default,
        }
    }

    fn path(&self) -> &str {
        match self {
            Self::Flag(path) | Self::Env(path) => path,
            Self::Default => DEFAULT_CONFIG_FILE,
        }
    }
}

impl fmt::Display for ConfigLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(path) => write!(f, "{path} (--config)"),
            Self::Env(path) => write!(f, "{path} ({CONFIG_ENV})"),
            Self::Default => write!(f, "{DEFAULT_CONFIG_FILE} (default)"),
        }
    }
}
