//! Central JSONL logging for the bank-link workspace.
//!
//! Library crates only emit `tracing` events. A binary installs the
//! subscriber once via [`init_with_config`]; events then land as one JSON
//! object per line in `~/.bank-link/logs/dev.jsonl` (or a configured path),
//! with credential-looking fields replaced by [`REDACTED`].
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "cli".into(),
//!     default_level: "debug".into(),
//!     ..Default::default()
//! });
//! ```

mod json_layer;
mod redact;
mod writer;

use std::io;
use std::path::PathBuf;

use json_layer::JsonLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use writer::CentralLogWriter;

pub use json_layer::LogEntry;
pub use redact::{is_sensitive_key, sanitize_value, REDACTED};

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written as `service` on every line.
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_level: String,
    /// Overrides [`default_log_path`].
    pub log_path: Option<PathBuf>,
    /// Mirror events to stderr in compact form.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "bank-link".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// `~/.bank-link/logs/dev.jsonl`, or under the temp dir without a home.
pub fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".bank-link")
        .join("logs")
        .join("dev.jsonl")
}

/// Install the global subscriber.
///
/// If the central log file cannot be opened, logging falls back to stderr
/// only. Calling this more than once is a no-op after the first success.
pub fn init_with_config(config: LogConfig) {
    let log_path = config.log_path.clone().unwrap_or_else(default_log_path);

    let env_filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let (json_layer, open_error) = match CentralLogWriter::new(&log_path) {
        Ok(writer) => {
            let layer = JsonLayer::new(config.service_name.clone(), writer);
            (Some(layer.with_filter(env_filter())), None)
        }
        Err(e) => (None, Some(e)),
    };

    // Stderr is forced on when the file sink is unavailable.
    let stderr_layer = if config.also_stderr || open_error.is_some() {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(io::stderr)
                .with_ansi(true)
                .with_filter(env_filter()),
        )
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    match open_error {
        None => tracing::info!(
            service = %config.service_name,
            log_path = %log_path.display(),
            "observability initialized"
        ),
        Some(e) => tracing::warn!(
            log_path = %log_path.display(),
            error = %e,
            "central log file unavailable, logging to stderr only"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "bank-link");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }

    #[test]
    fn test_default_log_path_is_under_bank_link_dir() {
        let path = default_log_path();
        assert!(path.ends_with(".bank-link/logs/dev.jsonl"));
    }
}
