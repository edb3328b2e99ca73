//! Logging setup shared by bank-link binaries.

use observability::LogConfig;
use tracing::Level;

/// Install logging under the `bank-link` service name.
pub fn init_logging(level: &str, also_stderr: bool) {
    init_logging_for_service("bank-link", level, also_stderr);
}

/// Install logging for a named service writing to the central JSONL file.
///
/// `level` is normalized through [`parse_level`]; `RUST_LOG` still wins.
pub fn init_logging_for_service(service_name: &str, level: &str, also_stderr: bool) {
    let level = parse_level(level).unwrap_or(Level::INFO);
    observability::init_with_config(LogConfig {
        service_name: service_name.to_string(),
        default_level: level.as_str().to_ascii_lowercase(),
        log_path: None,
        also_stderr,
    });
}

/// Parse a level name, accepting `warning` as an alias for `warn`.
pub fn parse_level(level: &str) -> Option<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Some(Level::WARN),
        other => other.parse().ok(),
    }
}
