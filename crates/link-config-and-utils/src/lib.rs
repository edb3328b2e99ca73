//! Configuration, file system paths, and logging setup for bank-link.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_API_URL, DEFAULT_AUTH_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_PUBLISHABLE_KEY, DEFAULT_RETURN_URL, MAX_AUTH_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, parse_level};
pub use paths::Paths;
