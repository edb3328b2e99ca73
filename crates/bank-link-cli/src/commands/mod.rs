//! CLI command implementations.

mod config;
mod link;

pub use config::{config_init, config_show};
pub use link::{link, LinkArgs};
