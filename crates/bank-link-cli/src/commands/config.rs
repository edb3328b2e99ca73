//! Configuration commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use link_config_and_utils::{Config, Paths};

/// Show the effective configuration.
pub fn config_show(format: &OutputFormat) -> Result<()> {
    let paths = Paths::new()?;
    let config = Config::load(&paths)?;

    match format {
        OutputFormat::Json => output::print_json(&config),
        OutputFormat::Text => {
            output::print_heading("Configuration");
            output::print_row("Config file", &paths.config_file().display().to_string());
            output::print_row("Log file", &paths.log_file().display().to_string());
            output::print_row("API URL", &config.api_url);
            output::print_row("Publishable key", &config.publishable_key);
            output::print_row("Return URL", &config.return_url);
            output::print_row("Auth timeout", &format!("{}s", config.auth_timeout_secs));
            output::print_row("Log level", &config.log_level);
        }
    }
    Ok(())
}

/// Write the effective configuration to the config file.
pub fn config_init(format: &OutputFormat) -> Result<()> {
    let paths = Paths::new()?;
    let config_path = paths.config_file();

    if config_path.exists() {
        output::print_success(
            &format!("Config already exists at {}", config_path.display()),
            format,
        );
        return Ok(());
    }

    let config = Config::load(&paths)?;
    config.save(&paths)?;
    output::print_success(&format!("Wrote {}", config_path.display()), format);
    Ok(())
}
