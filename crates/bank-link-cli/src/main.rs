//! Bank Link CLI - link a bank account from the terminal.

mod browser;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use link_config_and_utils::{init_logging_for_service, Config, Paths};

/// Bank Link CLI - Link a bank account through the hosted authentication flow.
#[derive(Parser)]
#[command(name = "bank-link")]
#[command(about = "Link a bank account through the hosted authentication flow")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Link a bank account
    Link {
        /// Client secret of the linking session
        #[arg(long, env = "BANK_LINK_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,

        /// Return target handed to the backend (must be a loopback http URL)
        #[arg(long)]
        return_url: Option<String>,

        /// Backend API base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Seconds to wait for the browser flow
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write the effective configuration to the config file
    Init,
}

/// Level from the config file and env, or the defaults if the file is unusable.
fn configured_log_level(paths: Option<&Paths>) -> String {
    paths
        .and_then(|paths| Config::load(paths).ok())
        .unwrap_or_else(Config::new)
        .log_level
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| configured_log_level(Paths::new().ok().as_ref()));
    init_logging_for_service("cli", &log_level, false);

    let result = match cli.command {
        Commands::Link {
            client_secret,
            return_url,
            api_url,
            timeout_secs,
        } => {
            commands::link(
                commands::LinkArgs {
                    client_secret,
                    return_url,
                    api_url,
                    timeout_secs,
                },
                &cli.format,
            )
            .await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_show(&cli.format),
            ConfigCommands::Init => commands::config_init(&cli.format),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
