//! The `link` command: run one full bank link attempt.

use crate::browser::SystemBrowser;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use bank_link::{
    AuthSessionManager, ClientSecret, HttpLinkBackend, LinkOrchestrator, LinkResult, LinkedBank,
    LoopbackAuthFlow,
};
use link_config_and_utils::{Config, Paths};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Time allowed for the RPCs around the browser flow.
const RPC_ALLOWANCE: Duration = Duration::from_secs(120);

/// Overrides for a single `link` invocation.
pub struct LinkArgs {
    pub client_secret: String,
    pub return_url: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Serialize)]
struct LinkSummary<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    linked_bank: Option<&'a LinkedBank>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn apply_overrides(mut config: Config, args: &LinkArgs) -> Result<Config> {
    if let Some(return_url) = &args.return_url {
        config.return_url = return_url.clone();
    }
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.auth_timeout_secs = timeout_secs;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Overall bound on one link attempt: the browser flow plus the RPCs around it.
fn link_deadline(config: &Config) -> Duration {
    config.auth_timeout().saturating_add(RPC_ALLOWANCE)
}

/// Link a bank account through the hosted flow.
pub async fn link(args: LinkArgs, format: &OutputFormat) -> Result<()> {
    let paths = Paths::new()?;
    let config = apply_overrides(Config::load(&paths)?, &args)?;
    let return_target: Url = config.return_url()?;

    let backend = Arc::new(HttpLinkBackend::new(
        config.api_url.clone(),
        config.publishable_key.clone(),
    )?);
    let flow = Arc::new(LoopbackAuthFlow::new(config.auth_timeout()));
    let auth_sessions = Arc::new(AuthSessionManager::new(flow));
    let orchestrator = LinkOrchestrator::new(backend, auth_sessions);
    orchestrator.set_state_callback(Box::new(|payload| {
        debug!(state = ?payload.state, "Link state changed");
    }));

    let client_secret = ClientSecret::new(args.client_secret);
    let browser = SystemBrowser::new(*format == OutputFormat::Text);

    info!(api_url = %config.api_url, "Starting bank link");

    let deadline = link_deadline(&config);
    let result = tokio::select! {
        result = tokio::time::timeout(
            deadline,
            orchestrator.link(&client_secret, &return_target, Some(&browser)),
        ) => match result {
            Ok(result) => result,
            Err(_) => anyhow::bail!("Link timed out after {}s", deadline.as_secs()),
        },
        _ = tokio::signal::ctrl_c() => anyhow::bail!("Link interrupted"),
    };

    report(&result, format)
}

fn report(result: &LinkResult, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let summary = match result {
                LinkResult::Completed(bank) => LinkSummary {
                    status: "completed",
                    linked_bank: Some(bank),
                    error: None,
                },
                LinkResult::Canceled => LinkSummary {
                    status: "canceled",
                    linked_bank: None,
                    error: None,
                },
                LinkResult::Failed(e) => LinkSummary {
                    status: "failed",
                    linked_bank: None,
                    error: Some(e.to_string()),
                },
            };
            output::print_json(&summary);
        }
        OutputFormat::Text => match result {
            LinkResult::Completed(bank) => {
                output::print_heading("Bank account linked");
                output::print_row("Session", &bank.session_id);
                output::print_row("Name", bank.display_name.as_deref().unwrap_or("-"));
                output::print_row("Bank", bank.bank_name.as_deref().unwrap_or("-"));
                output::print_row("Last 4", bank.last4.as_deref().unwrap_or("-"));
                output::print_row(
                    "Verification",
                    if bank.instantly_verified {
                        "instant"
                    } else {
                        "pending"
                    },
                );
            }
            LinkResult::Canceled => output::print_success("Linking canceled", format),
            LinkResult::Failed(e) => output::print_error(&e.to_string(), format),
        },
    }

    match result {
        LinkResult::Failed(e) if e.is_transient() => {
            anyhow::bail!("Link failed; retrying may succeed")
        }
        LinkResult::Failed(_) => anyhow::bail!("Link failed"),
        _ => Ok(()),
    }
}
