//! Loopback redirect listener implementing [`AuthFlow`] for desktop/CLI hosts.
//!
//! Binds the success target's host and port, hands the hosted URL to the
//! presentation context (typically the system browser) and waits for the
//! browser to land on the success or cancel target.

use crate::auth_session::{AuthFlow, AuthFlowRequest, PresentationContext, RedirectOutcome};
use crate::error::AuthFlowError;
use crate::redirect::matches_target;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};
use url::{Host, Url};

/// Default time the user has to finish the hosted flow.
pub const DEFAULT_LOOPBACK_TIMEOUT_SECS: u64 = 600;

/// A connection that has not sent its request line by then is closed.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

type RedirectSender = Arc<tokio::sync::Mutex<Option<oneshot::Sender<Url>>>>;

/// [`AuthFlow`] backed by a short-lived HTTP listener on a loopback address.
pub struct LoopbackAuthFlow {
    timeout: Duration,
    cancel_tx: Mutex<Option<oneshot::Sender<()>>>,
}

/// Aborts the accept loop when the flow returns or its future is dropped.
///
/// Connection handlers live in a `JoinSet` owned by the accept loop, so they
/// are aborted with it.
struct ListenerTask(JoinHandle<()>);

impl Drop for ListenerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl LoopbackAuthFlow {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel_tx: Mutex::new(None),
        }
    }

    /// Create with the default timeout.
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(DEFAULT_LOOPBACK_TIMEOUT_SECS))
    }
}

impl Default for LoopbackAuthFlow {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Socket address to listen on for `target`, if it is a loopback http URL.
fn loopback_addr(target: &Url) -> Result<SocketAddr, AuthFlowError> {
    if target.scheme() != "http" {
        return Err(AuthFlowError::StartRefused(format!(
            "redirect target scheme '{}' cannot be served by a loopback listener",
            target.scheme()
        )));
    }

    let ip = match target.host() {
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip),
        Some(Host::Domain(domain)) if domain.eq_ignore_ascii_case("localhost") => {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
        _ => {
            return Err(AuthFlowError::StartRefused(format!(
                "redirect target host '{}' is not a loopback address",
                target.host_str().unwrap_or("")
            )))
        }
    };

    if !ip.is_loopback() {
        return Err(AuthFlowError::StartRefused(format!(
            "redirect target host '{}' is not a loopback address",
            ip
        )));
    }

    let port = target.port_or_known_default().unwrap_or(80);
    Ok(SocketAddr::new(ip, port))
}

/// Whether both targets name the same scheme, host and port.
fn same_authority(a: &Url, b: &Url) -> bool {
    a.scheme().eq_ignore_ascii_case(b.scheme())
        && a.host_str().map(str::to_ascii_lowercase) == b.host_str().map(str::to_ascii_lowercase)
        && a.port_or_known_default() == b.port_or_known_default()
}

#[async_trait]
impl AuthFlow for LoopbackAuthFlow {
    async fn start(
        &self,
        request: AuthFlowRequest,
        context: &dyn PresentationContext,
    ) -> Result<RedirectOutcome, AuthFlowError> {
        let addr = loopback_addr(&request.success_target)?;
        if !same_authority(&request.success_target, &request.cancel_target) {
            return Err(AuthFlowError::StartRefused(format!(
                "cancel target {} is not served by the listener on {}",
                request.cancel_target, addr
            )));
        }
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AuthFlowError::StartRefused(format!("Failed to bind to {}: {}", addr, e)))?;

        info!(%addr, "Loopback redirect listener started");

        let (tx, rx) = oneshot::channel::<Url>();
        let tx: RedirectSender = Arc::new(tokio::sync::Mutex::new(Some(tx)));

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        *self.cancel_tx.lock() = Some(cancel_tx);

        let targets = Arc::new((request.success_target.clone(), request.cancel_target.clone()));
        let _listener_task = ListenerTask(tokio::spawn(async move {
            let mut handlers = JoinSet::new();
            loop {
                let accepted = listener.accept().await;
                while handlers.try_join_next().is_some() {}

                match accepted {
                    Ok((socket, peer)) => {
                        debug!(%peer, "Accepted redirect connection");
                        let tx = tx.clone();
                        let targets = targets.clone();
                        handlers.spawn(async move {
                            if let Err(e) = handle_connection(socket, &targets.0, &targets.1, tx).await {
                                error!("Error handling redirect connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                        break;
                    }
                }
            }
        }));

        if let Err(e) = context.open_url(&request.url) {
            self.cancel_tx.lock().take();
            return Err(AuthFlowError::StartRefused(format!(
                "Failed to open hosted auth page: {}",
                e
            )));
        }

        let outcome = tokio::select! {
            landed = rx => match landed {
                Ok(url) => Ok(RedirectOutcome::Redirected(url)),
                Err(_) => Err(AuthFlowError::Transport("redirect listener closed".to_string())),
            },
            Ok(()) = cancel_rx => Ok(RedirectOutcome::UserCanceled),
            _ = tokio::time::sleep(self.timeout) => Err(AuthFlowError::Timeout),
        };

        self.cancel_tx.lock().take();
        debug!("Loopback redirect listener stopping");
        outcome
    }

    fn cancel(&self) {
        if let Some(cancel_tx) = self.cancel_tx.lock().take() {
            let _ = cancel_tx.send(());
        }
    }
}

/// Serve one request; forward it if it lands on a redirect target.
async fn handle_connection(
    mut socket: TcpStream,
    success_target: &Url,
    cancel_target: &Url,
    tx: RedirectSender,
) -> std::io::Result<()> {
    let (reader, mut writer) = socket.split();
    let mut reader = BufReader::new(reader);
    let mut request_line = String::new();
    match tokio::time::timeout(REQUEST_READ_TIMEOUT, reader.read_line(&mut request_line)).await {
        Ok(read) => {
            read?;
        }
        Err(_) => {
            debug!("Closing redirect connection that sent no request");
            return Ok(());
        }
    }

    // GET /path?query HTTP/1.1
    let mut parts = request_line.split_whitespace();
    let method = parts.next();
    let target = parts.next();
    let version = parts.next();

    if method != Some("GET") {
        send_response(&mut writer, 405, "Method Not Allowed", "Method Not Allowed").await?;
        return Ok(());
    }

    let path = match (target, version) {
        (Some(path), Some(_)) if path.starts_with('/') => path,
        _ => {
            send_response(&mut writer, 400, "Bad Request", "Bad Request").await?;
            return Ok(());
        }
    };

    let landed = match success_target.join(path) {
        Ok(url) => url,
        Err(_) => {
            send_response(&mut writer, 400, "Bad Request", "Bad Request").await?;
            return Ok(());
        }
    };

    let body = if matches_target(&landed, success_target) {
        success_page()
    } else if matches_target(&landed, cancel_target) {
        canceled_page()
    } else {
        debug!(path = landed.path(), "Ignoring request to unrelated path");
        send_response(&mut writer, 404, "Not Found", "Not Found").await?;
        return Ok(());
    };

    send_response(&mut writer, 200, "OK", body).await?;

    if let Some(tx) = tx.lock().await.take() {
        let _ = tx.send(landed);
    }

    Ok(())
}

async fn send_response(
    writer: &mut tokio::net::tcp::WriteHalf<'_>,
    status_code: u16,
    status_text: &str,
    body: &str,
) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_code,
        status_text,
        body.len(),
        body
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await
}

fn success_page() -> &'static str {
    r#"<!DOCTYPE html>
<html>
<head><title>Bank linked</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px;">
<h1>Bank account linked</h1>
<p>You can close this window and return to the application.</p>
</body>
</html>"#
}

fn canceled_page() -> &'static str {
    r#"<!DOCTYPE html>
<html>
<head><title>Linking canceled</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px;">
<h1>Linking canceled</h1>
<p>No account was linked. You can close this window.</p>
</body>
</html>"#
}
