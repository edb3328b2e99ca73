//! System browser presentation host.

use bank_link::PresentationContext;
use tracing::info;
use url::Url;

/// Opens the hosted auth page in the user's default browser.
pub struct SystemBrowser {
    /// Print the URL so it can be opened by hand on headless machines.
    echo_url: bool,
}

impl SystemBrowser {
    pub fn new(echo_url: bool) -> Self {
        Self { echo_url }
    }
}

impl PresentationContext for SystemBrowser {
    fn open_url(&self, url: &Url) -> std::io::Result<()> {
        if self.echo_url {
            eprintln!("Opening browser to link your bank account...");
            eprintln!("If it does not open, visit: {}", url);
        }
        info!(host = url.host_str().unwrap_or(""), "Opening hosted auth page");
        open::that(url.as_str())
    }
}
