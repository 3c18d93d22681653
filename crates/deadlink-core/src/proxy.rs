//! SOCKS5 proxy readiness for onion addresses.
//!
//! The probe runs at most once per `ProxyContext`, no matter how many checkers
//! share it; the result is cached for the life of the context.

use std::sync::OnceLock;

use crate::config::CheckerConfig;
use crate::fetch::{Phase, RequestOptions};
use crate::protocol::Protocol;
use crate::transport::{Transport, TransferRequest};

/// Page fetched through the proxy to confirm it reaches the Tor network.
pub const PROXY_CHECK_URL: &str = "https://check.torproject.org/";

/// Text the check page shows when the request arrived over Tor.
pub const PROXY_CONFIRMATION: &str = "Congratulations. This browser is configured to use Tor.";

/// Default SOCKS port: Tor Browser on Windows, system tor elsewhere.
pub fn default_socks_port() -> u16 {
    if cfg!(windows) {
        9150
    } else {
        9050
    }
}

/// Shared proxy endpoint plus its once-computed readiness.
#[derive(Debug)]
pub struct ProxyContext {
    host: String,
    port: u16,
    ready: OnceLock<bool>,
}

impl ProxyContext {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ready: OnceLock::new(),
        }
    }

    pub fn from_config(config: &CheckerConfig) -> Self {
        Self::new(config.socks_host.clone(), config.socks_port)
    }

    /// A context whose readiness is already known; the probe never runs.
    pub fn with_state(host: impl Into<String>, port: u16, ready: bool) -> Self {
        let ctx = Self::new(host, port);
        let _ = ctx.ready.set(ready);
        ctx
    }

    /// `socks5h`: host names are resolved by the proxy, which onion needs.
    pub fn proxy_url(&self) -> String {
        format!("socks5h://{}:{}", self.host, self.port)
    }

    /// `None` until the probe has run.
    pub fn state(&self) -> Option<bool> {
        self.ready.get().copied()
    }

    pub fn is_ready(&self) -> bool {
        self.state().unwrap_or(false)
    }

    /// Runs the probe if nobody has yet and returns the cached answer.
    ///
    /// Concurrent callers block until the first probe finishes; the probe
    /// itself never runs twice.
    pub fn ensure_probed<T: Transport + ?Sized>(&self, transport: &T, config: &CheckerConfig) -> bool {
        *self.ready.get_or_init(|| {
            let ready = probe(transport, &self.proxy_url(), config);
            if ready {
                tracing::info!(proxy = %self.proxy_url(), "SOCKS proxy ready; onion URLs will be checked");
            } else {
                tracing::info!(proxy = %self.proxy_url(), "SOCKS proxy not ready; onion URLs will be reported unknown");
            }
            ready
        })
    }
}

fn probe<T: Transport + ?Sized>(transport: &T, proxy_url: &str, config: &CheckerConfig) -> bool {
    let options = RequestOptions::build(
        PROXY_CHECK_URL,
        Protocol::Http,
        Phase::FullBody,
        Some(proxy_url),
        config,
    )
    .capturing_body();

    let outcomes = match transport.execute(&[TransferRequest { id: 0, options }]) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            tracing::warn!("proxy probe failed: {}", e);
            return false;
        }
    };
    let Some(outcome) = outcomes.into_iter().next() else {
        return false;
    };
    if outcome.error_code != 0 {
        tracing::debug!(code = outcome.error_code, "proxy probe: {}", outcome.error_message);
    }
    outcome
        .body
        .map(|body| String::from_utf8_lossy(&body).contains(PROXY_CONFIRMATION))
        .unwrap_or(false)
}
