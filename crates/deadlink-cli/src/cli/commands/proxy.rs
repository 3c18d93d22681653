//! `deadlink proxy` – probe the SOCKS5 proxy used for onion addresses.

use anyhow::{Context, Result};
use deadlink_core::transport::CurlTransport;
use deadlink_core::{CheckerConfig, ProxyContext};

pub async fn run_proxy(cfg: CheckerConfig) -> Result<()> {
    let (proxy_url, ready) = tokio::task::spawn_blocking(move || {
        let proxy = ProxyContext::from_config(&cfg);
        let ready = proxy.ensure_probed(&CurlTransport::new(), &cfg);
        (proxy.proxy_url(), ready)
    })
    .await
    .context("proxy probe task join")?;

    if ready {
        println!("{}: ready, onion URLs will be checked", proxy_url);
    } else {
        println!("{}: not ready, onion URLs will be reported UNKNOWN", proxy_url);
    }
    Ok(())
}
