//! Per-request transport options, built from protocol, phase and proxy
//! eligibility.

use std::time::Duration;

use crate::config::CheckerConfig;
use crate::protocol::Protocol;

use super::Phase;

/// Modern desktop browser; some sites refuse unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Streaming servers expect a media player.
pub const MEDIA_PLAYER_USER_AGENT: &str = "VLC/3.0.20 LibVLC/3.0.20";

/// Anonymous FTP login sent on full-body FTP checks.
pub const FTP_ANONYMOUS_USER: &str = "anonymous";
pub const FTP_ANONYMOUS_PASSWORD: &str = "anonymous@domain.com";

/// Headers a regular browser would send.
pub const BROWSER_HEADERS: [&str; 7] = [
    "Accept: text/xml,application/xml,application/xhtml+xml,text/html;q=0.9,text/plain;q=0.8,image/png,*/*;q=0.5",
    "Cache-Control: max-age=0",
    "Connection: keep-alive",
    "Keep-Alive: 300",
    "Accept-Charset: ISO-8859-1,utf-8;q=0.7,*;q=0.7",
    "Accept-Language: en-us,en;q=0.5",
    "Pragma: ",
];

/// Everything the transport needs to issue one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// URL handed to the transport (MMS already rewritten to RTSP).
    pub url: String,
    /// Request metadata only, no body.
    pub header_only: bool,
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: Vec<String>,
    pub credentials: Option<(String, String)>,
    /// FTP: extended passive/active modes and a single CWD to the directory.
    pub ftp_single_cwd: bool,
    /// Ask for gzip/deflate/br.
    pub accept_encoding: bool,
    /// SOCKS5 proxy URL, only for onion hosts when the proxy is ready.
    pub proxy: Option<String>,
    /// Always false: certificate problems must not read as dead links.
    pub verify_tls: bool,
    pub capture_body: bool,
    pub verbose: bool,
}

impl RequestOptions {
    /// Builds options for a sanitized URL.
    ///
    /// `proxy` is the SOCKS5 URL to route through, already gated on onion
    /// host plus a positive readiness probe by the caller.
    pub fn build(
        url: &str,
        protocol: Protocol,
        phase: Phase,
        proxy: Option<&str>,
        config: &CheckerConfig,
    ) -> Self {
        let full_body = phase == Phase::FullBody;

        let url = match protocol {
            Protocol::Mms => rewrite_mms(url),
            _ => url.to_string(),
        };
        let timeout = if full_body {
            config.full_timeout()
        } else {
            config.header_timeout()
        };
        let user_agent = if protocol.is_streaming() {
            MEDIA_PLAYER_USER_AGENT.to_string()
        } else {
            config
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
        };
        let headers = if protocol == Protocol::Http {
            BROWSER_HEADERS.iter().map(|h| h.to_string()).collect()
        } else {
            Vec::new()
        };
        let credentials = (full_body && protocol == Protocol::Ftp).then(|| {
            (
                FTP_ANONYMOUS_USER.to_string(),
                FTP_ANONYMOUS_PASSWORD.to_string(),
            )
        });

        Self {
            url,
            header_only: !full_body,
            timeout,
            user_agent,
            headers,
            credentials,
            ftp_single_cwd: protocol == Protocol::Ftp,
            accept_encoding: full_body && protocol == Protocol::Http,
            proxy: proxy.map(str::to_string),
            verify_tls: false,
            capture_body: false,
            verbose: config.verbose,
        }
    }

    /// Same options, but keep the response body.
    pub fn capturing_body(mut self) -> Self {
        self.capture_body = true;
        self
    }
}

/// MMS and RTSP share a protocol family; libcurl only speaks RTSP.
fn rewrite_mms(url: &str) -> String {
    match url.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mms://") => format!("rtsp://{}", &url[6..]),
        _ => url.to_string(),
    }
}
