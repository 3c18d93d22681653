//! A URL prepared for checking: parsed, sanitized, protocol resolved.

use crate::protocol::{self, Protocol};
use crate::url_model::{self, NormalizedUrl, ParseError};

/// One URL ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTarget {
    /// Caller's input string; results are always reported under this key.
    pub requested: String,
    pub url: NormalizedUrl,
    /// Request-ready form: fragment stripped, literal `%20` in the query kept.
    pub sanitized: String,
    pub protocol: Protocol,
    pub onion: bool,
}

impl CheckTarget {
    /// Prepares `url` for checking under the caller's key `requested`.
    ///
    /// The two differ on the full-body retry, which fetches the effective
    /// URL of the header pass but reports under the original input.
    pub fn prepare(requested: &str, url: &str, proxy_ready: bool) -> Result<Self, ParseError> {
        let parsed = url_model::parse(url)?;
        let sanitized = url_model::sanitize(&parsed, true, true);
        let protocol = protocol::resolve(&parsed, proxy_ready);
        let onion = protocol::is_onion(&parsed);
        Ok(Self {
            requested: requested.to_string(),
            url: parsed,
            sanitized,
            protocol,
            onion,
        })
    }

    /// Scheduling key: the host as it goes on the wire.
    pub fn host_key(&self) -> String {
        self.url.wire_host().unwrap_or_default()
    }
}
