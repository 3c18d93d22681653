//! URL modeling: tolerant parsing, request sanitization, and comparison keys.
//!
//! Input URLs come from wiki markup and archive indexes, so they are often
//! malformed: missing schemes, single slashes, fully percent-encoded
//! separators, raw UTF-8 in host and path. `parse` repairs what it can,
//! `sanitize` rebuilds a request-ready URL, and `clean`/`domain_roots`
//! produce the keys used for redirect detection.

mod compare;
mod parse;
mod sanitize;

pub use compare::{clean, domain_roots};
pub use parse::parse;
pub use sanitize::{default_port, sanitize};

use thiserror::Error;

/// Components of a parsed URL. Each one is present or absent independently.
///
/// Values are the original text of each component; nothing is decoded or
/// re-encoded here, that is `sanitize`'s job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub scheme: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl NormalizedUrl {
    /// Lower-cased scheme, if any.
    pub fn scheme_lower(&self) -> Option<String> {
        self.scheme.as_deref().map(str::to_ascii_lowercase)
    }

    /// Lower-cased host, if any.
    pub fn host_lower(&self) -> Option<String> {
        self.host.as_deref().map(str::to_lowercase)
    }

    /// Host as sent on the wire: IDN-encoded, lower-cased, no trailing dot.
    /// Different spellings of one server give the same value.
    pub fn wire_host(&self) -> Option<String> {
        self.host
            .as_deref()
            .map(|host| sanitize::encode_host(host.trim_end_matches('.')))
    }
}

/// Why a URL could not be parsed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty URL")]
    Empty,
    #[error("missing host in {0}")]
    MissingHost(String),
    #[error("invalid port {port:?} in {url}")]
    InvalidPort { url: String, port: String },
}
