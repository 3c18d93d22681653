//! Liveness classification of one fetch result.
//!
//! Rules are checked in a fixed order and the first match wins. A header
//! pass only says "dead" for reasons a full fetch could not change; anything
//! else it is unsure about goes to the full-body retry.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::fetch::{FetchResult, Phase};
use crate::protocol::Protocol;
use crate::url_model::{clean, domain_roots};

/// HTTP status codes that count as a live resource.
pub const GOOD_HTTP_CODES: [u32; 24] = [
    100, 101, 102, 103, 200, 201, 202, 203, 204, 205, 206, 207, 208, 226, 250, 300, 301, 302,
    303, 304, 305, 306, 307, 308,
];

/// FTP reply codes that count as a live resource.
pub const GOOD_FTP_CODES: [u32; 32] = [
    100, 110, 120, 125, 150, 200, 202, 211, 212, 213, 214, 215, 220, 221, 225, 226, 227, 228,
    229, 230, 231, 232, 234, 250, 257, 300, 331, 332, 350, 600, 631, 633,
];

/// libcurl result codes that mean the resource is unreachable for good:
/// bad URL, DNS failure, refused connection, timeout, TLS failure and so on.
pub const FATAL_TRANSPORT_ERRORS: [u32; 24] = [
    3, 5, 6, 7, 8, 10, 11, 12, 13, 19, 28, 31, 47, 51, 52, 60, 61, 64, 68, 74, 83, 85, 86, 87,
];

/// Why a link was judged dead. `Display` gives the reason text reported to
/// callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadReason {
    /// 4xx/5xx on a full fetch.
    ResponseCode(u32),
    RedirectTo404,
    RedirectToRoot,
    Transport { code: u32, message: String },
    NoResponse,
    /// Status outside the protocol's good set.
    BadStatus { protocol: Protocol, code: u32 },
    /// Input could not be parsed as a URL.
    InvalidUrl(String),
}

impl fmt::Display for DeadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadReason::ResponseCode(code) => write!(f, "RESPONSE CODE: {code}"),
            DeadReason::RedirectTo404 => f.write_str("REDIRECT TO 404"),
            DeadReason::RedirectToRoot => f.write_str("REDIRECT TO ROOT"),
            DeadReason::Transport { code, message } => write!(f, "Curl Error {code}: {message}"),
            DeadReason::NoResponse => f.write_str("NO RESPONSE FROM SERVER"),
            DeadReason::BadStatus { protocol, code } => write!(f, "{protocol} RESPONSE CODE: {code}"),
            DeadReason::InvalidUrl(detail) => write!(f, "INVALID URL: {detail}"),
        }
    }
}

impl Serialize for DeadReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Tri-state verdict for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum Verdict {
    Alive,
    Dead(DeadReason),
    /// Not checked (unsupported scheme, onion without proxy) or the header
    /// pass could not decide and there was no retry.
    Uncertain,
}

impl Verdict {
    /// `Some(true)` dead, `Some(false)` alive, `None` unknown.
    pub fn is_dead(&self) -> Option<bool> {
        match self {
            Verdict::Alive => Some(false),
            Verdict::Dead(_) => Some(true),
            Verdict::Uncertain => None,
        }
    }

    pub fn reason(&self) -> Option<&DeadReason> {
        match self {
            Verdict::Dead(reason) => Some(reason),
            _ => None,
        }
    }
}

fn looks_like_404_page(key: &str) -> bool {
    key.contains("/404.htm") || key.contains("/404/") || key.to_ascii_lowercase().contains("notfound")
}

/// Classifies one result. `protocol` picks the good-code table; `phase`
/// decides whether inconclusive signals are `Dead` or `Uncertain`.
pub fn classify(result: &FetchResult, protocol: Protocol, phase: Phase) -> Verdict {
    let full_body = phase == Phase::FullBody;
    let code = result.status_code;
    let inconclusive = |reason: DeadReason| {
        if full_body {
            Verdict::Dead(reason)
        } else {
            Verdict::Uncertain
        }
    };

    if (400..600).contains(&code) {
        return inconclusive(DeadReason::ResponseCode(code));
    }

    let effective = clean(&result.effective_url);
    if looks_like_404_page(&effective) {
        return inconclusive(DeadReason::RedirectTo404);
    }

    let requested = clean(&result.sanitized_url);
    if !effective.is_empty()
        && effective != requested
        && domain_roots(&result.sanitized_url).contains(&effective)
    {
        return Verdict::Dead(DeadReason::RedirectToRoot);
    }

    if FATAL_TRANSPORT_ERRORS.contains(&result.transport_error_code) {
        return Verdict::Dead(DeadReason::Transport {
            code: result.transport_error_code,
            message: result.transport_error_message.clone(),
        });
    }

    if code == 0 {
        return inconclusive(DeadReason::NoResponse);
    }

    let good: &[u32] = if protocol == Protocol::Ftp {
        &GOOD_FTP_CODES
    } else {
        &GOOD_HTTP_CODES
    };
    if !good.contains(&code) {
        return Verdict::Dead(DeadReason::BadStatus { protocol, code });
    }

    Verdict::Alive
}
