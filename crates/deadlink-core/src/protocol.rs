//! Protocol resolution: which transport family handles a URL, and whether it
//! is an onion address that needs the SOCKS5 proxy.

use std::fmt;

use crate::url_model::NormalizedUrl;

/// Transport family of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Ftp,
    Rtsp,
    Mms,
    Unsupported,
}

impl Protocol {
    /// Resolves by scheme. A missing scheme is treated as HTTP since it is
    /// serialized as `https`.
    pub fn from_scheme(scheme: Option<&str>) -> Self {
        let Some(scheme) = scheme else {
            return Protocol::Http;
        };
        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => Protocol::Http,
            "ftp" => Protocol::Ftp,
            "rtsp" => Protocol::Rtsp,
            "mms" => Protocol::Mms,
            _ => Protocol::Unsupported,
        }
    }

    /// Streaming protocols get a media-player user agent.
    pub fn is_streaming(self) -> bool {
        matches!(self, Protocol::Rtsp | Protocol::Mms)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::Ftp => "FTP",
            Protocol::Rtsp => "RTSP",
            Protocol::Mms => "MMS",
            Protocol::Unsupported => "UNSUPPORTED",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when the host is a `.onion` address.
pub fn is_onion(url: &NormalizedUrl) -> bool {
    url.host_lower()
        .map(|h| h.trim_end_matches('.').ends_with(".onion"))
        .unwrap_or(false)
}

/// Resolves the protocol a URL will actually be checked with.
///
/// Onion addresses are only reachable through the proxy, so they resolve to
/// `Unsupported` unless `proxy_ready` is set. So do URLs without a host.
pub fn resolve(url: &NormalizedUrl, proxy_ready: bool) -> Protocol {
    let protocol = Protocol::from_scheme(url.scheme.as_deref());
    if protocol == Protocol::Unsupported || url.host.is_none() {
        return Protocol::Unsupported;
    }
    if is_onion(url) && !proxy_ready {
        return Protocol::Unsupported;
    }
    protocol
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url_model::parse;

    #[test]
    fn scheme_lookup() {
        assert_eq!(Protocol::from_scheme(Some("http")), Protocol::Http);
        assert_eq!(Protocol::from_scheme(Some("HTTPS")), Protocol::Http);
        assert_eq!(Protocol::from_scheme(Some("ftp")), Protocol::Ftp);
        assert_eq!(Protocol::from_scheme(Some("rtsp")), Protocol::Rtsp);
        assert_eq!(Protocol::from_scheme(Some("mms")), Protocol::Mms);
        assert_eq!(Protocol::from_scheme(Some("gopher")), Protocol::Unsupported);
        assert_eq!(Protocol::from_scheme(None), Protocol::Http);
    }

    #[test]
    fn onion_detection() {
        assert!(is_onion(&parse("http://expyuzz4wqqyqhjn.onion/").unwrap()));
        assert!(is_onion(&parse("http://EXAMPLE.ONION./x").unwrap()));
        assert!(!is_onion(&parse("http://onion.example.com/").unwrap()));
    }

    #[test]
    fn onion_needs_ready_proxy() {
        let url = parse("http://expyuzz4wqqyqhjn.onion/").unwrap();
        assert_eq!(resolve(&url, false), Protocol::Unsupported);
        assert_eq!(resolve(&url, true), Protocol::Http);
    }

    #[test]
    fn hostless_urls_are_unsupported() {
        let url = parse("mailto:someone@example.com").unwrap();
        assert_eq!(resolve(&url, true), Protocol::Unsupported);
        let url = parse("//example.com/page").unwrap();
        assert_eq!(resolve(&url, false), Protocol::Http);
    }
}
