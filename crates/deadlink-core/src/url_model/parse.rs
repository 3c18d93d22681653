//! Tolerant URL parsing.

use std::sync::LazyLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use super::{NormalizedUrl, ParseError};

/// Everything except the structural delimiters gets escaped before the URL
/// is split, so stray UTF-8 or reserved bytes inside a component can never
/// be mistaken for a delimiter.
const COMPONENT_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b':')
    .remove(b'/')
    .remove(b'@')
    .remove(b'?')
    .remove(b'&')
    .remove(b'=')
    .remove(b'#')
    .remove(b';')
    .remove(b'[')
    .remove(b']');

/// Schemes we know carry an authority even when the slashes are missing.
const NETWORK_SCHEMES: [&str; 5] = ["http", "https", "ftp", "rtsp", "mms"];

static ENCODED_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9+.\-]*%3a(?://|%2f%2f)").expect("static regex")
});
static SINGLE_SLASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^([a-z][a-z0-9+.\-]*:)?/([^/].*)$").expect("static regex")
});
static HAS_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z][a-z0-9+.\-]*:)?//").expect("static regex")
});
static OPAQUE_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^([a-z][a-z0-9+.\-]*):([^0-9].*)?$").expect("static regex")
});

/// Parses a raw URL into its components.
///
/// Repairs, in order: a fully percent-encoded `://`, a bare `://` with no
/// scheme, a single slash after the scheme, and a missing scheme (assumed
/// `http`). A protocol-relative `//host/...` keeps an empty scheme.
pub fn parse(raw: &str) -> Result<NormalizedUrl, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let repaired = repair(trimmed);
    let escaped = utf8_percent_encode(&repaired, COMPONENT_ESCAPE).to_string();
    let mut parts = split(&escaped, trimmed)?;
    for value in [
        &mut parts.scheme,
        &mut parts.user,
        &mut parts.pass,
        &mut parts.host,
        &mut parts.path,
        &mut parts.query,
        &mut parts.fragment,
    ] {
        if let Some(v) = value.as_mut() {
            *v = percent_decode_str(v).decode_utf8_lossy().into_owned();
        }
    }
    Ok(parts)
}

fn repair(input: &str) -> String {
    let mut url = input.to_string();

    if ENCODED_SEPARATOR.is_match(&url) {
        url = decode_encoded_url(&url);
    }
    if url.starts_with("://") {
        url.insert_str(0, "http");
    }
    if let Some(caps) = SINGLE_SLASH.captures(&url) {
        let scheme = caps.get(1).map_or("", |m| m.as_str());
        url = format!("{}//{}", scheme, &caps[2]);
    }
    if !HAS_AUTHORITY.is_match(&url) {
        match OPAQUE_SCHEME.captures(&url) {
            Some(caps) => {
                let scheme = caps[1].to_ascii_lowercase();
                if NETWORK_SCHEMES.contains(&scheme.as_str()) {
                    let rest = caps.get(2).map_or("", |m| m.as_str());
                    url = format!("{}://{}", &caps[1], rest);
                }
            }
            None => url.insert_str(0, "http://"),
        }
    }
    url
}

/// Decodes a URL whose separators were percent-encoded.
///
/// The fragment is left alone, `%23` stays encoded so a decoded `#` can never
/// start a fragment, and escapes of non-ASCII bytes stay encoded since they
/// may not form valid UTF-8 on their own.
fn decode_encoded_url(url: &str) -> String {
    let (body, fragment) = match url.split_once('#') {
        Some((b, f)) => (b, Some(f)),
        None => (url, None),
    };
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            if let Ok(b) = u8::from_str_radix(&body[i + 1..i + 3], 16) {
                if b.is_ascii() && b != b'#' {
                    out.push(b as char);
                    i += 3;
                    continue;
                }
            }
        }
        let ch = body[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }
    if let Some(f) = fragment {
        out.push('#');
        out.push_str(f);
    }
    out
}

/// Splits an escaped URL into components. `original` is only used in errors.
fn split(escaped: &str, original: &str) -> Result<NormalizedUrl, ParseError> {
    let mut parts = NormalizedUrl::default();
    let mut rest = escaped;

    if let Some((before, fragment)) = rest.split_once('#') {
        parts.fragment = non_empty(fragment);
        rest = before;
    }
    if let Some((before, query)) = rest.split_once('?') {
        parts.query = non_empty(query);
        rest = before;
    }
    if let Some(idx) = scheme_end(rest) {
        parts.scheme = Some(rest[..idx].to_string());
        rest = &rest[idx + 1..];
    }

    let Some(after_slashes) = rest.strip_prefix("//") else {
        parts.path = non_empty(rest);
        return Ok(parts);
    };
    let (authority, path) = match after_slashes.find('/') {
        Some(idx) => after_slashes.split_at(idx),
        None => (after_slashes, ""),
    };
    parts.path = non_empty(path);

    let host_port = match authority.rsplit_once('@') {
        Some((userinfo, host_port)) => {
            match userinfo.split_once(':') {
                Some((user, pass)) => {
                    parts.user = Some(user.to_string());
                    parts.pass = Some(pass.to_string());
                }
                None => parts.user = Some(userinfo.to_string()),
            }
            host_port
        }
        None => authority,
    };

    let (host, port) = split_host_port(host_port);
    if host.is_empty() {
        return Err(ParseError::MissingHost(original.to_string()));
    }
    parts.host = Some(host.to_string());
    if let Some(port) = port.filter(|p| !p.is_empty()) {
        let parsed = port
            .parse::<u16>()
            .ok()
            .filter(|_| port.bytes().all(|b| b.is_ascii_digit()));
        match parsed {
            Some(p) => parts.port = Some(p),
            None => {
                return Err(ParseError::InvalidPort {
                    url: original.to_string(),
                    port: port.to_string(),
                })
            }
        }
    }
    Ok(parts)
}

/// Index of the `:` ending a scheme, if `s` starts with one.
fn scheme_end(s: &str) -> Option<usize> {
    let idx = s.find(':')?;
    let scheme = &s[..idx];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    chars
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        .then_some(idx)
}

fn split_host_port(host_port: &str) -> (&str, Option<&str>) {
    if host_port.starts_with('[') {
        if let Some(end) = host_port.find(']') {
            let host = &host_port[..=end];
            let port = host_port[end + 1..].strip_prefix(':');
            return (host, port);
        }
    }
    match host_port.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (host_port, None),
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
