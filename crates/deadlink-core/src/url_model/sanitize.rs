//! Request-ready URL serialization.
//!
//! Rebuilds a URL so the receiving service sees a properly encoded path and
//! query: neither under-encoded (raw UTF-8, spaces) nor over-encoded (`%25XX`).

use percent_encoding::{percent_decode, percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::NormalizedUrl;

/// Characters a path may contain without any re-encoding.
const PATH_SAFE_EXTRA: &[u8] = b"$-_.+!*'(),~:/[]@;=%";

/// RFC 3986 unreserved characters stay literal in re-encoded path segments.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Form encoding for query keys and values; space becomes `+` afterwards.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

const ENCODED_SPACE: &str = "%20";

/// Default port for a scheme; omitted when serializing.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        "ftp" => Some(21),
        "rtsp" => Some(554),
        _ => None,
    }
}

/// Builds a request-ready URL from parsed components.
///
/// - scheme defaults to `https` and is lower-cased
/// - host is lower-cased and IDN-encoded when not ASCII
/// - the default port of the scheme is dropped
/// - path and query pass through untouched when they only contain safe
///   characters, otherwise every segment / key / value is decoded and
///   re-encoded on its own
/// - `preserve_query_encoding` keeps literal `%20` in the query instead of
///   turning it into `+`
/// - the fragment is appended verbatim unless `strip_fragment` is set
pub fn sanitize(parts: &NormalizedUrl, strip_fragment: bool, preserve_query_encoding: bool) -> String {
    let scheme = parts.scheme_lower().unwrap_or_else(|| "https".to_string());
    let mut url = format!("{scheme}://");

    if let Some(user) = &parts.user {
        url.push_str(user);
        if let Some(pass) = &parts.pass {
            url.push(':');
            url.push_str(pass);
        }
        url.push('@');
    }
    if let Some(host) = &parts.host {
        url.push_str(&encode_host(host));
        if let Some(port) = parts.port {
            if default_port(&scheme) != Some(port) {
                url.push(':');
                url.push_str(&port.to_string());
            }
        }
    }

    url.push('/');
    if let Some(path) = &parts.path {
        let body = path.strip_prefix('/').unwrap_or(path);
        if !body.is_empty() {
            if is_safe(path, PATH_SAFE_EXTRA) {
                url.push_str(body);
            } else {
                url.push_str(&encode_path(body));
            }
        }
    }

    if let Some(query) = &parts.query {
        url.push('?');
        if is_safe_query(query) {
            url.push_str(query);
        } else {
            url.push_str(&encode_query(query, preserve_query_encoding));
        }
    }

    if !strip_fragment {
        if let Some(fragment) = &parts.fragment {
            url.push('#');
            url.push_str(fragment);
        }
    }
    url
}

pub(super) fn encode_host(host: &str) -> String {
    if host.is_ascii() {
        return host.to_ascii_lowercase();
    }
    match url::Host::parse(host) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => host.to_lowercase(),
    }
}

fn is_safe(s: &str, extra: &[u8]) -> bool {
    s.bytes().all(|b| b.is_ascii_alphanumeric() || extra.contains(&b))
}

/// Same as the path set, plus `&` between pairs.
fn is_safe_query(s: &str) -> bool {
    s.split('&').all(|pair| is_safe(pair, PATH_SAFE_EXTRA))
}

/// Decodes and re-encodes every segment independently. A literal `+` is a
/// plus sign here, never a space.
fn encode_path(body: &str) -> String {
    body.split('/')
        .map(|segment| {
            let raw: Vec<u8> = percent_decode_str(segment).collect();
            percent_encode(&raw, PATH_SEGMENT).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_query(query: &str, preserve_encoding: bool) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => format!(
                "{}={}",
                encode_query_part(key, preserve_encoding),
                encode_query_part(value, preserve_encoding)
            ),
            None => encode_query_part(pair, preserve_encoding),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_query_part(part: &str, preserve_encoding: bool) -> String {
    if preserve_encoding {
        part.split(ENCODED_SPACE)
            .map(form_round_trip)
            .collect::<Vec<_>>()
            .join(ENCODED_SPACE)
    } else {
        form_round_trip(part)
    }
}

/// Form-decodes (`+` is a space) then form-encodes (space is `+`).
fn form_round_trip(s: &str) -> String {
    let spaced = s.replace('+', " ");
    let raw: Vec<u8> = percent_decode(spaced.as_bytes()).collect();
    percent_encode(&raw, QUERY_COMPONENT)
        .to_string()
        .replace(ENCODED_SPACE, "+")
}
