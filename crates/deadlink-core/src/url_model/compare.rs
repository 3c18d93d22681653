//! Comparison keys for redirect and root detection. Never used for requests.

use std::sync::LazyLock;

use regex::Regex;

static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:[a-z][a-z0-9+.\-]*:)?//").expect("static regex"));
static WWW_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^www\.").expect("static regex"));
static APEX_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-z0-9][a-z0-9\-]{1,63}\.[a-z.]{2,6})$").expect("static regex")
});

/// Strips scheme and `//`, a leading `www.`, the fragment, and one trailing
/// slash. Repeats until nothing changes, so `clean(clean(u)) == clean(u)`.
pub fn clean(input: &str) -> String {
    let mut current = clean_once(input);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(input: &str) -> String {
    let s = SCHEME_PREFIX.replace(input, "");
    let s = WWW_PREFIX.replace(&s, "");
    let s = s.split('#').next().unwrap_or_default();
    s.strip_suffix('/').unwrap_or(s).to_string()
}

/// Candidate "homepage" keys for a URL: the host, the apex domain matched by
/// a trailing-labels pattern, and the last two labels, each with and without
/// a trailing slash. Empty when the URL has no host.
pub fn domain_roots(url: &str) -> Vec<String> {
    let Some(host) = super::parse(url).ok().and_then(|p| p.host_lower()) else {
        return Vec::new();
    };

    let mut bases = vec![host.clone()];
    if let Some(m) = APEX_DOMAIN.find(&host) {
        bases.push(m.as_str().to_string());
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() >= 3 {
        bases.push(labels[labels.len() - 2..].join("."));
    }

    let mut roots = Vec::with_capacity(bases.len() * 2);
    for base in bases {
        let slashed = format!("{base}/");
        if !roots.contains(&base) {
            roots.push(base);
            roots.push(slashed);
        }
    }
    roots
}
