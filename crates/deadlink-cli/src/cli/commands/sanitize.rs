//! `deadlink sanitize <url>` – show what the checker would actually request.

use anyhow::Result;
use deadlink_core::url_model;

fn sanitized(url: &str, keep_fragment: bool) -> Result<String> {
    let parsed = url_model::parse(url)?;
    Ok(url_model::sanitize(&parsed, !keep_fragment, true))
}

pub fn run_sanitize(url: &str, keep_fragment: bool) -> Result<()> {
    println!("{}", sanitized(url, keep_fragment)?);
    Ok(())
}
