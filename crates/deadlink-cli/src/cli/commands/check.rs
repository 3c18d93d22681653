//! `deadlink check [URL]...` – check a batch and print one verdict per input.

use anyhow::{bail, Context, Result};
use deadlink_core::{CheckerConfig, DeadlinkChecker, FetchResult, ProxyContext, Verdict};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct CheckArgs {
    pub urls: Vec<String>,
    pub file: Option<PathBuf>,
    pub json: bool,
    pub no_queue: bool,
    pub verbose: bool,
}

struct Report {
    verdicts: HashMap<String, Verdict>,
    errors: HashMap<String, String>,
    details: HashMap<String, FetchResult>,
    proxy_ready: bool,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    url: &'a str,
    #[serde(flatten)]
    verdict: &'a Verdict,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    proxy_ready: bool,
    results: Vec<JsonEntry<'a>>,
    errors: &'a HashMap<String, String>,
    details: &'a HashMap<String, FetchResult>,
}

/// URLs from a list file: one per line, blank lines and `#` comments skipped.
fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn collect_inputs(urls: Vec<String>, file: Option<&Path>) -> Result<Vec<String>> {
    let mut inputs = urls;
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read URL list {}", path.display()))?;
        inputs.extend(parse_url_list(&text));
    }
    Ok(inputs)
}

fn verdict_line(url: &str, verdict: &Verdict) -> String {
    match verdict {
        Verdict::Alive => format!("{:<7} {}", "ALIVE", url),
        Verdict::Dead(reason) => format!("{:<7} {}  ({})", "DEAD", url, reason),
        Verdict::Uncertain => format!("{:<7} {}", "UNKNOWN", url),
    }
}

pub async fn run_check(mut cfg: CheckerConfig, args: CheckArgs) -> Result<()> {
    let inputs = collect_inputs(args.urls, args.file.as_deref())?;
    if inputs.is_empty() {
        bail!("no URLs given (pass them as arguments or with --file)");
    }
    if args.no_queue {
        cfg.queue_by_domain = false;
    }
    if args.verbose {
        cfg.verbose = true;
    }

    let report = tokio::task::spawn_blocking({
        let inputs = inputs.clone();
        move || -> Result<Report> {
            let proxy = Arc::new(ProxyContext::from_config(&cfg));
            let mut checker = DeadlinkChecker::new(cfg, proxy);
            let verdicts = checker.are_dead(inputs.as_slice())?;
            Ok(Report {
                verdicts,
                errors: checker.errors().clone(),
                details: checker.request_details().clone(),
                proxy_ready: checker.is_proxy_ready(),
            })
        }
    })
    .await
    .context("check task join")??;

    if args.json {
        let results = inputs
            .iter()
            .filter_map(|url| {
                report
                    .verdicts
                    .get(url)
                    .map(|verdict| JsonEntry { url, verdict })
            })
            .collect();
        let doc = JsonReport {
            proxy_ready: report.proxy_ready,
            results,
            errors: &report.errors,
            details: &report.details,
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    for url in &inputs {
        let verdict = report.verdicts.get(url).unwrap_or(&Verdict::Uncertain);
        println!("{}", verdict_line(url, verdict));
    }
    Ok(())
}
