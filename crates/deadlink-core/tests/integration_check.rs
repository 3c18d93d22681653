//! Integration tests: the real curl transport against a local HTTP server.

mod common;

use std::sync::Arc;

use common::link_server::{self, Route};
use deadlink_core::{CheckerConfig, DeadReason, DeadlinkChecker, ProxyContext, Verdict};

fn checker() -> DeadlinkChecker {
    let config = CheckerConfig {
        header_timeout_secs: 5,
        full_timeout_secs: 5,
        wave_delay_ms: 0,
        ..CheckerConfig::default()
    };
    // Known-unavailable proxy: no probe traffic leaves the machine.
    let proxy = Arc::new(ProxyContext::with_state("127.0.0.1", link_server::closed_port(), false));
    DeadlinkChecker::new(config, proxy)
}

#[test]
fn live_page_is_alive() {
    let base = link_server::start(&[("/ok", Route::Page)]);
    let url = format!("{}/ok", base);
    let mut c = checker();
    assert_eq!(c.is_dead(&url).unwrap(), Verdict::Alive);
    let detail = &c.request_details()[&url];
    assert_eq!(detail.status_code, 200);
    assert_eq!(detail.effective_url, url);
}

#[test]
fn missing_page_is_dead_with_reason() {
    let base = link_server::start(&[]);
    let url = format!("{}/gone", base);
    let mut c = checker();
    assert_eq!(
        c.is_dead(&url).unwrap(),
        Verdict::Dead(DeadReason::ResponseCode(404))
    );
    assert_eq!(c.errors()[&url], "RESPONSE CODE: 404");
}

#[test]
fn head_blocked_but_get_works_is_alive() {
    let base = link_server::start(&[("/dynamic", Route::HeadBlocked)]);
    let url = format!("{}/dynamic", base);
    let mut c = checker();
    assert_eq!(c.is_dead(&url).unwrap(), Verdict::Alive);
    assert!(c.errors().is_empty());
}

#[test]
fn redirect_to_error_page_is_dead() {
    let base = link_server::start(&[
        ("/old-article", Route::Redirect("/404.html")),
        ("/404.html", Route::Page),
    ]);
    let url = format!("{}/old-article", base);
    let mut c = checker();
    assert_eq!(c.is_dead(&url).unwrap(), Verdict::Dead(DeadReason::RedirectTo404));
    assert_eq!(c.errors()[&url], "REDIRECT TO 404");
}

#[test]
fn server_error_status_is_dead() {
    let base = link_server::start(&[("/broken", Route::Status(503))]);
    let url = format!("{}/broken", base);
    let mut c = checker();
    assert_eq!(
        c.is_dead(&url).unwrap(),
        Verdict::Dead(DeadReason::ResponseCode(503))
    );
}

#[test]
fn refused_connection_is_dead_in_header_pass() {
    let url = format!("http://127.0.0.1:{}/", link_server::closed_port());
    let mut c = checker();
    let verdict = c.is_dead(&url).unwrap();
    match &verdict {
        Verdict::Dead(DeadReason::Transport { code, .. }) => assert_eq!(*code, 7),
        other => panic!("expected transport failure, got {:?}", other),
    }
    assert!(verdict.reason().unwrap().to_string().starts_with("Curl Error 7: "));
    // Fatal in the header pass: never retried, so not listed in errors.
    assert!(c.errors().is_empty());
}

#[test]
fn mixed_batch_reports_every_input() {
    let base = link_server::start(&[("/a", Route::Page), ("/b", Route::HeadBlocked)]);
    let inputs = vec![
        format!("{}/a", base),
        format!("{}/b", base),
        format!("{}/missing", base),
        "gopher://old.example/".to_string(),
        "http://expyuzz4wqqyqhjn.onion/".to_string(),
    ];
    let mut c = checker();
    let verdicts = c.are_dead(inputs.as_slice()).unwrap();
    assert_eq!(verdicts.len(), inputs.len());
    assert_eq!(verdicts[&inputs[0]], Verdict::Alive);
    assert_eq!(verdicts[&inputs[1]], Verdict::Alive);
    assert_eq!(verdicts[&inputs[2]].is_dead(), Some(true));
    assert_eq!(verdicts[&inputs[3]], Verdict::Uncertain);
    assert_eq!(verdicts[&inputs[4]], Verdict::Uncertain);
    assert_eq!(c.errors().len(), 1);
}
