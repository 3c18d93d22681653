//! Fetch engine: turns check targets into concurrent transport requests for
//! one wave (header phase) or one retry batch (full-body phase).

mod options;
mod target;

pub use options::{
    RequestOptions, BROWSER_HEADERS, DEFAULT_USER_AGENT, FTP_ANONYMOUS_PASSWORD, FTP_ANONYMOUS_USER,
    MEDIA_PLAYER_USER_AGENT,
};
pub use target::CheckTarget;

use serde::Serialize;

use crate::config::CheckerConfig;
use crate::protocol::Protocol;
use crate::proxy::ProxyContext;
use crate::transport::{Transport, TransferOutcome, TransferRequest, TransportError};

/// Which pass a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Metadata only; cheap first pass.
    Header,
    /// Complete response; used when the header pass was inconclusive.
    FullBody,
}

/// Raw transport result for one attempted request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchResult {
    /// The caller's input string this result belongs to.
    pub requested_url: String,
    /// URL actually sent.
    pub sanitized_url: String,
    /// URL after following redirects.
    pub effective_url: String,
    pub status_code: u32,
    pub transport_error_code: u32,
    pub transport_error_message: String,
}

impl FetchResult {
    fn from_outcome(target: &CheckTarget, outcome: TransferOutcome) -> Self {
        Self {
            requested_url: target.requested.clone(),
            sanitized_url: target.sanitized.clone(),
            effective_url: outcome.effective_url,
            status_code: outcome.status_code,
            transport_error_code: outcome.error_code,
            transport_error_message: outcome.error_message,
        }
    }
}

/// Dispatches batches through a transport.
pub struct FetchEngine<'a, T: Transport + ?Sized> {
    transport: &'a T,
    config: &'a CheckerConfig,
    proxy: &'a ProxyContext,
}

impl<'a, T: Transport + ?Sized> FetchEngine<'a, T> {
    pub fn new(transport: &'a T, config: &'a CheckerConfig, proxy: &'a ProxyContext) -> Self {
        Self {
            transport,
            config,
            proxy,
        }
    }

    /// Fetches every supported target concurrently.
    ///
    /// Returns `(index into targets, result)` pairs sorted by index.
    /// Unsupported targets are never dispatched and get no result.
    pub fn fetch_batch(
        &self,
        targets: &[CheckTarget],
        phase: Phase,
    ) -> Result<Vec<(usize, FetchResult)>, TransportError> {
        let proxy_url = self.proxy.proxy_url();
        let proxy_ready = self.proxy.is_ready();

        let mut requests = Vec::with_capacity(targets.len());
        for (id, target) in targets.iter().enumerate() {
            if target.protocol == Protocol::Unsupported {
                tracing::debug!(url = %target.requested, "skipping unsupported URL");
                continue;
            }
            let proxy = (target.onion && proxy_ready).then_some(proxy_url.as_str());
            let options =
                RequestOptions::build(&target.sanitized, target.protocol, phase, proxy, self.config);
            requests.push(TransferRequest { id, options });
        }
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(count = requests.len(), ?phase, "dispatching batch");
        let outcomes = self.transport.execute(&requests)?;

        let mut results: Vec<(usize, FetchResult)> = outcomes
            .into_iter()
            .filter_map(|outcome| {
                let target = targets.get(outcome.id)?;
                Some((outcome.id, FetchResult::from_outcome(target, outcome)))
            })
            .collect();
        results.sort_by_key(|(id, _)| *id);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records requests and answers each with 200 at the requested URL.
    #[derive(Default)]
    struct RecordingTransport {
        seen: RefCell<Vec<TransferRequest>>,
    }

    impl Transport for RecordingTransport {
        fn execute(&self, requests: &[TransferRequest]) -> Result<Vec<TransferOutcome>, TransportError> {
            self.seen.borrow_mut().extend(requests.iter().cloned());
            Ok(requests
                .iter()
                .rev()
                .map(|r| TransferOutcome {
                    id: r.id,
                    effective_url: r.options.url.clone(),
                    status_code: 200,
                    ..Default::default()
                })
                .collect())
        }
    }

    fn targets(urls: &[&str], proxy_ready: bool) -> Vec<CheckTarget> {
        urls.iter()
            .map(|u| CheckTarget::prepare(u, u, proxy_ready).unwrap())
            .collect()
    }

    #[test]
    fn results_are_sorted_and_tied_to_targets() {
        let transport = RecordingTransport::default();
        let config = CheckerConfig::default();
        let proxy = ProxyContext::with_state("127.0.0.1", 9050, false);
        let engine = FetchEngine::new(&transport, &config, &proxy);
        let t = targets(&["http://a.example/", "ftp://b.example/f"], false);

        let results = engine.fetch_batch(&t, Phase::Header).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert_eq!(results[0].1.requested_url, "http://a.example/");
        assert_eq!(results[1].1.sanitized_url, "ftp://b.example/f");
        assert!(transport.seen.borrow().iter().all(|r| r.options.header_only));
    }

    #[test]
    fn unsupported_targets_are_not_dispatched() {
        let transport = RecordingTransport::default();
        let config = CheckerConfig::default();
        let proxy = ProxyContext::with_state("127.0.0.1", 9050, false);
        let engine = FetchEngine::new(&transport, &config, &proxy);
        let t = targets(&["http://expyuzz4wqqyqhjn.onion/", "gopher://old.example/"], false);

        let results = engine.fetch_batch(&t, Phase::FullBody).unwrap();
        assert!(results.is_empty());
        assert!(transport.seen.borrow().is_empty());
    }

    #[test]
    fn onion_routes_through_ready_proxy_only() {
        let transport = RecordingTransport::default();
        let config = CheckerConfig::default();
        let proxy = ProxyContext::with_state("127.0.0.1", 9050, true);
        let engine = FetchEngine::new(&transport, &config, &proxy);
        let t = targets(&["http://expyuzz4wqqyqhjn.onion/", "http://clear.example/"], true);

        engine.fetch_batch(&t, Phase::Header).unwrap();
        let seen = transport.seen.borrow();
        assert_eq!(seen[0].options.proxy.as_deref(), Some("socks5h://127.0.0.1:9050"));
        assert!(seen[1].options.proxy.is_none());
    }

    #[test]
    fn details_serialize_as_flat_record() {
        let result = FetchResult {
            requested_url: "example.com/a".to_string(),
            sanitized_url: "http://example.com/a".to_string(),
            effective_url: "http://example.com/a".to_string(),
            status_code: 200,
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 6);
        assert_eq!(json["status_code"], 200);
        assert_eq!(json["transport_error_message"], "");
    }
}
