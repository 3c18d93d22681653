//! Batch checker: parse, schedule into domain waves, header pass, full-body
//! retry for inconclusive results, classify.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use crate::classify::{classify, DeadReason, Verdict};
use crate::config::CheckerConfig;
use crate::fetch::{CheckTarget, FetchEngine, FetchResult, Phase};
use crate::protocol::Protocol;
use crate::proxy::ProxyContext;
use crate::scheduler;
use crate::transport::{CurlTransport, Transport, TransportError};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Checks URLs for liveness. One checker handles one batch at a time;
/// `errors` and `request_details` describe the most recent batch.
pub struct DeadlinkChecker<T: Transport = CurlTransport> {
    config: CheckerConfig,
    transport: T,
    proxy: Arc<ProxyContext>,
    errors: HashMap<String, String>,
    details: HashMap<String, FetchResult>,
}

impl DeadlinkChecker<CurlTransport> {
    /// Checker on libcurl. Probes the proxy unless `proxy` already knows
    /// its readiness.
    pub fn new(config: CheckerConfig, proxy: Arc<ProxyContext>) -> Self {
        Self::with_transport(config, proxy, CurlTransport::new())
    }
}

impl<T: Transport> DeadlinkChecker<T> {
    pub fn with_transport(config: CheckerConfig, proxy: Arc<ProxyContext>, transport: T) -> Self {
        proxy.ensure_probed(&transport, &config);
        Self {
            config,
            transport,
            proxy,
            errors: HashMap::new(),
            details: HashMap::new(),
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn is_proxy_ready(&self) -> bool {
        self.proxy.is_ready()
    }

    /// Checks a single URL.
    pub fn is_dead(&mut self, url: &str) -> Result<Verdict, CheckError> {
        let mut verdicts = self.are_dead(&[url])?;
        Ok(verdicts.remove(url).unwrap_or(Verdict::Uncertain))
    }

    /// Checks a batch. The result has exactly one entry per distinct input
    /// string, keyed by that string as given.
    pub fn are_dead<S: AsRef<str>>(&mut self, urls: &[S]) -> Result<HashMap<String, Verdict>, CheckError> {
        self.errors.clear();
        self.details.clear();

        let proxy_ready = self.proxy.is_ready();
        let mut verdicts: HashMap<String, Verdict> = HashMap::with_capacity(urls.len());
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for raw in urls.iter().map(AsRef::as_ref) {
            if !seen.insert(raw) {
                continue;
            }
            match CheckTarget::prepare(raw, raw, proxy_ready) {
                Err(e) => {
                    tracing::debug!(url = %raw, "unparseable URL: {}", e);
                    verdicts.insert(raw.to_string(), Verdict::Dead(DeadReason::InvalidUrl(e.to_string())));
                }
                Ok(target) if target.protocol == Protocol::Unsupported => {
                    tracing::debug!(url = %raw, "unsupported URL, not checked");
                    verdicts.insert(raw.to_string(), Verdict::Uncertain);
                }
                Ok(target) => pending.push((target.host_key(), target)),
            }
        }

        let waves = scheduler::schedule(pending, self.config.queue_by_domain);
        let wave_count = waves.len();
        for (index, wave) in waves.into_iter().enumerate() {
            if index > 0 && !self.config.wave_delay().is_zero() {
                std::thread::sleep(self.config.wave_delay());
            }
            tracing::debug!(wave = index + 1, of = wave_count, urls = wave.len(), "checking wave");
            let targets = wave.into_items();
            self.check_wave(&targets, proxy_ready, &mut verdicts)?;
        }

        // A transport that dropped a request leaves its URL undecided.
        for raw in seen {
            verdicts.entry(raw.to_string()).or_insert(Verdict::Uncertain);
        }

        let dead = verdicts.values().filter(|v| v.is_dead() == Some(true)).count();
        let unknown = verdicts.values().filter(|v| v.is_dead().is_none()).count();
        tracing::info!(
            total = verdicts.len(),
            dead,
            unknown,
            waves = wave_count,
            "batch checked"
        );
        Ok(verdicts)
    }

    fn check_wave(
        &mut self,
        targets: &[CheckTarget],
        proxy_ready: bool,
        verdicts: &mut HashMap<String, Verdict>,
    ) -> Result<(), CheckError> {
        let engine = FetchEngine::new(&self.transport, &self.config, &self.proxy);

        let mut retry = Vec::new();
        for (index, result) in engine.fetch_batch(targets, Phase::Header)? {
            let target = &targets[index];
            let verdict = classify(&result, target.protocol, Phase::Header);
            let next_url = if result.effective_url.is_empty() {
                target.sanitized.clone()
            } else {
                result.effective_url.clone()
            };
            self.details.insert(target.requested.clone(), result);

            if verdict != Verdict::Uncertain {
                verdicts.insert(target.requested.clone(), verdict);
                continue;
            }
            match CheckTarget::prepare(&target.requested, &next_url, proxy_ready) {
                Ok(next) if next.protocol != Protocol::Unsupported => retry.push(next),
                _ => {
                    tracing::debug!(url = %target.requested, effective = %next_url, "no retry possible");
                    verdicts.insert(target.requested.clone(), Verdict::Uncertain);
                }
            }
        }
        if retry.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = retry.len(), "retrying with full body");
        for (index, result) in engine.fetch_batch(&retry, Phase::FullBody)? {
            let target = &retry[index];
            let verdict = classify(&result, target.protocol, Phase::FullBody);
            if let Verdict::Dead(reason) = &verdict {
                self.errors.insert(target.requested.clone(), reason.to_string());
            }
            self.details.insert(target.requested.clone(), result);
            verdicts.insert(target.requested.clone(), verdict);
        }
        Ok(())
    }

    /// Reasons for URLs judged dead on a full-body fetch in the last batch.
    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    /// Last fetch result per URL in the last batch (full-body when retried).
    pub fn request_details(&self) -> &HashMap<String, FetchResult> {
        &self.details
    }
}
