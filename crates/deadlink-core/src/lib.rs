//! Concurrent dead-link checking over HTTP(S), FTP, RTSP and MMS.
//!
//! `DeadlinkChecker` is the entry point: it repairs and sanitizes input URLs,
//! spreads them over per-host waves, runs a cheap header pass and retries
//! inconclusive results with a full fetch before deciding.

pub mod checker;
pub mod classify;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod protocol;
pub mod proxy;
pub mod scheduler;
pub mod transport;
pub mod url_model;

pub use checker::{CheckError, DeadlinkChecker};
pub use classify::{DeadReason, Verdict};
pub use config::CheckerConfig;
pub use fetch::FetchResult;
pub use proxy::ProxyContext;
