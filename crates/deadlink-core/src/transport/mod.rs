//! Transport collaborator: runs a batch of prepared requests concurrently and
//! reports, per request, where it ended up and how.
//!
//! The checker only depends on the `Transport` trait. `CurlTransport` is the
//! libcurl multi-handle implementation used in production; tests plug in
//! scripted transports.

mod handler;
mod multi;

pub use multi::CurlTransport;

use thiserror::Error;

use crate::fetch::RequestOptions;

/// One request in a batch. `id` ties the outcome back to the caller's entry.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub id: usize,
    pub options: RequestOptions,
}

/// What the transport observed for one request.
///
/// `status_code` is 0 when no response arrived. `error_code` is the libcurl
/// result code (0 on success) and `error_message` its text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    pub id: usize,
    pub effective_url: String,
    pub status_code: u32,
    pub error_code: u32,
    pub error_message: String,
    /// Response body, only when the request set `capture_body`.
    pub body: Option<Vec<u8>>,
}

/// Batch-level transport failure. Per-request failures are reported inside
/// `TransferOutcome` instead.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("curl multi {op}: {source}")]
    Multi {
        op: &'static str,
        #[source]
        source: curl::MultiError,
    },
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Executes every request of a batch and returns one outcome per request,
/// in completion order.
pub trait Transport {
    fn execute(&self, requests: &[TransferRequest]) -> Result<Vec<TransferOutcome>, TransportError>;
}
