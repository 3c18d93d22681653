//! Curl multi backend: single-threaded event loop, one Easy2 per request.
//!
//! All requests of a batch are added up front; the loop performs, collects
//! finished transfers, and waits on the sockets until every handle is done.

use std::os::raw::c_long;
use std::time::Duration;

use curl::easy::{Easy2, List};
use curl::multi::{Easy2Handle, Multi};

use super::handler::CheckHandler;
use super::{Transport, TransferOutcome, TransferRequest, TransportError};
use crate::fetch::RequestOptions;

const MAX_REDIRECTS: u32 = 20;

/// `CURLFTPMETHOD_SINGLECWD`: one CWD to the full directory, then RETR.
const FTP_METHOD_SINGLECWD: c_long = 3;

/// Transport backed by one libcurl multi handle per batch.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    /// Longest time to block in `wait` before performing again.
    poll_interval: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for CurlTransport {
    fn execute(&self, requests: &[TransferRequest]) -> Result<Vec<TransferOutcome>, TransportError> {
        let multi = Multi::new();
        let mut outcomes = Vec::with_capacity(requests.len());
        let mut active: Vec<(Easy2Handle<CheckHandler>, usize)> = Vec::with_capacity(requests.len());

        for request in requests {
            match configure(&request.options) {
                Ok(easy) => {
                    let handle = multi
                        .add2(easy)
                        .map_err(|source| TransportError::Multi { op: "add", source })?;
                    active.push((handle, request.id));
                }
                Err(e) => {
                    tracing::debug!(url = %request.options.url, "request rejected before dispatch: {}", e);
                    outcomes.push(rejected(request, &e));
                }
            }
        }

        while !active.is_empty() {
            let running = multi
                .perform()
                .map_err(|source| TransportError::Multi { op: "perform", source })?;

            let mut completed: Vec<(usize, Result<(), curl::Error>)> = Vec::new();
            multi.messages(|msg| {
                for (i, (handle, _)) in active.iter().enumerate() {
                    if let Some(result) = msg.result_for2(handle) {
                        completed.push((i, result));
                        break;
                    }
                }
            });
            completed.sort_by(|a, b| b.0.cmp(&a.0));
            for (i, result) in completed {
                let (handle, id) = active.remove(i);
                let mut easy = multi
                    .remove2(handle)
                    .map_err(|source| TransportError::Multi { op: "remove", source })?;
                outcomes.push(outcome_from_easy(id, &mut easy, result));
            }

            if running > 0 {
                multi
                    .wait(&mut [], self.poll_interval)
                    .map_err(|source| TransportError::Multi { op: "wait", source })?;
            }
        }

        Ok(outcomes)
    }
}

/// Applies request options to a fresh Easy2 handle.
fn configure(opts: &RequestOptions) -> Result<Easy2<CheckHandler>, curl::Error> {
    let mut easy = Easy2::new(CheckHandler::new(opts.capture_body));
    easy.url(&opts.url)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTS)?;
    easy.autoreferer(true)?;
    // Empty file name: in-memory cookie engine, nothing written to disk.
    easy.cookie_file("")?;
    easy.timeout(opts.timeout)?;
    easy.useragent(&opts.user_agent)?;
    easy.ssl_verify_peer(opts.verify_tls)?;
    easy.ssl_verify_host(opts.verify_tls)?;
    easy.nobody(opts.header_only)?;
    easy.verbose(opts.verbose)?;

    if !opts.headers.is_empty() {
        let mut list = List::new();
        for header in &opts.headers {
            list.append(header)?;
        }
        easy.http_headers(list)?;
    }
    if let Some((user, pass)) = &opts.credentials {
        easy.username(user)?;
        easy.password(pass)?;
    }
    if opts.ftp_single_cwd {
        set_ftp_options(&easy)?;
    }
    if opts.accept_encoding {
        // Empty string: every encoding libcurl was built with.
        easy.accept_encoding("")?;
    }
    if let Some(proxy) = &opts.proxy {
        easy.proxy(proxy)?;
    }
    Ok(easy)
}

fn set_ftp_options(easy: &Easy2<CheckHandler>) -> Result<(), curl::Error> {
    let options = [
        (curl_sys::CURLOPT_FTP_USE_EPRT, 1),
        (curl_sys::CURLOPT_FTP_USE_EPSV, 1),
        (curl_sys::CURLOPT_FTP_FILEMETHOD, FTP_METHOD_SINGLECWD),
    ];
    for (option, value) in options {
        // Long-valued options on a live handle owned by `easy`.
        let rc = unsafe { curl_sys::curl_easy_setopt(easy.raw(), option, value) };
        if rc != curl_sys::CURLE_OK {
            return Err(curl::Error::new(rc));
        }
    }
    Ok(())
}

fn outcome_from_easy(
    id: usize,
    easy: &mut Easy2<CheckHandler>,
    result: Result<(), curl::Error>,
) -> TransferOutcome {
    let status_code = easy.response_code().unwrap_or(0);
    let effective_url = easy
        .effective_url()
        .ok()
        .flatten()
        .map(str::to_string)
        .unwrap_or_default();
    let (error_code, error_message) = match result {
        Ok(()) => (0, String::new()),
        Err(e) => (e.code() as u32, error_text(&e)),
    };
    TransferOutcome {
        id,
        effective_url,
        status_code,
        error_code,
        error_message,
        body: easy.get_mut().take_body(),
    }
}

fn rejected(request: &TransferRequest, e: &curl::Error) -> TransferOutcome {
    TransferOutcome {
        id: request.id,
        effective_url: request.options.url.clone(),
        status_code: 0,
        error_code: e.code() as u32,
        error_message: error_text(e),
        body: None,
    }
}

/// libcurl's detailed message when it left one, else the generic one.
fn error_text(e: &curl::Error) -> String {
    e.extra_description()
        .unwrap_or_else(|| e.description())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RequestOptions;

    fn options(url: &str) -> RequestOptions {
        RequestOptions {
            url: url.to_string(),
            header_only: true,
            timeout: Duration::from_secs(5),
            user_agent: "test-agent".to_string(),
            headers: Vec::new(),
            credentials: None,
            ftp_single_cwd: false,
            accept_encoding: false,
            proxy: None,
            verify_tls: false,
            capture_body: false,
            verbose: false,
        }
    }

    #[test]
    fn empty_batch_returns_no_outcomes() {
        let outcomes = CurlTransport::new().execute(&[]).unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn configure_accepts_full_option_set() {
        let mut opts = options("https://example.com/");
        opts.header_only = false;
        opts.headers = vec!["Accept-Language: en-us,en;q=0.5".to_string()];
        opts.credentials = Some(("anonymous".to_string(), "anonymous@domain.com".to_string()));
        opts.accept_encoding = true;
        opts.proxy = Some("socks5h://127.0.0.1:9050".to_string());
        assert!(configure(&opts).is_ok());
    }

    #[test]
    fn configure_accepts_ftp_options() {
        let mut opts = options("ftp://ftp.example.org/pub/file.iso");
        opts.ftp_single_cwd = true;
        assert!(configure(&opts).is_ok());
    }

    #[test]
    fn refused_connection_is_a_per_request_error() {
        // Bind then drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let request = TransferRequest {
            id: 7,
            options: options(&format!("http://127.0.0.1:{port}/")),
        };
        let outcomes = CurlTransport::new().execute(&[request]).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].id, 7);
        assert_eq!(outcomes[0].status_code, 0);
        assert_eq!(outcomes[0].error_code, 7, "CURLE_COULDNT_CONNECT");
        assert!(!outcomes[0].error_message.is_empty());
    }
}
