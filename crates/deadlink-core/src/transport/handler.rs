//! Easy2 handler for one liveness check. Bodies are discarded unless the
//! request asked to capture them (proxy probe).

/// Upper bound on captured body size; the probe only needs the first page.
const MAX_CAPTURED_BODY: usize = 1024 * 1024;

pub(super) struct CheckHandler {
    capture_body: bool,
    body: Vec<u8>,
}

impl CheckHandler {
    pub(super) fn new(capture_body: bool) -> Self {
        Self {
            capture_body,
            body: Vec::new(),
        }
    }

    pub(super) fn take_body(&mut self) -> Option<Vec<u8>> {
        self.capture_body.then(|| std::mem::take(&mut self.body))
    }
}

impl curl::easy::Handler for CheckHandler {
    fn debug(&mut self, kind: curl::easy::InfoType, data: &[u8]) {
        crate::logging::log_curl_debug(kind, data);
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        if self.capture_body && self.body.len() < MAX_CAPTURED_BODY {
            let room = MAX_CAPTURED_BODY - self.body.len();
            self.body.extend_from_slice(&data[..data.len().min(room)]);
        }
        Ok(data.len())
    }
}
