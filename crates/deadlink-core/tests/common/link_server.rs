//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed route table; every connection handles one request and is
//! closed. Unknown paths get 404.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum Route {
    /// 200 with a small HTML body.
    Page,
    /// Fixed status for HEAD and GET.
    Status(u16),
    /// HEAD answered with 405, GET with 200 (servers that block HEAD).
    HeadBlocked,
    /// 302 to the given path on the same server.
    Redirect(&'static str),
}

const BODY: &str = "<html><body>still here</body></html>";

/// Starts the server on a free port and returns its base URL without a
/// trailing slash (e.g. "http://127.0.0.1:12345"). Runs until the process exits.
pub fn start(routes: &[(&'static str, Route)]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<&'static str, Route>> = Arc::new(routes.iter().copied().collect());
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn handle(mut stream: std::net::TcpStream, routes: &HashMap<&'static str, Route>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/");
    let head = method.eq_ignore_ascii_case("HEAD");

    let response = match routes.get(path).copied() {
        Some(Route::Page) => response("200 OK", "", head),
        Some(Route::Status(code)) => response(&format!("{} Status", code), "", head),
        Some(Route::HeadBlocked) if head => response("405 Method Not Allowed", "", true),
        Some(Route::HeadBlocked) => response("200 OK", "", false),
        Some(Route::Redirect(to)) => response("302 Found", &format!("Location: {}\r\n", to), head),
        None => response("404 Not Found", "", head),
    };
    let _ = stream.write_all(response.as_bytes());
}

fn response(status: &str, extra_headers: &str, head: bool) -> String {
    let body = if head { "" } else { BODY };
    format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        status,
        BODY.len(),
        extra_headers,
        body
    )
}
