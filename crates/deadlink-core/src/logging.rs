//! Logging init: file under XDG state dir, or graceful fallback to stderr.
//! libcurl's verbose trace goes to the same sink under [`CURL_TARGET`].

use anyhow::Result;
use curl::easy::InfoType;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Log sink: the log file, or stderr when the file handle cannot be cloned.
enum FileOrStderr {
    File(std::fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

/// Initialize structured logging to `~/.local/state/deadlink/deadlink.log`.
/// Returns Err when the state dir is unwritable; callers fall back to stderr.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("deadlink")?;
    let log_dir = xdg_dirs.get_state_home().join("deadlink");

    fs::create_dir_all(&log_dir)?;
    let log_file_path: PathBuf = log_dir.join("deadlink.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    struct FileMakeWriter(std::fs::File);

    impl<'a> MakeWriter<'a> for FileMakeWriter {
        type Writer = FileOrStderr;

        fn make_writer(&'a self) -> Self::Writer {
            self.0
                .try_clone()
                .map(FileOrStderr::File)
                .unwrap_or(FileOrStderr::Stderr)
        }
    }

    let writer: BoxMakeWriter = BoxMakeWriter::new(FileMakeWriter(file));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!("deadlink logging initialized at {}", log_file_path.display());

    Ok(())
}

/// Stderr-only logging, used when `init_logging` fails.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// `RUST_LOG` when set, else info with debug for the checker engine.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

const DEFAULT_FILTER: &str = "info,deadlink_core=debug";

/// Target of libcurl's verbose output (`verbose = true` in the config).
pub const CURL_TARGET: &str = "deadlink_core::curl";

/// Forwards one libcurl verbose record to the log instead of raw stderr.
/// Text and header lines are logged as-is; payload is only counted.
pub(crate) fn log_curl_debug(kind: InfoType, data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    let line = text.trim_end();
    match kind {
        InfoType::Text => tracing::debug!(target: CURL_TARGET, "* {}", line),
        InfoType::HeaderIn => tracing::debug!(target: CURL_TARGET, "< {}", line),
        InfoType::HeaderOut => tracing::debug!(target: CURL_TARGET, "> {}", line),
        InfoType::DataIn | InfoType::SslDataIn => {
            tracing::trace!(target: CURL_TARGET, bytes = data.len(), "received")
        }
        _ => tracing::trace!(target: CURL_TARGET, bytes = data.len(), "sent"),
    }
}
