//! Console and file logging.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directives for a `-v` count.
pub fn filter_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "gallery_telegram=info,gallery_core=info,teloxide=warn",
        1 => "gallery_telegram=debug,gallery_core=debug,teloxide=info",
        2 => "gallery_telegram=trace,gallery_core=trace,teloxide=debug",
        _ => "trace",
    }
}

/// Log file name for a start time.
pub fn log_file_name(started: chrono::DateTime<chrono::Local>) -> String {
    format!("bot_{}.log", started.format("%Y-%m-%d_%H-%M-%S"))
}

fn open_log_file() -> std::io::Result<(File, PathBuf)> {
    let dir = gallery_core::logs_dir();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(log_file_name(chrono::Local::now()));
    let file = File::create(&path)?;
    Ok((file, path))
}

/// Install the global subscriber: stdout plus a per-run log file.
///
/// Returns the log file path, or `None` when only stdout is logging.
pub fn init_logging(verbose: u8) -> Option<PathBuf> {
    let filter = EnvFilter::try_new(filter_for(verbose)).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, path, file_error) = match open_log_file() {
        Ok((file, path)) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            Some(path),
            None,
        ),
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(error = %e, "Failed to open log file, logging to stdout only");
    }
    path
}
