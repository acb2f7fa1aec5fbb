//! Log file setup
//!
//! The terminal belongs to the UI, so logs go to a file. `RUST_LOG` controls
//! the filter and defaults to `info`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// File name used when no explicit log path is given
pub const LOG_FILE_NAME: &str = "cryptovisual.log";

/// Picks the log path: an explicit path wins, otherwise the cache root
pub fn log_path(explicit: Option<&Path>, cache_root: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| cache_root.map(|root| root.join(LOG_FILE_NAME)))
}

/// Opens `path` for appending, creating parent directories as needed
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Errors raised while setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be opened
    #[error("could not open log file: {0}")]
    Io(#[from] io::Error),

    /// A global subscriber was installed earlier; it stays in place
    #[error("a log subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Installs the global subscriber writing to `path`
///
/// Fails if the file cannot be opened or a subscriber is already installed.
/// In the latter case the first subscriber keeps receiving events.
pub fn init_logging(path: &Path) -> Result<(), LoggingError> {
    let file = open_log_file(path)?;
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| {
            debug!(path = %path.display(), error = %e, "log subscriber already installed");
            LoggingError::AlreadyInstalled(e.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_path_prefers_explicit() {
        let explicit = PathBuf::from("/tmp/custom.log");
        let root = PathBuf::from("/var/cache/cv");
        assert_eq!(
            log_path(Some(explicit.as_path()), Some(root.as_path())),
            Some(explicit.clone())
        );
        assert_eq!(
            log_path(None, Some(root.as_path())),
            Some(root.join(LOG_FILE_NAME))
        );
        assert_eq!(log_path(None, None), None);
    }

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("app.log");

        open_log_file(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        let dir = TempDir::new().unwrap();

        let _ = init_logging(&dir.path().join("first.log"));
        let second = init_logging(&dir.path().join("second.log"));

        assert!(matches!(second, Err(LoggingError::AlreadyInstalled(_))));
    }

    #[test]
    fn test_init_reports_unopenable_file() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending
        let result = init_logging(dir.path());
        assert!(matches!(result, Err(LoggingError::Io(_))));
    }
}
