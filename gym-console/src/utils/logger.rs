//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "gym-console";

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` takes precedence over `log_level` when set. Calling this more
/// than once keeps the first subscriber.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = json.unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    // Add file output if log_dir is provided
    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, LOG_FILE_PREFIX);
            let builder = builder.with_ansi(false).with_writer(file_appender);
            let result = if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            if result.is_err() {
                tracing::debug!("Logger already initialized");
            }
            return;
        }
    }

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("Logger already initialized");
    }
}

/// Clean up rolled log files older than `days`
///
/// Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &str, days: u64) -> std::io::Result<usize> {
    let max_age = Duration::from_secs(days * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::info!(removed, log_dir, "Removed old log files");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_keeps_fresh_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gym-console.2025-01-01"), "x").unwrap();
        std::fs::write(dir.path().join("other.log"), "x").unwrap();

        let removed = cleanup_old_logs(dir.path().to_str().unwrap(), 7).unwrap();
        assert_eq!(removed, 0);
        assert!(dir.path().join("gym-console.2025-01-01").exists());
        assert!(dir.path().join("other.log").exists());
    }

    #[test]
    fn test_cleanup_removes_everything_at_zero_days() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gym-console.2025-01-01"), "x").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let removed = cleanup_old_logs(dir.path().to_str().unwrap(), 0).unwrap();
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_init_logger_twice_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        init_logger_with_file(Some("debug"), Some(false), dir.path().to_str());
        init_logger();
    }
}
