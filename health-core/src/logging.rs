use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_FILE_NAME: &str = "cert-health.log";

const SECS_PER_DAY: u64 = 24 * 60 * 60;

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logs go to stderr so reports on stdout stay machine-readable. When `log_dir`
/// is set, a daily rolling file is written there as well.
pub fn init(level: &str, log_dir: Option<&Path>, retention_days: u64) -> anyhow::Result<()> {
  let filter = tracing_subscriber::EnvFilter::try_new(level)
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

  let stderr_layer = tracing_subscriber::fmt::layer()
    .with_ansi(false)
    .with_writer(std::io::stderr)
    .with_target(false);

  let mut removed = 0;
  let file_layer = match log_dir {
    Some(dir) => {
      fs::create_dir_all(dir)?;
      removed = remove_expired_logs(dir, retention_days, SystemTime::now());

      let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
      let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
      let _ = FILE_GUARD.set(guard);

      Some(
        tracing_subscriber::fmt::layer()
          .with_ansi(false)
          .with_writer(file_writer)
          .with_target(true),
      )
    }
    None => None,
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(stderr_layer)
    .with(file_layer)
    .try_init()?;

  if let Some(dir) = log_dir {
    tracing::debug!(dir = %dir.display(), removed, retention_days, "file logging enabled");
  }
  Ok(())
}

/// Deletes our rotated log files last modified before the retention window.
/// `retention_days == 0` keeps everything. Entries that cannot be inspected are left alone.
fn remove_expired_logs(log_dir: &Path, retention_days: u64, now: SystemTime) -> usize {
  if retention_days == 0 {
    return 0;
  }
  let window = Duration::from_secs(retention_days.saturating_mul(SECS_PER_DAY));
  let cutoff = now.checked_sub(window).unwrap_or(SystemTime::UNIX_EPOCH);

  let Ok(entries) = fs::read_dir(log_dir) else {
    return 0;
  };
  entries
    .flatten()
    .map(|entry| entry.path())
    .filter(|path| is_own_log_file(path))
    .filter(|path| {
      fs::metadata(path)
        .and_then(|m| m.modified())
        .is_ok_and(|modified| modified < cutoff)
    })
    .filter(|path| fs::remove_file(path).is_ok())
    .count()
}

/// `cert-health.log` itself or a dated rotation such as `cert-health.log.2026-03-01`.
fn is_own_log_file(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .and_then(|n| n.strip_prefix(LOG_FILE_NAME))
    .is_some_and(|suffix| suffix.is_empty() || suffix.starts_with('.'))
}
