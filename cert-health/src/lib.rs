pub mod cli;
pub mod source;

use anyhow::Context;
use chrono::Utc;
use health_core::config::{self, Config};
use health_core::{classify_all, logging, report, FailOn, Report};
use std::process::ExitCode;

/// Exit status when `--fail-on` is set and a certificate reaches that level.
pub const EXIT_UNHEALTHY: u8 = 2;

pub fn run(args: &[String]) -> anyhow::Result<ExitCode> {
  let cli = cli::parse_args(args)?;
  if cli.help {
    cli::print_help();
    return Ok(ExitCode::SUCCESS);
  }

  let mut cfg = match &cli.config {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };
  cli.apply(&mut cfg);

  logging::init(
    &cfg.logging.level,
    cfg.logging.directory.as_deref(),
    cfg.logging.retention_days,
  )
  .context("initialize logging")?;

  for reason in config::threshold_warnings(&cfg.thresholds) {
    tracing::warn!(reason = %reason, "inverted thresholds; classifying as configured");
  }

  let paths = if cfg.scan.paths.is_empty() {
    default_paths()
  } else {
    cfg.scan.paths.clone()
  };
  tracing::info!(paths = ?paths, recurse = cfg.scan.recurse, "scanning certificates");

  let options = source::CollectOptions::from_scan_config(&cfg.scan);
  let collected = source::collect(&paths, &options);

  // One `now` for the whole batch so every certificate is judged against the same instant.
  let now = Utc::now();
  let certificates = classify_all(collected.records, &cfg.thresholds, now);
  let report = Report::new(now, certificates, collected.errors, collected.excluded);

  let stdout = std::io::stdout();
  report::render(&report, cfg.output.format, &mut stdout.lock()).context("write report")?;

  let status = exit_status(&report, cfg.output.fail_on);
  if status == EXIT_UNHEALTHY {
    tracing::info!(overall = %report.overall_status(), "unhealthy certificates found");
  }
  Ok(ExitCode::from(status))
}

/// 0, or [`EXIT_UNHEALTHY`] when `fail_on` is set and the report reaches it.
pub fn exit_status(report: &Report, fail_on: Option<FailOn>) -> u8 {
  match fail_on {
    Some(level) if report.fails(level) => EXIT_UNHEALTHY,
    _ => 0,
  }
}

pub fn default_paths() -> Vec<String> {
  #[cfg(windows)]
  {
    vec![r"Cert:\LocalMachine\My".to_string()]
  }
  #[cfg(not(windows))]
  {
    vec!["/etc/ssl/certs".to_string()]
  }
}
