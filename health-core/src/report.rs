use crate::types::{worst_verdict, CertificateHealthReport, HealthVerdict, SourceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl FromStr for OutputFormat {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      _ => Err(anyhow::anyhow!("unknown output format `{s}` (expected text|json)")),
    }
  }
}

/// Exit-status policy: fail the run when any certificate is at least this bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
  Warning,
  Critical,
}

impl FailOn {
  fn threshold(self) -> HealthVerdict {
    match self {
      FailOn::Warning => HealthVerdict::Warning,
      FailOn::Critical => HealthVerdict::Critical,
    }
  }
}

impl FromStr for FailOn {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "warning" => Ok(Self::Warning),
      "critical" => Ok(Self::Critical),
      _ => Err(anyhow::anyhow!("unknown fail-on level `{s}` (expected warning|critical)")),
    }
  }
}

impl CertificateHealthReport {
  /// Worst verdict across the three axes. The classifier itself never rolls axes up.
  pub fn overall_status(&self) -> HealthVerdict {
    worst_verdict([
      self.validity_period_status,
      self.algorithm_status,
      self.key_size_status,
    ])
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
  pub ok: usize,
  pub warning: usize,
  pub critical: usize,
  pub unknown: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
  pub generated_at: DateTime<Utc>,
  pub certificates: Vec<CertificateHealthReport>,
  pub errors: Vec<SourceError>,
  pub excluded: usize,
  pub summary: Summary,
}

impl Report {
  pub fn new(
    generated_at: DateTime<Utc>,
    certificates: Vec<CertificateHealthReport>,
    errors: Vec<SourceError>,
    excluded: usize,
  ) -> Self {
    let mut summary = Summary::default();
    for c in &certificates {
      match c.overall_status() {
        HealthVerdict::Ok => summary.ok += 1,
        HealthVerdict::Warning => summary.warning += 1,
        HealthVerdict::Critical => summary.critical += 1,
        HealthVerdict::Unknown => summary.unknown += 1,
      }
    }
    Self {
      generated_at,
      certificates,
      errors,
      excluded,
      summary,
    }
  }

  pub fn overall_status(&self) -> HealthVerdict {
    worst_verdict(self.certificates.iter().map(|c| c.overall_status()))
  }

  pub fn fails(&self, level: FailOn) -> bool {
    self.overall_status().rank() >= level.threshold().rank()
  }
}

pub fn render(report: &Report, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<()> {
  match format {
    OutputFormat::Text => render_text(report, out)?,
    OutputFormat::Json => {
      serde_json::to_writer_pretty(&mut *out, report)?;
      writeln!(out)?;
    }
  }
  out.flush()?;
  Ok(())
}

fn render_text(report: &Report, out: &mut impl Write) -> std::io::Result<()> {
  for c in &report.certificates {
    let cert = &c.certificate;
    writeln!(out, "[{}] {}", c.overall_status(), cert.subject)?;
    writeln!(out, "  thumbprint: {}", cert.thumbprint)?;
    writeln!(out, "  location:   {}", cert.source_location)?;
    writeln!(
      out,
      "  valid:      {} .. {}",
      cert.not_before.format("%Y-%m-%d %H:%M:%S UTC"),
      cert.not_after.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
      out,
      "  validity:   {} - {}",
      c.validity_period_status, c.validity_period_message
    )?;
    writeln!(
      out,
      "  algorithm:  {} - {}",
      c.algorithm_status, c.algorithm_message
    )?;
    writeln!(
      out,
      "  key size:   {} - {}",
      c.key_size_status, c.key_size_message
    )?;
    writeln!(out)?;
  }

  for e in &report.errors {
    writeln!(out, "[Error] {}: {}", e.location, e.reason)?;
  }
  if !report.errors.is_empty() {
    writeln!(out)?;
  }

  let s = &report.summary;
  writeln!(
    out,
    "{} certificates: {} OK, {} Warning, {} Critical, {} Unknown; {} errors, {} excluded",
    report.certificates.len(),
    s.ok,
    s.warning,
    s.critical,
    s.unknown,
    report.errors.len(),
    report.excluded
  )
}
