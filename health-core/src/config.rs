use crate::report::{FailOn, OutputFormat};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Thresholds the classifier judges every certificate against.
///
/// Callers are expected to keep `critical_days < warning_days` and
/// `critical_key_size < warning_key_size`. Neither is enforced: inverted values
/// still classify deterministically, see [`crate::classifier::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthThresholds {
  #[serde(default = "default_warning_days")]
  pub warning_days: i64,

  #[serde(default = "default_critical_days")]
  pub critical_days: i64,

  #[serde(default = "default_warning_algorithms")]
  pub warning_algorithms: BTreeSet<String>,

  #[serde(default = "default_critical_algorithms")]
  pub critical_algorithms: BTreeSet<String>,

  #[serde(default = "default_critical_key_size")]
  pub critical_key_size: u32,

  #[serde(default = "default_warning_key_size")]
  pub warning_key_size: u32,
}

impl Default for HealthThresholds {
  fn default() -> Self {
    Self {
      warning_days: default_warning_days(),
      critical_days: default_critical_days(),
      warning_algorithms: default_warning_algorithms(),
      critical_algorithms: default_critical_algorithms(),
      critical_key_size: default_critical_key_size(),
      warning_key_size: default_warning_key_size(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  #[serde(default)]
  pub thresholds: HealthThresholds,

  #[serde(default)]
  pub scan: ScanConfig,

  #[serde(default)]
  pub logging: LoggingConfig,

  #[serde(default)]
  pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
  /// Store paths (`Cert:\LocalMachine\My`) or filesystem paths. Empty means the platform default.
  #[serde(default)]
  pub paths: Vec<String>,

  #[serde(default)]
  pub recurse: bool,

  #[serde(default = "default_certificate_file_types")]
  pub certificate_file_types: Vec<String>,

  #[serde(default)]
  pub excluded_thumbprints: Vec<String>,
}

impl Default for ScanConfig {
  fn default() -> Self {
    Self {
      paths: Vec::new(),
      recurse: false,
      certificate_file_types: default_certificate_file_types(),
      excluded_thumbprints: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
  #[serde(default = "default_log_level")]
  pub level: String,

  #[serde(default)]
  pub directory: Option<PathBuf>,

  #[serde(default = "default_retention_days")]
  pub retention_days: u64,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      directory: None,
      retention_days: default_retention_days(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
  #[serde(default)]
  pub format: OutputFormat,

  #[serde(default)]
  pub fail_on: Option<FailOn>,
}

fn default_warning_days() -> i64 {
  60
}

fn default_critical_days() -> i64 {
  30
}

fn default_warning_algorithms() -> BTreeSet<String> {
  BTreeSet::from(["sha1RSA".to_string()])
}

fn default_critical_algorithms() -> BTreeSet<String> {
  BTreeSet::from(["md5RSA".to_string()])
}

fn default_critical_key_size() -> u32 {
  1024
}

fn default_warning_key_size() -> u32 {
  2048
}

fn default_certificate_file_types() -> Vec<String> {
  ["cer", "crt", "pem", "der"]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_retention_days() -> u64 {
  14
}

impl Config {
  /// Reads an explicitly named config file. Missing or malformed files are errors.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = fs::read_to_string(path)
      .with_context(|| format!("read config file {}", path.display()))?;
    let cfg =
      Self::from_toml(&raw).with_context(|| format!("parse config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(cfg)
  }

  pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
    Ok(toml::from_str(raw)?)
  }
}

/// Describes threshold orderings that break the caller invariants.
/// The thresholds are still used as given.
pub fn threshold_warnings(t: &HealthThresholds) -> Vec<String> {
  let mut out = Vec::new();
  if t.critical_days >= t.warning_days {
    out.push(format!(
      "critical_days ({}) should be less than warning_days ({})",
      t.critical_days, t.warning_days
    ));
  }
  if t.critical_key_size >= t.warning_key_size {
    out.push(format!(
      "critical_key_size ({}) should be less than warning_key_size ({})",
      t.critical_key_size, t.warning_key_size
    ));
  }
  out
}
