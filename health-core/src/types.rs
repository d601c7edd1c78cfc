use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthVerdict {
  #[serde(rename = "OK")]
  Ok,
  Warning,
  Critical,
  /// Only produced on the key-size axis, when the key size could not be determined.
  Unknown,
}

impl HealthVerdict {
  /// Rank used for worst-of rollups: `Ok < Unknown < Warning < Critical`.
  pub fn rank(self) -> u8 {
    match self {
      HealthVerdict::Ok => 0,
      HealthVerdict::Unknown => 1,
      HealthVerdict::Warning => 2,
      HealthVerdict::Critical => 3,
    }
  }
}

impl fmt::Display for HealthVerdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      HealthVerdict::Ok => "OK",
      HealthVerdict::Warning => "Warning",
      HealthVerdict::Critical => "Critical",
      HealthVerdict::Unknown => "Unknown",
    })
  }
}

pub fn worst_verdict(verdicts: impl IntoIterator<Item = HealthVerdict>) -> HealthVerdict {
  verdicts
    .into_iter()
    .max_by_key(|v| v.rank())
    .unwrap_or(HealthVerdict::Ok)
}

/// Normalized certificate attributes, as produced by a certificate source.
///
/// `signature_algorithm` must use the same names (and casing) as the configured
/// algorithm lists; matching is exact. `key_size` is `None` when the source could
/// not determine it, never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
  pub subject: String,
  pub thumbprint: String,
  pub fingerprint_sha256: String,
  pub not_before: DateTime<Utc>,
  pub not_after: DateTime<Utc>,
  pub signature_algorithm: String,
  pub key_size: Option<u32>,
  pub source_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateHealthReport {
  #[serde(flatten)]
  pub certificate: CertificateRecord,
  pub validity_period_status: HealthVerdict,
  pub validity_period_message: String,
  pub algorithm_status: HealthVerdict,
  pub algorithm_message: String,
  pub key_size_status: HealthVerdict,
  pub key_size_message: String,
}

/// A certificate, file or store that could not be read. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
  pub location: String,
  pub reason: String,
}

impl SourceError {
  pub fn new(location: impl Into<String>, reason: impl Into<String>) -> Self {
    Self {
      location: location.into(),
      reason: reason.into(),
    }
  }
}
