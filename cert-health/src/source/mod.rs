mod files;
pub mod normalize;
pub mod store;

use health_core::config::ScanConfig;
use health_core::{CertificateRecord, SourceError};
use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;

pub use store::{StoreLocation, StorePath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePath {
  Store(StorePath),
  Filesystem(PathBuf),
}

/// `Cert:\...` (any case) is a certificate store path, anything else is a filesystem path.
pub fn parse_source_path(raw: &str) -> anyhow::Result<SourcePath> {
  let is_store = raw
    .get(..5)
    .is_some_and(|prefix| prefix.eq_ignore_ascii_case("cert:"));
  if is_store {
    return Ok(SourcePath::Store(StorePath::parse(&raw[5..])?));
  }
  Ok(SourcePath::Filesystem(PathBuf::from(raw)))
}

#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
  pub recurse: bool,
  /// Lowercase extensions without a leading dot.
  pub file_types: Vec<String>,
  pub exclusions: Exclusions,
}

impl CollectOptions {
  pub fn from_scan_config(cfg: &ScanConfig) -> Self {
    Self {
      recurse: cfg.recurse,
      file_types: cfg
        .certificate_file_types
        .iter()
        .map(|t| normalize_file_type(t))
        .filter(|t| !t.is_empty())
        .collect(),
      exclusions: Exclusions::new(&cfg.excluded_thumbprints),
    }
  }
}

fn normalize_file_type(t: &str) -> String {
  t.trim()
    .trim_start_matches('*')
    .trim_start_matches('.')
    .to_ascii_lowercase()
}

/// Thumbprints (SHA-1) or SHA-256 fingerprints whose certificates are skipped.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
  fingerprints: HashSet<String>,
}

impl Exclusions {
  pub fn new(entries: &[String]) -> Self {
    Self {
      fingerprints: entries
        .iter()
        .map(|e| canonical_fingerprint(e))
        .filter(|e| !e.is_empty())
        .collect(),
    }
  }

  pub fn matches(&self, record: &CertificateRecord) -> bool {
    self.fingerprints.contains(&canonical_fingerprint(&record.thumbprint))
      || self
        .fingerprints
        .contains(&canonical_fingerprint(&record.fingerprint_sha256))
  }
}

fn canonical_fingerprint(s: &str) -> String {
  s.chars()
    .filter(|c| !c.is_whitespace() && *c != ':')
    .map(|c| c.to_ascii_uppercase())
    .collect()
}

#[derive(Debug, Default)]
pub struct Collected {
  pub records: Vec<CertificateRecord>,
  pub errors: Vec<SourceError>,
  pub excluded: usize,
}

pub(crate) struct Collector<'a> {
  exclusions: &'a Exclusions,
  out: Collected,
}

impl<'a> Collector<'a> {
  fn new(exclusions: &'a Exclusions) -> Self {
    Self {
      exclusions,
      out: Collected::default(),
    }
  }

  pub(crate) fn add_der(&mut self, der: &[u8], location: &str) {
    match normalize::record_from_der(der, location) {
      Ok(record) if self.exclusions.matches(&record) => {
        tracing::debug!(
          thumbprint = %record.thumbprint,
          location = %location,
          "certificate excluded"
        );
        self.out.excluded += 1;
      }
      Ok(record) => self.out.records.push(record),
      Err(e) => self.error(location, format!("{e:#}")),
    }
  }

  pub(crate) fn error(&mut self, location: &str, reason: impl Display) {
    let reason = reason.to_string();
    tracing::warn!(location = %location, reason = %reason, "skipping unreadable certificate source");
    self.out.errors.push(SourceError::new(location, reason));
  }

  fn finish(self) -> Collected {
    self.out
  }
}

/// Visits every path in order. Failures are collected per item and never stop the run.
pub fn collect(paths: &[String], options: &CollectOptions) -> Collected {
  let mut collector = Collector::new(&options.exclusions);

  for raw in paths {
    match parse_source_path(raw) {
      Ok(SourcePath::Store(store)) => store::collect_store(&store, options.recurse, &mut collector),
      Ok(SourcePath::Filesystem(path)) => files::collect_path(&path, options, &mut collector),
      Err(e) => collector.error(raw, format!("{e:#}")),
    }
  }

  let out = collector.finish();
  tracing::info!(
    certificates = out.records.len(),
    errors = out.errors.len(),
    excluded = out.excluded,
    "certificate collection finished"
  );
  out
}
