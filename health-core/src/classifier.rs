//! Health classification of a single certificate along three independent axes.
//!
//! Day counts are whole days of `not_after - now`, truncated toward zero: a
//! certificate expiring in 36 hours "expires in 1 day", one that expired 36 hours
//! ago "expired 1 day ago".

use crate::config::HealthThresholds;
use crate::types::{CertificateHealthReport, CertificateRecord, HealthVerdict};
use chrono::{DateTime, TimeDelta, Utc};

/// Classifies one certificate. Pure and total: the same inputs always produce the
/// same report, whatever the thresholds look like.
pub fn classify(
  record: CertificateRecord,
  thresholds: &HealthThresholds,
  now: DateTime<Utc>,
) -> CertificateHealthReport {
  let (validity_period_status, validity_period_message) =
    validity_period_health(record.not_after, thresholds, now);
  let (algorithm_status, algorithm_message) =
    algorithm_health(&record.signature_algorithm, thresholds);
  let (key_size_status, key_size_message) = key_size_health(record.key_size, thresholds);

  CertificateHealthReport {
    certificate: record,
    validity_period_status,
    validity_period_message,
    algorithm_status,
    algorithm_message,
    key_size_status,
    key_size_message,
  }
}

/// Classifies a batch against a single `now`, keeping input order.
pub fn classify_all(
  records: impl IntoIterator<Item = CertificateRecord>,
  thresholds: &HealthThresholds,
  now: DateTime<Utc>,
) -> Vec<CertificateHealthReport> {
  records
    .into_iter()
    .map(|r| classify(r, thresholds, now))
    .collect()
}

// Conditions are checked in order and the first match wins. With inverted
// thresholds the Warning range is simply empty.
fn validity_period_health(
  not_after: DateTime<Utc>,
  t: &HealthThresholds,
  now: DateTime<Utc>,
) -> (HealthVerdict, String) {
  let days = (not_after - now).num_days();

  if not_after > shift_days(now, t.warning_days) {
    (
      HealthVerdict::Ok,
      format!("Certificate expires in {}", day_count(days)),
    )
  } else if not_after > shift_days(now, t.critical_days) {
    (
      HealthVerdict::Warning,
      format!("Certificate is expiring in {}", day_count(days)),
    )
  } else if not_after > now {
    (
      HealthVerdict::Critical,
      format!("Certificate is expiring in {}", day_count(days)),
    )
  } else {
    (
      HealthVerdict::Critical,
      format!("Certificate expired {} ago", day_count(days.abs())),
    )
  }
}

fn algorithm_health(algorithm: &str, t: &HealthThresholds) -> (HealthVerdict, String) {
  if t.critical_algorithms.contains(algorithm) {
    (
      HealthVerdict::Critical,
      format!("Signature algorithm {algorithm} is considered vulnerable"),
    )
  } else if t.warning_algorithms.contains(algorithm) {
    (
      HealthVerdict::Warning,
      format!("Signature algorithm {algorithm} is deprecated"),
    )
  } else {
    (
      HealthVerdict::Ok,
      format!("Signature algorithm {algorithm} is acceptable"),
    )
  }
}

fn key_size_health(key_size: Option<u32>, t: &HealthThresholds) -> (HealthVerdict, String) {
  let Some(bits) = key_size else {
    return (HealthVerdict::Unknown, "Key size is unknown".to_string());
  };

  if bits < t.critical_key_size {
    (
      HealthVerdict::Critical,
      format!(
        "Key size {bits} bits is below the minimum of {} bits",
        t.critical_key_size
      ),
    )
  } else if bits < t.warning_key_size {
    (
      HealthVerdict::Warning,
      format!(
        "Key size {bits} bits is below the recommended {} bits",
        t.warning_key_size
      ),
    )
  } else {
    (
      HealthVerdict::Ok,
      format!(
        "Key size {bits} bits meets the recommended {} bits",
        t.warning_key_size
      ),
    )
  }
}

/// `now + days`, saturating at the representable range.
fn shift_days(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
  TimeDelta::try_days(days)
    .and_then(|d| now.checked_add_signed(d))
    .unwrap_or(if days < 0 {
      DateTime::<Utc>::MIN_UTC
    } else {
      DateTime::<Utc>::MAX_UTC
    })
}

fn day_count(days: i64) -> String {
  if days == 1 {
    "1 day".to_string()
  } else {
    format!("{days} days")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use std::collections::BTreeSet;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
  }

  fn record(not_after: DateTime<Utc>, algorithm: &str, key_size: Option<u32>) -> CertificateRecord {
    CertificateRecord {
      subject: "CN=test.example".to_string(),
      thumbprint: "3381A4D7".to_string(),
      fingerprint_sha256: "bb4779ee".to_string(),
      not_before: not_after - TimeDelta::days(365),
      not_after,
      signature_algorithm: algorithm.to_string(),
      key_size,
      source_location: "/etc/ssl/certs/test.pem".to_string(),
    }
  }

  fn in_days(days: i64) -> DateTime<Utc> {
    now() + TimeDelta::days(days)
  }

  fn validity(not_after: DateTime<Utc>, t: &HealthThresholds) -> (HealthVerdict, String) {
    let r = classify(record(not_after, "sha256RSA", Some(2048)), t, now());
    (r.validity_period_status, r.validity_period_message)
  }

  #[test]
  fn far_expiry_is_ok_with_days_remaining() {
    let (status, msg) = validity(in_days(400), &HealthThresholds::default());
    assert_eq!(status, HealthVerdict::Ok);
    assert_eq!(msg, "Certificate expires in 400 days");
  }

  #[test]
  fn one_day_inside_warning_window_is_warning() {
    for (warning, critical) in [(60, 30), (10, 0), (365, 100), (3, 1)] {
      let t = HealthThresholds {
        warning_days: warning,
        critical_days: critical,
        ..HealthThresholds::default()
      };
      let (status, _) = validity(in_days(warning - 1), &t);
      assert_eq!(status, HealthVerdict::Warning, "warning={warning} critical={critical}");
    }
  }

  #[test]
  fn validity_boundaries_are_inclusive_on_the_severe_side() {
    let t = HealthThresholds::default();
    assert_eq!(validity(in_days(60), &t).0, HealthVerdict::Warning);
    assert_eq!(
      validity(in_days(60) + TimeDelta::seconds(1), &t).0,
      HealthVerdict::Ok
    );
    assert_eq!(validity(in_days(30), &t).0, HealthVerdict::Critical);
    assert_eq!(
      validity(in_days(30) + TimeDelta::seconds(1), &t).0,
      HealthVerdict::Warning
    );
  }

  #[test]
  fn expiring_soon_is_critical_with_expiring_wording() {
    let (status, msg) = validity(in_days(10), &HealthThresholds::default());
    assert_eq!(status, HealthVerdict::Critical);
    assert_eq!(msg, "Certificate is expiring in 10 days");
  }

  #[test]
  fn not_after_equal_to_now_counts_as_expired() {
    let (status, msg) = validity(now(), &HealthThresholds::default());
    assert_eq!(status, HealthVerdict::Critical);
    assert_eq!(msg, "Certificate expired 0 days ago");
  }

  #[test]
  fn expired_certificate_reports_absolute_days() {
    let (status, msg) = validity(in_days(-5), &HealthThresholds::default());
    assert_eq!(status, HealthVerdict::Critical);
    assert_eq!(msg, "Certificate expired 5 days ago");
    assert!(!msg.contains("expiring"));
  }

  #[test]
  fn partial_days_truncate_toward_zero() {
    let t = HealthThresholds::default();
    let (_, msg) = validity(now() + TimeDelta::hours(36), &t);
    assert_eq!(msg, "Certificate is expiring in 1 day");
    let (_, msg) = validity(now() - TimeDelta::hours(36), &t);
    assert_eq!(msg, "Certificate expired 1 day ago");
    let (status, msg) = validity(now() + TimeDelta::hours(5), &t);
    assert_eq!(status, HealthVerdict::Critical);
    assert_eq!(msg, "Certificate is expiring in 0 days");
  }

  #[test]
  fn inverted_day_thresholds_follow_ordered_evaluation() {
    let t = HealthThresholds {
      warning_days: 10,
      critical_days: 30,
      ..HealthThresholds::default()
    };
    // The Warning range is empty: anything not beyond 10 days is Critical.
    assert_eq!(validity(in_days(20), &t).0, HealthVerdict::Ok);
    assert_eq!(validity(in_days(11), &t).0, HealthVerdict::Ok);
    assert_eq!(validity(in_days(10), &t).0, HealthVerdict::Critical);
    assert_eq!(validity(in_days(5), &t).0, HealthVerdict::Critical);
    assert_eq!(validity(in_days(-5), &t).0, HealthVerdict::Critical);

    let equal = HealthThresholds {
      warning_days: 30,
      critical_days: 30,
      ..HealthThresholds::default()
    };
    assert_eq!(validity(in_days(30), &equal).0, HealthVerdict::Critical);
    assert_eq!(validity(in_days(31), &equal).0, HealthVerdict::Ok);
  }

  #[test]
  fn extreme_day_thresholds_do_not_panic() {
    let t = HealthThresholds {
      warning_days: i64::MAX,
      critical_days: i64::MIN,
      ..HealthThresholds::default()
    };
    assert_eq!(validity(in_days(10_000), &t).0, HealthVerdict::Warning);
    assert_eq!(validity(in_days(-1), &t).0, HealthVerdict::Warning);
  }

  #[test]
  fn algorithm_defaults() {
    let t = HealthThresholds::default();
    let status = |alg: &str| classify(record(in_days(400), alg, Some(2048)), &t, now()).algorithm_status;
    assert_eq!(status("md5RSA"), HealthVerdict::Critical);
    assert_eq!(status("sha1RSA"), HealthVerdict::Warning);
    assert_eq!(status("sha256RSA"), HealthVerdict::Ok);
    assert_eq!(status("1.2.3.4.5"), HealthVerdict::Ok);
  }

  #[test]
  fn algorithm_matching_is_exact_and_critical_wins() {
    let t = HealthThresholds {
      warning_algorithms: BTreeSet::from(["sha1RSA".to_string()]),
      critical_algorithms: BTreeSet::from(["sha1RSA".to_string()]),
      ..HealthThresholds::default()
    };
    let r = classify(record(in_days(400), "sha1RSA", Some(2048)), &t, now());
    assert_eq!(r.algorithm_status, HealthVerdict::Critical);
    assert_eq!(r.algorithm_message, "Signature algorithm sha1RSA is considered vulnerable");

    let defaults = HealthThresholds::default();
    let r = classify(record(in_days(400), "SHA1RSA", Some(2048)), &defaults, now());
    assert_eq!(r.algorithm_status, HealthVerdict::Ok);
  }

  #[test]
  fn key_size_partition() {
    let t = HealthThresholds::default();
    let key = |bits: Option<u32>| {
      let r = classify(record(in_days(400), "sha256RSA", bits), &t, now());
      (r.key_size_status, r.key_size_message)
    };

    assert_eq!(key(None), (HealthVerdict::Unknown, "Key size is unknown".to_string()));
    assert_eq!(key(Some(1023)).0, HealthVerdict::Critical);
    assert_eq!(key(Some(1024)).0, HealthVerdict::Warning);
    assert_eq!(key(Some(2047)).0, HealthVerdict::Warning);
    assert_eq!(key(Some(2048)).0, HealthVerdict::Ok);
    assert_eq!(key(Some(0)).0, HealthVerdict::Critical);
    assert_eq!(
      key(Some(1023)).1,
      "Key size 1023 bits is below the minimum of 1024 bits"
    );
    assert_eq!(
      key(Some(1024)).1,
      "Key size 1024 bits is below the recommended 2048 bits"
    );
  }

  #[test]
  fn unknown_key_size_ignores_other_fields() {
    let t = HealthThresholds::default();
    for (days, alg) in [(-30, "md5RSA"), (400, "sha256RSA"), (45, "sha1RSA")] {
      let r = classify(record(in_days(days), alg, None), &t, now());
      assert_eq!(r.key_size_status, HealthVerdict::Unknown);
    }
  }

  #[test]
  fn classify_is_idempotent() {
    let t = HealthThresholds::default();
    let r = record(in_days(45), "sha1RSA", Some(2048));
    assert_eq!(classify(r.clone(), &t, now()), classify(r, &t, now()));
  }

  #[test]
  fn axes_are_independent() {
    let base = HealthThresholds::default();
    let r = record(in_days(20), "sha1RSA", Some(1536));
    let before = classify(r.clone(), &base, now());

    let algorithms_changed = HealthThresholds {
      warning_algorithms: BTreeSet::new(),
      critical_algorithms: BTreeSet::from(["sha1RSA".to_string()]),
      ..base.clone()
    };
    let after = classify(r.clone(), &algorithms_changed, now());
    assert_ne!(after.algorithm_status, before.algorithm_status);
    assert_eq!(after.validity_period_status, before.validity_period_status);
    assert_eq!(after.key_size_status, before.key_size_status);

    let days_changed = HealthThresholds {
      warning_days: 5,
      critical_days: 1,
      ..base.clone()
    };
    let after = classify(r.clone(), &days_changed, now());
    assert_ne!(after.validity_period_status, before.validity_period_status);
    assert_eq!(after.algorithm_status, before.algorithm_status);
    assert_eq!(after.key_size_status, before.key_size_status);

    let keys_changed = HealthThresholds {
      critical_key_size: 512,
      warning_key_size: 1024,
      ..base
    };
    let after = classify(r, &keys_changed, now());
    assert_ne!(after.key_size_status, before.key_size_status);
    assert_eq!(after.validity_period_status, before.validity_period_status);
    assert_eq!(after.algorithm_status, before.algorithm_status);
  }

  #[test]
  fn end_to_end_defaults() {
    let r = classify(
      record(in_days(45), "sha1RSA", Some(2048)),
      &HealthThresholds::default(),
      now(),
    );
    assert_eq!(r.validity_period_status, HealthVerdict::Warning);
    assert_eq!(r.validity_period_message, "Certificate is expiring in 45 days");
    assert_eq!(r.algorithm_status, HealthVerdict::Warning);
    assert_eq!(r.key_size_status, HealthVerdict::Ok);
    assert_eq!(r.overall_status(), HealthVerdict::Warning);
    assert_eq!(r.certificate.source_location, "/etc/ssl/certs/test.pem");
  }

  #[test]
  fn batch_keeps_input_order() {
    let t = HealthThresholds::default();
    let records = vec![
      record(in_days(400), "sha256RSA", Some(4096)),
      record(in_days(-1), "md5RSA", Some(512)),
      record(in_days(45), "sha1RSA", None),
    ];
    let reports = classify_all(records.clone(), &t, now());
    assert_eq!(reports.len(), 3);
    for (report, record) in reports.iter().zip(&records) {
      assert_eq!(&report.certificate, record);
    }
    assert_eq!(reports[1].overall_status(), HealthVerdict::Critical);
  }
}
