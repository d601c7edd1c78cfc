use chrono::{DateTime, Utc};
use health_core::CertificateRecord;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// Signature OIDs and the short names thresholds are written against.
const SIGNATURE_ALGORITHMS: &[(&str, &str)] = &[
  ("1.2.840.113549.1.1.2", "md2RSA"),
  ("1.2.840.113549.1.1.4", "md5RSA"),
  ("1.2.840.113549.1.1.5", "sha1RSA"),
  ("1.2.840.113549.1.1.10", "RSASSA-PSS"),
  ("1.2.840.113549.1.1.11", "sha256RSA"),
  ("1.2.840.113549.1.1.12", "sha384RSA"),
  ("1.2.840.113549.1.1.13", "sha512RSA"),
  ("1.2.840.113549.1.1.14", "sha224RSA"),
  ("1.2.840.10040.4.3", "sha1DSA"),
  ("2.16.840.1.101.3.4.3.2", "sha256DSA"),
  ("1.2.840.10045.4.1", "sha1ECDSA"),
  ("1.2.840.10045.4.3.1", "sha224ECDSA"),
  ("1.2.840.10045.4.3.2", "sha256ECDSA"),
  ("1.2.840.10045.4.3.3", "sha384ECDSA"),
  ("1.2.840.10045.4.3.4", "sha512ECDSA"),
  ("1.3.101.112", "Ed25519"),
  ("1.3.101.113", "Ed448"),
];

/// Short algorithm name for a dotted signature OID; unmapped OIDs pass through.
pub fn signature_algorithm_name(oid: &str) -> String {
  SIGNATURE_ALGORITHMS
    .iter()
    .find(|(o, _)| *o == oid)
    .map(|(_, name)| name.to_string())
    .unwrap_or_else(|| oid.to_string())
}

pub fn record_from_der(der: &[u8], source_location: &str) -> anyhow::Result<CertificateRecord> {
  let (_, cert) = x509_parser::parse_x509_certificate(der)
    .map_err(|e| anyhow::anyhow!("invalid X.509 certificate: {e}"))?;

  let validity = cert.validity();
  let signature_oid = cert.signature_algorithm.algorithm.to_id_string();
  Ok(CertificateRecord {
    subject: cert.subject().to_string(),
    thumbprint: format!("{:X}", Sha1::digest(der)),
    fingerprint_sha256: format!("{:x}", Sha256::digest(der)),
    not_before: asn1_to_utc(validity.not_before)?,
    not_after: asn1_to_utc(validity.not_after)?,
    signature_algorithm: signature_algorithm_name(&signature_oid),
    key_size: key_size(cert.public_key()),
    source_location: source_location.to_string(),
  })
}

fn asn1_to_utc(t: ASN1Time) -> anyhow::Result<DateTime<Utc>> {
  DateTime::from_timestamp(t.timestamp(), 0)
    .ok_or_else(|| anyhow::anyhow!("certificate time out of range: {t}"))
}

fn key_size(spki: &SubjectPublicKeyInfo) -> Option<u32> {
  match spki.parsed() {
    Ok(PublicKey::RSA(rsa)) => bit_length(rsa.modulus),
    Ok(PublicKey::EC(point)) => ec_key_size(point.data()),
    Ok(PublicKey::DSA(y)) => bit_length(y),
    _ => None,
  }
}

/// Bits in a big-endian unsigned integer, ignoring leading zero bytes.
fn bit_length(bytes: &[u8]) -> Option<u32> {
  let start = bytes.iter().position(|b| *b != 0)?;
  let significant = &bytes[start..];
  let len = u32::try_from(significant.len()).ok()?;
  Some(len * 8 - significant[0].leading_zeros())
}

// Field size from the encoded point: 0x04 || X || Y, or 0x02/0x03 || X.
fn ec_key_size(point: &[u8]) -> Option<u32> {
  let coordinate_len = match point {
    [0x04, rest @ ..] if !rest.is_empty() && rest.len() % 2 == 0 => rest.len() / 2,
    [0x02 | 0x03, rest @ ..] if !rest.is_empty() => rest.len(),
    _ => return None,
  };
  match coordinate_len {
    66 => Some(521),
    n => u32::try_from(n * 8).ok(),
  }
}
