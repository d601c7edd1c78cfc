use super::Collector;
use std::fmt;

/// Stores enumerated when a bare location is scanned with `--recurse`.
pub const STANDARD_STORES: &[&str] = &[
  "My",
  "Root",
  "CA",
  "AuthRoot",
  "TrustedPublisher",
  "TrustedPeople",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLocation {
  LocalMachine,
  CurrentUser,
}

impl StoreLocation {
  fn parse(s: &str) -> anyhow::Result<Self> {
    if s.eq_ignore_ascii_case("LocalMachine") {
      Ok(Self::LocalMachine)
    } else if s.eq_ignore_ascii_case("CurrentUser") {
      Ok(Self::CurrentUser)
    } else {
      Err(anyhow::anyhow!(
        "unknown store location `{s}` (expected LocalMachine or CurrentUser)"
      ))
    }
  }

  fn as_str(self) -> &'static str {
    match self {
      Self::LocalMachine => "LocalMachine",
      Self::CurrentUser => "CurrentUser",
    }
  }
}

/// `Cert:\<Location>[\<Store>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePath {
  pub location: StoreLocation,
  pub store: Option<String>,
}

impl StorePath {
  /// Parses the part after the `Cert:` drive prefix.
  pub fn parse(rest: &str) -> anyhow::Result<Self> {
    let parts: Vec<&str> = rest
      .split(['\\', '/'])
      .filter(|p| !p.is_empty())
      .collect();
    match parts.as_slice() {
      [] => Err(anyhow::anyhow!("store path needs a location, e.g. Cert:\\LocalMachine\\My")),
      [location] => Ok(Self {
        location: StoreLocation::parse(location)?,
        store: None,
      }),
      [location, store] => Ok(Self {
        location: StoreLocation::parse(location)?,
        store: Some(store.to_string()),
      }),
      _ => Err(anyhow::anyhow!(
        "store path has too many components: Cert:{rest}"
      )),
    }
  }

  fn with_store(&self, store: &str) -> Self {
    Self {
      location: self.location,
      store: Some(store.to_string()),
    }
  }
}

impl fmt::Display for StorePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Cert:\\{}", self.location.as_str())?;
    if let Some(store) = &self.store {
      write!(f, "\\{store}")?;
    }
    Ok(())
  }
}

pub(crate) fn collect_store(path: &StorePath, recurse: bool, collector: &mut Collector<'_>) {
  let targets: Vec<StorePath> = match &path.store {
    Some(_) => vec![path.clone()],
    None if recurse => STANDARD_STORES.iter().map(|s| path.with_store(s)).collect(),
    None => {
      collector.error(
        &path.to_string(),
        "store location needs a store name or --recurse",
      );
      return;
    }
  };

  for target in targets {
    let location = target.to_string();
    let Some(store) = target.store.as_deref() else {
      continue;
    };
    match enumerate_store(target.location, store) {
      Ok(certs) => {
        tracing::debug!(store = %location, count = certs.len(), "enumerated certificate store");
        for der in certs {
          collector.add_der(&der, &location);
        }
      }
      Err(e) => collector.error(&location, format!("{e:#}")),
    }
  }
}

#[cfg(windows)]
fn enumerate_store(location: StoreLocation, name: &str) -> anyhow::Result<Vec<Vec<u8>>> {
  use windows::core::PCSTR;
  use windows::Win32::Security::Cryptography::{
    CertCloseStore, CertEnumCertificatesInStore, CertOpenStore, CERT_OPEN_STORE_FLAGS,
    CERT_QUERY_ENCODING_TYPE, HCRYPTPROV_LEGACY,
  };

  const CERT_STORE_PROV_SYSTEM_W: usize = 10;
  const CERT_STORE_OPEN_EXISTING_FLAG: u32 = 0x0000_4000;
  const CERT_STORE_READONLY_FLAG: u32 = 0x0000_8000;
  const CERT_SYSTEM_STORE_CURRENT_USER: u32 = 0x0001_0000;
  const CERT_SYSTEM_STORE_LOCAL_MACHINE: u32 = 0x0002_0000;

  let wide: Vec<u16> = name.encode_utf16().chain([0]).collect();
  let flags = CERT_STORE_OPEN_EXISTING_FLAG
    | CERT_STORE_READONLY_FLAG
    | match location {
      StoreLocation::LocalMachine => CERT_SYSTEM_STORE_LOCAL_MACHINE,
      StoreLocation::CurrentUser => CERT_SYSTEM_STORE_CURRENT_USER,
    };

  // SAFETY: the provider is a predefined integer identifier and `wide` is a
  // null-terminated store name that outlives the call.
  let store = unsafe {
    CertOpenStore(
      PCSTR(CERT_STORE_PROV_SYSTEM_W as *const u8),
      CERT_QUERY_ENCODING_TYPE(0),
      HCRYPTPROV_LEGACY(0),
      CERT_OPEN_STORE_FLAGS(flags),
      Some(wide.as_ptr() as *const std::ffi::c_void),
    )
  }
  .map_err(|e| anyhow::anyhow!("CertOpenStore failed: {e}"))?;

  let mut out = Vec::new();
  // SAFETY: each context returned by the enumeration stays valid until it is passed
  // back in; the encoded bytes are copied out before that happens.
  unsafe {
    let mut ctx = CertEnumCertificatesInStore(store, None);
    while !ctx.is_null() {
      let der = std::slice::from_raw_parts((*ctx).pbCertEncoded, (*ctx).cbCertEncoded as usize);
      out.push(der.to_vec());
      ctx = CertEnumCertificatesInStore(store, Some(ctx as *const _));
    }
    let _ = CertCloseStore(store, 0);
  }

  Ok(out)
}

#[cfg(not(windows))]
fn enumerate_store(_location: StoreLocation, _name: &str) -> anyhow::Result<Vec<Vec<u8>>> {
  Err(anyhow::anyhow!(
    "certificate stores are only available on Windows"
  ))
}
