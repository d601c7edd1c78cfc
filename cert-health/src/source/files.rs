use super::{CollectOptions, Collector};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;
use x509_parser::pem::Pem;

const PEM_ARMOR: &[u8] = b"-----BEGIN ";

/// A file is read whatever its extension; a directory contributes the files whose
/// extension is a configured certificate type. Symlinks are not followed.
pub(crate) fn collect_path(path: &Path, options: &CollectOptions, collector: &mut Collector<'_>) {
  if !path.exists() {
    collector.error(&path.display().to_string(), "path does not exist");
    return;
  }

  if !path.is_dir() {
    read_certificate_file(path, collector);
    return;
  }

  let mut walker = WalkDir::new(path)
    .follow_links(false)
    .min_depth(1)
    .sort_by_file_name();
  if !options.recurse {
    walker = walker.max_depth(1);
  }

  for entry in walker {
    match entry {
      Ok(entry) => {
        if entry.file_type().is_file() && is_certificate_file(entry.path(), &options.file_types) {
          read_certificate_file(entry.path(), collector);
        }
      }
      Err(e) => {
        let location = e
          .path()
          .unwrap_or(path)
          .display()
          .to_string();
        collector.error(&location, format!("walk failed: {e}"));
      }
    }
  }
}

fn is_certificate_file(p: &Path, file_types: &[String]) -> bool {
  let ext = p
    .extension()
    .and_then(|s| s.to_str())
    .unwrap_or("")
    .to_ascii_lowercase();
  !ext.is_empty() && file_types.iter().any(|t| *t == ext)
}

fn read_certificate_file(path: &Path, collector: &mut Collector<'_>) {
  let location = path.display().to_string();
  let data = match fs::read(path) {
    Ok(d) => d,
    Err(e) => {
      collector.error(&location, format!("read failed: {e}"));
      return;
    }
  };

  if !is_pem(&data) {
    collector.add_der(&data, &location);
    return;
  }

  let mut found = 0usize;
  let mut broken = 0usize;
  // A broken block is consumed up to its END line, so later blocks still parse.
  for (i, block) in Pem::iter_from_buffer(&data).enumerate() {
    match block {
      Ok(pem) if pem.label == "CERTIFICATE" => {
        found += 1;
        collector.add_der(&pem.contents, &location);
      }
      Ok(pem) => {
        tracing::debug!(path = %location, label = %pem.label, "skipping non-certificate PEM block");
      }
      Err(e) => {
        broken += 1;
        collector.error(&location, format!("invalid PEM block {}: {e}", i + 1));
      }
    }
  }

  if found == 0 && broken == 0 {
    collector.error(&location, "no certificate found in PEM file");
  }
}

fn is_pem(data: &[u8]) -> bool {
  data
    .windows(PEM_ARMOR.len())
    .any(|w| w == PEM_ARMOR)
}
