use health_core::config::Config;
use health_core::{FailOn, OutputFormat};
use std::path::PathBuf;

/// Command-line overrides. `None`/empty means "keep the config file value".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
  pub help: bool,
  pub paths: Vec<String>,
  pub recurse: bool,
  pub warning_days: Option<i64>,
  pub critical_days: Option<i64>,
  pub warning_algorithms: Vec<String>,
  pub critical_algorithms: Vec<String>,
  pub critical_key_size: Option<u32>,
  pub warning_key_size: Option<u32>,
  pub excluded_thumbprints: Vec<String>,
  pub file_types: Vec<String>,
  pub format: Option<OutputFormat>,
  pub fail_on: Option<FailOn>,
  pub config: Option<PathBuf>,
  pub log_level: Option<String>,
  pub log_dir: Option<PathBuf>,
}

const VALUE_FLAGS: &[&str] = &[
  "--warning-days",
  "--critical-days",
  "--warning-algorithm",
  "--critical-algorithm",
  "--critical-key-size",
  "--warning-key-size",
  "--exclude",
  "--file-type",
  "--format",
  "--fail-on",
  "--config",
  "--log-level",
  "--log-dir",
];

/// Parses arguments after the program name.
pub fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
  let mut out = CliArgs::default();
  let mut i = 0;
  while i < args.len() {
    let arg = args[i].as_str();
    match arg {
      "--help" | "-h" => out.help = true,
      "--recurse" => out.recurse = true,
      _ if VALUE_FLAGS.contains(&arg) => {
        let value = take_value(args, &mut i, arg)?;
        set_flag(&mut out, arg, value)?;
      }
      _ if arg.starts_with("--") => anyhow::bail!("unknown option `{arg}` (see --help)"),
      _ => out.paths.push(arg.to_string()),
    }
    i += 1;
  }
  Ok(out)
}

fn set_flag(out: &mut CliArgs, flag: &str, value: &str) -> anyhow::Result<()> {
  match flag {
    "--warning-days" => out.warning_days = Some(parse_number(flag, value)?),
    "--critical-days" => out.critical_days = Some(parse_number(flag, value)?),
    "--warning-algorithm" => out.warning_algorithms.push(value.to_string()),
    "--critical-algorithm" => out.critical_algorithms.push(value.to_string()),
    "--critical-key-size" => out.critical_key_size = Some(parse_number(flag, value)?),
    "--warning-key-size" => out.warning_key_size = Some(parse_number(flag, value)?),
    "--exclude" => out.excluded_thumbprints.push(value.to_string()),
    "--file-type" => out.file_types.push(value.to_string()),
    "--format" => out.format = Some(value.parse()?),
    "--fail-on" => out.fail_on = Some(value.parse()?),
    "--config" => out.config = Some(PathBuf::from(value)),
    "--log-level" => out.log_level = Some(value.to_string()),
    "--log-dir" => out.log_dir = Some(PathBuf::from(value)),
    _ => anyhow::bail!("unknown option `{flag}`"),
  }
  Ok(())
}

fn take_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> anyhow::Result<&'a str> {
  *i += 1;
  args
    .get(*i)
    .map(String::as_str)
    .ok_or_else(|| anyhow::anyhow!("missing value for `{flag}`"))
}

fn parse_number<T: std::str::FromStr>(flag: &str, raw: &str) -> anyhow::Result<T> {
  raw
    .trim()
    .parse()
    .map_err(|_| anyhow::anyhow!("`{flag}` expects a whole number, got `{raw}`"))
}

impl CliArgs {
  /// Flags win over the config file. Repeated list flags replace the configured list.
  pub fn apply(&self, cfg: &mut Config) {
    let t = &mut cfg.thresholds;
    if let Some(v) = self.warning_days {
      t.warning_days = v;
    }
    if let Some(v) = self.critical_days {
      t.critical_days = v;
    }
    if !self.warning_algorithms.is_empty() {
      t.warning_algorithms = self.warning_algorithms.iter().cloned().collect();
    }
    if !self.critical_algorithms.is_empty() {
      t.critical_algorithms = self.critical_algorithms.iter().cloned().collect();
    }
    if let Some(v) = self.critical_key_size {
      t.critical_key_size = v;
    }
    if let Some(v) = self.warning_key_size {
      t.warning_key_size = v;
    }

    let scan = &mut cfg.scan;
    if !self.paths.is_empty() {
      scan.paths = self.paths.clone();
    }
    if self.recurse {
      scan.recurse = true;
    }
    if !self.file_types.is_empty() {
      scan.certificate_file_types = self.file_types.clone();
    }
    scan
      .excluded_thumbprints
      .extend(self.excluded_thumbprints.iter().cloned());

    if let Some(format) = self.format {
      cfg.output.format = format;
    }
    if let Some(fail_on) = self.fail_on {
      cfg.output.fail_on = Some(fail_on);
    }
    if let Some(level) = &self.log_level {
      cfg.logging.level = level.clone();
    }
    if let Some(dir) = &self.log_dir {
      cfg.logging.directory = Some(dir.clone());
    }
  }
}

pub fn print_help() {
  println!(
    "cert-health {}\n\
     Report X.509 certificate health: expiry, signature algorithm and key size.\n\
     \n\
     Usage: cert-health [PATH ...] [options]\n\
     \n\
     PATH                        Cert:\\<LocalMachine|CurrentUser>[\\<Store>] or a file/directory\n\
     --recurse                   Descend into subdirectories / all stores of a location\n\
     --warning-days N            Days before expiry that count as Warning (default 60)\n\
     --critical-days N           Days before expiry that count as Critical (default 30)\n\
     --warning-algorithm NAME    Deprecated signature algorithm (repeatable, default sha1RSA)\n\
     --critical-algorithm NAME   Vulnerable signature algorithm (repeatable, default md5RSA)\n\
     --critical-key-size N       Keys smaller than this are Critical (default 1024)\n\
     --warning-key-size N        Keys smaller than this are Warning (default 2048)\n\
     --exclude THUMBPRINT        Skip a certificate (repeatable)\n\
     --file-type EXT             Certificate file extension (repeatable, default cer crt pem der)\n\
     --format text|json          Output format (default text)\n\
     --fail-on warning|critical  Exit with status 2 when any certificate reaches the level\n\
     --config FILE               TOML configuration file\n\
     --log-level LEVEL           Log filter, e.g. debug or cert_health=trace (default info)\n\
     --log-dir DIR               Also write daily rolling logs to DIR\n\
     --version                   Print the version",
    env!("CARGO_PKG_VERSION")
  );
}
