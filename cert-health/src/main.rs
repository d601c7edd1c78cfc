use anyhow::Context;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
  let args: Vec<String> = std::env::args().skip(1).collect();

  if args.iter().any(|a| a == "--version") {
    println!("{}", env!("CARGO_PKG_VERSION"));
    return Ok(ExitCode::SUCCESS);
  }

  cert_health::run(&args).context("cert-health run")
}
