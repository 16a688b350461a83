//! pingen: print SPKI pins for every certificate a TLS server presents.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use pingen_lib::{display_text, to_json, HostEndpoint, PinConfig, PinGenerator};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "pingen",
    about = "Generate public key pins for the certificate chain of a TLS server",
    long_about = "pingen connects to a TLS server, captures every certificate it presents\n\
                  and prints one pin per certificate, leaf first. A pin is the base64\n\
                  digest of the certificate's SubjectPublicKeyInfo, prefixed with the\n\
                  algorithm label (e.g. SHA256/...), as used by HTTP clients that support\n\
                  certificate pinning.\n\n\
                  The server's certificates are NOT validated. Only run this over a\n\
                  network path you trust.",
    after_help = "EXAMPLES:\n\
                  \n  pingen android.com\
                  \n  pingen example.com:8443 SHA-256\
                  \n  pingen example.com sha256 debug\
                  \n  pingen --json example.com SHA-256\
                  \n  pingen [::1]:8443 sha-512 --timeout 2s"
)]
struct Cli {
    /// Target server as <host>[:port]; the port defaults to 443
    target: String,
    /// Hash algorithm: SHA-1, SHA-256, SHA-384 or SHA-512 (case and hyphens optional)
    #[arg(default_value = "SHA-1")]
    algorithm: String,
    /// Pass `debug` to print each certificate's subject above its pin
    mode: Option<Mode>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
    /// Connect and handshake deadline (plain numbers are seconds)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, default_value = "10s")]
    timeout: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum Mode {
    Debug,
}

/// Parse a duration string using humantime format.
///
/// Plain numbers (e.g. "10") default to seconds. Otherwise, standard
/// humantime units are accepted: `ms`, `s`, `m`, `h`, etc.
fn parse_duration(s: &str) -> Result<Duration> {
    let duration = if s.chars().all(|c| c.is_ascii_digit()) {
        let secs: u64 = s.parse().context("Invalid duration value")?;
        Duration::from_secs(secs)
    } else {
        humantime::parse_duration(s).with_context(|| format!("Invalid duration: '{s}'"))?
    };
    if duration.is_zero() {
        anyhow::bail!("Timeout must be greater than zero");
    }
    Ok(duration)
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "warn,pingen_lib=debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

fn run(cli: &Cli) -> Result<()> {
    let debug = cli.mode == Some(Mode::Debug);
    let endpoint = HostEndpoint::parse(&cli.target)?;
    let config = PinConfig {
        debug,
        timeout: cli.timeout,
    };
    let generator = PinGenerator::new(endpoint, &cli.algorithm, config)?;

    eprintln!(
        "**Run this on a trusted network**\nGenerating {} pins for: {}",
        generator.algorithm(),
        generator.endpoint()
    );
    log::debug!("handshake timeout {:?}", cli.timeout);

    let report = generator
        .run()
        .with_context(|| format!("Failed to generate pins for {}", generator.endpoint()))?;

    if cli.json {
        println!("{}", to_json(&report)?);
    } else {
        print!("{}", display_text(&report));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.target.eq_ignore_ascii_case("help") {
        Cli::command().print_long_help()?;
        return Ok(());
    }

    init_logging(cli.mode == Some(Mode::Debug));

    run(&cli).inspect_err(|_| {
        eprintln!("{}", Cli::command().render_usage());
    })
}
