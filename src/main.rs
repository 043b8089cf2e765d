use std::net::Ipv4Addr;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

use kakeup::config::{Config, Settings};
use kakeup::layer4;

/// Runs a command when a Wake-on-LAN magic packet for this host arrives.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Shell command to execute on wake-up
    #[arg(short, long)]
    command: Option<String>,

    /// Only react to magic packets for this MAC address
    #[arg(short, long)]
    mac: Option<String>,

    /// Only accept packets sent from this IPv4 address
    #[arg(short = 'i', long)]
    source_ip: Option<Ipv4Addr>,

    /// UDP destination port [default: 9]
    #[arg(short, long)]
    port: Option<u16>,

    /// YAML file with the same settings; command-line values take precedence
    #[arg(short = 'f', long)]
    config: Option<String>,

    /// More log output, repeat for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }

    fn settings(&self) -> Settings {
        Settings {
            command: self.command.clone(),
            mac: self.mac.clone(),
            source_ip: self.source_ip,
            port: self.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Cli::parse();

    simple_logger::SimpleLogger::new()
        .with_level(opts.log_level())
        .with_colors(true)
        .init()?;

    let settings = match &opts.config {
        Some(path) => Settings::from_file(path)?.merge(opts.settings()),
        None => opts.settings(),
    };
    let cfg = Config::try_from(settings)?;

    let cancel_token: CancellationToken = CancellationToken::new();
    let signal_token = cancel_token.clone();

    ctrlc::set_handler(move || {
        log::debug!("received termination signal");
        signal_token.cancel();
    }).context("failed to install signal handler")?;

    let handle = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || layer4::l4_worker(cfg, cancel_token, handle))
        .await
        .context("listener thread panicked")?
}
