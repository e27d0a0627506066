// # update-host
//
// Points one host name at an address, a CNAME target or a Route 53 alias.
// Credentials come from `AWS_ACCESS_ID` and `AWS_SECRET_KEY`.
//
// ## Usage
//
// ```bash
// update-host home.example.com -a 203.0.113.7
// update-host www.example.com -c lb.example.net
// update-host cdn.example.com -A "Z2FDTNDATAQYW2 d111111abcdef8.cloudfront.net"
// update-host home.example.com --my-ip -t 300
// update-host home.example.com --my-ip -6
// update-host a.b.example.com example.com -a 203.0.113.7
// ```
//
// Running it again with the same arguments makes no API writes.

use anyhow::{Context, Result};
use cirrus::{CirrusExitCode, init_logging, log_level, provider, runtime};
use cirrus_core::traits::IpVersion;
use cirrus_core::updater::DEFAULT_TTL;
use cirrus_core::{
    Credentials, HostTarget, HostUpdate, ProviderConfig, UpdateResult, update_host,
};
use clap::{ArgGroup, Parser};
use std::process::ExitCode;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "update-host")]
#[command(about = "Point a single host name at an address, CNAME or alias", long_about = None)]
#[command(version)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["address", "alias", "cname", "my_ip"])
))]
struct Cli {
    /// Fully qualified host name to update
    fqdn: String,

    /// Hosted zone name (default: inferred from the host name)
    domain: Option<String>,

    /// Point the host at this IPv4 or IPv6 address
    #[arg(short = 'a', long = "address", value_name = "IP")]
    address: Option<String>,

    /// Make the host a Route 53 alias: "<hosted zone id> <dns name>"
    #[arg(short = 'A', long = "alias", value_name = "ZONEID DNSNAME")]
    alias: Option<String>,

    /// Make the host a CNAME to this name
    #[arg(short = 'c', long = "cname", value_name = "CNAME")]
    cname: Option<String>,

    /// Point the host at this machine's public address
    #[arg(long)]
    my_ip: bool,

    /// With --my-ip, accept only an IPv4 address
    #[arg(short = '4', long, requires = "my_ip", conflicts_with = "ipv6")]
    ipv4: bool,

    /// With --my-ip, accept only an IPv6 address
    #[arg(short = '6', long, requires = "my_ip")]
    ipv6: bool,

    /// Record TTL in seconds (ignored for aliases)
    #[arg(short = 't', long, default_value_t = DEFAULT_TTL)]
    ttl: u32,

    /// Log progress (info level)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                CirrusExitCode::ConfigError.into()
            } else {
                CirrusExitCode::Success.into()
            };
        }
    };

    if let Err(e) = init_logging(log_level(cli.verbose, false, false)) {
        eprintln!("{:#}", e);
        return CirrusExitCode::ConfigError.into();
    }

    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => {
            error!("{:#}", e);
            return CirrusExitCode::RuntimeError.into();
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => CirrusExitCode::Success.into(),
        Err(e) => {
            error!("{:#}", e);
            CirrusExitCode::for_error(&e).into()
        }
    }
}

async fn target(cli: &Cli) -> Result<HostTarget> {
    if let Some(address) = &cli.address {
        return Ok(HostTarget::address(address)?);
    }
    if let Some(alias) = &cli.alias {
        return Ok(HostTarget::alias(alias)?);
    }
    if let Some(cname) = &cli.cname {
        return Ok(HostTarget::cname(cname)?);
    }
    detect_ip(cli.ip_version()).await
}

impl Cli {
    fn ip_version(&self) -> Option<IpVersion> {
        match (self.ipv4, self.ipv6) {
            (true, _) => Some(IpVersion::V4),
            (_, true) => Some(IpVersion::V6),
            _ => None,
        }
    }
}

#[cfg(feature = "http")]
async fn detect_ip(version: Option<IpVersion>) -> Result<HostTarget> {
    let source = cirrus_ip_http::HttpIpSource::with_defaults(version)?;
    HostTarget::detect(&source)
        .await
        .context("Failed to detect public IP address")
}

#[cfg(not(feature = "http"))]
async fn detect_ip(_version: Option<IpVersion>) -> Result<HostTarget> {
    Err(cirrus_core::Error::config("--my-ip needs the `http` feature").into())
}

async fn run(cli: Cli) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let provider = provider(&ProviderConfig::route53(credentials))?;

    let target = target(&cli).await?;
    let update = HostUpdate::new(cli.fqdn.clone(), target)
        .with_domain(cli.domain.clone())
        .with_ttl(cli.ttl);

    let result = update_host(provider.as_ref(), &update)
        .await
        .with_context(|| format!("Failed to update {}", update.fqdn))?;

    match result {
        UpdateResult::Unchanged { current } => println!("{} unchanged", current),
        UpdateResult::Created { current } => println!("created {}", current),
        UpdateResult::Updated { previous, current } => {
            println!("updated {} (was {})", current, previous)
        }
    }
    Ok(())
}
