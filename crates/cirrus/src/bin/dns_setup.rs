// # dns-setup
//
// Makes Route 53 hosted zones match the bind zone files named in a YAML
// config. Zones that don't exist yet are created; record sets are created,
// updated or removed until the provider matches the file.
//
// ## Usage
//
// ```bash
// dns-setup dns.yaml            # apply
// dns-setup --dry-run dns.yaml  # report what would change
// dns-setup --show dns.yaml     # print current provider state as bind text
// dns-setup --terminate dns.yaml
// ```
//
// Every zone file is parsed before the provider is contacted; a single
// malformed file aborts the run with no changes made.

use anyhow::{Context, Result};
use cirrus::{CirrusExitCode, init_logging, log_level, provider, runtime};
use cirrus_core::{SyncConfig, SyncOutcome, Synchronizer, TerminateOutcome, load_zones};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "dns-setup")]
#[command(about = "Configure Route 53 hosted zones from bind zone files", long_about = None)]
#[command(version)]
struct Cli {
    /// YAML file naming the zone file of each domain
    config: PathBuf,

    /// Report planned changes without making them
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Print the provider's current records for each domain
    #[arg(short = 's', long, conflicts_with = "terminate")]
    show: bool,

    /// Delete every configured hosted zone and its records
    #[arg(long)]
    terminate: bool,

    /// Log progress (info level)
    #[arg(short, long)]
    verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log everything, including API requests
    #[arg(long)]
    debug: bool,
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

    if let Err(e) = init_logging(log_level(cli.verbose, cli.quiet, cli.debug)) {
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

async fn run(cli: Cli) -> Result<()> {
    let config = SyncConfig::load(&cli.config)?;

    if cli.show {
        return show(&config).await;
    }
    if cli.terminate {
        return terminate(&config, cli.dry_run).await;
    }

    let zones = load_zones(&config)?;
    let provider = provider(&config.provider_config()?)?;
    let outcomes = Synchronizer::new(provider.as_ref())
        .with_dry_run(cli.dry_run)
        .sync_all(&zones)
        .await?;

    for outcome in outcomes {
        match outcome {
            SyncOutcome::Created {
                zone,
                name_servers,
                summary,
            } => info!(
                "{}: created with {} record set(s), nameservers [{}]",
                zone,
                summary.creates,
                name_servers.join(", ")
            ),
            SyncOutcome::Updated { zone, summary } => info!(
                "{}: {} created, {} updated, {} deleted",
                zone, summary.creates, summary.updates, summary.deletes
            ),
            SyncOutcome::Unchanged { zone } => info!("{}: up to date", zone),
        }
    }
    Ok(())
}

async fn show(config: &SyncConfig) -> Result<()> {
    let provider = provider(&config.provider_config()?)?;
    let sync = Synchronizer::new(provider.as_ref());

    for (domain, _) in config.zone_files() {
        if let Some(text) = sync
            .show(&domain)
            .await
            .with_context(|| format!("Failed to read zone {}", domain))?
        {
            println!("{}", text);
        }
    }
    Ok(())
}

async fn terminate(config: &SyncConfig, dry_run: bool) -> Result<()> {
    let provider = provider(&config.provider_config()?)?;
    let sync = Synchronizer::new(provider.as_ref()).with_dry_run(dry_run);

    for (domain, _) in config.zone_files() {
        let outcome = sync
            .terminate(&domain)
            .await
            .with_context(|| format!("Failed to remove zone {}", domain))?;
        if let TerminateOutcome::Removed {
            zone,
            deleted_record_sets,
        } = outcome
        {
            info!("{}: removed with {} record set(s)", zone, deleted_record_sets);
        }
    }
    Ok(())
}
