// # cirrus command line support
//
// Shared plumbing for the `dns-setup` and `update-host` binaries: exit
// codes, logging setup, provider registration. Everything DNS-related lives
// in cirrus-core and the provider crates.

use cirrus_core::{DnsProvider, Error, ProviderConfig, ProviderRegistry};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Success, including runs that changed nothing
/// - 1: Configuration, usage or zone file error
/// - 2: Provider or runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CirrusExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CirrusExitCode> for ExitCode {
    fn from(code: CirrusExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl CirrusExitCode {
    /// Exit code for a failed run
    pub fn for_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<Error>() {
            Some(e) if e.is_input_error() => CirrusExitCode::ConfigError,
            _ => CirrusExitCode::RuntimeError,
        }
    }
}

/// Map the usual verbosity flags to a log level; default is WARN
pub fn log_level(verbose: bool, quiet: bool, debug: bool) -> Level {
    if debug {
        Level::DEBUG
    } else if verbose {
        Level::INFO
    } else if quiet {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Install the global tracing subscriber
pub fn init_logging(level: Level) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

/// A registry holding every provider compiled into this build
pub fn registry() -> ProviderRegistry {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "route53")]
    {
        tracing::debug!("Registering Route 53 provider");
        cirrus_provider_route53::register(&registry);
    }

    registry
}

/// Create the provider for `config`
pub fn provider(config: &ProviderConfig) -> Result<Box<dyn DnsProvider>, Error> {
    let provider = registry().create_provider(config)?;
    tracing::debug!("Using {} provider", provider.provider_name());
    Ok(provider)
}

/// Single-threaded runtime; every provider call is awaited in turn
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))
}
