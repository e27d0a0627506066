// # cirrus-core
//
// Core library for keeping hosted DNS zones in line with bind zone files.
//
// ## Architecture Overview
//
// - **zone**: Bind zone file parsing, `_alias` TXT decoding, rendering
// - **DnsProvider**: Trait for reading and changing hosted zones
// - **IpSource**: Trait for discovering the caller's public address
// - **reconcile**: Diff-and-apply of whole zones (`dns-setup`)
// - **updater**: Point updates of a single host (`update-host`)
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Parse before touching the provider**: a malformed zone file aborts
//    the run before any API call is made
// 2. **Plugin-Based**: Providers are registered by name, no hard-coded if-else
// 3. **Library-First**: Both binaries are thin wrappers over this crate
// 4. **Idempotency**: Unchanged record sets never produce writes

pub mod config;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod traits;
pub mod updater;
pub mod zone;

// Re-export core types for convenience
pub use config::{Credentials, ProviderConfig, SyncConfig};
pub use error::{Error, Result};
pub use reconcile::{Plan, SyncOutcome, Synchronizer, TerminateOutcome, load_zones, plan};
pub use registry::ProviderRegistry;
pub use traits::{Change, ChangeAction, DnsProvider, HostedZone, IpSource, UpdateResult};
pub use updater::{HostTarget, HostUpdate, infer_domain, update_host};
pub use zone::{AliasTarget, DesiredZone, RecordSet, RecordTarget, RecordType};
