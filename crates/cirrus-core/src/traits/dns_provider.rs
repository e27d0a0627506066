// # DNS Provider Trait
//
// Defines the interface to a hosted DNS provider.
//
// ## Implementations
//
// - Route 53: `cirrus-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use cirrus_core::DnsProvider;
//
// async fn show(provider: &dyn DnsProvider) -> cirrus_core::Result<()> {
//     if let Some(zone) = provider.find_zone("example.com").await? {
//         for set in provider.list_record_sets(&zone).await? {
//             println!("{}", set);
//         }
//     }
//     Ok(())
// }
// ```

use crate::zone::{RecordSet, RecordType};
use async_trait::async_trait;
use std::fmt;

/// A hosted zone as known to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Provider-specific zone id (without any `/hostedzone/` prefix)
    pub id: String,
    /// Absolute zone name
    pub name: String,
    /// Authoritative name servers, when the provider reported them
    pub name_servers: Vec<String>,
}

/// Kind of change applied to a record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Create,
    /// Create or replace
    Upsert,
    Delete,
}

impl ChangeAction {
    /// Wire name used by the provider API
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Upsert => "UPSERT",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One change to a record set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: ChangeAction,
    pub record_set: RecordSet,
}

impl Change {
    pub fn create(record_set: RecordSet) -> Self {
        Self {
            action: ChangeAction::Create,
            record_set,
        }
    }

    pub fn upsert(record_set: RecordSet) -> Self {
        Self {
            action: ChangeAction::Upsert,
            record_set,
        }
    }

    pub fn delete(record_set: RecordSet) -> Self {
        Self {
            action: ChangeAction::Delete,
            record_set,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.record_set)
    }
}

/// Result of a single-host update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// Record set existed with different content and was replaced
    Updated {
        /// What the provider held before
        previous: RecordSet,
        current: RecordSet,
    },
    /// Record set already matched (no write issued)
    Unchanged {
        current: RecordSet,
    },
    /// Record set didn't exist and was created
    Created {
        current: RecordSet,
    },
}

/// Trait for hosted DNS provider implementations
///
/// Providers translate these calls into API requests and nothing more:
/// no retries, no caching, no decisions about whether a change is needed.
/// Planning lives in [`crate::reconcile`] and [`crate::updater`]; a failed
/// call is returned to the caller, which reports it and stops.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up a hosted zone by name (`example.com` or `example.com.`)
    ///
    /// Returns `Ok(None)` when the provider has no such zone.
    async fn find_zone(&self, zone_name: &str) -> Result<Option<HostedZone>, crate::Error>;

    /// Create an empty hosted zone; the result carries its name servers
    async fn create_zone(&self, zone_name: &str) -> Result<HostedZone, crate::Error>;

    /// Delete a hosted zone. It must only hold provider-managed records.
    async fn delete_zone(&self, zone: &HostedZone) -> Result<(), crate::Error>;

    /// Every record set in the zone, including SOA and apex NS
    async fn list_record_sets(&self, zone: &HostedZone) -> Result<Vec<RecordSet>, crate::Error>;

    /// The record set at `name`, of `record_type` if given, otherwise of
    /// whatever type is found first.
    async fn find_record_set(
        &self,
        zone: &HostedZone,
        name: &str,
        record_type: Option<RecordType>,
    ) -> Result<Option<RecordSet>, crate::Error>;

    /// Apply `changes` in order. Implementations may split them into
    /// several requests; no rollback is attempted if a later request fails.
    async fn change_record_sets(
        &self,
        zone: &HostedZone,
        changes: &[Change],
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
