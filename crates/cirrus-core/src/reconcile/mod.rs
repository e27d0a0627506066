//! Zone reconciliation
//!
//! [`plan`] diffs the record sets a provider holds against the ones a zone
//! file asks for. [`Synchronizer`] drives a [`DnsProvider`] through the
//! `dns-setup` operations: create or update zones, show them, remove them.
//!
//! ## Flow
//!
//! 1. [`load_zones`] parses every configured zone file. Nothing touches the
//!    provider until all of them parse.
//! 2. For each zone: create the hosted zone if missing, otherwise list its
//!    record sets and [`plan`] against them.
//! 3. Apply the plan (deletes, then upserts, then creates). The first
//!    provider error stops the run.

use crate::config::SyncConfig;
use crate::error::Result;
use crate::traits::{Change, ChangeAction, DnsProvider, HostedZone};
use crate::zone::{DesiredZone, RecordKey, RecordSet, load_zone, normalize_name, render_zone};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Changes needed to bring a zone to its desired state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Deletes first, then upserts, then creates
    pub changes: Vec<Change>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn count(&self, action: ChangeAction) -> usize {
        self.changes.iter().filter(|c| c.action == action).count()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            creates: self.count(ChangeAction::Create),
            updates: self.count(ChangeAction::Upsert),
            deletes: self.count(ChangeAction::Delete),
        }
    }
}

/// Number of changes of each kind in a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

/// Diff `current` (provider state) against `desired` for `zone_name`.
///
/// Provider-managed sets (SOA, apex NS) are ignored on both sides. Sets are
/// matched on `(name, type)`; a changed TTL, value list or alias target
/// becomes an upsert.
pub fn plan(zone_name: &str, current: &[RecordSet], desired: &[RecordSet]) -> Plan {
    let mut remaining: HashMap<RecordKey, &RecordSet> = current
        .iter()
        .filter(|set| !set.is_provider_managed(zone_name))
        .map(|set| (set.key(), set))
        .collect();

    let mut upserts = Vec::new();
    let mut creates = Vec::new();

    for set in desired.iter().filter(|set| !set.is_provider_managed(zone_name)) {
        match remaining.remove(&set.key()) {
            Some(existing) if existing.same_content(set) => {
                debug!("Unchanged {}", set);
            }
            Some(existing) => {
                warn!("Updating {} to {}", existing, set);
                upserts.push(Change::upsert(set.clone()));
            }
            None => {
                warn!("Adding {}", set);
                creates.push(Change::create(set.clone()));
            }
        }
    }

    // whatever the zone file no longer mentions goes away, in a stable order
    let mut stale: Vec<&RecordSet> = remaining.into_values().collect();
    stale.sort_by(|a, b| a.key().cmp(&b.key()));

    let mut changes: Vec<Change> = stale
        .into_iter()
        .map(|set| {
            warn!("Removing {}", set);
            Change::delete(set.clone())
        })
        .collect();
    changes.extend(upserts);
    changes.extend(creates);

    Plan { changes }
}

/// Parse and translate every zone file named by `config`.
///
/// Fails on the first malformed file, before any provider is contacted.
pub fn load_zones(config: &SyncConfig) -> Result<Vec<DesiredZone>> {
    config
        .zone_files()
        .iter()
        .map(|(domain, path)| {
            info!("Reading zone {} from {}", domain, path.display());
            load_zone(domain, path)
        })
        .collect()
}

/// What [`Synchronizer::sync_zone`] did to a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The hosted zone did not exist and was created and populated
    Created {
        zone: String,
        name_servers: Vec<String>,
        summary: PlanSummary,
    },
    /// The hosted zone existed and changes were applied
    Updated { zone: String, summary: PlanSummary },
    /// The hosted zone already matched its zone file
    Unchanged { zone: String },
}

/// What [`Synchronizer::terminate`] did to a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminateOutcome {
    /// The zone and `deleted_record_sets` record sets were removed
    Removed {
        zone: String,
        deleted_record_sets: usize,
    },
    /// The provider has no such zone
    Missing { zone: String },
}

/// Drives a provider through the `dns-setup` operations
///
/// All calls are issued one at a time. In dry-run mode every read still
/// happens but nothing is written; outcomes describe what would be done.
pub struct Synchronizer<'a> {
    provider: &'a dyn DnsProvider,
    dry_run: bool,
}

impl<'a> Synchronizer<'a> {
    pub fn new(provider: &'a dyn DnsProvider) -> Self {
        Self {
            provider,
            dry_run: false,
        }
    }

    /// Parse every configured zone file; see [`load_zones`]
    pub fn load(config: &SyncConfig) -> Result<Vec<DesiredZone>> {
        load_zones(config)
    }

    /// Report only, write nothing
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sync every zone in order, stopping at the first error
    pub async fn sync_all(&self, zones: &[DesiredZone]) -> Result<Vec<SyncOutcome>> {
        if self.dry_run {
            warn!("Doing a dry-run, only reporting actions.");
        }
        let mut outcomes = Vec::with_capacity(zones.len());
        for zone in zones {
            info!("Syncing zone {} from {}", zone.name, zone.source.display());
            outcomes.push(self.sync_zone(zone).await?);
        }
        Ok(outcomes)
    }

    /// Create or update one hosted zone to match `desired`
    pub async fn sync_zone(&self, desired: &DesiredZone) -> Result<SyncOutcome> {
        match self.provider.find_zone(&desired.name).await? {
            Some(zone) => self.update_zone(&zone, desired).await,
            None => self.create_zone(desired).await,
        }
    }

    async fn create_zone(&self, desired: &DesiredZone) -> Result<SyncOutcome> {
        warn!("Creating zone {}", desired.name);
        let plan = plan(&desired.name, &[], &desired.record_sets);
        let summary = plan.summary();

        if self.dry_run {
            return Ok(SyncOutcome::Created {
                zone: desired.name.clone(),
                name_servers: Vec::new(),
                summary,
            });
        }

        let zone = self.provider.create_zone(&desired.name).await?;
        warn!(
            "Zone {} nameservers: {}",
            zone.name,
            zone.name_servers.join(" ")
        );
        debug!("Adding {} record set(s) to zone {}", plan.changes.len(), zone.name);
        if !plan.is_empty() {
            self.provider.change_record_sets(&zone, &plan.changes).await?;
        }

        Ok(SyncOutcome::Created {
            zone: zone.name,
            name_servers: zone.name_servers,
            summary,
        })
    }

    async fn update_zone(&self, zone: &HostedZone, desired: &DesiredZone) -> Result<SyncOutcome> {
        let current = self.provider.list_record_sets(zone).await?;
        debug!(
            "Zone {} holds {} record set(s), zone file {} declares {}",
            zone.name,
            current.len(),
            desired.source.display(),
            desired.record_sets.len()
        );

        let plan = plan(&desired.name, &current, &desired.record_sets);
        if plan.is_empty() {
            warn!("No differences found for zone {}", desired.name);
            return Ok(SyncOutcome::Unchanged {
                zone: desired.name.clone(),
            });
        }

        warn!("Updating zone {}", desired.name);
        if !self.dry_run {
            self.provider.change_record_sets(zone, &plan.changes).await?;
        }

        Ok(SyncOutcome::Updated {
            zone: desired.name.clone(),
            summary: plan.summary(),
        })
    }

    /// Render the provider's record sets for `zone_name` as bind text.
    ///
    /// Returns `Ok(None)` if the zone doesn't exist.
    pub async fn show(&self, zone_name: &str) -> Result<Option<String>> {
        let Some(zone) = self.provider.find_zone(zone_name).await? else {
            warn!("Zone {} does not exist", zone_name);
            return Ok(None);
        };
        let sets = self.provider.list_record_sets(&zone).await?;
        let mut text = format!("; Zone {} ID: {}\n", zone.name, zone.id);
        text.push_str(&render_zone(&zone.name, &sets));
        Ok(Some(text))
    }

    /// Delete every record set the zone file could have created, then the
    /// hosted zone itself.
    pub async fn terminate(&self, zone_name: &str) -> Result<TerminateOutcome> {
        let zone_name = normalize_name(zone_name);
        let Some(zone) = self.provider.find_zone(&zone_name).await? else {
            warn!("Zone {} does not exist", zone_name);
            return Ok(TerminateOutcome::Missing { zone: zone_name });
        };

        warn!("Removing zone {}", zone_name);
        let current = self.provider.list_record_sets(&zone).await?;
        let plan = plan(&zone_name, &current, &[]);
        let deleted_record_sets = plan.changes.len();

        if !self.dry_run {
            // a zone holding only SOA and apex NS can be deleted directly
            if !plan.is_empty() {
                self.provider.change_record_sets(&zone, &plan.changes).await?;
            }
            self.provider.delete_zone(&zone).await?;
        }

        Ok(TerminateOutcome::Removed {
            zone: zone_name,
            deleted_record_sets,
        })
    }
}
