//! Single-host updates
//!
//! Points one owner name at an address, a CNAME target or a provider alias,
//! the way `update-host` does. Unlike [`crate::reconcile`], nothing else in
//! the zone is looked at.

use crate::error::{Error, Result};
use crate::traits::{Change, DnsProvider, IpSource, IpVersion, UpdateResult};
use crate::zone::{AliasTarget, RecordSet, RecordType, normalize_name};
use std::net::IpAddr;
use tracing::{debug, info, warn};

/// TTL used when none is given
pub const DEFAULT_TTL: u32 = 3600;

/// What a host should resolve to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTarget {
    /// An A record for IPv4, AAAA for IPv6
    Address(IpAddr),
    /// A CNAME to another name
    Cname(String),
    /// A provider alias (always type A)
    Alias(AliasTarget),
}

impl HostTarget {
    /// Target from a `-a` argument
    pub fn address(value: &str) -> Result<Self> {
        value
            .trim()
            .parse::<IpAddr>()
            .map(HostTarget::Address)
            .map_err(|_| Error::invalid_input(format!("invalid IP address '{}'", value)))
    }

    /// Target from a `-A "<zone id> <dns name>"` argument
    pub fn alias(value: &str) -> Result<Self> {
        AliasTarget::parse(value).map(HostTarget::Alias)
    }

    /// Target from a `-c` argument
    pub fn cname(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() || value.contains(char::is_whitespace) {
            return Err(Error::invalid_input(format!(
                "invalid CNAME target '{}'",
                value
            )));
        }
        Ok(HostTarget::Cname(normalize_name(value)))
    }

    /// The caller's public address as seen by `source`
    ///
    /// A source restricted to one IP version must answer with that version.
    pub async fn detect(source: &dyn IpSource) -> Result<Self> {
        let ip = source.current().await?;
        if let Some(version) = source.version() {
            if IpVersion::of(&ip) != version {
                return Err(Error::invalid_input(format!(
                    "expected an {:?} address, detected {}",
                    version, ip
                )));
            }
        }
        info!("Detected public address {}", ip);
        Ok(HostTarget::Address(ip))
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            HostTarget::Address(IpAddr::V4(_)) | HostTarget::Alias(_) => RecordType::A,
            HostTarget::Address(IpAddr::V6(_)) => RecordType::Aaaa,
            HostTarget::Cname(_) => RecordType::Cname,
        }
    }
}

/// One `update-host` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUpdate {
    pub fqdn: String,
    /// Hosted zone name; inferred from `fqdn` when absent
    pub domain: Option<String>,
    pub target: HostTarget,
    /// Ignored for aliases
    pub ttl: u32,
}

impl HostUpdate {
    pub fn new(fqdn: impl Into<String>, target: HostTarget) -> Self {
        Self {
            fqdn: fqdn.into(),
            domain: None,
            target,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// The hosted zone this update goes to
    pub fn zone_name(&self) -> String {
        match &self.domain {
            Some(domain) => normalize_name(domain),
            None => infer_domain(&self.fqdn),
        }
    }

    /// The record set this update should leave behind
    pub fn record_set(&self) -> RecordSet {
        match &self.target {
            HostTarget::Address(ip) => RecordSet::new(
                &self.fqdn,
                self.target.record_type(),
                self.ttl,
                vec![ip.to_string()],
            ),
            HostTarget::Cname(target) => {
                RecordSet::new(&self.fqdn, RecordType::Cname, self.ttl, vec![target.clone()])
            }
            HostTarget::Alias(alias) => RecordSet::alias(&self.fqdn, alias.clone()),
        }
    }
}

/// Zone name for a host: everything after the first label when the host
/// has more than one dot, otherwise the host itself.
///
/// `www.example.com` → `example.com.`, `example.com` → `example.com.`
pub fn infer_domain(fqdn: &str) -> String {
    let host = fqdn.trim().trim_end_matches('.');
    if host.matches('.').count() > 1 {
        if let Some((_, rest)) = host.split_once('.') {
            return normalize_name(rest);
        }
    }
    normalize_name(host)
}

/// A and AAAA sets live side by side on a dual-stack host
fn is_address_pair(a: RecordType, b: RecordType) -> bool {
    matches!(
        (a, b),
        (RecordType::A, RecordType::Aaaa) | (RecordType::Aaaa, RecordType::A)
    )
}

/// Point `update.fqdn` at `update.target`.
///
/// Issues no write when the host already resolves to the same type, TTL and
/// values. A change of type is applied as a delete and a create in a single
/// change batch, except that an A set never replaces an AAAA set (or the
/// other way round): the new family is added beside the old one.
pub async fn update_host(provider: &dyn DnsProvider, update: &HostUpdate) -> Result<UpdateResult> {
    let zone_name = update.zone_name();
    let zone = provider
        .find_zone(&zone_name)
        .await?
        .ok_or_else(|| Error::not_found(format!("Zone {} doesn't exist", zone_name)))?;

    let desired = update.record_set();
    debug!("Looking up {} in zone {} ({})", desired.name, zone.name, zone.id);

    // prefer a set of the same type, so A and AAAA for one host can coexist
    let existing = match provider
        .find_record_set(&zone, &desired.name, Some(desired.record_type))
        .await?
    {
        Some(set) => Some(set),
        None => provider.find_record_set(&zone, &desired.name, None).await?,
    };

    match existing {
        Some(other) if is_address_pair(other.record_type, desired.record_type) => {
            info!("Adding {} next to {}", desired, other);
            provider
                .change_record_sets(&zone, &[Change::create(desired.clone())])
                .await?;
            Ok(UpdateResult::Created { current: desired })
        }
        None => {
            info!("Creating {}", desired);
            provider
                .change_record_sets(&zone, &[Change::create(desired.clone())])
                .await?;
            Ok(UpdateResult::Created { current: desired })
        }
        Some(previous) if previous.same_content(&desired) => {
            info!("{} is up to date", previous);
            Ok(UpdateResult::Unchanged { current: previous })
        }
        Some(previous) if previous.record_type == desired.record_type => {
            info!("Updating {} to {}", previous, desired);
            provider
                .change_record_sets(&zone, &[Change::upsert(desired.clone())])
                .await?;
            Ok(UpdateResult::Updated {
                previous,
                current: desired,
            })
        }
        Some(previous) => {
            warn!("Replacing {} with {}", previous, desired);
            provider
                .change_record_sets(
                    &zone,
                    &[Change::delete(previous.clone()), Change::create(desired.clone())],
                )
                .await?;
            Ok(UpdateResult::Updated {
                previous,
                current: desired,
            })
        }
    }
}
