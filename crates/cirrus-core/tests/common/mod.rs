//! Test doubles and common utilities for contract tests
//!
//! `MockDnsProvider` keeps hosted zones in memory and counts every call,
//! split into reads and writes.

#![allow(dead_code)]

use cirrus_core::error::{Error, Result};
use cirrus_core::traits::{Change, ChangeAction, DnsProvider, HostedZone, IpSource};
use cirrus_core::zone::{RecordSet, RecordType};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Counters {
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// An in-memory DnsProvider that tracks calls
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    counters: Arc<Counters>,
    /// Zone name → (zone, record sets)
    zones: Arc<Mutex<BTreeMap<String, (HostedZone, Vec<RecordSet>)>>>,
    /// Every change passed to change_record_sets, in order
    changes: Arc<Mutex<Vec<Change>>>,
    /// Every zone name passed to find_zone, in order
    lookups: Arc<Mutex<Vec<String>>>,
    /// Writes beyond this many fail with a rate-limit error
    write_limit: Option<usize>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider viewing the same zones and counters as `other`
    pub fn sharing_counters_with(other: &MockDnsProvider) -> Self {
        other.clone()
    }

    /// Add a zone holding the usual SOA and apex NS sets plus `sets`
    pub fn with_zone(self, name: &str, sets: Vec<RecordSet>) -> Self {
        self.insert_zone(name, sets);
        self
    }

    /// Let the first `n` writes succeed and fail every later one
    pub fn fail_writes_after(mut self, n: usize) -> Self {
        self.write_limit = Some(n);
        self
    }

    fn insert_zone(&self, name: &str, sets: Vec<RecordSet>) -> HostedZone {
        let zone = HostedZone {
            id: format!("Z{}", name.trim_end_matches('.').replace('.', "").to_uppercase()),
            name: format!("{}.", name.trim_end_matches('.')),
            name_servers: vec!["ns-1.awsdns-01.org.".to_string()],
        };
        let mut all = generated_sets(&zone.name);
        all.extend(sets);
        self.zones
            .lock()
            .unwrap()
            .insert(zone.name.clone(), (zone.clone(), all));
        zone
    }

    pub fn read_count(&self) -> usize {
        self.counters.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.counters.writes.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.read_count() + self.write_count()
    }

    pub fn recorded_changes(&self) -> Vec<Change> {
        self.changes.lock().unwrap().clone()
    }

    pub fn count_changes(&self, action: ChangeAction) -> usize {
        self.recorded_changes()
            .iter()
            .filter(|c| c.action == action)
            .count()
    }

    pub fn record_sets(&self, zone_name: &str) -> Vec<RecordSet> {
        self.zones
            .lock()
            .unwrap()
            .get(zone_name)
            .map(|(_, sets)| sets.clone())
            .unwrap_or_default()
    }

    pub fn zone_lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn has_zone(&self, zone_name: &str) -> bool {
        self.zones.lock().unwrap().contains_key(zone_name)
    }

    fn read(&self) {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) -> Result<()> {
        let writes = self.counters.writes.fetch_add(1, Ordering::SeqCst) + 1;
        match self.write_limit {
            Some(limit) if writes > limit => Err(Error::rate_limited(format!(
                "write {} refused (limit {})",
                writes, limit
            ))),
            _ => Ok(()),
        }
    }
}

fn generated_sets(zone_name: &str) -> Vec<RecordSet> {
    vec![
        RecordSet::new(
            zone_name,
            RecordType::Soa,
            900,
            vec!["ns-1.awsdns-01.org. awsdns-hostmaster.amazon.com. 1 7200 900 1209600 86400".into()],
        ),
        RecordSet::new(
            zone_name,
            RecordType::Ns,
            172800,
            vec!["ns-1.awsdns-01.org.".into()],
        ),
    ]
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn find_zone(&self, zone_name: &str) -> Result<Option<HostedZone>> {
        self.read();
        let name = format!("{}.", zone_name.trim_end_matches('.'));
        self.lookups.lock().unwrap().push(name.clone());
        Ok(self
            .zones
            .lock()
            .unwrap()
            .get(&name)
            .map(|(zone, _)| zone.clone()))
    }

    async fn create_zone(&self, zone_name: &str) -> Result<HostedZone> {
        self.write()?;
        Ok(self.insert_zone(zone_name, Vec::new()))
    }

    async fn delete_zone(&self, zone: &HostedZone) -> Result<()> {
        self.write()?;
        self.zones
            .lock()
            .unwrap()
            .remove(&zone.name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(zone.name.clone()))
    }

    async fn list_record_sets(&self, zone: &HostedZone) -> Result<Vec<RecordSet>> {
        self.read();
        Ok(self.record_sets(&zone.name))
    }

    async fn find_record_set(
        &self,
        zone: &HostedZone,
        name: &str,
        record_type: Option<RecordType>,
    ) -> Result<Option<RecordSet>> {
        self.read();
        Ok(self.record_sets(&zone.name).into_iter().find(|set| {
            set.name == name && record_type.is_none_or(|t| t == set.record_type)
        }))
    }

    async fn change_record_sets(&self, zone: &HostedZone, changes: &[Change]) -> Result<()> {
        self.write()?;
        let mut zones = self.zones.lock().unwrap();
        let (_, sets) = zones
            .get_mut(&zone.name)
            .ok_or_else(|| Error::not_found(zone.name.clone()))?;
        for change in changes {
            let key = change.record_set.key();
            sets.retain(|set| set.key() != key);
            if change.action != ChangeAction::Delete {
                sets.push(change.record_set.clone());
            }
        }
        self.changes.lock().unwrap().extend_from_slice(changes);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IpSource returning a fixed address
pub struct FixedIpSource {
    pub ip: IpAddr,
    pub calls: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }
}

/// Write `contents` to `name` inside `dir`
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// A zone file for `example.com` with three plain sets and one alias
pub const EXAMPLE_ZONE: &str = "\
$TTL 3600
@       IN  SOA ns1.example.com. hostmaster.example.com. ( 1 7200 900 1209600 86400 )
@       IN  NS  ns1.example.com.
@       IN  MX  10 mail.example.com.
www     300 IN  A   192.0.2.10
www     300 IN  A   192.0.2.11
mail        IN  A   192.0.2.20
_alias.cdn  IN  TXT \"Alias Z2FDTNDATAQYW2 d111111abcdef8.cloudfront.net.\"
";
