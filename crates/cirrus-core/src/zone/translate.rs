//! Grouping of parsed records into provider record sets
//!
//! Records sharing `(name, type)` become one [`RecordSet`]. Encoded alias
//! TXT records (`_alias.<name> TXT "Alias <zone id> <dns name>"`) become
//! native alias record sets at `<name>`.

use super::record::{
    ALIAS_LABEL, ALIAS_PREFIX, ALIAS_TTL, AliasTarget, RecordKey, RecordSet, RecordTarget,
    RecordType, ResourceRecord,
};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Translate parsed records for `zone_name` into record sets, in order of
/// first appearance. SOA and apex NS records are dropped.
pub fn translate(
    records: &[ResourceRecord],
    zone_name: &str,
    path: &Path,
) -> Result<Vec<RecordSet>> {
    let mut sets: Vec<RecordSet> = Vec::new();
    let mut index: HashMap<RecordKey, usize> = HashMap::new();
    // line each set was first defined on, for conflict messages
    let mut origin_line: Vec<usize> = Vec::new();

    for record in records {
        if let Some(alias) = alias_value(record) {
            let name = strip_alias_label(&record.name);
            let target = AliasTarget::parse(alias)
                .map_err(|e| Error::zone_parse(path, record.line, e.to_string()))?;
            info!("Interpreting TXT entry for {} as a route53 alias", name);
            if record.ttl != ALIAS_TTL {
                debug!(
                    "Alias {} declared with TTL {}, using {}",
                    name, record.ttl, ALIAS_TTL
                );
            }

            let set = RecordSet::alias(&name, target);
            if let Some(&existing) = index.get(&set.key()) {
                return Err(Error::zone_parse(
                    path,
                    record.line,
                    format!(
                        "alias for {} conflicts with the A record set defined on line {}",
                        name, origin_line[existing]
                    ),
                ));
            }
            index.insert(set.key(), sets.len());
            origin_line.push(record.line);
            sets.push(set);
            continue;
        }

        let set = RecordSet::new(
            &record.name,
            record.record_type,
            record.ttl,
            vec![record.data.clone()],
        );
        if set.is_provider_managed(zone_name) {
            debug!("Skipping provider managed record {}", set);
            continue;
        }

        match index.get(&set.key()) {
            Some(&existing) => {
                let current = &mut sets[existing];
                let RecordTarget::Values(values) = &mut current.target else {
                    return Err(Error::zone_parse(
                        path,
                        record.line,
                        format!(
                            "{} {} conflicts with the alias defined on line {}",
                            record.name, record.record_type, origin_line[existing]
                        ),
                    ));
                };
                if !values.contains(&record.data) {
                    values.push(record.data.clone());
                }
                // one TTL per set; the smallest wins
                current.ttl = current.ttl.min(record.ttl);
            }
            None => {
                index.insert(set.key(), sets.len());
                origin_line.push(record.line);
                sets.push(set);
            }
        }
    }

    Ok(sets)
}

/// The alias payload of an encoded alias TXT record, if `record` is one
fn alias_value(record: &ResourceRecord) -> Option<&str> {
    if record.record_type != RecordType::Txt {
        return None;
    }
    let inner = record.data.strip_prefix('"')?.strip_suffix('"')?;
    if inner.starts_with(ALIAS_PREFIX) && !inner.contains('"') {
        Some(inner)
    } else {
        None
    }
}

fn strip_alias_label(name: &str) -> String {
    let prefix = format!("{}.", ALIAS_LABEL);
    name.strip_prefix(&prefix).unwrap_or(name).to_string()
}
