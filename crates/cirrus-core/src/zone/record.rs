//! Record types shared by the zone parser, the reconciler and providers

use std::fmt;
use std::str::FromStr;

/// TTL given to every alias record set.
///
/// Route 53 alias record sets carry no TTL of their own; the zone file
/// convention pins them to this value so both sides compare equal.
pub const ALIAS_TTL: u32 = 600;

/// Owner label marking a TXT record as an encoded alias
pub const ALIAS_LABEL: &str = "_alias";

/// Prefix of an encoded alias TXT value
pub const ALIAS_PREFIX: &str = "Alias ";

/// DNS record types understood by the parser and the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    A,
    Aaaa,
    Caa,
    Cname,
    Ds,
    Mx,
    Naptr,
    Ns,
    Ptr,
    Soa,
    Spf,
    Srv,
    Txt,
}

impl RecordType {
    /// Presentation-format mnemonic
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Ds => "DS",
            RecordType::Mx => "MX",
            RecordType::Naptr => "NAPTR",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Spf => "SPF",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CAA" => RecordType::Caa,
            "CNAME" => RecordType::Cname,
            "DS" => RecordType::Ds,
            "MX" => RecordType::Mx,
            "NAPTR" => RecordType::Naptr,
            "NS" => RecordType::Ns,
            "PTR" => RecordType::Ptr,
            "SOA" => RecordType::Soa,
            "SPF" => RecordType::Spf,
            "SRV" => RecordType::Srv,
            "TXT" => RecordType::Txt,
            other => {
                return Err(crate::Error::invalid_input(format!(
                    "unsupported record type '{}'",
                    other
                )));
            }
        })
    }
}

/// A single parsed resource record, before grouping into record sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Absolute, lower-case owner name
    pub name: String,
    pub ttl: u32,
    pub record_type: RecordType,
    /// Normalized rdata in presentation format
    pub data: String,
    /// Line the record started on
    pub line: usize,
}

/// Target of a provider alias record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    pub hosted_zone_id: String,
    /// Absolute, lower-case DNS name
    pub dns_name: String,
    pub evaluate_target_health: bool,
}

impl AliasTarget {
    pub fn new(hosted_zone_id: impl Into<String>, dns_name: &str) -> Self {
        Self {
            hosted_zone_id: hosted_zone_id.into(),
            dns_name: normalize_name(dns_name),
            evaluate_target_health: false,
        }
    }

    /// Parse the `"<hosted zone id> <dns name>"` pair, with or without the
    /// leading `Alias ` keyword.
    pub fn parse(value: &str) -> crate::Result<Self> {
        let value = value.trim();
        let value = value.strip_prefix(ALIAS_PREFIX).unwrap_or(value);
        let words: Vec<&str> = value.split_whitespace().collect();
        match words.as_slice() {
            [zone_id, dns_name] => Ok(Self::new(*zone_id, dns_name)),
            _ => Err(crate::Error::invalid_input(format!(
                "alias must be '<hosted zone id> <dns name>', got '{}'",
                value
            ))),
        }
    }

    /// The zone-file TXT encoding, without surrounding quotes
    pub fn to_txt_value(&self) -> String {
        format!("{}{} {}", ALIAS_PREFIX, self.hosted_zone_id, self.dns_name)
    }
}

/// What a record set resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordTarget {
    /// Ordinary resource record values
    Values(Vec<String>),
    /// Provider alias
    Alias(AliasTarget),
}

/// All records sharing an owner name and type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    /// Absolute, lower-case owner name
    pub name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    pub target: RecordTarget,
}

impl RecordSet {
    /// Build a plain record set
    pub fn new(name: &str, record_type: RecordType, ttl: u32, values: Vec<String>) -> Self {
        Self {
            name: normalize_name(name),
            record_type,
            ttl,
            target: RecordTarget::Values(values),
        }
    }

    /// Build an alias record set (always type A, TTL [`ALIAS_TTL`])
    pub fn alias(name: &str, target: AliasTarget) -> Self {
        Self {
            name: normalize_name(name),
            record_type: RecordType::A,
            ttl: ALIAS_TTL,
            target: RecordTarget::Alias(target),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: self.name.clone(),
            record_type: self.record_type,
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.target, RecordTarget::Alias(_))
    }

    /// Values of a plain record set; empty for aliases
    pub fn values(&self) -> &[String] {
        match &self.target {
            RecordTarget::Values(values) => values,
            RecordTarget::Alias(_) => &[],
        }
    }

    /// True when the provider generates this set itself (SOA, apex NS)
    pub fn is_provider_managed(&self, zone_name: &str) -> bool {
        self.record_type == RecordType::Soa
            || (self.record_type == RecordType::Ns && self.name == normalize_name(zone_name))
    }

    /// Equality ignoring value order
    pub fn same_content(&self, other: &RecordSet) -> bool {
        if self.name != other.name || self.record_type != other.record_type {
            return false;
        }
        match (&self.target, &other.target) {
            (RecordTarget::Alias(a), RecordTarget::Alias(b)) => {
                a.hosted_zone_id == b.hosted_zone_id && a.dns_name == b.dns_name
            }
            (RecordTarget::Values(a), RecordTarget::Values(b)) => {
                if self.ttl != other.ttl {
                    return false;
                }
                let mut a = a.clone();
                let mut b = b.clone();
                a.sort();
                b.sort();
                a == b
            }
            _ => false,
        }
    }
}

impl fmt::Display for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            RecordTarget::Values(values) => write!(
                f,
                "{} {} {} [{}]",
                self.name,
                self.ttl,
                self.record_type,
                values.join(", ")
            ),
            RecordTarget::Alias(alias) => write!(
                f,
                "{} {} alias -> {} ({})",
                self.name, self.record_type, alias.dns_name, alias.hosted_zone_id
            ),
        }
    }
}

/// Identity of a record set within a hosted zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub name: String,
    pub record_type: RecordType,
}

/// Lower-case a domain name and make it dot-terminated.
///
/// Route 53 escapes `*` as `\052` in responses; that escape is undone here
/// so wildcard owners compare equal with the zone file.
pub fn normalize_name(name: &str) -> String {
    let mut name = name.trim().replace("\\052", "*").to_ascii_lowercase();
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}
