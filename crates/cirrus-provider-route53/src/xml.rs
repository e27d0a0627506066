// Route 53 REST API wire types (API version 2013-04-01)
//
// Requests are serialized and responses deserialized with quick-xml's serde
// support. Element order in request types follows the API schema.

use cirrus_core::zone::{ALIAS_TTL, AliasTarget, RecordSet, RecordTarget, RecordType, normalize_name};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Namespace of every request document
pub const XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListHostedZonesByNameResponse {
    #[serde(default)]
    pub hosted_zones: HostedZones,
}

#[derive(Debug, Default, Deserialize)]
pub struct HostedZones {
    #[serde(rename = "HostedZone", default)]
    pub items: Vec<HostedZoneXml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostedZoneXml {
    /// `/hostedzone/<id>`
    pub id: String,
    pub name: String,
}

impl HostedZoneXml {
    /// Zone id without the `/hostedzone/` prefix
    pub fn bare_id(&self) -> &str {
        self.id.trim_start_matches("/hostedzone/")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateHostedZoneRequest {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    pub name: String,
    pub caller_reference: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateHostedZoneResponse {
    pub hosted_zone: HostedZoneXml,
    #[serde(default)]
    pub delegation_set: DelegationSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DelegationSet {
    #[serde(default)]
    pub name_servers: NameServers,
}

#[derive(Debug, Default, Deserialize)]
pub struct NameServers {
    #[serde(rename = "NameServer", default)]
    pub items: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResourceRecordSetsResponse {
    #[serde(default)]
    pub resource_record_sets: ResourceRecordSets,
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub next_record_name: Option<String>,
    #[serde(default)]
    pub next_record_type: Option<String>,
    #[serde(default)]
    pub next_record_identifier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceRecordSets {
    #[serde(rename = "ResourceRecordSet", default)]
    pub items: Vec<ResourceRecordSetXml>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecordSetXml {
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_records: Option<ResourceRecords>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<AliasTargetXml>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecords {
    #[serde(rename = "ResourceRecord", default)]
    pub items: Vec<ResourceRecordXml>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecordXml {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliasTargetXml {
    pub hosted_zone_id: String,
    #[serde(rename = "DNSName")]
    pub dns_name: String,
    #[serde(default)]
    pub evaluate_target_health: bool,
}

impl From<&RecordSet> for ResourceRecordSetXml {
    fn from(set: &RecordSet) -> Self {
        match &set.target {
            RecordTarget::Values(values) => Self {
                name: set.name.clone(),
                record_type: set.record_type.to_string(),
                ttl: Some(set.ttl),
                resource_records: Some(ResourceRecords {
                    items: values
                        .iter()
                        .map(|value| ResourceRecordXml {
                            value: value.clone(),
                        })
                        .collect(),
                }),
                alias_target: None,
            },
            // aliases carry no TTL or records of their own
            RecordTarget::Alias(alias) => Self {
                name: set.name.clone(),
                record_type: set.record_type.to_string(),
                ttl: None,
                resource_records: None,
                alias_target: Some(AliasTargetXml {
                    hosted_zone_id: alias.hosted_zone_id.clone(),
                    dns_name: alias.dns_name.clone(),
                    evaluate_target_health: alias.evaluate_target_health,
                }),
            },
        }
    }
}

impl ResourceRecordSetXml {
    /// Convert to a [`RecordSet`]; `None` for types cirrus doesn't manage
    pub fn into_record_set(self) -> Option<RecordSet> {
        let record_type: RecordType = match self.record_type.parse() {
            Ok(record_type) => record_type,
            Err(_) => {
                debug!("Skipping {} record set at {}", self.record_type, self.name);
                return None;
            }
        };

        let name = normalize_name(&self.name);
        match self.alias_target {
            Some(alias) => {
                let mut target = AliasTarget::new(alias.hosted_zone_id, &alias.dns_name);
                target.evaluate_target_health = alias.evaluate_target_health;
                Some(RecordSet {
                    name,
                    record_type,
                    ttl: ALIAS_TTL,
                    target: RecordTarget::Alias(target),
                })
            }
            None => {
                let values = self
                    .resource_records
                    .map(|records| records.items.into_iter().map(|r| r.value).collect())
                    .unwrap_or_default();
                Some(RecordSet::new(
                    &name,
                    record_type,
                    self.ttl.unwrap_or_default(),
                    values,
                ))
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeResourceRecordSetsRequest {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    pub change_batch: ChangeBatch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeBatch {
    pub changes: Changes,
}

#[derive(Debug, Serialize)]
pub struct Changes {
    #[serde(rename = "Change")]
    pub items: Vec<ChangeXml>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeXml {
    pub action: &'static str,
    pub resource_record_set: ResourceRecordSetXml,
}

/// `<ErrorResponse>` body of a failed call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// `<InvalidChangeBatch>` body of a rejected change batch
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvalidChangeBatch {
    #[serde(default)]
    pub messages: Messages,
}

#[derive(Debug, Default, Deserialize)]
pub struct Messages {
    #[serde(rename = "Message", default)]
    pub items: Vec<String>,
}

/// Error code and message from an error body, if it is one Route 53 sends
pub fn parse_error(body: &str) -> Option<(String, String)> {
    if let Ok(response) = quick_xml::de::from_str::<ErrorResponse>(body) {
        return Some((response.error.code, response.error.message));
    }
    if let Ok(batch) = quick_xml::de::from_str::<InvalidChangeBatch>(body) {
        if !batch.messages.items.is_empty() {
            return Some((
                "InvalidChangeBatch".to_string(),
                batch.messages.items.join("; "),
            ));
        }
    }
    None
}
