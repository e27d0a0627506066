// # Amazon Route 53 DNS Provider
//
// This crate provides a Route 53 implementation of `cirrus_core::DnsProvider`
// over the REST/XML API, signed with AWS Signature Version 4.
//
// ## Behavior
//
// - One HTTP request per call, except record listing (paginated) and change
//   batches longer than 100 changes (split into several requests)
// - Errors are returned as they happen; no retry, no backoff
// - HTTP timeout of 30 seconds
// - Status mapping: 401/403 → authentication, 404 → not found,
//   429 and `Throttling` → rate limited, anything else → provider error
//   carrying the AWS error code
//
// ## Security Requirements
//
// - The secret key NEVER appears in logs or Debug output
// - Empty credentials are rejected before any request is made
//
// ## API Reference
//
// - https://docs.aws.amazon.com/Route53/latest/APIReference/
// - List zones: GET `/2013-04-01/hostedzonesbyname?dnsname=...`
// - Create zone: POST `/2013-04-01/hostedzone`
// - Delete zone: DELETE `/2013-04-01/hostedzone/:id`
// - List record sets: GET `/2013-04-01/hostedzone/:id/rrset`
// - Change record sets: POST `/2013-04-01/hostedzone/:id/rrset`

pub mod sign;
pub mod xml;

use async_trait::async_trait;
use chrono::Utc;
use cirrus_core::config::{Credentials, ProviderConfig};
use cirrus_core::traits::{Change, DnsProvider, DnsProviderFactory, HostedZone};
use cirrus_core::zone::{RecordSet, RecordType, normalize_name};
use cirrus_core::{Error, Result};
use reqwest::{Method, StatusCode, Url};
use sign::{Signer, uri_encode};
use std::time::Duration;
use xml::{
    ChangeBatch, ChangeResourceRecordSetsRequest, ChangeXml, Changes, CreateHostedZoneRequest,
    CreateHostedZoneResponse, ListHostedZonesByNameResponse, ListResourceRecordSetsResponse, XMLNS,
};

/// Route 53 API base URL
pub const ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";

/// Route 53 API version path segment
const API_VERSION: &str = "2013-04-01";

/// Route 53 is a global service signed in us-east-1
const SIGNING_REGION: &str = "us-east-1";
const SIGNING_SERVICE: &str = "route53";

/// Largest change batch sent in one request
pub const MAX_CHANGES_PER_REQUEST: usize = 100;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "route53";

/// Route 53 DNS provider
///
/// Stateless apart from the HTTP client; every method is a direct
/// translation to API requests.
pub struct Route53Provider {
    /// API credentials
    /// ⚠️ NEVER log the secret key
    credentials: Credentials,

    /// API base URL, without trailing slash
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the secret key
impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("access_id", &self.credentials.access_id)
            .field("secret_key", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Route53Provider {
    /// Create a provider talking to the public Route 53 endpoint
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_endpoint(credentials, ROUTE53_ENDPOINT)
    }

    /// Create a provider talking to `endpoint` (tests, proxies)
    pub fn with_endpoint(credentials: Credentials, endpoint: impl Into<String>) -> Result<Self> {
        credentials.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Send a signed request and return the response body.
    ///
    /// `path_and_query` starts after the API version, e.g. `/hostedzone`.
    async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<String>,
    ) -> Result<String> {
        let url = format!("{}/{}{}", self.endpoint, API_VERSION, path_and_query);
        let url = Url::parse(&url)
            .map_err(|e| Error::config(format!("Invalid Route 53 URL {}: {}", url, e)))?;

        let payload = body.unwrap_or_default();
        let signer = Signer {
            access_id: &self.credentials.access_id,
            secret_key: &self.credentials.secret_key,
            region: SIGNING_REGION,
            service: SIGNING_SERVICE,
        };
        let signed = signer.sign(method.as_str(), &url, payload.as_bytes(), Utc::now())?;

        tracing::debug!("Route 53 request: {} {}", method, url.path());

        let mut request = self
            .client
            .request(method, url)
            .header("x-amz-date", signed.amz_date)
            .header("authorization", signed.authorization);
        if !payload.is_empty() {
            request = request
                .header("content-type", "text/xml")
                .body(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(api_error(status, &text))
        }
    }

    async fn list_page(
        &self,
        zone: &HostedZone,
        start: Option<(&str, Option<&str>, Option<&str>)>,
        max_items: Option<usize>,
    ) -> Result<ListResourceRecordSetsResponse> {
        let mut query = Vec::new();
        if let Some((name, record_type, identifier)) = start {
            query.push(format!("name={}", uri_encode(name)));
            if let Some(record_type) = record_type {
                query.push(format!("type={}", uri_encode(record_type)));
            }
            if let Some(identifier) = identifier {
                query.push(format!("identifier={}", uri_encode(identifier)));
            }
        }
        if let Some(max_items) = max_items {
            query.push(format!("maxitems={}", max_items));
        }

        let mut path = format!("/hostedzone/{}/rrset", zone.id);
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }

        let body = self.request(Method::GET, &path, None).await?;
        parse(&body)
    }
}

/// Deserialize a response body
fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    quick_xml::de::from_str(body)
        .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))
}

/// Map a failed response to an error
fn api_error(status: StatusCode, body: &str) -> Error {
    let (code, message) = xml::parse_error(body)
        .unwrap_or_else(|| (String::new(), body.trim().to_string()));

    match (status.as_u16(), code.as_str()) {
        (401 | 403, _) => Error::auth(format!(
            "Invalid credentials or insufficient permissions. Status: {} {} {}",
            status, code, message
        )),
        (404, _) | (_, "NoSuchHostedZone") => Error::not_found(message),
        (429, _) | (_, "Throttling") | (_, "PriorRequestNotComplete") => Error::rate_limited(
            format!("Rate limit exceeded. Status: {} - {}", status, message),
        ),
        (500..=599, _) => Error::provider(
            PROVIDER,
            format!("Route 53 server error: {} - {}", status, message),
        ),
        (_, "") => Error::provider(PROVIDER, format!("{} - {}", status, message)),
        _ => Error::provider(PROVIDER, format!("{}: {}", code, message)),
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    /// ```http
    /// GET /2013-04-01/hostedzonesbyname?dnsname=example.com.&maxitems=1
    /// ```
    async fn find_zone(&self, zone_name: &str) -> Result<Option<HostedZone>> {
        let zone_name = normalize_name(zone_name);
        tracing::debug!("Looking up hosted zone {}", zone_name);

        let path = format!(
            "/hostedzonesbyname?dnsname={}&maxitems=1",
            uri_encode(&zone_name)
        );
        let body = self.request(Method::GET, &path, None).await?;
        let response: ListHostedZonesByNameResponse = parse(&body)?;

        // the listing starts at dnsname, so the first zone may be a later one
        let zone = response
            .hosted_zones
            .items
            .into_iter()
            .find(|zone| normalize_name(&zone.name) == zone_name)
            .map(|zone| HostedZone {
                id: zone.bare_id().to_string(),
                name: zone_name.clone(),
                name_servers: Vec::new(),
            });

        match &zone {
            Some(zone) => tracing::debug!("Found hosted zone {} ({})", zone.name, zone.id),
            None => tracing::debug!("No hosted zone named {}", zone_name),
        }
        Ok(zone)
    }

    /// ```http
    /// POST /2013-04-01/hostedzone
    /// <CreateHostedZoneRequest>...</CreateHostedZoneRequest>
    /// ```
    async fn create_zone(&self, zone_name: &str) -> Result<HostedZone> {
        let zone_name = normalize_name(zone_name);
        let request = CreateHostedZoneRequest {
            xmlns: XMLNS,
            name: zone_name.clone(),
            caller_reference: format!(
                "cirrus-{}-{}",
                zone_name.trim_end_matches('.'),
                Utc::now().timestamp_millis()
            ),
        };
        let body = quick_xml::se::to_string_with_root("CreateHostedZoneRequest", &request)
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to encode request: {}", e)))?;

        let body = self.request(Method::POST, "/hostedzone", Some(body)).await?;
        let response: CreateHostedZoneResponse = parse(&body)?;

        let zone = HostedZone {
            id: response.hosted_zone.bare_id().to_string(),
            name: normalize_name(&response.hosted_zone.name),
            name_servers: response.delegation_set.name_servers.items,
        };
        tracing::info!("Created hosted zone {} ({})", zone.name, zone.id);
        Ok(zone)
    }

    /// ```http
    /// DELETE /2013-04-01/hostedzone/:id
    /// ```
    async fn delete_zone(&self, zone: &HostedZone) -> Result<()> {
        let path = format!("/hostedzone/{}", zone.id);
        self.request(Method::DELETE, &path, None).await?;
        tracing::info!("Deleted hosted zone {} ({})", zone.name, zone.id);
        Ok(())
    }

    /// ```http
    /// GET /2013-04-01/hostedzone/:id/rrset[?name=...&type=...&identifier=...]
    /// ```
    async fn list_record_sets(&self, zone: &HostedZone) -> Result<Vec<RecordSet>> {
        let mut sets = Vec::new();
        let mut next: Option<(String, Option<String>, Option<String>)> = None;

        loop {
            let start = next
                .as_ref()
                .map(|(name, record_type, identifier)| {
                    (name.as_str(), record_type.as_deref(), identifier.as_deref())
                });
            let page = self.list_page(zone, start, None).await?;

            sets.extend(
                page.resource_record_sets
                    .items
                    .into_iter()
                    .filter_map(xml::ResourceRecordSetXml::into_record_set),
            );

            match (page.is_truncated, page.next_record_name) {
                (true, Some(name)) => {
                    next = Some((name, page.next_record_type, page.next_record_identifier))
                }
                _ => break,
            }
        }

        tracing::debug!("Zone {} holds {} record set(s)", zone.name, sets.len());
        Ok(sets)
    }

    /// ```http
    /// GET /2013-04-01/hostedzone/:id/rrset?name=...&type=...&maxitems=1
    /// ```
    async fn find_record_set(
        &self,
        zone: &HostedZone,
        name: &str,
        record_type: Option<RecordType>,
    ) -> Result<Option<RecordSet>> {
        let name = normalize_name(name);
        let type_name = record_type.map(|t| t.as_str());
        let page = self
            .list_page(zone, Some((&name, type_name, None)), Some(1))
            .await?;

        // the listing starts at name/type and runs on past it
        Ok(page
            .resource_record_sets
            .items
            .into_iter()
            .filter_map(xml::ResourceRecordSetXml::into_record_set)
            .find(|set| set.name == name && record_type.is_none_or(|t| t == set.record_type)))
    }

    /// ```http
    /// POST /2013-04-01/hostedzone/:id/rrset
    /// <ChangeResourceRecordSetsRequest>...</ChangeResourceRecordSetsRequest>
    /// ```
    async fn change_record_sets(&self, zone: &HostedZone, changes: &[Change]) -> Result<()> {
        let path = format!("/hostedzone/{}/rrset", zone.id);

        for chunk in changes.chunks(MAX_CHANGES_PER_REQUEST) {
            let request = ChangeResourceRecordSetsRequest {
                xmlns: XMLNS,
                change_batch: ChangeBatch {
                    changes: Changes {
                        items: chunk
                            .iter()
                            .map(|change| ChangeXml {
                                action: change.action.as_str(),
                                resource_record_set: (&change.record_set).into(),
                            })
                            .collect(),
                    },
                },
            };
            let body = quick_xml::se::to_string_with_root("ChangeResourceRecordSetsRequest", &request)
                .map_err(|e| {
                    Error::provider(PROVIDER, format!("Failed to encode change batch: {}", e))
                })?;

            tracing::debug!("Sending {} change(s) to zone {}", chunk.len(), zone.name);
            self.request(Method::POST, &path, Some(body)).await?;
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Route 53 providers
pub struct Route53Factory;

impl DnsProviderFactory for Route53Factory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Route53 {
                credentials,
                endpoint,
            } => {
                let endpoint = endpoint.as_deref().unwrap_or(ROUTE53_ENDPOINT);
                Ok(Box::new(Route53Provider::with_endpoint(
                    credentials.clone(),
                    endpoint,
                )?))
            }
        }
    }
}

/// Register the Route 53 provider with a registry
///
/// # Example
///
/// ```rust
/// use cirrus_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// cirrus_provider_route53::register(&registry);
/// assert!(registry.has_provider("route53"));
/// ```
pub fn register(registry: &cirrus_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(Route53Factory));
}
