// # HTTP IP Source
//
// Discovers the caller's public address for `update-host --my-ip` by asking
// IP echo services over HTTP.
//
// ## Behavior
//
// - Services are tried in order; the first usable answer wins
// - A service fails over to the next on transport errors, non-2xx status,
//   unparsable bodies, or an address of the wrong IP version
// - Bodies may be plain text (`203.0.113.7`) or JSON (`{"ip": "203.0.113.7"}`)
// - HTTP timeout of 10 seconds per service
// - No caching: every call asks again

use cirrus_core::traits::{IpSource, IpVersion};
use cirrus_core::{Error, Result};
use std::net::IpAddr;
use std::time::Duration;

/// Default IP echo services
pub const DEFAULT_IP_SERVICES: &[&str] = &[
    "https://api.ipify.org",  // returns plain text IP
    "https://ifconfig.me/ip", // No rate limit documented
    "https://icanhazip.com",  // No rate limit documented
];

/// Default HTTP timeout per service (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// Services to ask, in order
    urls: Vec<String>,
    /// IP version to accept (None = either)
    version: Option<IpVersion>,
    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source asking `urls` in order
    pub fn new(urls: Vec<String>, version: Option<IpVersion>) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::config("At least one IP service URL is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            urls,
            version,
            client,
        })
    }

    /// Create a source using [`DEFAULT_IP_SERVICES`]
    pub fn with_defaults(version: Option<IpVersion>) -> Result<Self> {
        Self::new(
            DEFAULT_IP_SERVICES.iter().map(|url| url.to_string()).collect(),
            version,
        )
    }

    /// Ask a single service
    async fn fetch_ip(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::provider("http", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::provider(
                "http",
                format!("HTTP error: {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::provider("http", format!("Failed to read response: {}", e)))?;

        let ip = parse_ip_body(&body)?;

        if let Some(version) = self.version {
            if IpVersion::of(&ip) != version {
                return Err(Error::provider(
                    "http",
                    format!("Expected {:?}, got: {}", version, ip),
                ));
            }
        }

        Ok(ip)
    }
}

/// Extract an address from a plain-text or `{"ip": ...}` JSON body
pub fn parse_ip_body(body: &str) -> Result<IpAddr> {
    let text = body.trim();

    let candidate = if text.starts_with('{') {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::provider("http", format!("Invalid JSON response: {}", e)))?;
        json["ip"]
            .as_str()
            .ok_or_else(|| Error::provider("http", "JSON response has no \"ip\" string"))?
            .trim()
            .to_string()
    } else {
        text.to_string()
    };

    candidate
        .parse()
        .map_err(|_| Error::provider("http", format!("Invalid IP address: {}", candidate)))
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let mut last_error = None;

        for url in &self.urls {
            match self.fetch_ip(url).await {
                Ok(ip) => {
                    tracing::debug!("{} reports public address {}", url, ip);
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!("IP service {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::config("No IP services configured")))
    }

    fn version(&self) -> Option<IpVersion> {
        self.version
    }
}
