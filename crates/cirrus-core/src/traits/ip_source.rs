// # IP Source Trait
//
// Discovers the caller's public address for `update-host --my-ip`.
//
// ## Implementations
//
// - HTTP echo services: `cirrus-ip-http` crate

use async_trait::async_trait;
use std::net::IpAddr;

/// IP version to look up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

/// Trait for IP source implementations
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IP address
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Restrict lookups to one IP version; `None` accepts either
    fn version(&self) -> Option<IpVersion> {
        None
    }
}
