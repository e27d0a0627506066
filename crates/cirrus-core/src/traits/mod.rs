//! Core traits for cirrus
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: Read and change hosted zones via provider APIs
//! - [`IpSource`]: Discover the caller's public IP address

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::{
    Change, ChangeAction, DnsProvider, DnsProviderFactory, HostedZone, UpdateResult,
};
pub use ip_source::{IpSource, IpVersion};
