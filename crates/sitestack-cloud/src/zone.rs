//! DNS zone lookup

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use sitestack_core::HostedZone;

/// Resolves a domain to a pre-existing hosted zone
#[async_trait]
pub trait ZoneLookup: Send + Sync {
    /// Fails with [`CloudError::ZoneNotFound`] when no zone covers the domain
    async fn lookup(&self, domain: &str) -> Result<HostedZone>;
}

/// Zone lookup over a fixed list of known zones (e.g. `zone` nodes in site.kdl)
#[derive(Debug, Clone, Default)]
pub struct StaticZoneLookup {
    zones: Vec<HostedZone>,
}

impl StaticZoneLookup {
    pub fn new(zones: Vec<HostedZone>) -> Self {
        Self { zones }
    }
}

#[async_trait]
impl ZoneLookup for StaticZoneLookup {
    async fn lookup(&self, domain: &str) -> Result<HostedZone> {
        // The most specific zone wins (sub.example.com over example.com)
        let zone = self
            .zones
            .iter()
            .filter(|z| z.covers(domain))
            .max_by_key(|z| z.name.len())
            .cloned()
            .ok_or_else(|| CloudError::ZoneNotFound(domain.to_string()))?;

        tracing::debug!(domain, zone = %zone.name, zone_id = %zone.zone_id, "Resolved hosted zone");
        Ok(zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> StaticZoneLookup {
        StaticZoneLookup::new(vec![
            HostedZone::new("Z1", "example.com"),
            HostedZone::new("Z2", "app.example.com"),
            HostedZone::new("Z3", "example.org"),
        ])
    }

    #[tokio::test]
    async fn test_lookup_exact_zone() {
        let zone = lookup().lookup("example.com").await.unwrap();
        assert_eq!(zone.zone_id, "Z1");
    }

    #[tokio::test]
    async fn test_lookup_prefers_most_specific_zone() {
        let zone = lookup().lookup("beta.app.example.com").await.unwrap();
        assert_eq!(zone.zone_id, "Z2");

        let zone = lookup().lookup("www.example.com").await.unwrap();
        assert_eq!(zone.zone_id, "Z1");
    }

    #[tokio::test]
    async fn test_lookup_missing_zone() {
        let result = lookup().lookup("example.net").await;
        assert!(matches!(result, Err(CloudError::ZoneNotFound(d)) if d == "example.net"));
    }
}
