//! DNSゾーン（グラフ外の既存リソース）

use serde::{Deserialize, Serialize};

/// ゾーン検索で得られる既存ゾーンへのハンドル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// プロバイダー側のゾーンID
    pub zone_id: String,

    /// ゾーン名（例: example.com）
    pub name: String,
}

impl HostedZone {
    pub fn new(zone_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            name: normalize_domain(&name.into()),
        }
    }

    /// ドメインがこのゾーンに属するか（ゾーン頂点を含む）
    pub fn covers(&self, domain: &str) -> bool {
        let domain = normalize_domain(domain);
        domain == self.name || domain.ends_with(&format!(".{}", self.name))
    }
}

/// 小文字化し、末尾のドットを取り除く
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_apex_and_subdomains() {
        let zone = HostedZone::new("Z123", "example.com");
        assert!(zone.covers("example.com"));
        assert!(zone.covers("www.example.com"));
        assert!(zone.covers("Example.COM."));
        assert!(!zone.covers("badexample.com"));
        assert!(!zone.covers("example.org"));
    }
}
