//! zone ノードのパース

use crate::error::{Result, SiteError};
use crate::model::HostedZone;
use kdl::KdlNode;

/// zone ノードをパース
///
/// 例: `zone "example.com" id="Z0123456789"`
pub fn parse_zone(node: &KdlNode) -> Result<HostedZone> {
    let name = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| SiteError::InvalidConfig("zone requires a name".to_string()))?;

    let zone_id = node
        .entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some("id"))
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| SiteError::InvalidConfig(format!("zone '{}' requires id=\"...\"", name)))?;

    Ok(HostedZone::new(zone_id, name))
}
