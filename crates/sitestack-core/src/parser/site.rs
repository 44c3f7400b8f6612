//! site ノードのパース

use crate::error::{Result, SiteError};
use crate::model::SiteSpec;
use kdl::KdlNode;

fn first_string(node: &KdlNode) -> Option<&str> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
}

/// site ノードをパース
pub fn parse_site(node: &KdlNode) -> Result<SiteSpec> {
    let domain = first_string(node)
        .ok_or_else(|| SiteError::InvalidConfig("site requires a domain name".to_string()))?;

    let mut site = SiteSpec::new(domain);

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value();
            let value = first_string(child).ok_or_else(|| {
                SiteError::InvalidConfig(format!("site.{} requires a string value", key))
            })?;
            match key {
                "index" | "index_document" | "index-document" => {
                    site.index_document = value.to_string();
                }
                "error" | "error_document" | "error-document" => {
                    site.error_document = value.to_string();
                }
                "source" => {
                    site.source = value.into();
                }
                "region" => {
                    site.region = value.to_string();
                }
                other => {
                    tracing::warn!(key = other, "Unknown site setting ignored");
                }
            }
        }
    }

    Ok(site)
}
