//! KDLパーサー
//!
//! site.kdl をパースして [`SiteFile`] を生成します。
//!
//! ```kdl
//! site "example.com" {
//!     index "index.html"
//!     error "error.html"
//!     source "website/dist"
//!     region "eu-west-2"
//! }
//! zone "example.com" id="Z0123456789"
//! ```

mod site;
mod zone;

use site::parse_site;
use zone::parse_zone;

use crate::error::{Result, SiteError};
use crate::model::SiteFile;
use kdl::KdlDocument;
use std::fs;
use std::path::Path;

/// KDLファイルをパース
pub fn parse_site_file<P: AsRef<Path>>(path: P) -> Result<SiteFile> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| SiteError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_site_string(&content)
}

/// KDL文字列をパース
pub fn parse_site_string(content: &str) -> Result<SiteFile> {
    let doc: KdlDocument = content.parse()?;

    let mut site = None;
    let mut zones = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "site" => {
                if site.is_some() {
                    return Err(SiteError::InvalidConfig(
                        "only one site node is allowed".to_string(),
                    ));
                }
                site = Some(parse_site(node)?);
            }
            "zone" => {
                zones.push(parse_zone(node)?);
            }
            other => {
                // 不明なノードはスキップ
                tracing::debug!(node = other, "Skipping unknown node");
            }
        }
    }

    let site = site.ok_or_else(|| SiteError::InvalidConfig("site node is required".to_string()))?;
    Ok(SiteFile { site, zones })
}
