//! リソース記述の共通型
//!
//! 5種類のリソース記述をタグ付きenumとしてまとめ、
//! 依存関係はライブハンドルではなくIDで表現します。

use super::certificate::CertificateResource;
use super::deployment::DeploymentResource;
use super::distribution::EdgeDistributionResource;
use super::dns::DnsRecordResource;
use super::storage::StorageResource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// グラフ内でリソースを識別する論理ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// リソースの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Storage,
    Certificate,
    Distribution,
    Deployment,
    DnsRecord,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Storage => write!(f, "storage"),
            ResourceKind::Certificate => write!(f, "certificate"),
            ResourceKind::Distribution => write!(f, "distribution"),
            ResourceKind::Deployment => write!(f, "deployment"),
            ResourceKind::DnsRecord => write!(f, "dns-record"),
        }
    }
}

/// リソース記述
///
/// 調整エンジンに一度だけ提出される不変の仕様です。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    Storage(StorageResource),
    Certificate(CertificateResource),
    Distribution(EdgeDistributionResource),
    Deployment(DeploymentResource),
    DnsRecord(DnsRecordResource),
}

impl Resource {
    pub fn id(&self) -> &ResourceId {
        match self {
            Resource::Storage(r) => &r.id,
            Resource::Certificate(r) => &r.id,
            Resource::Distribution(r) => &r.id,
            Resource::Deployment(r) => &r.id,
            Resource::DnsRecord(r) => &r.id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Storage(_) => ResourceKind::Storage,
            Resource::Certificate(_) => ResourceKind::Certificate,
            Resource::Distribution(_) => ResourceKind::Distribution,
            Resource::Deployment(_) => ResourceKind::Deployment,
            Resource::DnsRecord(_) => ResourceKind::DnsRecord,
        }
    }

    /// グラフ内の依存先と、その依存先に期待される種類
    ///
    /// DNSゾーンはグラフ外の既存リソースなので含まない。
    pub fn dependencies(&self) -> Vec<(&ResourceId, ResourceKind)> {
        match self {
            Resource::Storage(_) | Resource::Certificate(_) => Vec::new(),
            Resource::Distribution(r) => vec![
                (&r.origin, ResourceKind::Storage),
                (&r.certificate, ResourceKind::Certificate),
            ],
            Resource::Deployment(r) => vec![
                (&r.destination, ResourceKind::Storage),
                (&r.distribution, ResourceKind::Distribution),
            ],
            Resource::DnsRecord(r) => vec![(&r.alias_target, ResourceKind::Distribution)],
        }
    }

    pub fn as_storage(&self) -> Option<&StorageResource> {
        match self {
            Resource::Storage(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_certificate(&self) -> Option<&CertificateResource> {
        match self {
            Resource::Certificate(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_distribution(&self) -> Option<&EdgeDistributionResource> {
        match self {
            Resource::Distribution(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_deployment(&self) -> Option<&DeploymentResource> {
        match self {
            Resource::Deployment(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_dns_record(&self) -> Option<&DnsRecordResource> {
        match self {
            Resource::DnsRecord(r) => Some(r),
            _ => None,
        }
    }
}

impl From<StorageResource> for Resource {
    fn from(r: StorageResource) -> Self {
        Resource::Storage(r)
    }
}

impl From<CertificateResource> for Resource {
    fn from(r: CertificateResource) -> Self {
        Resource::Certificate(r)
    }
}

impl From<EdgeDistributionResource> for Resource {
    fn from(r: EdgeDistributionResource) -> Self {
        Resource::Distribution(r)
    }
}

impl From<DeploymentResource> for Resource {
    fn from(r: DeploymentResource) -> Self {
        Resource::Deployment(r)
    }
}

impl From<DnsRecordResource> for Resource {
    fn from(r: DnsRecordResource) -> Self {
        Resource::DnsRecord(r)
    }
}
