//! リソースグラフ
//!
//! 挿入順を保持したリソース記述の集合。依存関係はIDで表現され、
//! 作成順（トポロジカル順）と削除順（その逆）を導出できます。

use super::certificate::CERTIFICATE_REGION;
use super::deployment::invalidation_paths;
use super::distribution::SOFT_404_STATUS_CODES;
use super::resource::{Resource, ResourceId, ResourceKind};
use super::storage::{StorageResource, is_valid_bucket_name};
use crate::error::{Result, SiteError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// テンプレート形式のバージョン
pub const TEMPLATE_VERSION: u32 = 1;

/// 調整エンジンに提出する希望状態のグラフ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Template", try_from = "Template")]
pub struct ResourceGraph {
    resources: Vec<Resource>,
}

/// シリアライズ時のテンプレート表現
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Template {
    version: u32,
    resources: Vec<Resource>,
}

impl From<ResourceGraph> for Template {
    fn from(graph: ResourceGraph) -> Self {
        Self {
            version: TEMPLATE_VERSION,
            resources: graph.resources,
        }
    }
}

impl TryFrom<Template> for ResourceGraph {
    type Error = SiteError;

    fn try_from(template: Template) -> Result<Self> {
        if template.version > TEMPLATE_VERSION {
            return Err(SiteError::InvalidConfig(format!(
                "template version {} is newer than supported version {}",
                template.version, TEMPLATE_VERSION
            )));
        }
        let mut graph = ResourceGraph::new();
        for resource in template.resources {
            graph.add(resource)?;
        }
        Ok(graph)
    }
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// リソースを追加（IDの重複はエラー）
    pub fn add(&mut self, resource: impl Into<Resource>) -> Result<()> {
        let resource = resource.into();
        if self.get(resource.id()).is_some() {
            return Err(SiteError::DuplicateResource(resource.id().to_string()));
        }
        self.resources.push(resource);
        Ok(())
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn by_kind(&self, kind: ResourceKind) -> Vec<&Resource> {
        self.resources.iter().filter(|r| r.kind() == kind).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// 依存エッジ（依存元, 依存先）の一覧
    pub fn edges(&self) -> Vec<(ResourceId, ResourceId)> {
        self.resources
            .iter()
            .flat_map(|r| {
                r.dependencies()
                    .into_iter()
                    .map(|(dep, _)| (r.id().clone(), dep.clone()))
            })
            .collect()
    }

    /// 作成順（依存先が先、同順位は挿入順）
    pub fn creation_order(&self) -> Result<Vec<&Resource>> {
        let mut placed: HashSet<&ResourceId> = HashSet::new();
        let mut order = Vec::with_capacity(self.resources.len());

        while order.len() < self.resources.len() {
            let next = self.resources.iter().find(|r| {
                !placed.contains(r.id())
                    && r
                        .dependencies()
                        .iter()
                        .all(|(dep, _)| placed.contains(dep) || self.get(dep).is_none())
            });

            match next {
                Some(resource) => {
                    placed.insert(resource.id());
                    order.push(resource);
                }
                None => {
                    let remaining: Vec<_> = self
                        .resources
                        .iter()
                        .filter(|r| !placed.contains(r.id()))
                        .map(|r| r.id().as_str())
                        .collect();
                    return Err(SiteError::CircularDependency(remaining.join(" -> ")));
                }
            }
        }

        Ok(order)
    }

    /// 削除順（作成順の逆）
    pub fn destroy_order(&self) -> Result<Vec<&Resource>> {
        let mut order = self.creation_order()?;
        order.reverse();
        Ok(order)
    }

    /// 構造と不変条件を検証
    ///
    /// 参照先の存在と種類、循環の有無、各リソース種別の不変条件を確認する。
    pub fn validate(&self) -> Result<()> {
        self.validate_references()?;
        self.creation_order()?;

        let mut alias_records: HashMap<(String, String), &ResourceId> = HashMap::new();

        for resource in &self.resources {
            match resource {
                Resource::Storage(bucket) => {
                    if !is_valid_bucket_name(&bucket.bucket_name) {
                        return Err(SiteError::InvalidBucketName(bucket.bucket_name.clone()));
                    }
                }
                Resource::Certificate(cert) => {
                    if cert.region != CERTIFICATE_REGION {
                        return Err(violation(
                            &cert.id,
                            format!(
                                "certificate must be issued in {}, not {}",
                                CERTIFICATE_REGION, cert.region
                            ),
                        ));
                    }
                }
                Resource::Distribution(dist) => {
                    let origin = self.storage(&dist.id, &dist.origin)?;
                    let expected_path = format!("/{}", origin.error_document);
                    for code in SOFT_404_STATUS_CODES {
                        match dist.error_response(code) {
                            Some(r)
                                if r.response_page_path == expected_path
                                    && r.response_code == 200 => {}
                            _ => {
                                return Err(violation(
                                    &dist.id,
                                    format!(
                                        "{} must be remapped to {} with 200",
                                        code, expected_path
                                    ),
                                ));
                            }
                        }
                    }
                }
                Resource::Deployment(deploy) => {
                    let bucket = self.storage(&deploy.id, &deploy.destination)?;
                    let expected: HashSet<String> =
                        invalidation_paths(&bucket.index_document, &bucket.error_document)
                            .into_iter()
                            .collect();
                    let actual: HashSet<String> =
                        deploy.invalidation_paths.iter().cloned().collect();
                    if actual != expected || deploy.invalidation_paths.len() != expected.len() {
                        let mut wanted: Vec<_> = expected.into_iter().collect();
                        wanted.sort();
                        return Err(violation(
                            &deploy.id,
                            format!("invalidation paths must be exactly {:?}", wanted),
                        ));
                    }
                }
                Resource::DnsRecord(record) => {
                    let key = (record.zone.zone_id.clone(), record.record_name.clone());
                    if let Some(other) = alias_records.insert(key, &record.id) {
                        return Err(violation(
                            &record.id,
                            format!(
                                "{} already has an alias record ({})",
                                record.record_name, other
                            ),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_references(&self) -> Result<()> {
        for resource in &self.resources {
            for (dep, expected) in resource.dependencies() {
                let target = self.get(dep).ok_or_else(|| SiteError::MissingReference {
                    from: resource.id().to_string(),
                    to: dep.to_string(),
                })?;
                if target.kind() != expected {
                    return Err(SiteError::WrongReferenceKind {
                        from: resource.id().to_string(),
                        to: dep.to_string(),
                        expected: expected.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn storage(&self, from: &ResourceId, id: &ResourceId) -> Result<&StorageResource> {
        self.get(id)
            .and_then(Resource::as_storage)
            .ok_or_else(|| SiteError::WrongReferenceKind {
                from: from.to_string(),
                to: id.to_string(),
                expected: ResourceKind::Storage.to_string(),
            })
    }
}

fn violation(id: &ResourceId, message: String) -> SiteError {
    SiteError::InvariantViolation {
        resource: id.to_string(),
        message,
    }
}
