//! Local file-backed reconciliation engine
//!
//! Converges the graph against `.sitestack/state.json` instead of a remote
//! control plane. No remote calls are made: attributes such as the
//! distribution hostname are generated locally and kept stable across runs.
//! Used for dry runs, CI checks and tests.

use crate::action::{Action, ActionType, ApplyResult, Attributes, Plan};
use crate::engine::{DOMAIN_NAME_ATTRIBUTE, ReconciliationEngine, StackOutputs};
use crate::error::{CloudError, Result};
use crate::state::{GlobalState, ResourceState, ResourceStatus, StateManager};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use sitestack_core::{Resource, ResourceGraph, ResourceId, ResourceKind};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const LOCAL_ENGINE_NAME: &str = "local";

/// Suffix of generated distribution hostnames
const EDGE_DOMAIN_SUFFIX: &str = "edge.local";

/// File-backed engine
pub struct LocalEngine {
    project_root: PathBuf,
    region: String,
    state: StateManager,
}

impl LocalEngine {
    /// `region` is the stack region every resource inherits unless it pins its own
    pub fn new(project_root: impl AsRef<Path>, region: impl Into<String>) -> Self {
        let project_root = project_root.as_ref().to_path_buf();
        Self {
            state: StateManager::new(&project_root),
            project_root,
            region: region.into(),
        }
    }

    pub fn state_manager(&self) -> &StateManager {
        &self.state
    }

    fn resolve_source(&self, source: &Path) -> PathBuf {
        if source.is_absolute() {
            source.to_path_buf()
        } else {
            self.project_root.join(source)
        }
    }

    fn plan_against(&self, desired: &ResourceGraph, current: &GlobalState) -> Result<Plan> {
        desired.validate()?;
        let mut actions = Vec::new();

        // Resources that left the graph go first, dependents before dependencies
        let recorded = current.to_graph()?;
        for resource in recorded.destroy_order()? {
            if desired.get(resource.id()).is_none() {
                actions.push(Action::new(
                    ActionType::Delete,
                    resource.kind(),
                    resource.id().clone(),
                    format!("Delete {} {}", resource.kind(), resource.id()),
                ));
            }
        }

        for resource in desired.creation_order()? {
            let id = resource.id();
            let kind = resource.kind();
            let action = match current.get_resource(id.as_str()) {
                None => Action::new(
                    ActionType::Create,
                    kind,
                    id.clone(),
                    format!("Create {} {}", kind, id),
                ),
                Some(existing) if existing.status == ResourceStatus::Failed => Action::new(
                    ActionType::Update,
                    kind,
                    id.clone(),
                    format!("Retry failed {} {}", kind, id),
                ),
                // Asset content is opaque to the graph, so every submission redeploys
                Some(_) if kind == ResourceKind::Deployment => Action::new(
                    ActionType::Update,
                    kind,
                    id.clone(),
                    format!("Upload assets and invalidate cache ({})", id),
                ),
                Some(existing) if &existing.resource != resource => Action::new(
                    ActionType::Update,
                    kind,
                    id.clone(),
                    format!("Update {} {}", kind, id),
                ),
                Some(_) => Action::new(
                    ActionType::NoOp,
                    kind,
                    id.clone(),
                    format!("{} {} is up to date", kind, id),
                ),
            };

            let action = match resource {
                Resource::Deployment(deploy) => {
                    action.with_detail("invalidation_paths", json!(deploy.invalidation_paths))
                }
                Resource::Certificate(cert) => action.with_detail("region", json!(cert.region)),
                _ => action,
            };
            actions.push(action);
        }

        Ok(Plan::new(actions))
    }

    async fn apply_locked(
        &self,
        desired: &ResourceGraph,
        reviewed: Option<&Plan>,
    ) -> Result<ApplyResult> {
        let start = std::time::Instant::now();
        let mut state = self.state.load().await?;
        let plan = self.plan_against(desired, &state)?;
        if let Some(reviewed) = reviewed.filter(|r| !plan.same_actions(r)) {
            return Err(CloudError::PlanChanged(format!(
                "now {}, reviewed {}",
                plan.summary(),
                reviewed.summary()
            )));
        }
        let mut result = ApplyResult::new();
        let mut failed: HashSet<ResourceId> = HashSet::new();

        for action in &plan.actions {
            let key = action.resource_id.as_str();
            match action.action_type {
                ActionType::Delete => match self.delete(key, &mut state) {
                    Ok(()) => result.add_success(action.id.clone(), format!("Deleted {}", key)),
                    Err(e) => result.add_failure(action.id.clone(), e.to_string()),
                },
                ActionType::NoOp => {
                    if let Some(existing) = state.get_resource(key) {
                        result
                            .attributes
                            .insert(key.to_string(), existing.attributes.clone());
                    }
                }
                ActionType::Create | ActionType::Update => {
                    let resource = desired
                        .get(&action.resource_id)
                        .ok_or_else(|| CloudError::ResourceNotFound(key.to_string()))?;

                    let failed_dependency = resource
                        .dependencies()
                        .into_iter()
                        .map(|(dep, _)| dep)
                        .find(|dep| failed.contains(*dep));
                    if let Some(dep) = failed_dependency {
                        failed.insert(resource.id().clone());
                        result.add_failure(action.id.clone(), format!("dependency {} failed", dep));
                        continue;
                    }

                    info!(action = %action.action_type, resource = key, "Applying resource");
                    match self.converge(resource, &mut state) {
                        Ok((physical_id, attributes)) => {
                            let created_at = state.get_resource(key).map(|s| s.created_at);
                            let mut converged = ResourceState::new(physical_id, resource.clone())
                                .with_attributes(attributes.clone());
                            if let Some(created_at) = created_at {
                                converged.created_at = created_at;
                            }
                            state.set_resource(key.to_string(), converged);
                            result.attributes.insert(key.to_string(), attributes);
                            result.add_success(
                                action.id.clone(),
                                format!("{} {} {}", action.action_type, action.resource_kind, key),
                            );
                        }
                        Err(e) => {
                            warn!(resource = key, error = %e, "Resource failed to converge");
                            failed.insert(resource.id().clone());
                            match state.get_resource_mut(key) {
                                Some(existing) => existing.status = ResourceStatus::Failed,
                                None => state.set_resource(
                                    key.to_string(),
                                    ResourceState::new(String::new(), resource.clone())
                                        .with_status(ResourceStatus::Failed),
                                ),
                            }
                            result.add_failure(action.id.clone(), e.to_string());
                        }
                    }
                }
            }
        }

        self.state.save(&state).await?;
        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Create or update one resource, returning its physical ID and attributes
    fn converge(
        &self,
        resource: &Resource,
        state: &mut GlobalState,
    ) -> Result<(String, Attributes)> {
        let previous = state
            .get_resource(resource.id().as_str())
            .map(|s| s.attributes.clone())
            .unwrap_or_default();
        let keep = |key: &str, fallback: serde_json::Value| {
            previous.get(key).cloned().unwrap_or(fallback)
        };
        let mut attributes = Attributes::new();

        match resource {
            Resource::Storage(bucket) => {
                attributes.insert("bucket_name".into(), json!(bucket.bucket_name));
                attributes.insert(
                    "arn".into(),
                    json!(format!("arn:local:storage:::{}", bucket.bucket_name)),
                );
                attributes.insert("region".into(), json!(self.region));
                attributes.insert(
                    "regional_domain_name".into(),
                    json!(format!("{}.storage.{}.local", bucket.bucket_name, self.region)),
                );
                attributes.insert("object_count".into(), keep("object_count", json!(0)));
                Ok((bucket.bucket_name.clone(), attributes))
            }
            Resource::Certificate(cert) => {
                if !cert.zone.covers(&cert.domain_name) {
                    return Err(CloudError::ProvisioningFailed(format!(
                        "DNS validation record for {} cannot be written to zone {}",
                        cert.domain_name, cert.zone.name
                    )));
                }
                let certificate_id = keep(
                    "certificate_id",
                    json!(format!(
                        "cert-{}",
                        short_hash(&[cert.domain_name.as_str(), cert.region.as_str()])
                    )),
                );
                attributes.insert("certificate_id".into(), certificate_id.clone());
                attributes.insert("region".into(), json!(cert.region));
                attributes.insert("status".into(), json!("issued"));
                attributes.insert(
                    "validation_record".into(),
                    json!(format!(
                        "_{}.{}",
                        short_hash(&[cert.domain_name.as_str(), "validation"]),
                        cert.domain_name
                    )),
                );
                Ok((as_string(&certificate_id), attributes))
            }
            Resource::Distribution(dist) => {
                let origin = ready_attributes(state, &dist.origin)?;
                let certificate = ready_attributes(state, &dist.certificate)?;
                let distribution_id = keep(
                    "distribution_id",
                    json!(format!(
                        "E{}",
                        short_hash(&[
                            dist.id.as_str(),
                            &origin.get("bucket_name").map(as_string).unwrap_or_default(),
                        ])
                        .to_uppercase()
                    )),
                );
                let domain_name = keep(
                    DOMAIN_NAME_ATTRIBUTE,
                    json!(format!(
                        "{}.{}",
                        as_string(&distribution_id).to_lowercase(),
                        EDGE_DOMAIN_SUFFIX
                    )),
                );
                attributes.insert("distribution_id".into(), distribution_id.clone());
                attributes.insert(DOMAIN_NAME_ATTRIBUTE.into(), domain_name);
                attributes.insert(
                    "origin_domain_name".into(),
                    origin.get("regional_domain_name").cloned().unwrap_or_default(),
                );
                attributes.insert(
                    "certificate_id".into(),
                    certificate.get("certificate_id").cloned().unwrap_or_default(),
                );
                attributes.insert("aliases".into(), json!(dist.aliases));
                Ok((as_string(&distribution_id), attributes))
            }
            Resource::Deployment(deploy) => {
                let source = self.resolve_source(&deploy.source);
                if !source.is_dir() {
                    return Err(CloudError::AssetSource(format!(
                        "{} does not exist or is not a directory",
                        source.display()
                    )));
                }
                let distribution = ready_attributes(state, &deploy.distribution)?;
                ready_attributes(state, &deploy.destination)?;

                let object_count = count_files(&source)?;
                if let Some(bucket) = state.get_resource_mut(deploy.destination.as_str()) {
                    bucket.set_attribute("object_count", json!(object_count));
                }

                let invalidation_id = format!("I{}", Utc::now().format("%Y%m%d%H%M%S%3f"));
                info!(
                    objects = object_count,
                    invalidation = %invalidation_id,
                    paths = ?deploy.invalidation_paths,
                    "Uploaded assets and requested invalidation"
                );

                attributes.insert("source".into(), json!(source.display().to_string()));
                attributes.insert("object_count".into(), json!(object_count));
                attributes.insert(
                    "distribution_id".into(),
                    distribution.get("distribution_id").cloned().unwrap_or_default(),
                );
                attributes.insert("invalidation_id".into(), json!(invalidation_id));
                attributes.insert(
                    "invalidated_paths".into(),
                    json!(deploy.invalidation_paths),
                );
                Ok((deploy.id.to_string(), attributes))
            }
            Resource::DnsRecord(record) => {
                let target = ready_attributes(state, &record.alias_target)?;
                let hostname = target
                    .get(DOMAIN_NAME_ATTRIBUTE)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        CloudError::ProvisioningFailed(format!(
                            "alias target {} has no {}",
                            record.alias_target, DOMAIN_NAME_ATTRIBUTE
                        ))
                    })?;
                attributes.insert("fqdn".into(), json!(record.record_name));
                attributes.insert("record_type".into(), json!(record.record_type));
                attributes.insert("alias_target".into(), json!(hostname));
                attributes.insert("zone_id".into(), json!(record.zone.zone_id));
                Ok((
                    format!("{}/{}", record.zone.zone_id, record.record_name),
                    attributes,
                ))
            }
        }
    }

    fn delete(&self, key: &str, state: &mut GlobalState) -> Result<()> {
        let Some(existing) = state.get_resource(key) else {
            return Ok(());
        };

        let dependents: Vec<&str> = state
            .resources
            .iter()
            .filter(|(other, s)| {
                other.as_str() != key
                    && s.resource
                        .dependencies()
                        .iter()
                        .any(|(dep, _)| dep.as_str() == key)
            })
            .map(|(other, _)| other.as_str())
            .collect();
        if !dependents.is_empty() {
            return Err(CloudError::ProvisioningFailed(format!(
                "{} is still referenced by {}",
                key,
                dependents.join(", ")
            )));
        }

        if let Resource::Storage(bucket) = &existing.resource {
            let objects: u64 = existing.get_attribute("object_count").unwrap_or(0);
            if objects > 0 && !bucket.is_disposable() {
                return Err(CloudError::ProvisioningFailed(format!(
                    "bucket {} still holds {} objects and does not auto-delete them",
                    bucket.bucket_name, objects
                )));
            }
        }

        info!(resource = key, "Deleting resource");
        state.remove_resource(key);
        Ok(())
    }
}

#[async_trait]
impl ReconciliationEngine for LocalEngine {
    fn name(&self) -> &str {
        LOCAL_ENGINE_NAME
    }

    async fn plan(&self, desired: &ResourceGraph) -> Result<Plan> {
        let current = self.state.load().await?;
        self.plan_against(desired, &current)
    }

    async fn submit(&self, desired: &ResourceGraph) -> Result<ApplyResult> {
        let lock = self.state.acquire_lock().await?;
        let outcome = self.apply_locked(desired, None).await;
        lock.release().await?;
        outcome
    }

    async fn submit_planned(
        &self,
        desired: &ResourceGraph,
        reviewed: &Plan,
    ) -> Result<ApplyResult> {
        let lock = self.state.acquire_lock().await?;
        let outcome = self.apply_locked(desired, Some(reviewed)).await;
        lock.release().await?;
        outcome
    }

    async fn outputs(&self) -> Result<StackOutputs> {
        let state = self.state.load().await?;
        Ok(StackOutputs::from_resources(
            state
                .resources
                .values()
                .filter(|s| s.status == ResourceStatus::Ready)
                .map(|s| (s.resource.id(), s.kind(), &s.attributes)),
        ))
    }

    async fn destroy(&self) -> Result<ApplyResult> {
        let lock = self.state.acquire_lock().await?;
        let start = std::time::Instant::now();
        let mut state = self.state.load().await?;

        let order: Vec<ResourceId> = state
            .to_graph()?
            .destroy_order()?
            .into_iter()
            .map(|r| r.id().clone())
            .collect();

        let mut result = ApplyResult::new();
        for id in order {
            let action_id = format!("{}-{}", ActionType::Delete, id);
            match self.delete(id.as_str(), &mut state) {
                Ok(()) => result.add_success(action_id, format!("Deleted {}", id)),
                Err(e) => result.add_failure(action_id, e.to_string()),
            }
        }

        self.state.save(&state).await?;
        lock.release().await?;
        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

/// Attributes of a dependency that must already have converged
fn ready_attributes(state: &GlobalState, id: &ResourceId) -> Result<Attributes> {
    state
        .get_resource(id.as_str())
        .filter(|s| s.status == ResourceStatus::Ready)
        .map(|s| s.attributes.clone())
        .ok_or_else(|| CloudError::ResourceNotFound(id.to_string()))
}

fn as_string(value: &serde_json::Value) -> String {
    value
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| value.to_string())
}

fn short_hash(parts: &[&str]) -> String {
    let mut hasher = DefaultHasher::new();
    for part in parts {
        part.hash(&mut hasher);
    }
    format!("{:012x}", hasher.finish() & 0xffff_ffff_ffff)
}

fn count_files(source: &Path) -> Result<usize> {
    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&source.to_string_lossy())
    );
    let entries = glob::glob(&pattern).map_err(|e| CloudError::AssetSource(e.to_string()))?;

    let mut count = 0;
    for entry in entries {
        let path = entry.map_err(|e| CloudError::AssetSource(e.to_string()))?;
        if path.is_file() {
            count += 1;
        }
    }
    Ok(count)
}
