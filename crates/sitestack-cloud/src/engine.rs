//! Reconciliation engine trait definition

use crate::action::{ApplyResult, Attributes, Plan};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitestack_core::{ResourceGraph, ResourceId, ResourceKind};
use std::collections::BTreeMap;

/// Attribute holding a distribution's generated hostname
pub const DOMAIN_NAME_ATTRIBUTE: &str = "domain_name";

/// Reconciliation engine abstraction
///
/// The engine owns convergence: it orders creation by dependency, waits for
/// asynchronous readiness and reports per-resource results. Callers only hand
/// it a desired-state graph.
#[async_trait]
pub trait ReconciliationEngine: Send + Sync {
    /// Returns the engine name (e.g., "local")
    fn name(&self) -> &str;

    /// Calculate the actions needed to converge to the desired graph
    async fn plan(&self, desired: &ResourceGraph) -> Result<Plan>;

    /// Converge real state to the desired graph
    async fn submit(&self, desired: &ResourceGraph) -> Result<ApplyResult>;

    /// Converge only if the engine would still take the actions in `reviewed`
    ///
    /// Engines that cannot re-plan atomically with convergence fall back to
    /// a plain submit.
    async fn submit_planned(
        &self,
        desired: &ResourceGraph,
        _reviewed: &Plan,
    ) -> Result<ApplyResult> {
        self.submit(desired).await
    }

    /// Outputs of the currently converged stack
    async fn outputs(&self) -> Result<StackOutputs>;

    /// Destroy every managed resource in reverse dependency order
    async fn destroy(&self) -> Result<ApplyResult>;
}

/// Values surfaced after provisioning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackOutputs {
    /// Generated hostname of the edge distribution
    pub distribution_domain_name: Option<String>,

    /// Attributes of every resource, by logical ID
    pub resources: BTreeMap<String, Attributes>,
}

impl StackOutputs {
    pub fn from_resources<'a, I>(resources: I) -> Self
    where
        I: IntoIterator<Item = (&'a ResourceId, ResourceKind, &'a Attributes)>,
    {
        let mut outputs = Self::default();
        for (id, kind, attributes) in resources {
            if kind == ResourceKind::Distribution && outputs.distribution_domain_name.is_none() {
                outputs.distribution_domain_name = attributes
                    .get(DOMAIN_NAME_ATTRIBUTE)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
            }
            outputs.resources.insert(id.to_string(), attributes.clone());
        }
        outputs
    }

    /// Collect outputs from a submitted graph and the engine's apply result
    pub fn from_apply(graph: &ResourceGraph, result: &ApplyResult) -> Self {
        Self::from_resources(graph.iter().filter_map(|r| {
            result
                .attributes
                .get(r.id().as_str())
                .map(|attrs| (r.id(), r.kind(), attrs))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outputs_pick_distribution_hostname() {
        let bucket_id = ResourceId::new("Bucket");
        let dist_id = ResourceId::new("Distribution");
        let bucket_attrs: Attributes = [("bucket_name".to_string(), json!("example.com-hosting"))]
            .into_iter()
            .collect();
        let dist_attrs: Attributes = [(
            DOMAIN_NAME_ATTRIBUTE.to_string(),
            json!("abc123.edge.local"),
        )]
        .into_iter()
        .collect();

        let outputs = StackOutputs::from_resources([
            (&bucket_id, ResourceKind::Storage, &bucket_attrs),
            (&dist_id, ResourceKind::Distribution, &dist_attrs),
        ]);

        assert_eq!(
            outputs.distribution_domain_name.as_deref(),
            Some("abc123.edge.local")
        );
        assert_eq!(outputs.resources.len(), 2);
    }
}
