//! Provisioner: turns a site description into a submitted resource graph

use crate::action::{ApplyResult, Plan};
use crate::engine::{ReconciliationEngine, StackOutputs};
use crate::error::{CloudError, Result};
use crate::zone::ZoneLookup;
use sitestack_core::{ResourceGraph, SiteSpec};
use tracing::{info, instrument};

/// Composition root
///
/// Looks up the hosted zone, builds the five resource descriptions and hands
/// the graph to the engine. Convergence (ordering, readiness, retries) is the
/// engine's job; failures raised here are validation-time only.
pub struct Provisioner<E, Z> {
    engine: E,
    zones: Z,
}

impl<E: ReconciliationEngine, Z: ZoneLookup> Provisioner<E, Z> {
    pub fn new(engine: E, zones: Z) -> Self {
        Self { engine, zones }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn zones(&self) -> &Z {
        &self.zones
    }

    /// Build and validate the desired-state graph without submitting it
    #[instrument(skip_all, fields(domain = %site.domain_name))]
    pub async fn synthesize(&self, site: &SiteSpec) -> Result<ResourceGraph> {
        site.validate()?;
        let zone = self.zones.lookup(&site.domain_name).await?;
        let graph = sitestack_core::synthesize(site, &zone)?;
        info!(
            resources = graph.len(),
            zone_id = %zone.zone_id,
            "Synthesized resource graph"
        );
        Ok(graph)
    }

    /// Actions the engine would take for this site
    pub async fn plan(&self, site: &SiteSpec) -> Result<Plan> {
        let graph = self.synthesize(site).await?;
        self.engine.plan(&graph).await
    }

    /// Submit the site's graph and return the stack outputs
    #[instrument(skip_all, fields(domain = %site.domain_name, engine = self.engine.name()))]
    pub async fn provision(&self, site: &SiteSpec) -> Result<StackOutputs> {
        let graph = self.synthesize(site).await?;
        let result = self.engine.submit(&graph).await?;
        Self::finish(&graph, result)
    }

    /// Submit the site's graph only if the engine still plans `reviewed`
    ///
    /// Fails with [`CloudError::PlanChanged`] when the state moved between
    /// [`Provisioner::plan`] and this call.
    #[instrument(skip_all, fields(domain = %site.domain_name, engine = self.engine.name()))]
    pub async fn provision_reviewed(
        &self,
        site: &SiteSpec,
        reviewed: &Plan,
    ) -> Result<StackOutputs> {
        let graph = self.synthesize(site).await?;
        let result = self.engine.submit_planned(&graph, reviewed).await?;
        Self::finish(&graph, result)
    }

    fn finish(graph: &ResourceGraph, result: ApplyResult) -> Result<StackOutputs> {
        if !result.is_success() {
            return Err(CloudError::ProvisioningFailed(
                result.failure_messages().join("; "),
            ));
        }

        info!(
            applied = result.succeeded.len(),
            duration_ms = result.duration_ms,
            "Provisioning complete"
        );
        Ok(StackOutputs::from_apply(graph, &result))
    }

    /// Destroy every resource the engine manages
    pub async fn teardown(&self) -> Result<ApplyResult> {
        let result = self.engine.destroy().await?;
        if !result.is_success() {
            return Err(CloudError::ProvisioningFailed(
                result.failure_messages().join("; "),
            ));
        }
        info!(deleted = result.succeeded.len(), "Teardown complete");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Attributes;
    use crate::engine::DOMAIN_NAME_ATTRIBUTE;
    use crate::local::LocalEngine;
    use crate::zone::StaticZoneLookup;
    use async_trait::async_trait;
    use serde_json::json;
    use sitestack_core::{CERTIFICATE_REGION, HostedZone, Resource, ResourceId, ResourceKind};
    use std::sync::Mutex;

    /// Records submitted graphs without converging anything
    #[derive(Default)]
    struct RecordingEngine {
        submitted: Mutex<Vec<ResourceGraph>>,
        fail_with: Option<String>,
    }

    impl RecordingEngine {
        fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Default::default()
            }
        }

        fn last_submitted(&self) -> ResourceGraph {
            self.submitted.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ReconciliationEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        async fn plan(&self, _desired: &ResourceGraph) -> Result<Plan> {
            Ok(Plan::empty())
        }

        async fn submit(&self, desired: &ResourceGraph) -> Result<ApplyResult> {
            self.submitted.lock().unwrap().push(desired.clone());

            let mut result = ApplyResult::new();
            if let Some(message) = &self.fail_with {
                result.add_failure("create-Certificate".to_string(), message.clone());
                return Ok(result);
            }
            for resource in desired.iter() {
                let mut attributes = Attributes::new();
                if resource.kind() == ResourceKind::Distribution {
                    attributes.insert(
                        DOMAIN_NAME_ATTRIBUTE.into(),
                        json!("d111111abcdef8.edge.test"),
                    );
                }
                result
                    .attributes
                    .insert(resource.id().to_string(), attributes);
                result.add_success(format!("create-{}", resource.id()), String::new());
            }
            Ok(result)
        }

        async fn outputs(&self) -> Result<StackOutputs> {
            Ok(StackOutputs::default())
        }

        async fn destroy(&self) -> Result<ApplyResult> {
            Ok(ApplyResult::new())
        }
    }

    fn zones() -> StaticZoneLookup {
        StaticZoneLookup::new(vec![HostedZone::new("Z0123456789", "example.com")])
    }

    #[tokio::test]
    async fn test_provision_submits_complete_graph() {
        let provisioner = Provisioner::new(RecordingEngine::default(), zones());
        let site = SiteSpec::new("example.com").with_region("ap-northeast-1");

        let outputs = provisioner.provision(&site).await.unwrap();
        assert_eq!(
            outputs.distribution_domain_name.as_deref(),
            Some("d111111abcdef8.edge.test")
        );

        let graph = provisioner.engine().last_submitted();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.edges().len(), 5);
        graph.validate().unwrap();

        let cert = graph
            .get(&ResourceId::new("Certificate"))
            .and_then(Resource::as_certificate)
            .unwrap();
        assert_eq!(cert.region, CERTIFICATE_REGION);
        assert_eq!(cert.zone.zone_id, "Z0123456789");
    }

    #[tokio::test]
    async fn test_reinvocation_submits_new_graph() {
        let provisioner = Provisioner::new(RecordingEngine::default(), zones());

        provisioner
            .provision(&SiteSpec::new("example.com"))
            .await
            .unwrap();
        provisioner
            .provision(&SiteSpec::new("example.com").with_documents("index.html", "404.html"))
            .await
            .unwrap();

        let submitted = provisioner.engine().submitted.lock().unwrap();
        assert_eq!(submitted.len(), 2);
        let deployment = submitted[1]
            .get(&ResourceId::new("BucketDeployment"))
            .and_then(Resource::as_deployment)
            .unwrap();
        assert_eq!(
            deployment.invalidation_paths,
            vec!["/", "/index.html", "/404.html"]
        );
    }

    #[tokio::test]
    async fn test_missing_zone_fails_before_submission() {
        let provisioner = Provisioner::new(RecordingEngine::default(), zones());

        let err = provisioner
            .provision(&SiteSpec::new("example.org"))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::ZoneNotFound(_)));
        assert!(provisioner.engine().submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_site_fails_before_submission() {
        let provisioner = Provisioner::new(RecordingEngine::default(), zones());

        let err = provisioner
            .provision(&SiteSpec::new("example.com").with_documents("/index.html", "error.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::InvalidGraph(_)));
        assert!(provisioner.engine().submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_engine_failure_is_surfaced() {
        let provisioner =
            Provisioner::new(RecordingEngine::failing("validation timed out"), zones());

        let err = provisioner
            .provision(&SiteSpec::new("example.com"))
            .await
            .unwrap_err();
        match err {
            CloudError::ProvisioningFailed(message) => {
                assert_eq!(message, "create-Certificate: validation timed out");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_reviewed_plan_is_rejected_after_state_moves() {
        let project = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(project.path().join("dist")).unwrap();
        std::fs::write(project.path().join("dist/index.html"), "<html></html>").unwrap();
        let provisioner = Provisioner::new(LocalEngine::new(project.path(), "us-east-1"), zones());
        let site = SiteSpec::new("example.com");

        let reviewed = provisioner.plan(&site).await.unwrap();
        assert_eq!(reviewed.summary().create, 5);

        // Another run converges first
        provisioner.provision(&site).await.unwrap();

        let err = provisioner
            .provision_reviewed(&site, &reviewed)
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::PlanChanged(_)));

        let fresh = provisioner.plan(&site).await.unwrap();
        let outputs = provisioner
            .provision_reviewed(&site, &fresh)
            .await
            .unwrap();
        assert!(outputs.distribution_domain_name.is_some());
    }

    #[tokio::test]
    async fn test_subdomain_uses_parent_zone() {
        let provisioner = Provisioner::new(RecordingEngine::default(), zones());
        let graph = provisioner
            .synthesize(&SiteSpec::new("www.example.com"))
            .await
            .unwrap();

        let record = graph
            .get(&ResourceId::new("AliasRecord"))
            .and_then(Resource::as_dns_record)
            .unwrap();
        assert_eq!(record.record_name, "www.example.com");
        assert_eq!(record.zone.name, "example.com");
    }
}
