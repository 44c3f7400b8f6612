//! リソースグラフの合成
//!
//! サイト定義と検索済みのDNSゾーンから、5つのリソース記述と
//! その依存関係を組み立てます。

use crate::error::{Result, SiteError};
use crate::model::{
    BucketEncryption, CertificateResource, DeploymentResource, DnsRecordResource,
    EdgeDistributionResource, HostedZone, RecordType, RemovalPolicy, ResourceGraph, ResourceId,
    SiteSpec, StorageResource, invalidation_paths, spa_error_responses,
};
use tracing::{debug, info, instrument};

pub const BUCKET_ID: &str = "Bucket";
pub const CERTIFICATE_ID: &str = "Certificate";
pub const DISTRIBUTION_ID: &str = "Distribution";
pub const DEPLOYMENT_ID: &str = "BucketDeployment";
pub const ALIAS_RECORD_ID: &str = "AliasRecord";

/// サイト定義からリソースグラフを合成
///
/// 失敗するのは記述が不正な場合のみ（ドメイン・ドキュメント名の不備、
/// ゾーンがドメインを含まない、グラフの不変条件違反）。
#[instrument(skip_all, fields(domain = %site.domain_name, zone = %zone.name))]
pub fn synthesize(site: &SiteSpec, zone: &HostedZone) -> Result<ResourceGraph> {
    site.validate()?;

    if !zone.covers(&site.domain_name) {
        return Err(SiteError::InvalidConfig(format!(
            "zone '{}' does not contain domain '{}'",
            zone.name, site.domain_name
        )));
    }

    let bucket_id = ResourceId::new(BUCKET_ID);
    let certificate_id = ResourceId::new(CERTIFICATE_ID);
    let distribution_id = ResourceId::new(DISTRIBUTION_ID);

    let bucket_name = site.bucket_name();
    debug!(bucket = %bucket_name, "Building storage resource");
    let bucket = StorageResource {
        id: bucket_id.clone(),
        bucket_name: bucket_name.clone(),
        index_document: site.index_document.clone(),
        error_document: site.error_document.clone(),
        encryption: BucketEncryption::ProviderManaged,
        public_read_access: false,
        removal_policy: RemovalPolicy::Destroy,
        auto_delete_objects: true,
    };

    let certificate =
        CertificateResource::dns_validated(certificate_id.clone(), &site.domain_name, zone.clone());

    let distribution = EdgeDistributionResource {
        id: distribution_id.clone(),
        origin: bucket_id.clone(),
        origin_access_identity: format!("{}-access-identity", bucket_name),
        error_responses: spa_error_responses(&site.error_document),
        certificate: certificate_id,
        aliases: vec![site.domain_name.clone()],
    };

    let deployment = DeploymentResource {
        id: ResourceId::new(DEPLOYMENT_ID),
        source: site.source.clone(),
        destination: bucket_id,
        distribution: distribution_id.clone(),
        invalidation_paths: invalidation_paths(&site.index_document, &site.error_document),
    };

    let record = DnsRecordResource {
        id: ResourceId::new(ALIAS_RECORD_ID),
        record_name: site.domain_name.clone(),
        zone: zone.clone(),
        record_type: RecordType::A,
        alias_target: distribution_id,
    };

    let mut graph = ResourceGraph::new();
    graph.add(bucket)?;
    graph.add(certificate)?;
    graph.add(distribution)?;
    graph.add(deployment)?;
    graph.add(record)?;
    graph.validate()?;

    info!(resources = graph.len(), "Resource graph synthesized");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CERTIFICATE_REGION, Resource, ResourceKind};
    use std::collections::HashSet;

    fn zone() -> HostedZone {
        HostedZone::new("Z0123456789", "example.com")
    }

    fn example_graph() -> ResourceGraph {
        let site = SiteSpec::new("example.com").with_documents("index.html", "error.html");
        synthesize(&site, &zone()).unwrap()
    }

    fn single(graph: &ResourceGraph, kind: ResourceKind) -> &Resource {
        let found = graph.by_kind(kind);
        assert_eq!(found.len(), 1, "expected exactly one {}", kind);
        found[0]
    }

    #[test]
    fn test_example_site_end_to_end() {
        let graph = example_graph();
        assert_eq!(graph.len(), 5);

        let bucket = single(&graph, ResourceKind::Storage).as_storage().unwrap();
        assert_eq!(bucket.bucket_name, "example.com-hosting");
        assert_eq!(bucket.index_document, "index.html");
        assert_eq!(bucket.error_document, "error.html");
        assert!(!bucket.public_read_access);
        assert_eq!(bucket.encryption, BucketEncryption::ProviderManaged);
        assert!(bucket.is_disposable());

        let cert = single(&graph, ResourceKind::Certificate)
            .as_certificate()
            .unwrap();
        assert_eq!(cert.domain_name, "example.com");
        assert_eq!(cert.region, CERTIFICATE_REGION);
        assert_eq!(cert.zone, zone());

        let dist = single(&graph, ResourceKind::Distribution)
            .as_distribution()
            .unwrap();
        assert_eq!(dist.origin.as_str(), BUCKET_ID);
        assert_eq!(dist.certificate.as_str(), CERTIFICATE_ID);
        assert_eq!(dist.aliases, vec!["example.com"]);
        assert_eq!(
            dist.origin_access_identity,
            "example.com-hosting-access-identity"
        );
        for code in [403, 404] {
            let r = dist.error_response(code).unwrap();
            assert_eq!(r.response_page_path, "/error.html");
            assert_eq!(r.response_code, 200);
        }

        let deploy = single(&graph, ResourceKind::Deployment)
            .as_deployment()
            .unwrap();
        assert_eq!(
            deploy.invalidation_paths,
            vec!["/", "/index.html", "/error.html"]
        );
        assert_eq!(deploy.destination.as_str(), BUCKET_ID);
        assert_eq!(deploy.distribution.as_str(), DISTRIBUTION_ID);

        let record = single(&graph, ResourceKind::DnsRecord)
            .as_dns_record()
            .unwrap();
        assert_eq!(record.record_name, "example.com");
        assert_eq!(record.record_type, RecordType::A);
        assert_eq!(record.alias_target.as_str(), DISTRIBUTION_ID);
    }

    #[test]
    fn test_dependency_edges() {
        let graph = example_graph();
        let edges: HashSet<(String, String)> = graph
            .edges()
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();

        let expected: HashSet<(String, String)> = [
            (DISTRIBUTION_ID, BUCKET_ID),
            (DISTRIBUTION_ID, CERTIFICATE_ID),
            (DEPLOYMENT_ID, BUCKET_ID),
            (DEPLOYMENT_ID, DISTRIBUTION_ID),
            (ALIAS_RECORD_ID, DISTRIBUTION_ID),
        ]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        assert_eq!(edges, expected);
    }

    #[test]
    fn test_certificate_region_ignores_site_region() {
        for region in ["eu-west-2", "ap-northeast-1", "us-west-2", "us-east-1"] {
            let site = SiteSpec::new("example.com").with_region(region);
            let graph = synthesize(&site, &zone()).unwrap();
            let cert = single(&graph, ResourceKind::Certificate)
                .as_certificate()
                .unwrap();
            assert_eq!(cert.region, CERTIFICATE_REGION);
        }
    }

    #[test]
    fn test_invariants_hold_for_various_sites() {
        let cases = [
            ("example.com", "index.html", "error.html"),
            ("www.example.com", "home.htm", "404.html"),
            ("app.example.com", "index.html", "index.html"),
            ("docs.example.com", "app/shell.html", "app/missing.html"),
        ];

        for (domain, index, error) in cases {
            let site = SiteSpec::new(domain).with_documents(index, error);
            let graph = synthesize(&site, &zone()).unwrap();
            assert_eq!(graph.len(), 5);

            let dist = single(&graph, ResourceKind::Distribution)
                .as_distribution()
                .unwrap();
            let error_path = format!("/{}", error);
            assert_eq!(dist.error_responses.len(), 2);
            for code in [403, 404] {
                let r = dist.error_response(code).unwrap();
                assert_eq!(r.response_page_path, error_path);
                assert_eq!(r.response_code, 200);
            }

            let deploy = single(&graph, ResourceKind::Deployment)
                .as_deployment()
                .unwrap();
            let actual: HashSet<&str> =
                deploy.invalidation_paths.iter().map(String::as_str).collect();
            let index_path = format!("/{}", index);
            let expected: HashSet<&str> = ["/", index_path.as_str(), error_path.as_str()]
                .into_iter()
                .collect();
            assert_eq!(actual, expected);

            let records = graph.by_kind(ResourceKind::DnsRecord);
            assert_eq!(records.len(), 1);
            let record = records[0].as_dns_record().unwrap();
            assert_eq!(record.record_name, domain);
            assert_eq!(
                graph.get(&record.alias_target).map(|r| r.kind()),
                Some(ResourceKind::Distribution)
            );
        }
    }

    #[test]
    fn test_zone_must_cover_domain() {
        let site = SiteSpec::new("example.org");
        let result = synthesize(&site, &zone());
        assert!(matches!(result, Err(SiteError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_domain_rejected() {
        let site = SiteSpec::new("not a domain");
        assert!(matches!(
            synthesize(&site, &zone()),
            Err(SiteError::InvalidDomain { .. })
        ));
    }
}
