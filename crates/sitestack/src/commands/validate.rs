use crate::utils;
use colored::Colorize;
use sitestack_core::{CERTIFICATE_REGION, Resource};
use std::path::PathBuf;

pub async fn handle(config: Option<PathBuf>) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());

    let site = match utils::load_site(config) {
        Ok(site) => site,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ サイト定義を読み込めません".red().bold());
            eprintln!("  {:#}", e);
            std::process::exit(1);
        }
    };

    println!(
        "プロジェクトルート: {}",
        site.project_root.display().to_string().cyan()
    );

    let graph = match site.provisioner().synthesize(site.site()).await {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 設定エラー".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    let spec = site.site();
    println!("{}", "✓ 設定ファイルは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  ドメイン: {}", spec.domain_name.cyan());
    println!(
        "  ドキュメント: {} / {}",
        spec.index_document, spec.error_document
    );
    println!("  ソース: {}", spec.source.display());
    println!(
        "  リージョン: {} (証明書: {})",
        spec.region, CERTIFICATE_REGION
    );
    println!("  リソース: {}個", graph.len());
    for resource in graph.creation_order()? {
        let detail = match resource {
            Resource::Storage(bucket) => bucket.bucket_name.clone(),
            Resource::Certificate(cert) => format!("{} @ {}", cert.domain_name, cert.region),
            Resource::Distribution(dist) => dist.aliases.join(", "),
            Resource::Deployment(deploy) => deploy.invalidation_paths.join(" "),
            Resource::DnsRecord(record) => {
                format!("{} → {}", record.record_name, record.alias_target)
            }
        };
        println!(
            "    - {} [{}] {}",
            resource.id().to_string().cyan(),
            resource.kind(),
            detail
        );
    }

    Ok(())
}
