use crate::utils::{self, LoadedSite};
use colored::Colorize;
use sitestack_cloud::ReconciliationEngine;

pub async fn handle(site: &LoadedSite, yes: bool) -> anyhow::Result<()> {
    println!("{}", "スタックを削除します...".blue().bold());
    utils::print_loaded_site_file(site);

    let provisioner = site.provisioner();
    let current = provisioner.engine().outputs().await?;
    if current.resources.is_empty() {
        println!("{}", "削除するリソースはありません".yellow());
        return Ok(());
    }

    println!();
    println!(
        "{}",
        format!("削除対象 ({}個):", current.resources.len()).bold()
    );
    for id in current.resources.keys() {
        println!("  {} {}", "-".red().bold(), id);
    }

    if !yes {
        println!();
        println!(
            "{}",
            "警告: すべてのリソースとアップロード済みのコンテンツが削除されます。".yellow()
        );
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    let result = provisioner.teardown().await?;
    println!();
    println!(
        "{} ({}個のリソース, {}ms)",
        "✓ 削除が完了しました".green().bold(),
        result.succeeded.len(),
        result.duration_ms
    );

    Ok(())
}
