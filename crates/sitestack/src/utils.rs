use anyhow::Context;
use colored::Colorize;
use sitestack_cloud::{ActionType, LocalEngine, Plan, Provisioner, StackOutputs, StaticZoneLookup};
use sitestack_core::{SiteFile, SiteSpec};
use std::path::PathBuf;

/// 読み込み済みのサイト定義
pub struct LoadedSite {
    pub path: PathBuf,
    pub project_root: PathBuf,
    pub file: SiteFile,
}

impl LoadedSite {
    pub fn site(&self) -> &SiteSpec {
        &self.file.site
    }

    /// ローカルエンジンとsite.kdlのゾーン定義でProvisionerを組み立てる
    pub fn provisioner(&self) -> Provisioner<LocalEngine, StaticZoneLookup> {
        Provisioner::new(
            LocalEngine::new(&self.project_root, self.file.site.region.clone()),
            StaticZoneLookup::new(self.file.zones.clone()),
        )
    }
}

/// サイト定義ファイルを探して読み込む
pub fn load_site(config: Option<PathBuf>) -> anyhow::Result<LoadedSite> {
    let path = match config {
        Some(path) => path,
        None => sitestack_config::find_site_file()?,
    };

    let file = sitestack_core::parse_site_file(&path)
        .with_context(|| format!("{} の読み込みに失敗しました", path.display()))?;
    let project_root = sitestack_config::project_root_for(&path);

    tracing::debug!(
        path = %path.display(),
        project_root = %project_root.display(),
        "Loaded site file"
    );

    Ok(LoadedSite {
        path,
        project_root,
        file,
    })
}

/// 読み込んだ設定ファイル情報を表示
pub fn print_loaded_site_file(site: &LoadedSite) {
    println!(
        "📄 読み込んだ設定ファイル: {}",
        site.path.display().to_string().cyan()
    );
    println!("ドメイン: {}", site.site().domain_name.cyan());
}

/// 実行計画を表示
pub fn print_plan(plan: &Plan) {
    println!();
    println!("{}", "実行計画:".bold());
    for action in &plan.actions {
        let line = format!(
            "{} {} ({})",
            action.resource_id, action.description, action.resource_kind
        );
        match action.action_type {
            ActionType::Create => println!("  {} {}", "+".green().bold(), line),
            ActionType::Update => println!("  {} {}", "~".yellow().bold(), line),
            ActionType::Delete => println!("  {} {}", "-".red().bold(), line),
            ActionType::NoOp => println!("    {}", line.dimmed()),
        }
    }
    println!();
    println!("{}", plan.summary());
}

/// スタックの出力を表示
pub fn print_outputs(outputs: &StackOutputs) {
    match &outputs.distribution_domain_name {
        Some(hostname) => println!("配信ドメイン: {}", hostname.cyan().bold()),
        None => println!("配信ドメイン: {}", "(未作成)".dimmed()),
    }

    if outputs.resources.is_empty() {
        return;
    }
    println!();
    println!("リソース: {}個", outputs.resources.len());
    for (id, attributes) in &outputs.resources {
        println!("  • {}", id.cyan());
        for (key, value) in attributes {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("      {}: {}", key, value);
        }
    }
}
