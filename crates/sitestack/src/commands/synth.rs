use crate::utils::LoadedSite;
use colored::Colorize;
use std::path::Path;

pub async fn handle(site: &LoadedSite, out: Option<&Path>) -> anyhow::Result<()> {
    let graph = site.provisioner().synthesize(site.site()).await?;
    let template = serde_json::to_string_pretty(&graph)?;

    match out {
        Some(path) => {
            std::fs::write(path, format!("{}\n", template)).map_err(|e| {
                anyhow::anyhow!("{} への書き込みに失敗しました: {}", path.display(), e)
            })?;
            // stdoutはテンプレート専用なので案内はstderrへ
            eprintln!(
                "{} {} ({}個のリソース)",
                "✓ テンプレートを書き出しました:".green().bold(),
                path.display().to_string().cyan(),
                graph.len()
            );
        }
        None => println!("{}", template),
    }

    Ok(())
}
