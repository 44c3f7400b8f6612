use crate::utils::{self, LoadedSite};
use colored::Colorize;

pub async fn handle(site: &LoadedSite) -> anyhow::Result<()> {
    println!("{}", "実行計画を作成中...".blue());
    utils::print_loaded_site_file(site);

    let provisioner = site.provisioner();
    let plan = provisioner.plan(site.site()).await?;
    utils::print_plan(&plan);

    if !plan.has_changes {
        println!("{}", "✓ 変更はありません".green());
    }

    Ok(())
}
