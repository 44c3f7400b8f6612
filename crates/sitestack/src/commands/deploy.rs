use crate::utils::{self, LoadedSite};
use colored::Colorize;
use sitestack_cloud::{ActionType, CloudError};

pub async fn handle(site: &LoadedSite, yes: bool) -> anyhow::Result<()> {
    println!("{}", "デプロイを開始します...".blue().bold());
    utils::print_loaded_site_file(site);

    let provisioner = site.provisioner();
    let plan = provisioner.plan(site.site()).await?;
    utils::print_plan(&plan);

    // 削除を伴う場合は確認（--yesが指定されていない場合）
    let deletes = plan.actions_by_type(ActionType::Delete);
    if !deletes.is_empty() && !yes {
        println!();
        println!(
            "{}",
            format!("警告: {}個のリソースが削除されます。", deletes.len()).yellow()
        );
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    println!();
    println!("{}", "リソースを構築中...".blue());
    // 表示した計画から状態が変わっていれば適用しない
    let outputs = match provisioner.provision_reviewed(site.site(), &plan).await {
        Ok(outputs) => outputs,
        Err(CloudError::PlanChanged(reason)) => {
            anyhow::bail!(
                "表示した実行計画の後に状態が変更されました ({})。再度実行してください",
                reason
            );
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", "✓ デプロイが完了しました".green().bold());
    println!();
    utils::print_outputs(&outputs);

    Ok(())
}
