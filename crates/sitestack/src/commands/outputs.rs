use crate::utils::{self, LoadedSite};
use colored::Colorize;
use sitestack_cloud::ReconciliationEngine;

pub async fn handle(site: &LoadedSite) -> anyhow::Result<()> {
    let provisioner = site.provisioner();
    let outputs = provisioner.engine().outputs().await?;

    if outputs.resources.is_empty() {
        println!("{}", "まだデプロイされていません".yellow());
        println!("sitestack deploy を実行してください");
        return Ok(());
    }

    utils::print_outputs(&outputs);
    Ok(())
}
