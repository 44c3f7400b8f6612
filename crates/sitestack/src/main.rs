mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitestack")]
#[command(about = "書く。届く。静的サイトの配信基盤を宣言的に。", long_about = None)]
struct Cli {
    /// サイト定義ファイル（省略時は site.kdl を自動検出）
    #[arg(short, long, env = "SITESTACK_CONFIG_PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// リソースグラフを合成してJSONテンプレートを出力
    Synth {
        /// 出力先ファイル（省略時は標準出力）
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// 適用予定の変更を表示
    Plan,
    /// サイトを構築・コンテンツを再デプロイ
    Deploy {
        /// 削除を伴う変更も確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// すべてのリソースを削除
    Destroy {
        /// 確認なしで実行（指定しない場合は対象の表示のみ）
        #[arg(short, long)]
        yes: bool,
    },
    /// デプロイ済みスタックの出力を表示
    Outputs,
    /// 設定を検証
    Validate,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrへ（synthのJSONをstdoutに出すため）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match cli.command {
        // 設定ファイル不要
        Commands::Version => {
            println!("sitestack {}", env!("CARGO_PKG_VERSION"));
        }
        // 読み込みエラーも自前で表示する
        Commands::Validate => {
            commands::validate::handle(cli.config).await?;
        }
        Commands::Synth { out } => {
            let site = utils::load_site(cli.config)?;
            commands::synth::handle(&site, out.as_deref()).await?;
        }
        Commands::Plan => {
            let site = utils::load_site(cli.config)?;
            commands::plan::handle(&site).await?;
        }
        Commands::Deploy { yes } => {
            let site = utils::load_site(cli.config)?;
            commands::deploy::handle(&site, yes).await?;
        }
        Commands::Destroy { yes } => {
            let site = utils::load_site(cli.config)?;
            commands::destroy::handle(&site, yes).await?;
        }
        Commands::Outputs => {
            let site = utils::load_site(cli.config)?;
            commands::outputs::handle(&site).await?;
        }
    }

    Ok(())
}
