//! コンテンツデプロイとキャッシュ無効化

use super::resource::ResourceId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ローカルのファイルツリーをバケットへアップロードし、
/// 完了後にエッジキャッシュの一部パスを無効化する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentResource {
    pub id: ResourceId,

    /// アップロード元ディレクトリ
    pub source: PathBuf,

    /// アップロード先バケット
    pub destination: ResourceId,

    /// 無効化対象のエッジ配信
    pub distribution: ResourceId,

    pub invalidation_paths: Vec<String>,
}

/// 再デプロイ時に無効化するパス
///
/// ルート・インデックス・エラードキュメントのみ。重複は1つにまとめる。
pub fn invalidation_paths(index_document: &str, error_document: &str) -> Vec<String> {
    let mut paths = vec![
        "/".to_string(),
        format!("/{}", index_document),
        format!("/{}", error_document),
    ];
    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
    paths
}
