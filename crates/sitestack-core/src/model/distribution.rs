//! エッジ配信（CDNディストリビューション）

use super::resource::ResourceId;
use serde::{Deserialize, Serialize};

/// "soft 404" として扱うオリジンのステータスコード
///
/// 非公開バケットは存在しないキーに対して403を返すため、404と同じ扱いにする。
pub const SOFT_404_STATUS_CODES: [u16; 2] = [403, 404];

/// エラーレスポンスの書き換え規則
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// オリジンが返したステータス
    pub error_code: u16,
    /// 代わりに返すページのパス
    pub response_page_path: String,
    /// クライアントに返すステータス
    pub response_code: u16,
}

/// エッジ配信の記述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDistributionResource {
    pub id: ResourceId,

    /// オリジンとなるバケット
    pub origin: ResourceId,

    /// オリジンアクセスIDのコメント
    pub origin_access_identity: String,

    pub error_responses: Vec<ErrorResponse>,

    /// TLS IDとして使う証明書
    pub certificate: ResourceId,

    /// ビューワー向けの別名（CNAME）
    pub aliases: Vec<String>,
}

impl EdgeDistributionResource {
    pub fn error_response(&self, error_code: u16) -> Option<&ErrorResponse> {
        self.error_responses
            .iter()
            .find(|r| r.error_code == error_code)
    }
}

/// クライアントサイドルーティング向けのエラー書き換え規則
///
/// 未知のパスはアプリシェルを返す必要があるため、エラーコードは200で握りつぶす。
pub fn spa_error_responses(error_document: &str) -> Vec<ErrorResponse> {
    SOFT_404_STATUS_CODES
        .iter()
        .map(|&code| ErrorResponse {
            error_code: code,
            response_page_path: format!("/{}", error_document),
            response_code: 200,
        })
        .collect()
}
