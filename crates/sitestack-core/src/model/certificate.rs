//! TLS証明書

use super::resource::ResourceId;
use super::zone::HostedZone;
use serde::{Deserialize, Serialize};

/// 証明書を発行するリージョン
///
/// エッジ配信サービスはこのリージョンで発行された証明書しか
/// TLS IDとして受け付けない。スタックのリージョン設定を継承させてはいけない。
pub const CERTIFICATE_REGION: &str = "us-east-1";

/// ドメイン所有の検証方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMethod {
    /// ゾーンにCNAMEチャレンジを書き込んで検証
    Dns,
}

/// DNS検証付きの証明書リクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateResource {
    pub id: ResourceId,
    pub domain_name: String,
    /// 検証レコードを書き込むゾーン
    pub zone: HostedZone,
    /// 発行リージョン（常に [`CERTIFICATE_REGION`]）
    pub region: String,
    pub validation: ValidationMethod,
}

impl CertificateResource {
    pub fn dns_validated(id: ResourceId, domain_name: impl Into<String>, zone: HostedZone) -> Self {
        Self {
            id,
            domain_name: domain_name.into(),
            zone,
            region: CERTIFICATE_REGION.to_string(),
            validation: ValidationMethod::Dns,
        }
    }
}
