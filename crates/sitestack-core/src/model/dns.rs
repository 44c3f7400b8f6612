//! DNSエイリアスレコード

use super::resource::ResourceId;
use super::zone::HostedZone;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
}

/// ドメインをエッジ配信に向けるエイリアスレコード
///
/// エッジ配信のアドレスは固定ではないため、固定値ではなくエイリアスで解決する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecordResource {
    pub id: ResourceId,

    /// レコード名（完全修飾ドメイン名）
    pub record_name: String,

    pub zone: HostedZone,

    pub record_type: RecordType,

    /// エイリアスの解決先（エッジ配信）
    pub alias_target: ResourceId,
}
