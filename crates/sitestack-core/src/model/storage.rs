//! ストレージ（静的ドキュメント配信用バケット）

use super::resource::ResourceId;
use serde::{Deserialize, Serialize};

/// サーバーサイド暗号化の方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketEncryption {
    Unencrypted,
    /// プロバイダー管理キー
    ProviderManaged,
    /// 鍵管理サービスのキー
    KmsManaged,
}

/// スタック削除時の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    Retain,
    Destroy,
}

/// 静的ドキュメントを配信するバケット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageResource {
    pub id: ResourceId,

    /// バケット名（ストレージ名前空間でグローバルに一意）
    pub bucket_name: String,

    /// インデックスドキュメント（例: index.html）
    pub index_document: String,

    /// エラードキュメント（例: error.html）
    pub error_document: String,

    pub encryption: BucketEncryption,

    /// 公開読み取り（配信はオリジンアクセスID経由なので通常false）
    pub public_read_access: bool,

    pub removal_policy: RemovalPolicy,

    /// 削除前にオブジェクトを自動で空にするか
    pub auto_delete_objects: bool,
}

impl StorageResource {
    /// 手動で空にしなくても削除できるか
    pub fn is_disposable(&self) -> bool {
        self.removal_policy == RemovalPolicy::Destroy && self.auto_delete_objects
    }
}

/// バケット名の命名規則を満たすか
///
/// 3〜63文字、小文字英数字・`.`・`-` のみ、先頭と末尾は英数字。
pub fn is_valid_bucket_name(name: &str) -> bool {
    let len = name.len();
    if !(3..=63).contains(&len) {
        return false;
    }
    let bytes = name.as_bytes();
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !alnum(bytes[0]) || !alnum(bytes[len - 1]) {
        return false;
    }
    if name.contains("..") {
        return false;
    }
    bytes.iter().all(|&b| alnum(b) || b == b'.' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bucket_names() {
        assert!(is_valid_bucket_name("example.com-hosting"));
        assert!(is_valid_bucket_name("abc"));
        assert!(is_valid_bucket_name("my-site-01"));
    }

    #[test]
    fn test_invalid_bucket_names() {
        assert!(!is_valid_bucket_name("ab"));
        assert!(!is_valid_bucket_name("Example.com-hosting"));
        assert!(!is_valid_bucket_name("-leading"));
        assert!(!is_valid_bucket_name("trailing-"));
        assert!(!is_valid_bucket_name("double..dot"));
        assert!(!is_valid_bucket_name("under_score"));
        assert!(!is_valid_bucket_name(&"a".repeat(64)));
    }

    #[test]
    fn test_is_disposable() {
        let mut bucket = StorageResource {
            id: ResourceId::new("Bucket"),
            bucket_name: "example.com-hosting".to_string(),
            index_document: "index.html".to_string(),
            error_document: "error.html".to_string(),
            encryption: BucketEncryption::ProviderManaged,
            public_read_access: false,
            removal_policy: RemovalPolicy::Destroy,
            auto_delete_objects: true,
        };
        assert!(bucket.is_disposable());

        bucket.auto_delete_objects = false;
        assert!(!bucket.is_disposable());

        bucket.auto_delete_objects = true;
        bucket.removal_policy = RemovalPolicy::Retain;
        assert!(!bucket.is_disposable());
    }
}
