//! サイト定義
//!
//! site.kdl から読み込まれる入力。ここからリソースグラフを合成します。

use super::zone::{HostedZone, normalize_domain};
use crate::error::{Result, SiteError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";
pub const DEFAULT_ERROR_DOCUMENT: &str = "error.html";
pub const DEFAULT_SOURCE: &str = "dist";
pub const DEFAULT_REGION: &str = "eu-west-2";

/// ホスティングするサイトの記述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSpec {
    /// 配信ドメイン（小文字・末尾ドットなしに正規化済み）
    pub domain_name: String,

    pub index_document: String,

    pub error_document: String,

    /// アップロードするファイルツリー（プロジェクトルートからの相対パス可）
    pub source: PathBuf,

    /// スタック全体のリージョン（証明書には適用されない）
    pub region: String,
}

impl SiteSpec {
    /// デフォルト値でサイトを作成
    pub fn new(domain_name: impl AsRef<str>) -> Self {
        Self {
            domain_name: normalize_domain(domain_name.as_ref()),
            index_document: DEFAULT_INDEX_DOCUMENT.to_string(),
            error_document: DEFAULT_ERROR_DOCUMENT.to_string(),
            source: PathBuf::from(DEFAULT_SOURCE),
            region: DEFAULT_REGION.to_string(),
        }
    }

    pub fn with_documents(mut self, index: impl Into<String>, error: impl Into<String>) -> Self {
        self.index_document = index.into();
        self.error_document = error.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// バケット名（`{domain}-hosting`）
    pub fn bucket_name(&self) -> String {
        format!("{}-hosting", self.domain_name)
    }

    pub fn validate(&self) -> Result<()> {
        validate_domain(&self.domain_name)?;
        validate_document(&self.index_document)?;
        validate_document(&self.error_document)?;
        if self.region.trim().is_empty() {
            return Err(SiteError::InvalidConfig(
                "region must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// site.kdl 全体（サイト + 既知のDNSゾーン）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteFile {
    pub site: SiteSpec,
    #[serde(default)]
    pub zones: Vec<HostedZone>,
}

/// DNS名として妥当か検証
pub fn validate_domain(domain: &str) -> Result<()> {
    let invalid = |reason: &str| SiteError::InvalidDomain {
        domain: domain.to_string(),
        reason: reason.to_string(),
    };

    if domain.is_empty() {
        return Err(invalid("empty"));
    }
    if domain.len() > 253 {
        return Err(invalid("longer than 253 characters"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid("at least two labels are required"));
    }
    for label in labels {
        if label.is_empty() || label.len() > 63 {
            return Err(invalid("each label must be 1-63 characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("labels must not start or end with '-'"));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(invalid("labels may contain only letters, digits and '-'"));
        }
    }
    Ok(())
}

/// インデックス/エラードキュメント名を検証
pub fn validate_document(document: &str) -> Result<()> {
    let invalid = |reason: &str| SiteError::InvalidDocument {
        document: document.to_string(),
        reason: reason.to_string(),
    };

    if document.is_empty() {
        return Err(invalid("empty"));
    }
    if document.starts_with('/') {
        return Err(invalid("must be relative to the bucket root (no leading '/')"));
    }
    if document.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    Ok(())
}
