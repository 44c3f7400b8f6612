use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("無効なドメイン名 '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    #[error("無効なドキュメント名 '{document}': {reason}")]
    InvalidDocument { document: String, reason: String },

    #[error("無効なバケット名 '{0}'")]
    InvalidBucketName(String),

    #[error("リソースIDが重複しています: {0}")]
    DuplicateResource(String),

    #[error("リソース '{from}' が存在しないリソース '{to}' を参照しています")]
    MissingReference { from: String, to: String },

    #[error("リソース '{from}' の参照先 '{to}' は {expected} ではありません")]
    WrongReferenceKind {
        from: String,
        to: String,
        expected: String,
    },

    #[error("循環依存が検出されました: {0}")]
    CircularDependency(String),

    #[error("リソース '{resource}' が不変条件に違反しています: {message}")]
    InvariantViolation { resource: String, message: String },
}

pub type Result<T> = std::result::Result<T, SiteError>;
