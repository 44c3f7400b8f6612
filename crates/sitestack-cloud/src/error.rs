//! Provisioning error types

use thiserror::Error;

/// Provisioning errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("DNS zone not found for domain: {0}")]
    ZoneNotFound(String),

    #[error("Invalid resource graph: {0}")]
    InvalidGraph(#[from] sitestack_core::SiteError),

    #[error("Provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Asset source error: {0}")]
    AssetSource(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("State changed since the plan was computed: {0}")]
    PlanChanged(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
