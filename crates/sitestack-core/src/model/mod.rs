//! モデル定義
//!
//! サイト定義と、そこから合成される5種類のリソース記述を定義します。

mod certificate;
mod deployment;
mod distribution;
mod dns;
mod graph;
mod resource;
mod site;
mod storage;
mod zone;

// Re-exports
pub use certificate::*;
pub use deployment::*;
pub use distribution::*;
pub use dns::*;
pub use graph::*;
pub use resource::*;
pub use site::*;
pub use storage::*;
pub use zone::*;
