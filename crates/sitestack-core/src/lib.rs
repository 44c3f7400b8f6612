//! SiteStack Core
//!
//! 静的サイトのホスティング基盤を宣言的に記述するためのコアクレート。
//!
//! - [`model`]: サイト定義と5種類のリソース記述、リソースグラフ
//! - [`parser`]: site.kdl のパース
//! - [`synth`]: サイト定義からリソースグラフを合成

pub mod error;
pub mod model;
pub mod parser;
pub mod synth;

pub use error::{Result, SiteError};
pub use model::*;
pub use parser::{parse_site_file, parse_site_string};
pub use synth::synthesize;
