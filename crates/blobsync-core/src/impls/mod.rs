//! Impls - ports の実装
//!
//! # 内容
//! - **StorageConnection**: Azure Blob Storage の `BlobSource`（`object_store` 経由）
//! - **credentials**: 接続文字列 / トークン認証
//! - **endpoint**: アカウントエンドポイントへの環境の埋め込み
//! - **listing**: 任意の `ObjectStore` クライアント上の遅延一覧とダウンロード
//! - **CsvCodec**: `csv` クレートによる `TableCodec`

pub mod azure;
pub mod credentials;
pub mod csv_codec;
pub mod endpoint;
pub mod listing;

pub use self::azure::{StorageConnection, StorageConnectionBuilder};
pub use self::credentials::{
    ClientSecretCredential, ConnectionString, StorageCredentials, TokenCredential,
};
pub use self::csv_codec::CsvCodec;
pub use self::endpoint::{AccountEndpoint, parse_account_endpoint, resolve_template};
pub use self::listing::{BlobListing, fetch_blob};
