//! Ports - 同期パイプラインと外部の境界
//!
//! # Ports
//! - **BlobSource**: リモートの一覧取得とダウンロード（本番は Azure Blob Storage）
//! - **TableCodec**: 区切り文字形式の表データの解析 / 書き出し

pub mod blob_source;
pub mod table_codec;

pub use self::blob_source::BlobSource;
pub use self::table_codec::{Table, TableCodec};
