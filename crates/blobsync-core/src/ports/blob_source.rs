//! BlobSource port - リモート blob コンテナの読み取り専用ビュー

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{BlobRecord, SyncError};

/// BlobSource は「どの blob があるか」と「blob X の中身」に答える
///
/// # 設計原則
/// - コンテナを変更しない（読み取り専用）
/// - 名前は一覧が返したものをそのまま使う
#[async_trait]
pub trait BlobSource: Send + Sync {
    /// Materialize the listing into records, in store order.
    ///
    /// Names starting with `name_prefix` are kept (all names when `None`);
    /// names starting with `exclude_prefix` are then dropped.
    async fn list_blob_records(
        &self,
        name_prefix: Option<&str>,
        exclude_prefix: Option<&str>,
    ) -> Result<Vec<BlobRecord>, SyncError>;

    /// Fetch the full content of one blob.
    async fn download_blob(&self, blob_name: &str) -> Result<Bytes, SyncError>;
}
