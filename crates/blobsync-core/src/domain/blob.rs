//! Blob - blob レコードと、そこから導出する名前
//!
//! blob キーから 2 種類の名前が出てくる（混同しないこと）:
//! - `local_name`: 先頭のパスセグメントを除いたキー（表示・報告用）
//! - `flattened_name`: キー全体の `/` を `_` に置換したもの（ローカルのファイル名）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::SyncError;

/// One object in the remote container, as seen by a single listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    pub blob_name: String,
    pub creation_time: DateTime<Utc>,
    pub local_name: String,
    pub size: u64,
}

impl BlobRecord {
    /// Build a record, deriving `local_name` from `blob_name`.
    pub fn new(
        blob_name: impl Into<String>,
        creation_time: DateTime<Utc>,
        size: u64,
    ) -> Result<Self, SyncError> {
        let blob_name = blob_name.into();
        let local_name = local_name(&blob_name)?.to_string();
        Ok(Self {
            blob_name,
            creation_time,
            local_name,
            size,
        })
    }

    pub fn flattened_name(&self) -> String {
        flattened_name(&self.blob_name)
    }
}

/// Strip everything up to and including the first `/`.
///
/// `"2024/01/report.csv"` becomes `"01/report.csv"`.
pub fn local_name(blob_name: &str) -> Result<&str, SyncError> {
    match blob_name.split_once('/') {
        Some((_, rest)) => Ok(rest),
        None => {
            tracing::error!(blob_name, "failed to get name from blob");
            Err(SyncError::MalformedName {
                blob_name: blob_name.to_string(),
            })
        }
    }
}

/// `"2024/01/report.csv"` becomes `"2024_01_report.csv"`.
pub fn flattened_name(blob_name: &str) -> String {
    blob_name.replace('/', "_")
}
