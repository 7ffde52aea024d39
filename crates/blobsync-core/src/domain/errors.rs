//! Errors - 同期エラーの分類
//!
//! どの variant も現在の実行にとって致命的。復旧手段は再実行:
//! 書き出し済みの blob はファイルが存在するためスキップされる。

use std::path::PathBuf;

use thiserror::Error;

/// SyncError はコアの全操作で使うエラー型
#[derive(Debug, Error)]
pub enum SyncError {
    /// The blob name has no `/`, so no local name can be derived.
    #[error("failed to get name from blob '{blob_name}': expected at least one '/'")]
    MalformedName { blob_name: String },

    /// The blob disappeared between listing and download.
    #[error("blob '{blob_name}' not found")]
    NotFound { blob_name: String },

    /// The credential was rejected or lacks permission.
    #[error("access to '{blob_name}' was denied")]
    Auth {
        blob_name: String,
        #[source]
        source: object_store::Error,
    },

    /// Downloaded bytes are not a readable table.
    #[error("blob '{blob_name}' is not valid CSV")]
    Codec {
        blob_name: String,
        #[source]
        source: CodecError,
    },

    /// No usable credential was configured.
    #[error("credential error: {0}")]
    Credential(String),

    #[error("malformed endpoint template '{template}': {reason}")]
    Template { template: String, reason: String },

    /// Any other failure reported by the object store client.
    #[error("{context}")]
    Store {
        context: String,
        #[source]
        source: object_store::Error,
    },

    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Classify a client error raised while touching `blob_name`.
    pub fn from_store(blob_name: &str, source: object_store::Error) -> Self {
        match source {
            object_store::Error::NotFound { .. } => SyncError::NotFound {
                blob_name: blob_name.to_string(),
            },
            object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. } => SyncError::Auth {
                blob_name: blob_name.to_string(),
                source,
            },
            source => SyncError::Store {
                context: format!("object store request for '{blob_name}' failed"),
                source,
            },
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}

/// CodecError は `TableCodec` 実装が返すエラー
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("input has no header row")]
    MissingHeader,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("flushing encoded output failed")]
    Flush(#[from] std::io::Error),
}
