//! blobsync-core
//!
//! コストエクスポートの blob をローカルの CSV ファイルへ同期するための部品。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（blob レコード、環境、blob ごとの状態、エラー）
//! - **ports**: 抽象化レイヤー（BlobSource, TableCodec）
//! - **impls**: 実装（Azure Blob Storage 接続、認証、CSV codec）
//! - **app**: 同期パイプラインと実行レポート

pub mod domain;
pub mod ports;
pub mod impls;
pub mod app;

pub use app::{SyncConfig, SyncPipeline, SyncReport};
pub use domain::{BlobRecord, Environment, SyncError};
pub use impls::{ClientSecretCredential, CsvCodec, StorageConnection};
