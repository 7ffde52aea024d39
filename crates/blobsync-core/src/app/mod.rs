//! App - アプリケーション層
//!
//! ports を組み合わせて同期処理を実装します。
//!
//! # 主要コンポーネント
//! - **SyncPipeline**: 一覧取得 → ローカルにあるものはスキップ → 残りをダウンロードして変換
//! - **SyncReport**: 1 回の実行の blob ごとの結果と集計

pub mod pipeline;
pub mod status;

pub use self::pipeline::{SyncConfig, SyncPipeline};
pub use self::status::{BlobOutcome, SyncReport};
