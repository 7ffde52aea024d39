//! Status - 同期実行の結果（blob ごと・合計）

use serde::{Deserialize, Serialize};

use crate::domain::BlobState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobOutcome {
    pub blob_name: String,
    pub file_name: String,
    pub state: BlobState,
}

/// SyncReport は 1 回の実行で何が起きたかを説明する
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub discovered: usize,
    pub skipped: usize,
    pub converted: usize,
    pub outcomes: Vec<BlobOutcome>,
}

impl SyncReport {
    pub(crate) fn record(&mut self, blob_name: &str, file_name: String, state: BlobState) {
        match state {
            BlobState::Skipped => self.skipped += 1,
            BlobState::Converted => self.converted += 1,
            BlobState::Discovered | BlobState::Downloaded => {}
        }
        self.outcomes.push(BlobOutcome {
            blob_name: blob_name.to_string(),
            file_name,
            state,
        });
    }

    /// File names written during this run, in processing order.
    pub fn exported(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.state == BlobState::Converted)
            .map(|o| o.file_name.as_str())
    }
}
