//! State - 同期実行中の blob ごとの状態遷移

use serde::{Deserialize, Serialize};

/// BlobState は 1 回の `sync` の中での blob の状態
///
/// # 状態遷移
/// - Discovered → Skipped（raw ディレクトリにファイルが既にある）
/// - Discovered → Downloaded → Converted
///
/// Discovered へ戻る遷移もリトライ状態もない。失敗すると実行は中断し、
/// 次の実行は新しい一覧から始まる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobState {
    /// Listed remotely, not yet checked against the local directory.
    Discovered,

    /// A local file with the flattened name already exists.
    Skipped,

    /// Bytes fetched, not yet written.
    Downloaded,

    /// Parsed and written to the processed directory.
    Converted,
}

impl BlobState {
    /// Is `next` a legal successor of `self`?
    pub fn can_transition_to(self, next: BlobState) -> bool {
        matches!(
            (self, next),
            (BlobState::Discovered, BlobState::Skipped)
                | (BlobState::Discovered, BlobState::Downloaded)
                | (BlobState::Downloaded, BlobState::Converted)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BlobState::Discovered, BlobState::Skipped, true)]
    #[case(BlobState::Discovered, BlobState::Downloaded, true)]
    #[case(BlobState::Downloaded, BlobState::Converted, true)]
    #[case(BlobState::Discovered, BlobState::Converted, false)]
    #[case(BlobState::Skipped, BlobState::Downloaded, false)]
    #[case(BlobState::Converted, BlobState::Discovered, false)]
    fn transitions(#[case] from: BlobState, #[case] to: BlobState, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn serializes_as_snake_case() {
        let s = serde_json::to_string(&BlobState::Converted).unwrap();
        assert_eq!(s, "\"converted\"");
    }
}
