//! TableCodec port - 区切り文字形式の表データの入出力

use crate::domain::CodecError;

/// In-memory table: a header row plus data rows of equal width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub trait TableCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Table, CodecError>;

    fn encode(&self, table: &Table) -> Result<Vec<u8>, CodecError>;
}
