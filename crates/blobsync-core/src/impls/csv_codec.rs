//! CsvCodec - `csv` クレートによるカンマ区切りテーブル

use crate::domain::CodecError;
use crate::ports::{Table, TableCodec};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CsvCodec reads a header row plus records and writes them back out.
///
/// With `write_index` (the default) the output gains a leading unnamed
/// column holding the 0-based row number, the layout the existing cost
/// reports were exported with.
#[derive(Debug, Clone, Copy)]
pub struct CsvCodec {
    write_index: bool,
}

impl CsvCodec {
    pub fn new() -> Self {
        Self { write_index: true }
    }

    pub fn without_index() -> Self {
        Self { write_index: false }
    }

    pub fn writes_index(&self) -> bool {
        self.write_index
    }
}

impl Default for CsvCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TableCodec for CsvCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Table, CodecError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers = reader.headers()?;
        if headers.is_empty() {
            return Err(CodecError::MissingHeader);
        }
        let mut table = Table::new(headers.iter().map(str::to_string).collect());

        for record in reader.records() {
            let record = record?;
            table.rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(table)
    }

    fn encode(&self, table: &Table) -> Result<Vec<u8>, CodecError> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

        let index_header = self.write_index.then_some("");
        writer.write_record(index_header.into_iter().chain(table.headers.iter().map(String::as_str)))?;

        for (i, row) in table.rows.iter().enumerate() {
            let index = i.to_string();
            let index_cell = self.write_index.then_some(index.as_str());
            writer.write_record(index_cell.into_iter().chain(row.iter().map(String::as_str)))?;
        }

        writer
            .into_inner()
            .map_err(|e| CodecError::Flush(e.into_error()))
    }
}
