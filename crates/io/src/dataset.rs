// Source dataset dispatch by file extension

use std::path::Path;

use serde_json::{Map, Value};

use crate::csv::{load_csv_records, read_file_as_utf8, sniff_delimiter};
use crate::error::IoError;
use crate::json::load_json_records;

/// One source row: field name -> JSON value.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Tsv,
    /// Delimiter sniffed from content.
    Text,
    Json,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "tsv" | "tab" => Ok(DatasetFormat::Tsv),
            "txt" => Ok(DatasetFormat::Text),
            "json" => Ok(DatasetFormat::Json),
            _ => Err(IoError::UnsupportedFormat(ext)),
        }
    }
}

/// Load every record of a `.csv`, `.tsv`, `.txt` or `.json` file.
pub fn load_dataset(path: &Path) -> Result<Vec<Record>, IoError> {
    let format = DatasetFormat::from_path(path)?;
    let content = read_file_as_utf8(path)?;
    let records = match format {
        DatasetFormat::Json => load_json_records(&content)?,
        DatasetFormat::Tsv => load_csv_records(&content, b'\t')?,
        DatasetFormat::Csv | DatasetFormat::Text => {
            load_csv_records(&content, sniff_delimiter(&content))?
        }
    };
    log::debug!("{}: {} record(s) as {:?}", path.display(), records.len(), format);
    Ok(records)
}
