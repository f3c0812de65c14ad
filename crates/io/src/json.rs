// JSON dataset loading and output

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::IoError;

/// Parse a JSON array of objects.
pub fn load_json_records(content: &str) -> Result<Vec<Map<String, Value>>, IoError> {
    let root: Value = serde_json::from_str(content).map_err(|e| IoError::Json(e.to_string()))?;
    let Value::Array(items) = root else {
        return Err(IoError::NotAnArray);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => Ok(object),
            _ => Err(IoError::NotArrayOfObjects { index }),
        })
        .collect()
}

/// Write `value` as pretty JSON with a trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::Io(format!("{}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| IoError::Json(e.to_string()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
