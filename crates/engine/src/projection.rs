//! Domain rows <-> string cells.
//!
//! Domain rows are any serde type whose field names are column ids. Into the
//! table every field is rendered as text; back out, each cell is coerced by
//! its column's [`ValueKind`] and the resulting JSON object is deserialized.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use gridpaste_core::{Cells, ColumnDef, DataRow, ValueKind};

use crate::error::EngineError;
use crate::validation::{parse_boolean, parse_integer_input, parse_numeric_input, MAX_EXACT_INTEGER};

/// Text shown in a cell for a JSON value. `null` renders empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Render one domain row as cells. Fields that are not columns are ignored;
/// columns missing from the row read as `""`.
pub fn domain_to_cells<D: Serialize>(
    row: &D,
    columns: &[ColumnDef],
    index: usize,
) -> Result<Cells, EngineError> {
    let value = serde_json::to_value(row).map_err(|e| EngineError::Serialize(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(EngineError::NotAnObject { index });
    };
    Ok(object_to_cells(&object, columns))
}

pub fn domain_rows_to_cells<D: Serialize>(
    rows: &[D],
    columns: &[ColumnDef],
) -> Result<Vec<Cells>, EngineError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| domain_to_cells(row, columns, i))
        .collect()
}

/// Cells from an already-parsed JSON object (dataset files).
pub fn object_to_cells(object: &Map<String, Value>, columns: &[ColumnDef]) -> Cells {
    columns
        .iter()
        .map(|c| {
            let text = object.get(&c.id).map(display_value).unwrap_or_default();
            (c.id.clone(), text)
        })
        .collect()
}

/// Typed JSON value for one cell. Blank non-text cells become `null`.
pub fn coerce_cell(column: &ColumnDef, raw: &str) -> Result<Value, String> {
    if column.kind != ValueKind::Text && raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    match column.kind {
        ValueKind::Text => Ok(Value::String(raw.to_string())),
        ValueKind::Integer => {
            let n = parse_integer_input(raw).map_err(|e| e.to_string())?;
            Ok(Value::Number(Number::from(n)))
        }
        ValueKind::Number => {
            if let Ok(n) = parse_integer_input(raw) {
                return Ok(Value::Number(Number::from(n)));
            }
            let n = parse_numeric_input(raw, true).map_err(|e| e.to_string())?;
            Ok(number_value(n))
        }
        ValueKind::Boolean => parse_boolean(raw)
            .map(Value::Bool)
            .ok_or_else(|| "must be true or false".to_string()),
    }
}

// Integral values stay integers so they deserialize into integer fields.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// JSON object holding every column of `row`, coerced by kind.
pub fn row_to_value(row: &DataRow, columns: &[ColumnDef]) -> Result<Value, EngineError> {
    let mut object = Map::with_capacity(columns.len());
    for column in columns {
        let value = coerce_cell(column, row.cell(&column.id)).map_err(|message| EngineError::Coerce {
            row_id: row.id.clone(),
            column: column.id.clone(),
            message,
        })?;
        object.insert(column.id.clone(), value);
    }
    Ok(Value::Object(object))
}

pub fn row_to_domain<D: DeserializeOwned>(row: &DataRow, columns: &[ColumnDef]) -> Result<D, EngineError> {
    let value = row_to_value(row, columns)?;
    serde_json::from_value(value).map_err(|e| EngineError::Deserialize {
        row_id: row.id.clone(),
        message: e.to_string(),
    })
}
