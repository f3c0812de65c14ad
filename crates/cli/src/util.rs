use std::io::Read;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use gridpaste_config::TableConfig;
use gridpaste_core::{column_index, ActiveCell, RowId, TableMode};
use gridpaste_engine::EditSession;

use crate::CliError;

pub(crate) fn load_table(path: &Path) -> Result<TableConfig, CliError> {
    let config = TableConfig::load(path)?;
    log::debug!(
        "table '{}': {} column(s), {} mode",
        config.display_name(),
        config.columns.len(),
        config.mode
    );
    Ok(config)
}

/// Dataset records as JSON objects, ready to seed a session.
pub(crate) fn load_source(path: &Path) -> Result<Vec<Value>, CliError> {
    let records = gridpaste_io::load_dataset(path)?;
    Ok(records.into_iter().map(Value::Object).collect())
}

pub(crate) fn read_clipboard(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => Ok(gridpaste_io::csv::read_file_as_utf8(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| CliError::io(format!("stdin: {e}")))?;
            Ok(text)
        }
    }
}

/// Resolve `--at <row key>:<column>` (or `ghost:<column>`) to a cell.
pub(crate) fn parse_anchor<E>(spec: &str, session: &EditSession<Value, E>) -> Result<ActiveCell, CliError> {
    let Some((row, column)) = spec.rsplit_once(':') else {
        return Err(CliError::args(format!("invalid --at '{}'", spec))
            .with_hint("expected <row key>:<column> or ghost:<column>"));
    };

    if column_index(session.columns(), column).is_none() {
        let available: Vec<&str> = session.columns().iter().map(|c| c.id.as_str()).collect();
        return Err(CliError::args(format!("unknown column '{}'", column))
            .with_hint(format!("available columns: {}", available.join(", "))));
    }

    if row == "ghost" {
        if session.mode() != TableMode::Create {
            return Err(CliError::args("edit tables have no ghost row")
                .with_hint("set mode = \"create\" in the table definition"));
        }
        return Ok(ActiveCell::new(RowId::ghost(), column));
    }

    let key = row.trim();
    session
        .rows()
        .iter()
        .filter_map(|r| r.as_data())
        .find(|r| r.cell(session.id_column()).trim() == key)
        .map(|r| ActiveCell::new(r.id.clone(), column))
        .ok_or_else(|| CliError::args(format!("no row with {} '{}'", session.id_column(), key)))
}

/// Human-facing label for a row: its key when it has one.
pub(crate) fn row_label<E>(session: &EditSession<Value, E>, row_id: &RowId) -> String {
    match session.data_row(row_id.as_str()) {
        Some(row) if !row.cell(session.id_column()).trim().is_empty() => {
            format!("{} [{}]", row_id, row.cell(session.id_column()).trim())
        }
        _ => row_id.to_string(),
    }
}

/// One field failure, flattened for reports.
#[derive(Debug, Serialize)]
pub(crate) struct Issue {
    pub row_id: RowId,
    pub key: String,
    pub field: String,
    pub message: String,
}

pub(crate) fn validation_issues<E>(session: &EditSession<Value, E>) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (row_id, fields) in &session.validation_state().errors {
        let key = session
            .data_row(row_id.as_str())
            .map(|r| r.cell(session.id_column()).trim().to_string())
            .unwrap_or_default();
        for (field, message) in fields {
            issues.push(Issue {
                row_id: row_id.clone(),
                key: key.clone(),
                field: field.clone(),
                message: message.clone(),
            });
        }
    }
    issues
}

/// One report line per field failure.
pub(crate) fn issue_lines<E>(session: &EditSession<Value, E>) -> Vec<String> {
    validation_issues(session)
        .into_iter()
        .map(|issue| {
            let label = if issue.key.is_empty() {
                issue.row_id.to_string()
            } else {
                format!("{} [{}]", issue.row_id, issue.key)
            };
            format!("  {}: {}: {}", label, issue.field, issue.message)
        })
        .collect()
}

/// Print exactly one JSON document on stdout.
pub(crate) fn print_json(value: &Value) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(crate::exit_codes::EXIT_ERROR, e.to_string()))?;
    println!("{}", out);
    Ok(())
}
