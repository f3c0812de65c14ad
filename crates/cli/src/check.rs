// `gpaste check` and `gpaste table validate`

use std::path::PathBuf;

use serde_json::{json, Value};

use gridpaste_engine::EditSession;

use crate::exit_codes::EXIT_VALIDATION;
use crate::util::{issue_lines, load_source, load_table, print_json, validation_issues};
use crate::CliError;

pub(crate) fn cmd_check(table: PathBuf, data: PathBuf, json: bool) -> Result<(), CliError> {
    let config = load_table(&table)?;
    let source = load_source(&data)?;

    let session = EditSession::<Value>::builder(config.columns.clone(), config.id_column.clone())
        .mode(config.mode)
        .build(&source)?;
    let state = session.validation_state();

    if json {
        print_json(&json!({
            "table": config.display_name(),
            "valid": state.is_valid,
            "rows": source.len(),
            "invalid_rows": state.errors.len(),
            "errors": validation_issues(&session),
        }))?;
        return if state.is_valid {
            Ok(())
        } else {
            Err(CliError::silent(EXIT_VALIDATION))
        };
    }

    if state.is_valid {
        println!("ok: {} row(s) valid", source.len());
        return Ok(());
    }

    println!(
        "{} of {} row(s) invalid ({} error(s))",
        state.errors.len(),
        source.len(),
        state.error_count()
    );
    for line in issue_lines(&session) {
        println!("{}", line);
    }
    Err(CliError::new(
        EXIT_VALIDATION,
        format!("{} row(s) failed validation", state.errors.len()),
    ))
}

pub(crate) fn cmd_table_validate(file: PathBuf, json: bool) -> Result<(), CliError> {
    let config = load_table(&file)?;
    let columns: Vec<Value> = config
        .columns
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "label": c.label(),
                "kind": c.kind.to_string(),
                "required": c.required,
            })
        })
        .collect();

    if json {
        return print_json(&json!({
            "valid": true,
            "name": config.display_name(),
            "mode": config.mode.to_string(),
            "id_column": config.id_column,
            "columns": columns,
        }));
    }

    println!(
        "ok: {} ({} column(s), {} mode, id column '{}')",
        config.display_name(),
        config.columns.len(),
        config.mode,
        config.id_column
    );
    Ok(())
}
