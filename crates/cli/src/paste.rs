// `gpaste paste`: one paste against a dataset, optionally applied

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use serde_json::{json, Value};

use gridpaste_core::RowId;
use gridpaste_engine::{EditSession, ParseOptions, PasteOutcome, SessionError};

use crate::exit_codes::{EXIT_ERROR, EXIT_PERSIST, EXIT_VALIDATION};
use crate::util::{load_source, load_table, issue_lines, parse_anchor, print_json, read_clipboard, row_label};
use crate::CliError;

pub(crate) struct PasteArgs {
    pub table: PathBuf,
    pub data: PathBuf,
    pub clipboard: Option<PathBuf>,
    pub at: Option<String>,
    pub apply: bool,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// Rows handed to the persistence callback on the last apply.
type Persisted = Rc<RefCell<Option<Vec<Value>>>>;

pub(crate) fn cmd_paste(args: PasteArgs) -> Result<(), CliError> {
    let config = load_table(&args.table)?;
    let source = load_source(&args.data)?;
    let text = read_clipboard(args.clipboard.as_deref())?;

    let matched: Rc<RefCell<Vec<String>>> = Rc::default();
    let persisted: Persisted = Rc::default();

    let hook_matched = Rc::clone(&matched);
    let sink = Rc::clone(&persisted);
    let output = args.output.clone();

    let mut session = EditSession::<Value>::builder(config.columns.clone(), config.id_column.clone())
        .mode(config.mode)
        .parse_options(ParseOptions { skip_header: config.skip_header })
        .on_row_updated(move |row_id, key| {
            log::debug!("matched {} on key '{}'", row_id, key);
            hook_matched.borrow_mut().push(key.to_string());
        })
        .persist(move |rows: Vec<Value>| {
            let result = match &output {
                Some(path) => gridpaste_io::json::write_json(path, &rows)
                    .map_err(|e| format!("{}: {}", path.display(), e)),
                None => Ok(()),
            };
            *sink.borrow_mut() = Some(rows);
            std::future::ready(result)
        })
        .build(&source)?;

    if let Some(at) = &args.at {
        let cell = parse_anchor(at, &session)?;
        session.set_active_cell_info(cell);
    }

    let outcome = session.paste_text(&text);
    log::info!("paste: {:?}", outcome);

    let mut applied: Option<Vec<RowId>> = None;
    let mut failure: Option<CliError> = None;
    if args.apply {
        match smol::block_on(session.apply_changes()) {
            Ok(ids) => {
                session.commit_baseline();
                applied = Some(ids);
            }
            Err(SessionError::ValidationFailed(state)) => {
                failure = Some(CliError::new(
                    EXIT_VALIDATION,
                    format!("{} row(s) failed validation; nothing was written", state.errors.len()),
                ));
            }
            Err(SessionError::Persistence(msg)) => {
                failure = Some(CliError::new(EXIT_PERSIST, format!("could not persist rows: {}", msg)));
            }
            Err(err @ (SessionError::MissingPersistence | SessionError::Engine(_))) => {
                failure = Some(CliError::new(EXIT_ERROR, err.to_string()));
            }
        }
    }

    let rows_to_stdout = args.apply && args.output.is_none();
    if args.json {
        let mut doc = json!({
            "table": config.display_name(),
            "outcome": outcome,
            "rows": session.rows(),
            "dirty": session.dirty_row_ids(),
            "validation": session.validation_state(),
            "has_unsaved_changes": session.has_unsaved_changes(),
        });
        if let Some(ids) = &applied {
            doc["persisted"] = json!(ids);
            if rows_to_stdout {
                doc["persisted_rows"] = json!(persisted.borrow().clone().unwrap_or_default());
            }
        }
        print_json(&doc)?;
        return match failure {
            Some(err) => Err(CliError::silent(err.code)),
            None => Ok(()),
        };
    }

    // Persisted rows own stdout when there is no --output file
    let report = |line: String| {
        if rows_to_stdout {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    };

    report(describe_outcome(&outcome, &session));
    let keys = matched.borrow();
    if !keys.is_empty() {
        report(format!("matched keys: {}", keys.join(", ")));
    }
    report(format!(
        "rows: {} (dirty: {})",
        session.rows().iter().filter(|r| !r.is_ghost()).count(),
        session.dirty_row_ids().len()
    ));
    let state = session.validation_state();
    if state.is_valid {
        report("validation: ok".to_string());
    } else {
        report(format!("validation: {} error(s)", state.error_count()));
        for line in issue_lines(&session) {
            report(line);
        }
    }

    if let Some(ids) = &applied {
        match &args.output {
            Some(path) => report(format!("persisted {} row(s) to {}", ids.len(), path.display())),
            None => {
                let rows = persisted.borrow().clone().unwrap_or_default();
                print_json(&Value::Array(rows))?;
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn describe_outcome<E>(outcome: &PasteOutcome, session: &EditSession<Value, E>) -> String {
    match outcome {
        PasteOutcome::Ignored => "paste ignored".to_string(),
        PasteOutcome::Cell { row_id, column_id, created, changed } => {
            let what = match (*created, *changed) {
                (true, _) => "created",
                (false, true) => "updated",
                (false, false) => "unchanged",
            };
            format!("cell {} {} on {}", column_id, what, row_label(session, row_id))
        }
        PasteOutcome::Table { updated, created, unmatched } => format!(
            "table paste: {} updated, {} created, {} unmatched",
            updated.len(),
            created.len(),
            unmatched
        ),
        PasteOutcome::Anchored { updated, created, dropped_rows } => format!(
            "anchored paste: {} updated, {} created, {} dropped",
            updated.len(),
            created.len(),
            dropped_rows
        ),
    }
}
