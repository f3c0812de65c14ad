// End-to-end edit session flows: paste, dirty, apply, discard.

use std::cell::RefCell;
use std::rc::Rc;

use gridpaste_core::{ActiveCell, ColumnDef, ColumnRule, NumericConstraint, RowId, TableMode, GHOST_ROW_ID};
use gridpaste_engine::{EditSession, PasteEvent, PasteOutcome, SessionError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    id: i64,
    name: String,
    value: i64,
}

fn item(id: i64, name: &str, value: i64) -> Item {
    Item {
        id,
        name: name.to_string(),
        value,
    }
}

fn columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::integer("id").with_label("ID").required(),
        ColumnDef::text("name").with_label("Name").required(),
        ColumnDef::integer("value")
            .with_label("Value")
            .with_rule(ColumnRule::whole_number(NumericConstraint::between(0.0, 1000.0))),
    ]
}

fn source() -> Vec<Item> {
    vec![item(1, "Item 1", 10), item(2, "Item 2", 20)]
}

type Saved = Rc<RefCell<Vec<Vec<Item>>>>;

fn recording_session(mode: TableMode, data: &[Item]) -> (EditSession<Item, String>, Saved) {
    let saved: Saved = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&saved);
    let session = EditSession::builder(columns(), "id")
        .mode(mode)
        .persist(move |rows: Vec<Item>| {
            sink.borrow_mut().push(rows);
            async { Ok::<(), String>(()) }
        })
        .build(data)
        .unwrap();
    (session, saved)
}

// ---------------------------------------------------------------------------
// Edit mode
// ---------------------------------------------------------------------------

#[test]
fn edit_paste_apply_discard() {
    let (mut session, saved) = recording_session(TableMode::Edit, &source());

    let mut event = PasteEvent::new("1\tUpdated\t100");
    let outcome = session.handle_paste(&mut event);
    assert!(event.is_default_prevented());
    assert_eq!(outcome.updated_rows().len(), 1);

    let first = session.rows()[0].as_data().unwrap().id.clone();
    assert_eq!(session.dirty_row_ids().iter().collect::<Vec<_>>(), vec![&first]);
    assert!(session.has_unsaved_changes());

    let persisted = smol::block_on(session.apply_changes()).unwrap();
    assert_eq!(persisted, vec![first.clone()]);
    assert_eq!(*saved.borrow(), vec![vec![item(1, "Updated", 100)]]);

    // The engine does not rebase after a successful apply.
    assert!(session.has_unsaved_changes());

    session.discard_changes();
    assert!(!session.has_unsaved_changes());
    assert_eq!(session.rows()[0].cell("name"), "Item 1");
    assert_eq!(session.rows()[0].cell("value"), "10");
}

#[test]
fn edit_paste_persists_large_integer_ids_exactly() {
    let data = vec![item(9_007_199_254_740_992, "low", 1), item(9_007_199_254_740_993, "high", 2)];
    let (mut session, saved) = recording_session(TableMode::Edit, &data);

    let outcome = session.paste_text("9007199254740993\tb\t3");
    assert_eq!(outcome.updated_rows().len(), 1);
    assert_eq!(session.dirty_row_ids().len(), 1);

    smol::block_on(session.apply_changes()).unwrap();
    assert_eq!(*saved.borrow(), vec![vec![item(9_007_199_254_740_993, "b", 3)]]);
}

#[test]
fn edit_paste_with_header_and_csv() {
    let (mut session, _) = recording_session(TableMode::Edit, &source());
    session.paste_text("ID,Name,Value\n2,\"Two, revised\",25\n");
    let row = session.rows()[1].as_data().unwrap();
    assert_eq!(row.cell("name"), "Two, revised");
    assert_eq!(session.dirty_domain_rows().unwrap(), vec![item(2, "Two, revised", 25)]);
}

#[test]
fn commit_after_apply_clears_dirty() {
    let (mut session, _) = recording_session(TableMode::Edit, &source());
    session.paste_text("2\tChanged\t5");
    smol::block_on(session.apply_changes()).unwrap();
    session.commit_baseline();
    assert!(!session.has_unsaved_changes());
    assert_eq!(session.baseline().rows()[1].cell("name"), "Changed");
}

#[test]
fn apply_blocked_by_rule_violation() {
    let (mut session, saved) = recording_session(TableMode::Edit, &source());
    session.paste_text("1\tItem 1\t5000");
    assert!(!session.is_save_enabled());

    let err = smol::block_on(session.apply_changes()).unwrap_err();
    match &err {
        SessionError::ValidationFailed(state) => {
            let first = session.rows()[0].id_str();
            assert_eq!(
                state.row_errors(first).unwrap()["value"],
                "must be between 0 and 1000"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "validation failed: 1 error(s) in 1 row(s)");
    assert!(saved.borrow().is_empty());
}

#[test]
fn anchored_edit_paste_respects_table_bounds() {
    let (mut session, _) = recording_session(TableMode::Edit, &source());
    let second = session.rows()[1].as_data().unwrap().id.clone();
    session.set_active_cell_info(ActiveCell::new(second.clone(), "name"));

    let outcome = session.paste_text("A\t1\nB\t2\nC\t3");
    match outcome {
        PasteOutcome::Anchored { updated, created, dropped_rows } => {
            assert_eq!(updated, vec![second]);
            assert!(created.is_empty());
            assert_eq!(dropped_rows, 2);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.rows().len(), 2);
}

// ---------------------------------------------------------------------------
// Create mode
// ---------------------------------------------------------------------------

#[test]
fn create_typing_into_ghost_then_apply() {
    let (mut session, saved) = recording_session(TableMode::Create, &[]);
    assert_eq!(session.rows().len(), 1);

    let new_id = session.update_cell(GHOST_ROW_ID, "id", "7").unwrap();
    session.update_cell(new_id.as_str(), "name", "Seven");
    session.update_cell(new_id.as_str(), "value", "70");

    assert_eq!(session.rows().len(), 2);
    assert!(session.rows()[1].is_ghost());
    assert!(session.is_save_enabled());

    smol::block_on(session.apply_changes()).unwrap();
    assert_eq!(*saved.borrow(), vec![vec![item(7, "Seven", 70)]]);
}

#[test]
fn create_single_cell_paste_follows_converted_row() {
    let (mut session, _) = recording_session(TableMode::Create, &[]);
    session.set_active_cell_info(ActiveCell::new(RowId::ghost(), "name"));

    session.paste_text("First");
    let pointer = session.active_cell().unwrap().row_id.clone();
    assert!(!pointer.is_ghost());

    session.paste_text("Renamed");
    assert_eq!(session.data_row(pointer.as_str()).unwrap().cell("name"), "Renamed");
    assert_eq!(session.rows().len(), 2);
}

#[test]
fn create_table_paste_keeps_existing_rows() {
    let (mut session, _) = recording_session(TableMode::Create, &source());
    let outcome = session.paste_text("3\tThree\t30\n4\tFour\t40");
    assert_eq!(outcome.created_rows().len(), 2);

    let rows = session.rows();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].cell("name"), "Item 1");
    assert_eq!(rows[3].cell("name"), "Four");
    assert!(rows[4].is_ghost());

    assert_eq!(
        session.dirty_domain_rows().unwrap(),
        vec![item(3, "Three", 30), item(4, "Four", 40)]
    );
}

#[test]
fn reset_then_discard_restores_source() {
    let (mut session, _) = recording_session(TableMode::Create, &source());
    session.reset_rows();
    assert_eq!(session.rows().len(), 1);
    session.discard_changes();
    assert_eq!(session.rows().len(), 3);
    assert!(session.rows()[2].is_ghost());
}
