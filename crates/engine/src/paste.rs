//! Paste routing.
//!
//! Every paste is parsed into a grid, then routed on `(mode, active cell,
//! grid shape)`:
//!
//! | Grid | Active cell | Behavior |
//! |------|-------------|----------|
//! | 1x1  | set         | write the active cell (ghost converts) |
//! | any  | none        | table-level: create appends rows, edit matches by id column |
//! | any  | set         | anchored at the active cell |
//!
//! The active cell is never cleared here; callers manage it.

use serde::Serialize;

use gridpaste_core::{column_index, ActiveCell, Cells, ColumnDef, RowId, TableMode, TableRow};

use crate::clipboard::{parse_clipboard_with, Grid, ParseOptions};
use crate::row_store::{RowPosition, RowStore};
use crate::validation::{parse_integer_input, parse_numeric_input, MAX_EXACT_INTEGER};

/// A clipboard paste delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    text: String,
    default_prevented: bool,
}

impl PasteEvent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            default_prevented: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// What a paste did to the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PasteOutcome {
    /// Nothing written (empty clipboard, stale anchor, blank ghost write).
    Ignored,
    /// Single value written to the active cell.
    Cell {
        row_id: RowId,
        column_id: String,
        /// The active cell was the ghost row and has been converted.
        created: bool,
        changed: bool,
    },
    /// Table-level paste (no active cell).
    Table {
        updated: Vec<RowId>,
        created: Vec<RowId>,
        /// Parsed rows with no matching id (edit mode).
        unmatched: usize,
    },
    /// Multi-cell paste anchored at the active cell.
    Anchored {
        updated: Vec<RowId>,
        created: Vec<RowId>,
        /// Parsed rows past the last row of an edit table.
        dropped_rows: usize,
    },
}

impl PasteOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, PasteOutcome::Ignored)
    }

    pub fn created_rows(&self) -> &[RowId] {
        match self {
            PasteOutcome::Cell { row_id, created: true, .. } => std::slice::from_ref(row_id),
            PasteOutcome::Table { created, .. } | PasteOutcome::Anchored { created, .. } => created,
            _ => &[],
        }
    }

    pub fn updated_rows(&self) -> &[RowId] {
        match self {
            PasteOutcome::Cell { row_id, created: false, .. } => std::slice::from_ref(row_id),
            PasteOutcome::Table { updated, .. } | PasteOutcome::Anchored { updated, .. } => updated,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct PasteCoordinator {
    mode: TableMode,
    id_column: String,
    active_cell: Option<ActiveCell>,
    options: ParseOptions,
}

impl PasteCoordinator {
    pub fn new(mode: TableMode, id_column: impl Into<String>) -> Self {
        Self {
            mode,
            id_column: id_column.into(),
            active_cell: None,
            options: ParseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn mode(&self) -> TableMode {
        self.mode
    }

    pub fn set_active_cell_info(&mut self, cell: ActiveCell) {
        self.active_cell = Some(cell);
    }

    pub fn clear_active_cell_info(&mut self) {
        self.active_cell = None;
    }

    pub fn active_cell(&self) -> Option<&ActiveCell> {
        self.active_cell.as_ref()
    }

    /// Parse and apply one paste. The event's default is always prevented.
    ///
    /// `on_row_updated` fires once per row matched by an edit-mode
    /// table-level paste, with the parsed id value.
    pub fn handle_paste<H>(&mut self, event: &mut PasteEvent, store: &mut RowStore, on_row_updated: H) -> PasteOutcome
    where
        H: FnMut(&RowId, &str),
    {
        event.prevent_default();
        let grid = parse_clipboard_with(event.text(), store.columns(), self.options);
        self.paste_grid(grid, store, on_row_updated)
    }

    /// Apply an already-parsed grid.
    pub fn paste_grid<H>(&mut self, grid: Grid, store: &mut RowStore, on_row_updated: H) -> PasteOutcome
    where
        H: FnMut(&RowId, &str),
    {
        let outcome = if grid.is_empty() {
            PasteOutcome::Ignored
        } else {
            match self.active_cell.clone() {
                Some(cell) if grid.len() == 1 && grid[0].len() == 1 => {
                    log::debug!("paste: single value into {}:{}", cell.row_id, cell.column_id);
                    self.paste_single(&cell, &grid[0][0], store)
                }
                Some(cell) => {
                    log::debug!(
                        "paste: {}x{} grid anchored at {}:{}",
                        grid.len(),
                        grid[0].len(),
                        cell.row_id,
                        cell.column_id
                    );
                    self.paste_anchored(&cell, &grid, store)
                }
                None => {
                    log::debug!("paste: {} row(s) at table level ({} mode)", grid.len(), self.mode);
                    match self.mode {
                        TableMode::Create => paste_table_create(&grid, store),
                        TableMode::Edit => self.paste_table_edit(&grid, store, on_row_updated),
                    }
                }
            }
        };
        log::debug!("paste outcome: {:?}", outcome);
        outcome
    }

    fn paste_single(&mut self, cell: &ActiveCell, value: &str, store: &mut RowStore) -> PasteOutcome {
        if cell.row_id.is_ghost() {
            let Some(new_id) = store.convert_ghost_row(cell.row_id.as_str(), &cell.column_id, value) else {
                return PasteOutcome::Ignored;
            };
            self.active_cell = Some(ActiveCell::new(new_id.clone(), cell.column_id.clone()));
            return PasteOutcome::Cell {
                row_id: new_id,
                column_id: cell.column_id.clone(),
                created: true,
                changed: true,
            };
        }

        if store.data_row(cell.row_id.as_str()).is_none()
            || column_index(store.columns(), &cell.column_id).is_none()
        {
            log::warn!("paste: active cell {}:{} no longer exists", cell.row_id, cell.column_id);
            return PasteOutcome::Ignored;
        }
        let changed = store.update_cell(cell.row_id.as_str(), &cell.column_id, value);
        PasteOutcome::Cell {
            row_id: cell.row_id.clone(),
            column_id: cell.column_id.clone(),
            created: false,
            changed,
        }
    }

    fn paste_table_edit<H>(&self, grid: &Grid, store: &mut RowStore, mut on_row_updated: H) -> PasteOutcome
    where
        H: FnMut(&RowId, &str),
    {
        let columns = store.columns().to_vec();
        let Some(id_index) = column_index(&columns, &self.id_column) else {
            log::warn!("paste: id column '{}' is not a table column", self.id_column);
            return PasteOutcome::Ignored;
        };
        let numeric_key = columns[id_index].kind.is_numeric();

        let mut updated: Vec<RowId> = Vec::new();
        let mut unmatched = 0;
        for parsed in grid {
            let key = parsed.get(id_index).map(|k| k.trim()).unwrap_or("");
            let target = if key.is_empty() {
                None
            } else {
                store
                    .data_rows()
                    .find(|row| keys_match(row.cell(&self.id_column), key, numeric_key))
                    .map(|row| row.id.clone())
            };
            let Some(row_id) = target else {
                unmatched += 1;
                continue;
            };

            for (i, (column, value)) in columns.iter().zip(parsed).enumerate() {
                if i != id_index {
                    store.update_cell(row_id.as_str(), &column.id, value);
                }
            }
            on_row_updated(&row_id, key);
            if !updated.contains(&row_id) {
                updated.push(row_id);
            }
        }

        PasteOutcome::Table {
            updated,
            created: Vec::new(),
            unmatched,
        }
    }

    fn paste_anchored(&mut self, anchor: &ActiveCell, grid: &Grid, store: &mut RowStore) -> PasteOutcome {
        let columns = store.columns().to_vec();
        let Some(start_col) = column_index(&columns, &anchor.column_id) else {
            log::warn!("paste: anchor column '{}' is not a table column", anchor.column_id);
            return PasteOutcome::Ignored;
        };
        let Some(start_row) = store.position(anchor.row_id.as_str()) else {
            log::warn!("paste: anchor row '{}' no longer exists", anchor.row_id);
            return PasteOutcome::Ignored;
        };

        let mut updated = Vec::new();
        let mut created = Vec::new();
        let mut dropped_rows = 0;

        for (offset, parsed) in grid.iter().enumerate() {
            let target = start_row + offset;
            let targets = columns.iter().skip(start_col).zip(parsed);

            if let Some(TableRow::Data(row)) = store.rows().get(target) {
                let row_id = row.id.clone();
                for (column, value) in targets {
                    store.update_cell(row_id.as_str(), &column.id, value);
                }
                updated.push(row_id);
                continue;
            }

            match self.mode {
                TableMode::Edit => {
                    dropped_rows = grid.len() - offset;
                    break;
                }
                TableMode::Create => {
                    let cells: Cells = targets.map(|(c, v)| (c.id.clone(), v.clone())).collect();
                    if cells.values().all(|v| v.trim().is_empty()) {
                        continue;
                    }
                    let row = store.new_row(cells);
                    created.push(store.add_row(row, RowPosition::BeforeGhost));
                }
            }
        }

        if anchor.row_id.is_ghost() {
            if let Some(first) = created.first() {
                self.active_cell = Some(ActiveCell::new(first.clone(), anchor.column_id.clone()));
            }
        }

        PasteOutcome::Anchored {
            updated,
            created,
            dropped_rows,
        }
    }
}

/// Create mode, no anchor: every non-blank parsed row becomes a new row
/// appended after the existing data rows.
fn paste_table_create(grid: &Grid, store: &mut RowStore) -> PasteOutcome {
    let columns: Vec<ColumnDef> = store.columns().to_vec();
    let new_rows: Vec<_> = grid
        .iter()
        .filter(|parsed| parsed.iter().any(|v| !v.trim().is_empty()))
        .map(|parsed| {
            let cells: Cells = columns
                .iter()
                .zip(parsed)
                .map(|(c, v)| (c.id.clone(), v.clone()))
                .collect();
            store.new_row(cells)
        })
        .collect();

    let created: Vec<RowId> = new_rows.iter().map(|r| r.id.clone()).collect();
    store.set_rows_with(|mut rows| {
        rows.extend(new_rows.into_iter().map(TableRow::Data));
        rows
    });

    PasteOutcome::Table {
        updated: Vec::new(),
        created,
        unmatched: 0,
    }
}

/// Compare an existing id cell against a pasted key.
///
/// Numeric id columns compare by value ("1" == "1.0"); everything else by
/// trimmed text. Whole numbers compare as `i64`; the float comparison only
/// applies where a float holds both values exactly.
fn keys_match(existing: &str, pasted: &str, numeric: bool) -> bool {
    let existing = existing.trim();
    if existing.is_empty() {
        return false;
    }
    if numeric {
        if let (Ok(a), Ok(b)) = (parse_integer_input(existing), parse_integer_input(pasted)) {
            return a == b;
        }
        if let (Ok(a), Ok(b)) = (parse_numeric_input(existing, true), parse_numeric_input(pasted, true)) {
            if a.abs() <= MAX_EXACT_INTEGER && b.abs() <= MAX_EXACT_INTEGER {
                return a == b;
            }
        }
    }
    existing == pasted.trim()
}
