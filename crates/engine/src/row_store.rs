//! Ordered row storage with ghost-row handling.
//!
//! INVARIANT: a store built for a create-capable table holds exactly one
//! [`TableRow::Ghost`], always last. Edit tables hold none.

use gridpaste_core::{column_index, Cells, ColumnDef, DataRow, RowId, TableMode, TableRow};

/// Where [`RowStore::add_row`] inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPosition {
    /// Immediately before the ghost row (end of the data rows).
    #[default]
    BeforeGhost,
    Start,
    /// Index among data rows; clamped so the ghost stays last.
    Index(usize),
}

#[derive(Debug, Clone)]
pub struct RowStore {
    columns: Vec<ColumnDef>,
    rows: Vec<TableRow>,
    with_ghost: bool,
    next_id: u64,
}

impl RowStore {
    pub fn new(columns: Vec<ColumnDef>, mode: TableMode) -> Self {
        let with_ghost = mode.has_ghost_row();
        let rows = if with_ghost { vec![TableRow::Ghost] } else { Vec::new() };
        Self {
            columns,
            rows,
            with_ghost,
            next_id: 0,
        }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn has_ghost_row(&self) -> bool {
        self.with_ghost
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &DataRow> {
        self.rows.iter().filter_map(TableRow::as_data)
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_ghost()).count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self, row_id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.has_id(row_id))
    }

    pub fn ghost_position(&self) -> Option<usize> {
        self.rows.iter().position(TableRow::is_ghost)
    }

    pub fn get(&self, row_id: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.has_id(row_id))
    }

    pub fn data_row(&self, row_id: &str) -> Option<&DataRow> {
        self.get(row_id).and_then(TableRow::as_data)
    }

    fn data_row_mut(&mut self, row_id: &str) -> Option<&mut DataRow> {
        self.rows
            .iter_mut()
            .filter_map(TableRow::as_data_mut)
            .find(|r| r.id.as_str() == row_id)
    }

    /// Next unused identity. Monotonic; never reuses an id, even after removal.
    pub fn generate_row_id(&mut self) -> RowId {
        loop {
            self.next_id += 1;
            let candidate = RowId::new(format!("row-{}", self.next_id));
            if self.position(candidate.as_str()).is_none() {
                return candidate;
            }
        }
    }

    /// Every column present, all empty.
    pub fn blank_cells(&self) -> Cells {
        self.columns
            .iter()
            .map(|c| (c.id.clone(), String::new()))
            .collect()
    }

    /// Build a data row with a fresh id. Columns missing from `cells` are
    /// filled with `""`; unknown keys are dropped. The row is not inserted.
    pub fn new_row(&mut self, cells: Cells) -> DataRow {
        let mut full = self.blank_cells();
        for (key, value) in cells {
            if let Some(slot) = full.get_mut(&key) {
                *slot = value;
            }
        }
        let id = self.generate_row_id();
        DataRow::new(id, full)
    }

    /// Replace one cell of a data row. Returns true if the stored value changed.
    ///
    /// The ghost row, unknown rows and unknown columns are never written.
    pub fn update_cell(&mut self, row_id: &str, column_id: &str, value: &str) -> bool {
        if column_index(&self.columns, column_id).is_none() {
            log::debug!("update_cell: unknown column '{}'", column_id);
            return false;
        }
        let Some(row) = self.data_row_mut(row_id) else {
            return false;
        };
        match row.cells.get_mut(column_id) {
            Some(current) if current == value => false,
            Some(current) => {
                *current = value.to_string();
                true
            }
            None => {
                if value.is_empty() {
                    return false;
                }
                row.cells.insert(column_id.to_string(), value.to_string());
                true
            }
        }
    }

    /// Turn the ghost row into a data row holding `value`, then append a
    /// fresh ghost. Returns the new row's id.
    ///
    /// Returns `None` (and changes nothing) unless `row_id` is the ghost and
    /// `value` has non-whitespace content.
    pub fn convert_ghost_row(&mut self, row_id: &str, column_id: &str, value: &str) -> Option<RowId> {
        if !RowId::from(row_id).is_ghost() || value.trim().is_empty() {
            return None;
        }
        if column_index(&self.columns, column_id).is_none() {
            return None;
        }
        let pos = self.ghost_position()?;

        let mut cells = self.blank_cells();
        cells.insert(column_id.to_string(), value.to_string());
        let id = self.generate_row_id();
        self.rows[pos] = TableRow::data(id.clone(), cells);
        self.rows.insert(pos + 1, TableRow::Ghost);
        log::debug!("ghost row converted to '{}' via column '{}'", id, column_id);
        Some(id)
    }

    /// Replace the full row list. Ghosts in `rows` collapse to one trailing
    /// ghost (create tables) or are dropped (edit tables). A data row carrying
    /// the ghost id gets a fresh identity.
    pub fn set_rows(&mut self, rows: Vec<TableRow>) {
        self.rows = rows.into_iter().filter(|r| !r.is_ghost()).collect();
        for i in 0..self.rows.len() {
            let needs_id = matches!(&self.rows[i], TableRow::Data(row) if row.id.is_ghost());
            if needs_id {
                let id = self.generate_row_id();
                if let TableRow::Data(row) = &mut self.rows[i] {
                    log::debug!("data row with ghost id stored as '{}'", id);
                    row.id = id;
                }
            }
        }
        if self.with_ghost {
            self.rows.push(TableRow::Ghost);
        }
    }

    /// `set_rows` with an updater that receives the current rows.
    pub fn set_rows_with<F>(&mut self, update: F)
    where
        F: FnOnce(Vec<TableRow>) -> Vec<TableRow>,
    {
        let current = std::mem::take(&mut self.rows);
        self.set_rows(update(current));
    }

    /// Drop every row, leaving only a fresh ghost (or nothing, for edit tables).
    pub fn reset_rows(&mut self) {
        self.set_rows(Vec::new());
    }

    /// Insert a data row. An id already in use is replaced with a fresh one.
    /// Returns the id the row was stored under.
    pub fn add_row(&mut self, mut row: DataRow, position: RowPosition) -> RowId {
        if row.id.is_ghost() || self.position(row.id.as_str()).is_some() {
            row.id = self.generate_row_id();
        }
        let data_count = self.data_row_count();
        let index = match position {
            RowPosition::BeforeGhost => data_count,
            RowPosition::Start => 0,
            RowPosition::Index(i) => i.min(data_count),
        };
        let id = row.id.clone();
        self.rows.insert(index, TableRow::Data(row));
        id
    }

    /// Remove a data row. The ghost cannot be removed.
    pub fn remove_row(&mut self, row_id: &str) -> Option<DataRow> {
        let pos = self
            .rows
            .iter()
            .position(|r| r.as_data().is_some_and(|d| d.id.as_str() == row_id))?;
        match self.rows.remove(pos) {
            TableRow::Data(row) => Some(row),
            TableRow::Ghost => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpaste_core::GHOST_ROW_ID;

    fn columns() -> Vec<ColumnDef> {
        vec![ColumnDef::integer("id"), ColumnDef::text("name")]
    }

    fn ghost_count(store: &RowStore) -> usize {
        store.rows().iter().filter(|r| r.is_ghost()).count()
    }

    #[test]
    fn new_create_store_has_single_ghost() {
        let store = RowStore::new(columns(), TableMode::Create);
        assert_eq!(store.len(), 1);
        assert!(store.rows()[0].is_ghost());
        assert_eq!(store.data_row_count(), 0);
    }

    #[test]
    fn new_edit_store_is_empty() {
        let store = RowStore::new(columns(), TableMode::Edit);
        assert!(store.is_empty());
        assert!(!store.has_ghost_row());
    }

    #[test]
    fn convert_ghost_row_appends_new_ghost() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        let id = store.convert_ghost_row(GHOST_ROW_ID, "name", "Ann").unwrap();
        assert!(!id.is_ghost());
        assert_eq!(store.len(), 2);
        assert_eq!(store.data_row(id.as_str()).unwrap().cell("name"), "Ann");
        assert_eq!(store.data_row(id.as_str()).unwrap().cell("id"), "");
        assert!(store.rows()[1].is_ghost());
        assert_eq!(ghost_count(&store), 1);
    }

    #[test]
    fn convert_ghost_row_rejects_blank_and_non_ghost() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        assert!(store.convert_ghost_row(GHOST_ROW_ID, "name", "").is_none());
        assert!(store.convert_ghost_row(GHOST_ROW_ID, "name", "   ").is_none());
        assert_eq!(store.len(), 1);

        let id = store.convert_ghost_row(GHOST_ROW_ID, "name", "Ann").unwrap();
        assert!(store.convert_ghost_row(id.as_str(), "name", "Bob").is_none());
        assert!(store.convert_ghost_row(GHOST_ROW_ID, "missing", "Bob").is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_cell_touches_one_cell() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        let id = store.convert_ghost_row(GHOST_ROW_ID, "name", "Ann").unwrap();

        assert!(store.update_cell(id.as_str(), "id", "7"));
        assert!(!store.update_cell(id.as_str(), "id", "7"), "unchanged value is a no-op");
        assert!(!store.update_cell(id.as_str(), "nope", "x"));
        assert!(!store.update_cell(GHOST_ROW_ID, "name", "x"), "ghost is never written");

        let row = store.data_row(id.as_str()).unwrap();
        assert_eq!(row.cell("id"), "7");
        assert_eq!(row.cell("name"), "Ann");
    }

    #[test]
    fn set_rows_dedupes_ghosts() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        let a = store.new_row(Cells::new());
        let b = store.new_row(Cells::new());
        store.set_rows(vec![
            TableRow::Ghost,
            TableRow::Data(a.clone()),
            TableRow::Ghost,
            TableRow::Data(b.clone()),
        ]);
        assert_eq!(store.len(), 3);
        assert_eq!(ghost_count(&store), 1);
        assert!(store.rows()[2].is_ghost());
        assert_eq!(store.position(a.id.as_str()), Some(0));
    }

    #[test]
    fn set_rows_renames_data_row_with_ghost_id() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        let mut cells = store.blank_cells();
        cells.insert("name".to_string(), "Ann".to_string());
        store.set_rows(vec![TableRow::data(RowId::ghost(), cells)]);

        assert_eq!(store.len(), 2);
        let ghost_ids = store
            .rows()
            .iter()
            .filter(|r| r.id_str() == GHOST_ROW_ID)
            .count();
        assert_eq!(ghost_ids, 1);
        assert_eq!(store.position(GHOST_ROW_ID), Some(1));
        let row = store.rows()[0].as_data().unwrap();
        assert!(!row.id.is_ghost());
        assert_eq!(row.cell("name"), "Ann");
    }

    #[test]
    fn set_rows_appends_missing_ghost_and_edit_drops_it() {
        let mut create = RowStore::new(columns(), TableMode::Create);
        let row = create.new_row(Cells::new());
        create.set_rows(vec![TableRow::Data(row.clone())]);
        assert_eq!(create.len(), 2);

        let mut edit = RowStore::new(columns(), TableMode::Edit);
        edit.set_rows(vec![TableRow::Data(row), TableRow::Ghost]);
        assert_eq!(edit.len(), 1);
        assert_eq!(ghost_count(&edit), 0);
    }

    #[test]
    fn set_rows_with_updater() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        let row = store.new_row(Cells::new());
        store.set_rows_with(|mut rows| {
            rows.insert(0, TableRow::Data(row));
            rows
        });
        assert_eq!(store.len(), 2);
        assert!(store.rows()[1].is_ghost());
    }

    #[test]
    fn reset_rows_leaves_blank_ghost() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        store.convert_ghost_row(GHOST_ROW_ID, "name", "Ann");
        store.convert_ghost_row(GHOST_ROW_ID, "name", "Bob");
        store.reset_rows();
        assert_eq!(store.rows(), &[TableRow::Ghost]);
    }

    #[test]
    fn add_row_positions() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        let a = store.new_row(Cells::new());
        let a_id = store.add_row(a, RowPosition::default());
        let b = store.new_row(Cells::new());
        let b_id = store.add_row(b, RowPosition::Start);
        let c = store.new_row(Cells::new());
        let c_id = store.add_row(c, RowPosition::Index(99));

        let order: Vec<&str> = store.rows().iter().map(|r| r.id_str()).collect();
        assert_eq!(order, vec![b_id.as_str(), a_id.as_str(), c_id.as_str(), GHOST_ROW_ID]);
    }

    #[test]
    fn add_row_reassigns_duplicate_id() {
        let mut store = RowStore::new(columns(), TableMode::Edit);
        let row = store.new_row(Cells::new());
        let first = store.add_row(row.clone(), RowPosition::default());
        let second = store.add_row(row, RowPosition::default());
        assert_ne!(first, second);
    }

    #[test]
    fn remove_row_keeps_ghost() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        let id = store.convert_ghost_row(GHOST_ROW_ID, "name", "Ann").unwrap();
        assert!(store.remove_row(GHOST_ROW_ID).is_none());
        assert_eq!(store.remove_row(id.as_str()).unwrap().cell("name"), "Ann");
        assert_eq!(store.rows(), &[TableRow::Ghost]);
    }

    #[test]
    fn generated_ids_are_never_reused() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        let first = store.convert_ghost_row(GHOST_ROW_ID, "name", "Ann").unwrap();
        store.remove_row(first.as_str());
        let second = store.convert_ghost_row(GHOST_ROW_ID, "name", "Bob").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn new_row_fills_all_columns() {
        let mut store = RowStore::new(columns(), TableMode::Create);
        let mut cells = Cells::new();
        cells.insert("name".into(), "Ann".into());
        cells.insert("bogus".into(), "x".into());
        let row = store.new_row(cells);
        assert_eq!(row.cells.len(), 2);
        assert_eq!(row.cell("name"), "Ann");
        assert_eq!(row.cell("id"), "");
    }
}
