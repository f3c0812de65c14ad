//! Dirty tracking against a clean baseline.
//!
//! A row is dirty when any cell differs from its baseline counterpart, or
//! when it was explicitly marked and not yet cleared. Baseline lookup is two
//! passes: synthetic row id first, then the value under the id column (for
//! rows re-keyed after a server round trip). Rows with no baseline match are
//! never dirty by comparison.

use std::collections::{BTreeSet, HashMap};

use gridpaste_core::{DataRow, RowId, TableRow};

/// Immutable snapshot of the rows considered saved, indexed both ways.
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    rows: Vec<DataRow>,
    by_row_id: HashMap<RowId, usize>,
    by_key: HashMap<String, usize>,
    id_column: String,
}

impl Baseline {
    pub fn new(rows: Vec<DataRow>, id_column: &str) -> Self {
        let mut by_row_id = HashMap::with_capacity(rows.len());
        let mut by_key = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            by_row_id.entry(row.id.clone()).or_insert(i);
            let key = row.cell(id_column).trim();
            if !key.is_empty() {
                by_key.entry(key.to_string()).or_insert(i);
            }
        }
        Self {
            rows,
            by_row_id,
            by_key,
            id_column: id_column.to_string(),
        }
    }

    /// Baseline from a table snapshot; the ghost row is skipped.
    pub fn from_table(rows: &[TableRow], id_column: &str) -> Self {
        Self::new(rows.iter().filter_map(TableRow::as_data).cloned().collect(), id_column)
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Baseline counterpart of `row`: same row id, else same id-column key.
    pub fn find(&self, row: &DataRow) -> Option<&DataRow> {
        if let Some(&i) = self.by_row_id.get(&row.id) {
            return self.rows.get(i);
        }
        let key = row.cell(&self.id_column).trim();
        if key.is_empty() {
            return None;
        }
        self.by_key.get(key).and_then(|&i| self.rows.get(i))
    }

    /// Ids of matched rows whose cells differ from the baseline.
    pub fn changed_rows(&self, rows: &[TableRow]) -> BTreeSet<RowId> {
        rows.iter()
            .filter_map(TableRow::as_data)
            .filter(|row| self.find(row).is_some_and(|clean| row.differs_from(clean)))
            .map(|row| row.id.clone())
            .collect()
    }
}

/// Stateless comparison: dirty ids of `rows` relative to `clean`.
pub fn compute_dirty(rows: &[TableRow], clean: &[TableRow], id_column: &str) -> BTreeSet<RowId> {
    Baseline::from_table(clean, id_column).changed_rows(rows)
}

/// Comparison result plus explicit marks.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    dirty: BTreeSet<RowId>,
    marked: BTreeSet<RowId>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute from scratch. Marks on rows that no longer exist are dropped.
    pub fn recompute(&mut self, rows: &[TableRow], baseline: &Baseline) {
        self.marked
            .retain(|id| rows.iter().any(|r| r.has_id(id.as_str())));
        let mut dirty = baseline.changed_rows(rows);
        dirty.extend(self.marked.iter().cloned());
        self.dirty = dirty;
    }

    /// Force a row dirty regardless of comparison. The ghost is never dirty.
    pub fn mark_row_dirty(&mut self, row_id: &RowId) {
        if row_id.is_ghost() {
            return;
        }
        self.marked.insert(row_id.clone());
        self.dirty.insert(row_id.clone());
    }

    /// Drop ids from the set and their marks. The next recompute re-adds any
    /// row whose values still differ from the baseline.
    pub fn clear_dirty_rows(&mut self, row_ids: &[RowId]) {
        for id in row_ids {
            self.marked.remove(id);
            self.dirty.remove(id);
        }
    }

    pub fn clear_all_dirty(&mut self) {
        self.marked.clear();
        self.dirty.clear();
    }

    pub fn dirty_row_ids(&self) -> &BTreeSet<RowId> {
        &self.dirty
    }

    pub fn is_dirty(&self, row_id: &str) -> bool {
        self.dirty.contains(row_id)
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirty.len()
    }
}
