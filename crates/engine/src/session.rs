//! Edit session: rows, baseline, dirty set and validation bound together.
//!
//! Every mutation goes through the session, which recomputes the dirty set
//! and validation state before returning. The only async step is
//! [`EditSession::apply_changes`], which hands the dirty rows to the caller's
//! persistence callback.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde::Serialize;

use gridpaste_core::{
    column_index, ActiveCell, Cells, ColumnDef, DataRow, RowId, TableMode, TableRow, ValidationState,
};

use crate::clipboard::ParseOptions;
use crate::dirty::{Baseline, DirtyTracker};
use crate::error::{EngineError, SessionError};
use crate::paste::{PasteCoordinator, PasteEvent, PasteOutcome};
use crate::projection::{domain_rows_to_cells, row_to_domain};
use crate::row_store::{RowPosition, RowStore};
use crate::validation::{self, RowValidator, SchemaValidator};

/// Default persistence error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by a persistence callback.
pub type PersistFuture<E> = Pin<Box<dyn Future<Output = Result<(), E>>>>;

type PersistFn<D, E> = Box<dyn FnMut(Vec<D>) -> PersistFuture<E>>;
type RowUpdatedHook = Box<dyn FnMut(&RowId, &str)>;

fn boxed_persist<D, E, F, Fut>(mut persist: F) -> PersistFn<D, E>
where
    F: FnMut(Vec<D>) -> Fut + 'static,
    Fut: Future<Output = Result<(), E>> + 'static,
{
    Box::new(move |rows| Box::pin(persist(rows)) as PersistFuture<E>)
}

// ============================================================================
// Builder
// ============================================================================

pub struct SessionBuilder<D, E = BoxError> {
    columns: Vec<ColumnDef>,
    id_column: String,
    mode: TableMode,
    options: ParseOptions,
    validator: Option<Box<dyn RowValidator>>,
    persist: Option<PersistFn<D, E>>,
    on_row_updated: Option<RowUpdatedHook>,
}

impl<D> SessionBuilder<D, BoxError> {
    pub fn new(columns: Vec<ColumnDef>, id_column: impl Into<String>) -> Self {
        Self {
            columns,
            id_column: id_column.into(),
            mode: TableMode::default(),
            options: ParseOptions::default(),
            validator: None,
            persist: None,
            on_row_updated: None,
        }
    }
}

impl<D, E> SessionBuilder<D, E> {
    pub fn mode(mut self, mode: TableMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn parse_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the schema validator derived from the columns.
    pub fn validator<V>(mut self, validator: V) -> Self
    where
        V: RowValidator + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn on_row_updated<H>(mut self, hook: H) -> Self
    where
        H: FnMut(&RowId, &str) + 'static,
    {
        self.on_row_updated = Some(Box::new(hook));
        self
    }

    /// Async callback receiving the dirty rows on `apply_changes`. Its error
    /// type becomes the session's.
    pub fn persist<E2, F, Fut>(self, persist: F) -> SessionBuilder<D, E2>
    where
        F: FnMut(Vec<D>) -> Fut + 'static,
        Fut: Future<Output = Result<(), E2>> + 'static,
    {
        let persist = boxed_persist(persist);
        SessionBuilder {
            columns: self.columns,
            id_column: self.id_column,
            mode: self.mode,
            options: self.options,
            validator: self.validator,
            persist: Some(persist),
            on_row_updated: self.on_row_updated,
        }
    }
}

impl<D, E> SessionBuilder<D, E>
where
    D: Serialize + DeserializeOwned,
{
    /// Build the session from the source dataset. The source becomes the
    /// clean baseline.
    pub fn build(self, source: &[D]) -> Result<EditSession<D, E>, EngineError> {
        if column_index(&self.columns, &self.id_column).is_none() {
            return Err(EngineError::UnknownColumn(self.id_column));
        }
        let validator: Box<dyn RowValidator> = match self.validator {
            Some(v) => v,
            None => Box::new(SchemaValidator::new(&self.columns)?),
        };

        let mut session = EditSession {
            store: RowStore::new(self.columns.clone(), self.mode),
            paste: PasteCoordinator::new(self.mode, self.id_column.clone()).with_options(self.options),
            columns: self.columns,
            id_column: self.id_column,
            mode: self.mode,
            baseline: Baseline::default(),
            dirty: DirtyTracker::new(),
            validation: ValidationState::default(),
            validator,
            persist: self.persist,
            on_row_updated: self.on_row_updated,
        };
        session.import_data(source)?;
        Ok(session)
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct EditSession<D, E = BoxError> {
    columns: Vec<ColumnDef>,
    id_column: String,
    mode: TableMode,
    store: RowStore,
    baseline: Baseline,
    dirty: DirtyTracker,
    validation: ValidationState,
    validator: Box<dyn RowValidator>,
    paste: PasteCoordinator,
    persist: Option<PersistFn<D, E>>,
    on_row_updated: Option<RowUpdatedHook>,
}

impl<D> EditSession<D, BoxError> {
    pub fn builder(columns: Vec<ColumnDef>, id_column: impl Into<String>) -> SessionBuilder<D, BoxError> {
        SessionBuilder::new(columns, id_column)
    }
}

impl<D, E> EditSession<D, E>
where
    D: Serialize + DeserializeOwned,
{
    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn mode(&self) -> TableMode {
        self.mode
    }

    pub fn rows(&self) -> &[TableRow] {
        self.store.rows()
    }

    pub fn data_row(&self, row_id: &str) -> Option<&DataRow> {
        self.store.data_row(row_id)
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn dirty_row_ids(&self) -> &BTreeSet<RowId> {
        self.dirty.dirty_row_ids()
    }

    pub fn is_row_dirty(&self, row_id: &str) -> bool {
        self.dirty.is_dirty(row_id)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn validation_state(&self) -> &ValidationState {
        &self.validation
    }

    pub fn is_save_enabled(&self) -> bool {
        validation::is_save_enabled(&self.validation, self.store.rows())
    }

    // ------------------------------------------------------------------------
    // Row mutations
    // ------------------------------------------------------------------------

    /// Write one cell. Writing a non-blank value into the ghost row converts
    /// it. Returns the id of the row written, or `None` if nothing was.
    pub fn update_cell(&mut self, row_id: &str, column_id: &str, value: &str) -> Option<RowId> {
        let written = if RowId::from(row_id).is_ghost() {
            self.convert_ghost_row_inner(row_id, column_id, value)
        } else {
            self.store.update_cell(row_id, column_id, value);
            self.store
                .data_row(row_id)
                .filter(|_| column_index(&self.columns, column_id).is_some())
                .map(|r| r.id.clone())
        };
        self.refresh();
        written
    }

    pub fn convert_ghost_row(&mut self, row_id: &str, column_id: &str, value: &str) -> Option<RowId> {
        let converted = self.convert_ghost_row_inner(row_id, column_id, value);
        self.refresh();
        converted
    }

    fn convert_ghost_row_inner(&mut self, row_id: &str, column_id: &str, value: &str) -> Option<RowId> {
        let id = self.store.convert_ghost_row(row_id, column_id, value)?;
        self.dirty.mark_row_dirty(&id);
        Some(id)
    }

    /// Insert a new row built from `cells`. New rows are marked dirty.
    pub fn add_row(&mut self, cells: Cells, position: RowPosition) -> RowId {
        let row = self.store.new_row(cells);
        let id = self.store.add_row(row, position);
        self.dirty.mark_row_dirty(&id);
        self.refresh();
        id
    }

    pub fn remove_row(&mut self, row_id: &str) -> Option<DataRow> {
        let removed = self.store.remove_row(row_id);
        self.refresh();
        removed
    }

    pub fn set_rows(&mut self, rows: Vec<TableRow>) {
        self.store.set_rows(rows);
        self.refresh();
    }

    pub fn set_rows_with<F>(&mut self, update: F)
    where
        F: FnOnce(Vec<TableRow>) -> Vec<TableRow>,
    {
        self.store.set_rows_with(update);
        self.refresh();
    }

    pub fn reset_rows(&mut self) {
        self.store.reset_rows();
        self.refresh();
    }

    // ------------------------------------------------------------------------
    // Dirty marks
    // ------------------------------------------------------------------------

    pub fn mark_row_dirty(&mut self, row_id: &RowId) {
        if self.store.data_row(row_id.as_str()).is_some() {
            self.dirty.mark_row_dirty(row_id);
        }
    }

    /// Removal takes effect until the next mutation re-compares rows.
    pub fn clear_dirty_rows(&mut self, row_ids: &[RowId]) {
        self.dirty.clear_dirty_rows(row_ids);
    }

    pub fn clear_all_dirty(&mut self) {
        self.dirty.clear_all_dirty();
    }

    // ------------------------------------------------------------------------
    // Paste
    // ------------------------------------------------------------------------

    pub fn set_active_cell_info(&mut self, cell: ActiveCell) {
        self.paste.set_active_cell_info(cell);
    }

    pub fn clear_active_cell_info(&mut self) {
        self.paste.clear_active_cell_info();
    }

    pub fn active_cell(&self) -> Option<&ActiveCell> {
        self.paste.active_cell()
    }

    pub fn handle_paste(&mut self, event: &mut PasteEvent) -> PasteOutcome {
        let hook = &mut self.on_row_updated;
        let outcome = self.paste.handle_paste(event, &mut self.store, |row_id, key| {
            if let Some(hook) = hook.as_mut() {
                hook(row_id, key);
            }
        });
        for id in outcome.created_rows() {
            self.dirty.mark_row_dirty(id);
        }
        self.refresh();
        outcome
    }

    pub fn paste_text(&mut self, text: &str) -> PasteOutcome {
        let mut event = PasteEvent::new(text);
        self.handle_paste(&mut event)
    }

    // ------------------------------------------------------------------------
    // Baseline lifecycle
    // ------------------------------------------------------------------------

    /// Restore the rows of the clean baseline and drop all dirty state.
    pub fn discard_changes(&mut self) {
        let rows = self.baseline.rows().iter().cloned().map(TableRow::Data).collect();
        self.store.set_rows(rows);
        self.dirty.clear_all_dirty();
        self.refresh();
        log::info!("discarded changes; {} row(s) restored", self.baseline.len());
    }

    /// Replace rows and baseline with a new dataset.
    pub fn import_data(&mut self, source: &[D]) -> Result<(), EngineError> {
        let cells = domain_rows_to_cells(source, &self.columns)?;
        let rows: Vec<TableRow> = cells
            .into_iter()
            .map(|c| TableRow::Data(self.store.new_row(c)))
            .collect();
        self.store.set_rows(rows);
        self.baseline = Baseline::from_table(self.store.rows(), &self.id_column);
        self.dirty.clear_all_dirty();
        self.refresh();
        log::info!("imported {} row(s)", self.baseline.len());
        Ok(())
    }

    /// Adopt the current data rows as the clean baseline.
    pub fn commit_baseline(&mut self) {
        self.baseline = Baseline::from_table(self.store.rows(), &self.id_column);
        self.dirty.clear_all_dirty();
        self.refresh();
        log::debug!("baseline committed ({} row(s))", self.baseline.len());
    }

    /// Refresh from a changed source without losing local edits.
    ///
    /// Rows matched by id-column key are refreshed unless dirty. Source rows
    /// with no local counterpart are added. Local rows missing from the new
    /// source are kept only when dirty. The new source becomes the baseline.
    pub fn sync_source(&mut self, source: &[D]) -> Result<(), EngineError> {
        let source_cells = domain_rows_to_cells(source, &self.columns)?;
        let current: Vec<DataRow> = self.store.data_rows().cloned().collect();

        let mut by_key: HashMap<String, usize> = HashMap::new();
        for (i, row) in current.iter().enumerate() {
            let key = row.cell(&self.id_column).trim();
            if !key.is_empty() {
                by_key.entry(key.to_string()).or_insert(i);
            }
        }

        let mut used = vec![false; current.len()];
        let mut next_rows = Vec::with_capacity(source_cells.len());
        let mut clean_rows = Vec::with_capacity(source_cells.len());
        let mut kept_dirty = 0;

        for cells in source_cells {
            let key = cells.get(&self.id_column).map(|k| k.trim()).unwrap_or("");
            let matched = by_key.get(key).copied().filter(|&i| !used[i]);
            let row = match matched {
                Some(i) => {
                    used[i] = true;
                    let existing = &current[i];
                    if self.dirty.is_dirty(existing.id.as_str()) {
                        kept_dirty += 1;
                        existing.clone()
                    } else {
                        DataRow::new(existing.id.clone(), cells.clone())
                    }
                }
                None => self.store.new_row(cells.clone()),
            };
            clean_rows.push(DataRow::new(row.id.clone(), cells));
            next_rows.push(row);
        }

        let mut orphaned = Vec::new();
        for (i, row) in current.into_iter().enumerate() {
            if !used[i] && self.dirty.is_dirty(row.id.as_str()) {
                orphaned.push(row.id.clone());
                next_rows.push(row);
            }
        }

        self.store.set_rows(next_rows.into_iter().map(TableRow::Data).collect());
        self.baseline = Baseline::new(clean_rows, &self.id_column);
        for id in &orphaned {
            self.dirty.mark_row_dirty(id);
        }
        self.refresh();
        log::debug!(
            "source synced: {} row(s), {} dirty kept, {} local-only kept",
            self.baseline.len(),
            kept_dirty,
            orphaned.len()
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Dirty rows in table order, projected into the domain type.
    pub fn dirty_domain_rows(&self) -> Result<Vec<D>, EngineError> {
        Ok(self.project_dirty()?.1)
    }

    fn project_dirty(&self) -> Result<(Vec<RowId>, Vec<D>), EngineError> {
        let mut ids = Vec::new();
        let mut rows = Vec::new();
        for row in self.store.data_rows().filter(|r| self.dirty.is_dirty(r.id.as_str())) {
            rows.push(row_to_domain(row, &self.columns)?);
            ids.push(row.id.clone());
        }
        Ok((ids, rows))
    }

    /// Validate, then hand every dirty row to the persistence callback.
    ///
    /// Returns the ids of the rows persisted. On any error rows and dirty
    /// state are left as they were. On success the baseline is not moved;
    /// call [`Self::commit_baseline`] (or `import_data`) once the store has
    /// accepted the rows.
    pub async fn apply_changes(&mut self) -> Result<Vec<RowId>, SessionError<E>> {
        self.refresh();
        if !self.validation.is_valid {
            log::debug!("apply blocked: {} invalid row(s)", self.validation.errors.len());
            return Err(SessionError::ValidationFailed(self.validation.clone()));
        }
        if self.persist.is_none() {
            return Err(SessionError::MissingPersistence);
        }

        let (ids, rows) = self.project_dirty()?;
        let Some(persist) = self.persist.as_mut() else {
            return Err(SessionError::MissingPersistence);
        };
        log::info!("applying {} dirty row(s)", ids.len());
        match persist(rows).await {
            Ok(()) => Ok(ids),
            Err(e) => {
                log::warn!("persistence failed for {} row(s)", ids.len());
                Err(SessionError::Persistence(e))
            }
        }
    }

    fn refresh(&mut self) {
        self.dirty.recompute(self.store.rows(), &self.baseline);
        self.validation = validation::validate_all(self.store.rows(), self.validator.as_ref());
    }
}
