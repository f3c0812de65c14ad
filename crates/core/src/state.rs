use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::row::RowId;

/// Whether a table can grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableMode {
    /// Table carries a ghost row; pastes may create rows.
    #[default]
    Create,
    /// Existing rows only; pastes never create rows.
    Edit,
}

impl TableMode {
    pub fn has_ghost_row(&self) -> bool {
        matches!(self, TableMode::Create)
    }
}

impl std::fmt::Display for TableMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableMode::Create => write!(f, "create"),
            TableMode::Edit => write!(f, "edit"),
        }
    }
}

/// Where a single-cell or anchored paste lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCell {
    pub row_id: RowId,
    pub column_id: String,
}

impl ActiveCell {
    pub fn new(row_id: RowId, column_id: impl Into<String>) -> Self {
        Self {
            row_id,
            column_id: column_id.into(),
        }
    }
}

/// Field id -> message for one row.
pub type FieldErrors = BTreeMap<String, String>;

/// Result of validating every non-ghost row.
///
/// INVARIANT: `is_valid == errors.is_empty()`, and the ghost row never
/// appears in `errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationState {
    pub is_valid: bool,
    pub errors: BTreeMap<RowId, FieldErrors>,
}

impl ValidationState {
    pub fn from_errors(errors: BTreeMap<RowId, FieldErrors>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn row_errors(&self, row_id: &str) -> Option<&FieldErrors> {
        self.errors.get(row_id)
    }

    /// Total number of field messages across all rows.
    pub fn error_count(&self) -> usize {
        self.errors.values().map(|fields| fields.len()).sum()
    }
}

impl Default for ValidationState {
    fn default() -> Self {
        Self::from_errors(BTreeMap::new())
    }
}
