//! Row identity and row contents.
//!
//! A table is an ordered list of [`TableRow`]s. Create-capable tables carry
//! exactly one trailing [`TableRow::Ghost`], the always-blank "next row to be
//! typed". Externally it looks like a row with the reserved id
//! [`GHOST_ROW_ID`] and no cells.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Reserved identity of the ghost row.
pub const GHOST_ROW_ID: &str = "__ghost__";

/// Column id -> raw cell text. Missing entries read as the empty string.
pub type Cells = BTreeMap<String, String>;

/// Synthetic row identity, unique within one table instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn ghost() -> Self {
        Self(GHOST_ROW_ID.to_string())
    }

    pub fn is_ghost(&self) -> bool {
        self.0 == GHOST_ROW_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A materialized (non-ghost) row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    pub id: RowId,
    pub cells: Cells,
}

impl DataRow {
    pub fn new(id: RowId, cells: Cells) -> Self {
        Self { id, cells }
    }

    /// Cell text, or `""` if the cell was never written.
    pub fn cell(&self, column_id: &str) -> &str {
        self.cells.get(column_id).map(String::as_str).unwrap_or("")
    }

    /// True if every cell is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }

    /// True if any cell differs from `other` (string equality, missing == "").
    pub fn differs_from(&self, other: &DataRow) -> bool {
        let keys: BTreeSet<&String> = self.cells.keys().chain(other.cells.keys()).collect();
        keys.into_iter().any(|k| self.cell(k) != other.cell(k))
    }
}

/// A row as held by the row store: the ghost sentinel or a data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    Ghost,
    Data(DataRow),
}

impl TableRow {
    pub fn data(id: RowId, cells: Cells) -> Self {
        TableRow::Data(DataRow::new(id, cells))
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self, TableRow::Ghost)
    }

    /// Row identity as exposed to callers; the ghost reports [`GHOST_ROW_ID`].
    pub fn id_str(&self) -> &str {
        match self {
            TableRow::Ghost => GHOST_ROW_ID,
            TableRow::Data(row) => row.id.as_str(),
        }
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.id_str() == id
    }

    pub fn as_data(&self) -> Option<&DataRow> {
        match self {
            TableRow::Ghost => None,
            TableRow::Data(row) => Some(row),
        }
    }

    pub fn as_data_mut(&mut self) -> Option<&mut DataRow> {
        match self {
            TableRow::Ghost => None,
            TableRow::Data(row) => Some(row),
        }
    }

    /// Cell text; always `""` for the ghost row.
    pub fn cell(&self, column_id: &str) -> &str {
        match self {
            TableRow::Ghost => "",
            TableRow::Data(row) => row.cell(column_id),
        }
    }
}

impl From<DataRow> for TableRow {
    fn from(row: DataRow) -> Self {
        TableRow::Data(row)
    }
}

impl Serialize for TableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let empty = Cells::new();
        let cells = match self {
            TableRow::Ghost => &empty,
            TableRow::Data(row) => &row.cells,
        };
        let mut state = serializer.serialize_struct("TableRow", 2)?;
        state.serialize_field("id", self.id_str())?;
        state.serialize_field("cells", cells)?;
        state.end()
    }
}
