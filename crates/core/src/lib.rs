//! `gridpaste-core`: table model shared by the engine, config and CLI crates.
//!
//! Cell values are always stored as text. Typed interpretation happens only
//! when a row is validated or projected into a domain type.

pub mod column;
pub mod row;
pub mod rule;
pub mod state;

pub use column::{column_index, ColumnDef, ValueKind};
pub use row::{Cells, DataRow, RowId, TableRow, GHOST_ROW_ID};
pub use rule::{ColumnRule, ComparisonOperator, NumericConstraint};
pub use state::{ActiveCell, FieldErrors, TableMode, ValidationState};
