//! `gridpaste-engine`: paste-driven table reconciliation.
//!
//! Pure engine crate: receives column definitions, source rows and raw
//! clipboard text; returns row mutations, dirty sets and validation state.
//! No UI or IO dependencies.

pub mod clipboard;
pub mod dirty;
pub mod error;
pub mod paste;
pub mod projection;
pub mod row_store;
pub mod session;
pub mod validation;

pub use clipboard::{parse_clipboard, Grid, ParseOptions};
pub use dirty::{Baseline, DirtyTracker};
pub use error::{EngineError, SessionError};
pub use paste::{PasteCoordinator, PasteEvent, PasteOutcome};
pub use row_store::{RowPosition, RowStore};
pub use session::{EditSession, SessionBuilder};
pub use validation::{RowValidator, SchemaValidator};
