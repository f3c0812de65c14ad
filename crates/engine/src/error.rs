use std::fmt;

use gridpaste_core::{RowId, ValidationState};

#[derive(Debug)]
pub enum EngineError {
    /// A column id that is not part of the table definition.
    UnknownColumn(String),
    /// A column rule that cannot be compiled (bad regex, etc.).
    InvalidRule { column: String, message: String },
    /// A domain row did not serialize to a JSON object.
    NotAnObject { index: usize },
    /// Domain row serialization failed.
    Serialize(String),
    /// A cell could not be coerced to its column's value kind.
    Coerce { row_id: RowId, column: String, message: String },
    /// Coerced cells did not deserialize into the domain type.
    Deserialize { row_id: RowId, message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownColumn(column) => write!(f, "unknown column: {column}"),
            Self::InvalidRule { column, message } => {
                write!(f, "column '{column}': invalid rule: {message}")
            }
            Self::NotAnObject { index } => {
                write!(f, "source row {index}: does not serialize to an object")
            }
            Self::Serialize(msg) => write!(f, "serialize error: {msg}"),
            Self::Coerce { row_id, column, message } => {
                write!(f, "row '{row_id}', column '{column}': {message}")
            }
            Self::Deserialize { row_id, message } => {
                write!(f, "row '{row_id}': cannot build domain row: {message}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Errors returned by [`crate::EditSession::apply_changes`].
///
/// `E` is the persistence callback's own error type; it is passed through
/// unchanged.
#[derive(Debug)]
pub enum SessionError<E> {
    /// One or more rows failed validation. Persistence was not invoked.
    ValidationFailed(ValidationState),
    /// `apply_changes` was called on a session built without a persistence callback.
    MissingPersistence,
    /// Dirty rows could not be projected into the domain type.
    Engine(EngineError),
    /// The persistence callback failed.
    Persistence(E),
}

impl<E> From<EngineError> for SessionError<E> {
    fn from(e: EngineError) -> Self {
        SessionError::Engine(e)
    }
}

impl<E: fmt::Display> fmt::Display for SessionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(state) => write!(
                f,
                "validation failed: {} error(s) in {} row(s)",
                state.error_count(),
                state.errors.len()
            ),
            Self::MissingPersistence => write!(f, "persistence callback is required"),
            Self::Engine(e) => write!(f, "{e}"),
            Self::Persistence(e) => write!(f, "persistence failed: {e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for SessionError<E> {}
