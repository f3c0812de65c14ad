use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    /// TOML / JSON parse or deserialization error.
    Parse(String),
    /// Structurally valid document that describes an unusable table.
    Validation(String),
    /// A column id declared more than once.
    DuplicateColumn(String),
    /// `id_column` does not name a declared column.
    UnknownIdColumn(String),
    /// A column rule that cannot be used as written.
    InvalidRule { column: String, message: String },
    /// Extension other than `.toml` / `.json`.
    UnsupportedFormat(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "table parse error: {msg}"),
            Self::Validation(msg) => write!(f, "table validation error: {msg}"),
            Self::DuplicateColumn(id) => write!(f, "duplicate column id: {id}"),
            Self::UnknownIdColumn(id) => write!(f, "id_column '{id}' is not a declared column"),
            Self::InvalidRule { column, message } => {
                write!(f, "column '{column}': invalid rule: {message}")
            }
            Self::UnsupportedFormat(ext) => {
                write!(f, "unsupported table definition format: '{ext}' (expected .toml or .json)")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
