use std::fmt;

#[derive(Debug)]
pub enum IoError {
    /// File read/write failure.
    Io(String),
    /// Malformed CSV/TSV.
    Csv(String),
    /// Malformed JSON.
    Json(String),
    /// JSON root is not an array.
    NotAnArray,
    /// JSON array element that is not an object.
    NotArrayOfObjects { index: usize },
    /// Extension with no known reader.
    UnsupportedFormat(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
            Self::NotAnArray => write!(f, "JSON root must be an array of objects"),
            Self::NotArrayOfObjects { index } => {
                write!(f, "JSON element {index} is not an object")
            }
            Self::UnsupportedFormat(ext) => {
                write!(f, "unsupported dataset format: '{ext}' (expected .csv, .tsv, .txt or .json)")
            }
        }
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io(e.to_string())
    }
}
