// Dataset file I/O

pub mod csv;
pub mod dataset;
pub mod error;
pub mod json;

pub use dataset::{load_dataset, DatasetFormat, Record};
pub use error::IoError;
