// Table definition loading

pub mod error;
pub mod table;

pub use error::ConfigError;
pub use table::TableConfig;
