//! CLI Exit Code Registry
//!
//! Single source of truth for `gpaste` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad args, unknown format or anchor) |
//! | 3    | File could not be read or written                |
//! | 4    | Table definition rejected                        |
//! | 5    | Dataset or clipboard content malformed           |
//! | 6    | One or more rows failed validation               |
//! | 7    | Persisting the dirty rows failed                 |

use gridpaste_config::ConfigError;
use gridpaste_io::IoError;

/// Success.
pub const EXIT_SUCCESS: u8 = 0;
/// General error.
pub const EXIT_ERROR: u8 = 1;
/// Bad arguments.
pub const EXIT_USAGE: u8 = 2;
/// File read/write failure.
pub const EXIT_IO: u8 = 3;
/// Invalid table definition.
pub const EXIT_CONFIG: u8 = 4;
/// Malformed dataset.
pub const EXIT_PARSE: u8 = 5;
/// Validation failed; nothing was persisted.
pub const EXIT_VALIDATION: u8 = 6;
/// Persistence callback failed.
pub const EXIT_PERSIST: u8 = 7;

pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Io(_) => EXIT_IO,
        ConfigError::UnsupportedFormat(_) => EXIT_USAGE,
        _ => EXIT_CONFIG,
    }
}

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Io(_) => EXIT_IO,
        IoError::UnsupportedFormat(_) => EXIT_USAGE,
        IoError::Csv(_) | IoError::Json(_) | IoError::NotAnArray | IoError::NotArrayOfObjects { .. } => {
            EXIT_PARSE
        }
    }
}
