//! Table definition files.
//!
//! ```toml
//! name = "Vocabulary"
//! mode = "edit"
//! id_column = "id"
//!
//! [[columns]]
//! id = "id"
//! kind = "integer"
//! required = true
//! ```

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use gridpaste_core::{ColumnDef, ColumnRule, TableMode};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mode: TableMode,
    pub id_column: String,
    /// Strip a pasted first row that repeats the column labels.
    #[serde(default = "default_skip_header")]
    pub skip_header: bool,
    pub columns: Vec<ColumnDef>,
}

fn default_skip_header() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl TableConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: TableConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: TableConfig =
            serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a `.toml` or `.json` table definition.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Self::from_toml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::Validation("at least one column is required".into()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.id.trim().is_empty() {
                return Err(ConfigError::Validation("column id must not be empty".into()));
            }
            if !seen.insert(column.id.as_str()) {
                return Err(ConfigError::DuplicateColumn(column.id.clone()));
            }
        }

        if !seen.contains(self.id_column.as_str()) {
            return Err(ConfigError::UnknownIdColumn(self.id_column.clone()));
        }

        for column in &self.columns {
            if let Some(rule) = &column.rule {
                validate_rule(&column.id, rule)?;
            }
        }

        Ok(())
    }

    /// Display name, falling back to the id column.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id_column)
    }
}

fn validate_rule(column: &str, rule: &ColumnRule) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::InvalidRule {
        column: column.to_string(),
        message,
    };

    if let Some(constraint) = rule.constraint() {
        if constraint.operator.needs_second_value() && constraint.value2.is_none() {
            return Err(invalid(format!("{:?} needs value2", constraint.operator)));
        }
        if let Some(max) = constraint.value2 {
            if max < constraint.value1 {
                return Err(invalid(format!("value2 ({max}) is below value1 ({})", constraint.value1)));
            }
        }
    }

    match rule {
        ColumnRule::List { values } if values.is_empty() => Err(invalid("list has no values".into())),
        ColumnRule::Pattern { regex } => Regex::new(regex).map(|_| ()).map_err(|e| invalid(e.to_string())),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
