use serde::{Deserialize, Serialize};

use crate::rule::ColumnRule;

/// How the text of a cell is interpreted at validation/export time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Free text (default).
    #[default]
    Text,
    /// Integer or decimal number.
    Number,
    /// Integer only.
    Integer,
    /// `true`/`false` (also accepts `yes`/`no`, `1`/`0`).
    Boolean,
}

impl ValueKind {
    /// Returns true if values of this kind compare numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Number | ValueKind::Integer)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Text => write!(f, "text"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// One field every row of a table carries.
///
/// Column definitions are fixed for the lifetime of a table instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Stable, unique identifier. Also the field name in domain rows.
    pub id: String,
    /// Display label. Falls back to `id` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: ValueKind,
    /// Blank values are reported as errors when set.
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<ColumnRule>,
}

impl ColumnDef {
    pub fn new(id: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            id: id.into(),
            label: None,
            kind,
            required: false,
            rule: None,
        }
    }

    pub fn text(id: impl Into<String>) -> Self {
        Self::new(id, ValueKind::Text)
    }

    pub fn number(id: impl Into<String>) -> Self {
        Self::new(id, ValueKind::Number)
    }

    pub fn integer(id: impl Into<String>) -> Self {
        Self::new(id, ValueKind::Integer)
    }

    pub fn boolean(id: impl Into<String>) -> Self {
        Self::new(id, ValueKind::Boolean)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_rule(mut self, rule: ColumnRule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Effective display label.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Position of a column id in the table's column order.
pub fn column_index(columns: &[ColumnDef], id: &str) -> Option<usize> {
    columns.iter().position(|c| c.id == id)
}
