//! Column rules
//!
//! Constrains what a column accepts: number ranges, text length, a fixed list
//! of values, or a regular expression. Blank values are never checked against
//! a rule; whether a blank is allowed is decided by `ColumnDef::required`.
//!
//! ## Case Sensitivity
//!
//! - **List matching**: Case-sensitive. "Yes" != "yes".
//! - **Pattern matching**: Whatever the regex says (use `(?i)` for insensitive).

use serde::{Deserialize, Serialize};

// ============================================================================
// Core Types
// ============================================================================

/// A validation rule attached to a column.
///
/// Serialized with an internal `type` tag so table definitions can write
/// `rule = { type = "list", values = ["a", "b"] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnRule {
    /// Integer within bounds.
    WholeNumber(NumericConstraint),
    /// Decimal within bounds.
    Decimal(NumericConstraint),
    /// Character count within bounds.
    TextLength(NumericConstraint),
    /// One of a fixed set of values.
    List { values: Vec<String> },
    /// Matches a regular expression.
    Pattern { regex: String },
}

impl ColumnRule {
    pub fn whole_number(constraint: NumericConstraint) -> Self {
        ColumnRule::WholeNumber(constraint)
    }

    pub fn decimal(constraint: NumericConstraint) -> Self {
        ColumnRule::Decimal(constraint)
    }

    pub fn text_length(constraint: NumericConstraint) -> Self {
        ColumnRule::TextLength(constraint)
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnRule::List {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        ColumnRule::Pattern { regex: regex.into() }
    }

    /// The numeric constraint, for rule types that carry one.
    pub fn constraint(&self) -> Option<&NumericConstraint> {
        match self {
            ColumnRule::WholeNumber(c) | ColumnRule::Decimal(c) | ColumnRule::TextLength(c) => Some(c),
            ColumnRule::List { .. } | ColumnRule::Pattern { .. } => None,
        }
    }
}

/// Numeric constraint (used by WholeNumber, Decimal, TextLength).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericConstraint {
    pub operator: ComparisonOperator,
    /// First value (required for all operators).
    pub value1: f64,
    /// Second value (required for Between/NotBetween).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<f64>,
}

impl NumericConstraint {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            operator: ComparisonOperator::Between,
            value1: min,
            value2: Some(max),
        }
    }

    pub fn not_between(min: f64, max: f64) -> Self {
        Self {
            operator: ComparisonOperator::NotBetween,
            value1: min,
            value2: Some(max),
        }
    }

    pub fn equal_to(value: f64) -> Self {
        Self::single(ComparisonOperator::EqualTo, value)
    }

    pub fn not_equal_to(value: f64) -> Self {
        Self::single(ComparisonOperator::NotEqualTo, value)
    }

    pub fn greater_than(value: f64) -> Self {
        Self::single(ComparisonOperator::GreaterThan, value)
    }

    pub fn less_than(value: f64) -> Self {
        Self::single(ComparisonOperator::LessThan, value)
    }

    pub fn greater_than_or_equal(value: f64) -> Self {
        Self::single(ComparisonOperator::GreaterThanOrEqual, value)
    }

    pub fn less_than_or_equal(value: f64) -> Self {
        Self::single(ComparisonOperator::LessThanOrEqual, value)
    }

    fn single(operator: ComparisonOperator, value: f64) -> Self {
        Self {
            operator,
            value1: value,
            value2: None,
        }
    }

    /// Human-readable description, e.g. "between 1 and 10".
    pub fn describe(&self) -> String {
        let a = format_bound(self.value1);
        let b = format_bound(self.value2.unwrap_or(self.value1));
        match self.operator {
            ComparisonOperator::Between => format!("between {a} and {b}"),
            ComparisonOperator::NotBetween => format!("not between {a} and {b}"),
            ComparisonOperator::EqualTo => format!("equal to {a}"),
            ComparisonOperator::NotEqualTo => format!("not equal to {a}"),
            ComparisonOperator::GreaterThan => format!("greater than {a}"),
            ComparisonOperator::LessThan => format!("less than {a}"),
            ComparisonOperator::GreaterThanOrEqual => format!("at least {a}"),
            ComparisonOperator::LessThanOrEqual => format!("at most {a}"),
        }
    }
}

fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Comparison operator for numeric constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Between,
    NotBetween,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl ComparisonOperator {
    /// Between/NotBetween need a second bound.
    pub fn needs_second_value(&self) -> bool {
        matches!(self, ComparisonOperator::Between | ComparisonOperator::NotBetween)
    }
}
