//! Row validation
//!
//! Validation runs over every data row and collects per-field messages into a
//! [`ValidationState`]. The ghost row is never validated.
//!
//! ## Blank Handling
//!
//! A blank cell (empty or whitespace) only fails when its column is
//! `required`. Kind checks and rules skip blanks.
//!
//! ## Numeric Input
//!
//! - Whitespace is trimmed, a leading `+` is allowed
//! - `integer` columns and `whole_number` rules reject any decimal point,
//!   including `3.0`
//! - NaN and infinities are rejected

use std::collections::BTreeMap;
use std::num::IntErrorKind;

use regex::Regex;

use gridpaste_core::{
    ColumnDef, ColumnRule, ComparisonOperator, DataRow, FieldErrors, NumericConstraint, TableRow,
    ValidationState, ValueKind,
};

use crate::error::EngineError;

// ============================================================================
// Validator Seam
// ============================================================================

/// Per-row validation function: field id -> message, empty when valid.
pub trait RowValidator {
    fn validate_row(&self, row: &DataRow) -> FieldErrors;
}

impl<F> RowValidator for F
where
    F: Fn(&DataRow) -> FieldErrors,
{
    fn validate_row(&self, row: &DataRow) -> FieldErrors {
        self(row)
    }
}

/// Validate every non-ghost row. Stateless between calls.
pub fn validate_all<V>(rows: &[TableRow], validator: &V) -> ValidationState
where
    V: RowValidator + ?Sized,
{
    let mut errors = BTreeMap::new();
    for row in rows.iter().filter_map(TableRow::as_data) {
        let fields = validator.validate_row(row);
        if !fields.is_empty() {
            errors.insert(row.id.clone(), fields);
        }
    }
    ValidationState::from_errors(errors)
}

/// Saving needs a valid table with at least one data row.
pub fn is_save_enabled(state: &ValidationState, rows: &[TableRow]) -> bool {
    state.is_valid && rows.iter().any(|r| !r.is_ghost())
}

// ============================================================================
// Numeric Validation Helpers
// ============================================================================

/// Error when parsing numeric input for validation.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericParseError {
    /// Input is empty (after trimming whitespace).
    Empty,
    /// Input contains invalid characters or format.
    InvalidFormat,
    /// Input has a decimal point but an integer is required.
    FractionalNotAllowed,
    /// Whole number that does not fit in 64 bits, or an exponent form past
    /// the range where floats hold integers exactly.
    OutOfRange,
}

impl std::fmt::Display for NumericParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericParseError::Empty => write!(f, "value is empty"),
            NumericParseError::InvalidFormat => write!(f, "must be a number"),
            NumericParseError::FractionalNotAllowed => write!(f, "must be a whole number"),
            NumericParseError::OutOfRange => write!(f, "is out of range"),
        }
    }
}

/// Parse cell text as a number.
///
/// ```
/// use gridpaste_engine::validation::parse_numeric_input;
///
/// assert!(parse_numeric_input("3.14", true).is_ok());
/// assert!(parse_numeric_input(".5", true).is_ok());
/// assert!(parse_numeric_input("3.0", false).is_err());
/// assert_eq!(parse_numeric_input(" +3 ", false), Ok(3.0));
/// ```
pub fn parse_numeric_input(value: &str, allow_decimal: bool) -> Result<f64, NumericParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NumericParseError::Empty);
    }

    let normalized = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if normalized.is_empty() {
        return Err(NumericParseError::InvalidFormat);
    }

    if !allow_decimal && normalized.contains('.') {
        return Err(NumericParseError::FractionalNotAllowed);
    }

    let parsed = normalized
        .parse::<f64>()
        .map_err(|_| NumericParseError::InvalidFormat)?;
    if !parsed.is_finite() {
        return Err(NumericParseError::InvalidFormat);
    }
    if !allow_decimal && parsed.fract() != 0.0 {
        // "1e-1" and friends
        return Err(NumericParseError::FractionalNotAllowed);
    }
    Ok(parsed)
}

/// Largest magnitude at which every integer has an exact `f64`.
pub const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Parse cell text as a 64-bit integer without going through `f64`.
///
/// Plain digit strings parse exactly across the whole `i64` range. Exponent
/// forms such as `1e3` are accepted only while a float holds them exactly.
///
/// ```
/// use gridpaste_engine::validation::{parse_integer_input, NumericParseError};
///
/// assert_eq!(parse_integer_input(" +9007199254740993 "), Ok(9_007_199_254_740_993));
/// assert_eq!(parse_integer_input("1e3"), Ok(1000));
/// assert_eq!(parse_integer_input("9223372036854775808"), Err(NumericParseError::OutOfRange));
/// ```
pub fn parse_integer_input(value: &str) -> Result<i64, NumericParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NumericParseError::Empty);
    }
    let normalized = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if normalized.is_empty() {
        return Err(NumericParseError::InvalidFormat);
    }
    if normalized.contains('.') {
        return Err(NumericParseError::FractionalNotAllowed);
    }

    match normalized.parse::<i64>() {
        Ok(n) => Ok(n),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            Err(NumericParseError::OutOfRange)
        }
        Err(_) => {
            let n = parse_numeric_input(normalized, false)?;
            if n.abs() > MAX_EXACT_INTEGER {
                return Err(NumericParseError::OutOfRange);
            }
            Ok(n as i64)
        }
    }
}

/// Evaluate a numeric constraint. `Between` is inclusive on both ends.
pub fn eval_numeric_constraint(
    x: f64,
    operator: ComparisonOperator,
    a: f64,
    b: Option<f64>,
) -> bool {
    match operator {
        ComparisonOperator::Between => {
            let max = b.unwrap_or(a);
            x >= a && x <= max
        }
        ComparisonOperator::NotBetween => {
            let max = b.unwrap_or(a);
            x < a || x > max
        }
        ComparisonOperator::EqualTo => (x - a).abs() < f64::EPSILON,
        ComparisonOperator::NotEqualTo => (x - a).abs() >= f64::EPSILON,
        ComparisonOperator::GreaterThan => x > a,
        ComparisonOperator::LessThan => x < a,
        ComparisonOperator::GreaterThanOrEqual => x >= a,
        ComparisonOperator::LessThanOrEqual => x <= a,
    }
}

fn satisfies(x: f64, constraint: &NumericConstraint) -> bool {
    eval_numeric_constraint(x, constraint.operator, constraint.value1, constraint.value2)
}

/// Accepted spellings for boolean cells.
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Schema Validator
// ============================================================================

struct CompiledColumn {
    def: ColumnDef,
    pattern: Option<Regex>,
}

/// Validator derived from column definitions: required flags, value kinds
/// and column rules.
pub struct SchemaValidator {
    columns: Vec<CompiledColumn>,
}

impl SchemaValidator {
    /// Compile the columns' rules. Fails on a pattern that is not a valid regex.
    pub fn new(columns: &[ColumnDef]) -> Result<Self, EngineError> {
        let columns = columns
            .iter()
            .map(|def| {
                let pattern = match &def.rule {
                    Some(ColumnRule::Pattern { regex }) => {
                        Some(Regex::new(regex).map_err(|e| EngineError::InvalidRule {
                            column: def.id.clone(),
                            message: e.to_string(),
                        })?)
                    }
                    _ => None,
                };
                Ok(CompiledColumn {
                    def: def.clone(),
                    pattern,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        Ok(Self { columns })
    }

    /// Message for one cell, or `None` if it passes.
    pub fn check_cell(&self, column_id: &str, value: &str) -> Option<String> {
        self.columns
            .iter()
            .find(|c| c.def.id == column_id)
            .and_then(|c| check(c, value))
    }
}

impl RowValidator for SchemaValidator {
    fn validate_row(&self, row: &DataRow) -> FieldErrors {
        self.columns
            .iter()
            .filter_map(|c| check(c, row.cell(&c.def.id)).map(|msg| (c.def.id.clone(), msg)))
            .collect()
    }
}

fn check(column: &CompiledColumn, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return column.def.required.then(|| "is required".to_string());
    }
    if let Some(msg) = check_kind(column.def.kind, value) {
        return Some(msg);
    }
    check_rule(column, value)
}

fn check_kind(kind: ValueKind, value: &str) -> Option<String> {
    match kind {
        ValueKind::Text => None,
        ValueKind::Number => parse_numeric_input(value, true).err().map(|e| e.to_string()),
        ValueKind::Integer => parse_integer_input(value).err().map(|e| e.to_string()),
        ValueKind::Boolean => parse_boolean(value)
            .is_none()
            .then(|| "must be true or false".to_string()),
    }
}

fn check_rule(column: &CompiledColumn, value: &str) -> Option<String> {
    let rule = column.def.rule.as_ref()?;
    match rule {
        ColumnRule::WholeNumber(c) => match parse_numeric_input(value, false) {
            Ok(x) if satisfies(x, c) => None,
            Ok(_) => Some(format!("must be {}", c.describe())),
            Err(e) => Some(e.to_string()),
        },
        ColumnRule::Decimal(c) => match parse_numeric_input(value, true) {
            Ok(x) if satisfies(x, c) => None,
            Ok(_) => Some(format!("must be {}", c.describe())),
            Err(e) => Some(e.to_string()),
        },
        ColumnRule::TextLength(c) => {
            let len = value.chars().count() as f64;
            (!satisfies(len, c)).then(|| format!("length must be {}", c.describe()))
        }
        ColumnRule::List { values } => {
            (!values.iter().any(|v| v == value)).then(|| format!("must be one of: {}", values.join(", ")))
        }
        ColumnRule::Pattern { .. } => match &column.pattern {
            Some(re) if !re.is_match(value) => Some("does not match the expected format".to_string()),
            _ => None,
        },
    }
}
