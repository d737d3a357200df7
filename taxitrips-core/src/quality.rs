//! Quality gate: canonical-column presence and value-range rules.
//!
//! Data-quality problems are findings, not errors. `validate` always returns a
//! [`ValidationVerdict`]; nothing in here fails or panics on bad data.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::schema::CANONICAL_COLUMNS;

/// Closed numeric interval a column's values must lie in. `None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeRule {
    pub name: &'static str,
    pub column: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Range rules evaluated once every canonical column is present.
pub const RANGE_RULES: [RangeRule; 2] = [
    RangeRule {
        name: "airport_fee_non_negative",
        column: "airport_fee",
        min: Some(0.0),
        max: None,
    },
    RangeRule {
        name: "passenger_count_range",
        column: "passenger_count",
        min: Some(0.0),
        max: Some(6.0),
    },
];

impl RangeRule {
    fn admits(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn constraint(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("must lie in [{min}, {max}]"),
            (Some(min), None) => format!("must be >= {min}"),
            (None, Some(max)) => format!("must be <= {max}"),
            (None, None) => "is unconstrained".to_string(),
        }
    }

    /// Check every row. Nulls are skipped; NaN counts as offending.
    fn check(&self, df: &DataFrame) -> Option<Violation> {
        let column = match df.column(self.column) {
            Ok(c) => c,
            Err(_) => return Some(self.violation(0, "is missing".into())),
        };

        if !is_numeric(column.dtype()) {
            return Some(self.violation(
                column.len(),
                format!("is not numeric (found {})", column.dtype()),
            ));
        }

        let values = match column.cast(&DataType::Float64) {
            Ok(v) => v,
            Err(e) => return Some(self.violation(column.len(), format!("could not be read: {e}"))),
        };
        let values = match values.f64() {
            Ok(ca) => ca,
            Err(e) => return Some(self.violation(column.len(), format!("could not be read: {e}"))),
        };

        let offending = values
            .into_iter()
            .flatten()
            .filter(|v| !self.admits(*v))
            .count();

        if offending == 0 {
            None
        } else {
            Some(self.violation(
                offending,
                format!("{} ({offending} offending rows)", self.constraint()),
            ))
        }
    }

    fn violation(&self, offending_rows: usize, detail: String) -> Violation {
        Violation {
            rule: self.name.to_string(),
            description: format!("{} {detail}", self.column),
            offending_rows,
        }
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Null
    )
}

/// One failed range rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub description: String,
    pub offending_rows: usize,
}

/// Structured pass/fail result of validating one file's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub passed: bool,
    pub missing_columns: BTreeSet<String>,
    pub violations: Vec<Violation>,
}

impl ValidationVerdict {
    fn from_findings(missing_columns: BTreeSet<String>, violations: Vec<Violation>) -> Self {
        Self {
            passed: missing_columns.is_empty() && violations.is_empty(),
            missing_columns,
            violations,
        }
    }
}

/// Validates a normalized frame against the canonical schema and range rules.
pub struct QualityGate;

impl QualityGate {
    pub fn validate(df: &DataFrame) -> ValidationVerdict {
        let missing = Self::missing_columns(df);
        if !missing.is_empty() {
            // Range rules assume their columns exist.
            return ValidationVerdict::from_findings(missing, Vec::new());
        }

        let violations = RANGE_RULES.iter().filter_map(|rule| rule.check(df)).collect();
        ValidationVerdict::from_findings(missing, violations)
    }

    pub fn missing_columns(df: &DataFrame) -> BTreeSet<String> {
        let schema = df.schema();
        CANONICAL_COLUMNS
            .iter()
            .filter(|name| !schema.contains(name))
            .map(|name| name.to_string())
            .collect()
    }
}
