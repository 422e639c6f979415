use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::columns::{ColumnMetadata, ColumnType};
use crate::features::Feature;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    In,
}

impl FilterOperator {
    /// Operators offered for a column of the given type.
    pub fn applies_to(self, column_type: ColumnType) -> bool {
        match column_type {
            ColumnType::Categorical => matches!(
                self,
                FilterOperator::Equals | FilterOperator::Contains | FilterOperator::In
            ),
            ColumnType::Numerical => matches!(
                self,
                FilterOperator::Equals | FilterOperator::GreaterThan | FilterOperator::LessThan
            ),
        }
    }
}

/// A single predicate attached to a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub column: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl FilterDefinition {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Filters without a column or a value are placeholders from an editor and
    /// are never sent.
    pub fn is_complete(&self) -> bool {
        !self.column.trim().is_empty() && !self.value.is_null()
    }

    /// Evaluates the predicate against a record's attribute map.
    ///
    /// A missing attribute never matches.
    pub fn matches(&self, attributes: &Map<String, Value>) -> bool {
        self.test(attributes.get(&self.column))
    }

    /// Same as [`FilterDefinition::matches`], using the feature's attribute
    /// lookup rules.
    pub fn matches_feature(&self, feature: &Feature) -> bool {
        self.test(feature.attribute(&self.column))
    }

    fn test(&self, actual: Option<&Value>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self.operator {
            FilterOperator::Equals => json_eq(actual, &self.value),
            FilterOperator::Contains => display(actual).contains(&display(&self.value)),
            FilterOperator::GreaterThan => {
                json_cmp(actual, &self.value) == Some(Ordering::Greater)
            }
            FilterOperator::LessThan => json_cmp(actual, &self.value) == Some(Ordering::Less),
            FilterOperator::In => match &self.value {
                Value::Array(items) => items.iter().any(|v| json_eq(actual, v)),
                other => json_eq(actual, other),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterRejection {
    Incomplete,
    UnknownColumn,
    OperatorMismatch(ColumnType),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterValidation {
    pub accepted: Vec<FilterDefinition>,
    pub rejected: Vec<(FilterDefinition, FilterRejection)>,
}

/// Checks filters against a source's column metadata, preserving order.
pub fn validate_filters(
    filters: &[FilterDefinition],
    columns: &[ColumnMetadata],
) -> FilterValidation {
    let mut out = FilterValidation::default();
    for f in filters {
        let verdict = if !f.is_complete() {
            Some(FilterRejection::Incomplete)
        } else {
            match columns.iter().find(|c| c.name == f.column) {
                None => Some(FilterRejection::UnknownColumn),
                Some(c) if !f.operator.applies_to(c.column_type) => {
                    Some(FilterRejection::OperatorMismatch(c.column_type))
                }
                Some(_) => None,
            }
        };
        match verdict {
            None => out.accepted.push(f.clone()),
            Some(reason) => out.rejected.push((f.clone(), reason)),
        }
    }
    out
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn json_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
