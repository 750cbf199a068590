use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::types::{error::DatabaseError, record::Record, value::Value};

/// Comparison operators accepted in WHERE clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>", alias = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Comparator {
    /// The operator that matches exactly the rows this one rejects.
    pub fn negate(self) -> Self {
        match self {
            Comparator::Eq => Comparator::Ne,
            Comparator::Ne => Comparator::Eq,
            Comparator::Lt => Comparator::Ge,
            Comparator::Ge => Comparator::Lt,
            Comparator::Le => Comparator::Gt,
            Comparator::Gt => Comparator::Le,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "<>",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
        }
    }

    /// Values of unrelated types never match.
    pub fn evaluate(&self, left: &Value, right: &Value) -> bool {
        let Some(ordering) = left.partial_cmp(right) else {
            return false;
        };
        match self {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Le => ordering != Ordering::Greater,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Comparator::Eq),
            "<>" | "!=" => Ok(Comparator::Ne),
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Le),
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Ge),
            other => Err(DatabaseError::Unsupported {
                details: format!("comparison operator '{}'", other),
            }),
        }
    }
}

/// A resolved WHERE clause: `[NOT] record[column_ord] <comparator> value`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column_ord: usize,
    pub comparator: Comparator,
    pub negated: bool,
    pub value: Value,
}

impl Condition {
    pub fn new(column_ord: usize, comparator: Comparator, value: Value) -> Self {
        Self {
            column_ord,
            comparator,
            negated: false,
            value,
        }
    }

    pub fn negated(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Comparator after applying NOT.
    pub fn effective_comparator(&self) -> Comparator {
        if self.negated {
            self.comparator.negate()
        } else {
            self.comparator
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record
            .get_value(self.column_ord)
            .is_some_and(|left| self.effective_comparator().evaluate(left, &self.value))
    }
}

/// A resolved SET clause
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub column_ord: usize,
    pub value: Value,
}

impl Operation {
    pub fn new(column_ord: usize, value: Value) -> Self {
        Self { column_ord, value }
    }
}

fn matches(condition: Option<&Condition>, record: &Record) -> bool {
    condition.is_none_or(|c| c.matches(record))
}

/// Matching records projected onto `column_ords`; every column when it is empty.
pub fn filter_select<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    column_ords: &[usize],
    condition: Option<&Condition>,
) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| matches(condition, record))
        .map(|record| {
            if column_ords.is_empty() {
                record.clone()
            } else {
                let values = column_ords
                    .iter()
                    .map(|ord| record.get_value(*ord).cloned().unwrap_or(Value::Null))
                    .collect();
                Record::new(record.row_id, values)
            }
        })
        .collect()
}

/// The records that survive the delete.
pub fn filter_delete<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    condition: &Condition,
) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| !condition.matches(record))
        .cloned()
        .collect()
}

/// Every record, with the target column replaced on the matching ones.
pub fn filter_update<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    operation: &Operation,
    condition: Option<&Condition>,
) -> Result<Vec<Record>, DatabaseError> {
    records
        .into_iter()
        .map(|record| {
            let mut record = record.clone();
            if matches(condition, &record) {
                record.set_value(operation.column_ord, operation.value.clone())?;
            }
            Ok(record)
        })
        .collect()
}
