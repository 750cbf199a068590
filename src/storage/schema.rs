use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::types::{error::DatabaseError, value::DataType};

/// Key role of a column, spelled the way the statement parser emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnKey {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "UNI")]
    Unique,
    #[serde(rename = "PRI")]
    Primary,
}

impl ColumnKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKey::None => "",
            ColumnKey::Unique => "UNI",
            ColumnKey::Primary => "PRI",
        }
    }

    /// Unique and primary columns both reject duplicate values.
    pub fn is_unique(&self) -> bool {
        !matches!(self, ColumnKey::None)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKey {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" => Ok(ColumnKey::None),
            "UNI" | "UNIQUE" => Ok(ColumnKey::Unique),
            "PRI" | "PRIMARY KEY" => Ok(ColumnKey::Primary),
            other => Err(DatabaseError::Unsupported {
                details: format!("column key '{}'", other),
            }),
        }
    }
}

/// Parse the parser's `is_nullable` spelling ("YES"/"NO").
pub fn parse_nullable(s: &str) -> Result<bool, DatabaseError> {
    match s.trim().to_ascii_uppercase().as_str() {
        "YES" => Ok(true),
        "NO" => Ok(false),
        other => Err(DatabaseError::Unsupported {
            details: format!("nullability flag '{}'", other),
        }),
    }
}

/// Represents a column definition in a table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    pub position: usize,
    pub nullable: bool,
    pub key: ColumnKey,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType, position: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            position,
            nullable: true,
            key: ColumnKey::None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.key = ColumnKey::Primary;
        self.nullable = false; // Primary keys are always NOT NULL
        self
    }

    pub fn unique(mut self) -> Self {
        self.key = ColumnKey::Unique;
        self
    }

    pub fn is_unique(&self) -> bool {
        self.key.is_unique()
    }
}

/// Column metadata of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Rejects duplicate column names; positions are renumbered in declaration order.
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnSchema>) -> Result<Self, DatabaseError> {
        let table_name = table_name.into();
        if columns.is_empty() {
            return Err(DatabaseError::ExecutionError {
                details: format!("table '{}' needs at least one column", table_name),
            });
        }
        if columns.len() > u8::MAX as usize {
            return Err(DatabaseError::ExecutionError {
                details: format!("table '{}' has more than 255 columns", table_name),
            });
        }
        for (index, column) in columns.iter().enumerate() {
            if columns[..index].iter().any(|c| c.name == column.name) {
                return Err(DatabaseError::ExecutionError {
                    details: format!(
                        "duplicate column '{}' in table '{}'",
                        column.name, table_name
                    ),
                });
            }
        }
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(position, column)| ColumnSchema { position, ..column })
            .collect();
        Ok(Self {
            table_name,
            columns,
        })
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Get column index by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// Like `get_column_index`, failing with `ColumnNotFound`.
    pub fn resolve(&self, name: &str) -> Result<usize, DatabaseError> {
        self.get_column_index(name)
            .ok_or_else(|| DatabaseError::ColumnNotFound {
                name: name.to_string(),
                table: self.table_name.clone(),
            })
    }

    /// Get all column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }
}
