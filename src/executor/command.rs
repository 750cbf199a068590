use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    executor::predicate::Comparator,
    storage::schema::{ColumnKey, ColumnSchema, parse_nullable},
    types::{RowId, error::DatabaseError, value::{DataType, Value}},
};

/// One column of a CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub column_name: String,
    pub data_type: DataType,
    pub is_nullable: bool,
    pub column_key: ColumnKey,
}

impl ColumnDefinition {
    pub fn new(column_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            column_name: column_name.into(),
            data_type,
            is_nullable: true,
            column_key: ColumnKey::None,
        }
    }

    /// Build from the parser's spellings, e.g. `("id", "INT", "NO", "PRI")`.
    pub fn from_parts(
        column_name: &str,
        data_type: &str,
        is_nullable: &str,
        column_key: &str,
    ) -> Result<Self, DatabaseError> {
        Ok(Self {
            column_name: column_name.to_string(),
            data_type: data_type.parse()?,
            is_nullable: parse_nullable(is_nullable)?,
            column_key: column_key.parse()?,
        })
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.column_key = ColumnKey::Unique;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.column_key = ColumnKey::Primary;
        self.is_nullable = false;
        self
    }

    pub fn to_schema(&self, position: usize) -> ColumnSchema {
        ColumnSchema {
            name: self.column_name.clone(),
            data_type: self.data_type,
            position,
            nullable: self.is_nullable && self.column_key != ColumnKey::Primary,
            key: self.column_key,
        }
    }
}

/// `[NOT] column <comparator> value`, by column name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    #[serde(default)]
    pub negated: bool,
    pub column_name: String,
    pub comparator: Comparator,
    pub value: Value,
}

impl WhereClause {
    pub fn new(column_name: impl Into<String>, comparator: Comparator, value: impl Into<Value>) -> Self {
        Self {
            negated: false,
            column_name: column_name.into(),
            comparator,
            value: value.into(),
        }
    }

    pub fn negated(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

/// `SET column = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column_name: String,
    pub value: Value,
}

impl Assignment {
    pub fn new(column_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column_name: column_name.into(),
            value: value.into(),
        }
    }
}

/// A parsed statement, as handed over by the query parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    CreateTable {
        table_name: String,
        column_list: Vec<ColumnDefinition>,
    },
    CreateIndex {
        table_name: String,
        column_name: String,
    },
    DropTable {
        table_name: String,
    },
    Insert {
        table_name: String,
        /// Empty means every column in declaration order.
        column_name_list: Vec<String>,
        value_list: Vec<Value>,
    },
    Update {
        table_name: String,
        operation: Assignment,
        condition: Option<WhereClause>,
    },
    Delete {
        table_name: String,
        condition: Option<WhereClause>,
    },
    Select {
        table_name: String,
        /// Empty means `*`.
        column_name_list: Vec<String>,
        condition: Option<WhereClause>,
    },
}

impl Command {
    pub fn table_name(&self) -> &str {
        match self {
            Command::CreateTable { table_name, .. }
            | Command::CreateIndex { table_name, .. }
            | Command::DropTable { table_name }
            | Command::Insert { table_name, .. }
            | Command::Update { table_name, .. }
            | Command::Delete { table_name, .. }
            | Command::Select { table_name, .. } => table_name,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Command::CreateTable { .. } => "CREATE TABLE",
            Command::CreateIndex { .. } => "CREATE INDEX",
            Command::DropTable { .. } => "DROP TABLE",
            Command::Insert { .. } => "INSERT INTO TABLE",
            Command::Update { .. } => "UPDATE",
            Command::Delete { .. } => "DELETE",
            Command::Select { .. } => "SELECT",
        }
    }
}

/// Rows returned by a SELECT, with the resolved column names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }

    /// Plain text grid, one line per row.
    pub fn render(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(Value::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(String::len)
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |values: &[String]| {
            values
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{:<width$}", value, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let mut out = line(&self.columns);
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &cells {
            out.push('\n');
            out.push_str(&line(row));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    TableCreated { table_name: String },
    TableDropped { table_name: String },
    Inserted { row_id: RowId },
    Updated { rows: usize },
    Deleted { rows: usize },
    Rows(ResultSet),
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::TableCreated { table_name } => write!(f, "Table '{}' created", table_name),
            QueryResult::TableDropped { table_name } => write!(f, "Table '{}' dropped", table_name),
            QueryResult::Inserted { row_id } => write!(f, "1 row inserted (row id {})", row_id),
            QueryResult::Updated { rows } => write!(f, "{} row(s) updated", rows),
            QueryResult::Deleted { rows } => write!(f, "{} row(s) deleted", rows),
            QueryResult::Rows(result) => f.write_str(&result.render()),
        }
    }
}
