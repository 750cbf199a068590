use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    config::EngineConfig,
    executor::command::{ColumnDefinition, Command, QueryResult},
    storage::{schema::TableSchema, table::Table, table_file::TableFile},
    types::{RowId, error::DatabaseError},
};

/// Registry of open tables; dispatches parsed commands to them.
pub struct StorageManager {
    config: EngineConfig,
    tables: HashMap<String, Table>,
    data_dir: Option<PathBuf>,
}

impl StorageManager {
    /// Purely in-memory; saving and loading are unavailable.
    pub fn new(config: EngineConfig) -> Result<Self, DatabaseError> {
        config.validate()?;
        Ok(Self {
            config,
            tables: HashMap::new(),
            data_dir: None,
        })
    }

    pub fn with_data_dir<P: AsRef<Path>>(
        data_dir: P,
        config: EngineConfig,
    ) -> Result<Self, DatabaseError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        info!("using data directory {}", data_dir.display());
        let mut manager = Self::new(config)?;
        manager.data_dir = Some(data_dir.to_path_buf());
        Ok(manager)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn execute(&mut self, command: Command) -> Result<QueryResult, DatabaseError> {
        let verb = command.verb();
        let table_name = command.table_name().to_string();
        let result = self.dispatch(command);
        if let Err(e) = &result {
            debug!("{} on '{}' rejected: {}", verb, table_name, e);
        }
        result
    }

    fn dispatch(&mut self, command: Command) -> Result<QueryResult, DatabaseError> {
        match command {
            Command::CreateTable {
                table_name,
                column_list,
            } => {
                let table_name = self.create_table(&table_name, &column_list)?.name().to_string();
                Ok(QueryResult::TableCreated { table_name })
            }
            Command::CreateIndex {
                table_name,
                column_name,
            } => {
                self.table(&table_name)?.schema().resolve(&column_name)?;
                Err(DatabaseError::Unsupported {
                    details: format!("index on '{}.{}'", table_name, column_name),
                })
            }
            Command::DropTable { table_name } => {
                self.drop_table(&table_name)?;
                Ok(QueryResult::TableDropped {
                    table_name: normalize(&table_name),
                })
            }
            Command::Insert {
                table_name,
                column_name_list,
                value_list,
            } => {
                let row_id = self
                    .table_mut(&table_name)?
                    .insert(&column_name_list, value_list)?;
                Ok(QueryResult::Inserted { row_id })
            }
            Command::Update {
                table_name,
                operation,
                condition,
            } => {
                let rows = self
                    .table_mut(&table_name)?
                    .update(&operation, condition.as_ref())?;
                Ok(QueryResult::Updated { rows })
            }
            Command::Delete {
                table_name,
                condition,
            } => {
                let rows = self.table_mut(&table_name)?.delete(condition.as_ref())?;
                Ok(QueryResult::Deleted { rows })
            }
            Command::Select {
                table_name,
                column_name_list,
                condition,
            } => {
                let rows = self
                    .table(&table_name)?
                    .select(&column_name_list, condition.as_ref())?;
                Ok(QueryResult::Rows(rows))
            }
        }
    }

    pub fn create_table(
        &mut self,
        table_name: &str,
        column_list: &[ColumnDefinition],
    ) -> Result<&Table, DatabaseError> {
        let name = normalize(table_name);
        if self.tables.contains_key(&name) {
            return Err(DatabaseError::TableAlreadyExists { name });
        }
        let table = Table::create_table(&name, column_list, self.config)?;
        Ok(self.tables.entry(name).or_insert(table))
    }

    /// Also removes the table's file when a data directory is set.
    pub fn drop_table(&mut self, table_name: &str) -> Result<Table, DatabaseError> {
        let name = normalize(table_name);
        let table = self
            .tables
            .remove(&name)
            .ok_or_else(|| DatabaseError::TableNotFound { name: name.clone() })?;
        if let Some(dir) = &self.data_dir {
            TableFile::new(dir, &name).remove()?;
        }
        info!("dropped table '{}'", name);
        Ok(table)
    }

    pub fn table(&self, table_name: &str) -> Result<&Table, DatabaseError> {
        let name = normalize(table_name);
        self.tables
            .get(&name)
            .ok_or(DatabaseError::TableNotFound { name })
    }

    pub fn table_mut(&mut self, table_name: &str) -> Result<&mut Table, DatabaseError> {
        let name = normalize(table_name);
        self.tables
            .get_mut(&name)
            .ok_or(DatabaseError::TableNotFound { name })
    }

    pub fn table_exists(&self, table_name: &str) -> bool {
        self.tables.contains_key(&normalize(table_name))
    }

    /// Sorted table names.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn require_data_dir(&self) -> Result<&Path, DatabaseError> {
        self.data_dir
            .as_deref()
            .ok_or_else(|| DatabaseError::ExecutionError {
                details: "storage manager has no data directory".to_string(),
            })
    }

    /// Write `<data_dir>/<table>.tbl`, keeping the previous file as `.tbl.bak`.
    pub fn save_table(&self, table_name: &str) -> Result<PathBuf, DatabaseError> {
        let dir = self.require_data_dir()?;
        let table = self.table(table_name)?;
        let file = TableFile::new(dir, table.name());
        file.write(&table.to_byte_stream()?)?;
        Ok(file.path().to_path_buf())
    }

    /// Load a table file for a known schema. Column metadata and the row id
    /// counter live in the catalog, which is outside this manager, so the
    /// caller supplies both.
    pub fn load_table(
        &mut self,
        schema: TableSchema,
        next_row_id: RowId,
    ) -> Result<&Table, DatabaseError> {
        let dir = self.require_data_dir()?;
        let name = normalize(&schema.table_name);
        if self.tables.contains_key(&name) {
            return Err(DatabaseError::TableAlreadyExists { name });
        }
        let bytes = TableFile::new(dir, &name).read()?;
        let schema = TableSchema {
            table_name: name.clone(),
            ..schema
        };
        let table = Table::from_byte_stream(schema, self.config, next_row_id, &bytes)?;
        Ok(self.tables.entry(name).or_insert(table))
    }
}

fn normalize(table_name: &str) -> String {
    table_name.trim().to_lowercase()
}
