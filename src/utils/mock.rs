use std::path::Path;

use tempfile::TempDir;

use crate::{
    config::EngineConfig, storage::storage_manager::StorageManager, types::error::DatabaseError,
};

/// A storage manager over a throwaway data directory, removed on drop.
pub struct TempDatabase {
    pub dir: TempDir,
    pub storage_manager: StorageManager,
}

impl TempDatabase {
    pub fn new() -> Result<Self, DatabaseError> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_prefix(prefix: &str) -> Result<Self, DatabaseError> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let storage_manager = StorageManager::with_data_dir(dir.path(), EngineConfig::default())?;
        Ok(Self {
            dir,
            storage_manager,
        })
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, DatabaseError> {
        let dir = tempfile::Builder::new().prefix("lumbung_test").tempdir()?;
        let storage_manager = StorageManager::with_data_dir(dir.path(), config)?;
        Ok(Self {
            dir,
            storage_manager,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A fresh manager over the same directory, as after a restart.
    pub fn reopen(&self) -> Result<StorageManager, DatabaseError> {
        StorageManager::with_data_dir(self.dir.path(), *self.storage_manager.config())
    }
}
