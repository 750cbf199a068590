use std::{
    fs::{self, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::types::error::DatabaseError;

pub const TABLE_FILE_EXTENSION: &str = "tbl";
pub const BACKUP_EXTENSION: &str = "tbl.bak";

/// `<dir>/<table>.tbl`: the table's pages back to back, nothing else.
#[derive(Debug, Clone)]
pub struct TableFile {
    path: PathBuf,
}

impl TableFile {
    pub fn new<P: AsRef<Path>>(dir: P, table_name: &str) -> Self {
        Self {
            path: dir
                .as_ref()
                .join(format!("{}.{}", table_name, TABLE_FILE_EXTENSION)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension(BACKUP_EXTENSION)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Any previous file is renamed to the backup path first, so a failed
    /// write loses at most the newest save.
    pub fn write(&self, bytes: &[u8]) -> Result<(), DatabaseError> {
        if self.path.exists() {
            fs::rename(&self.path, self.backup_path())?;
            debug!("backed up {}", self.path.display());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        info!("wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<u8>, DatabaseError> {
        let mut file = OpenOptions::new().read(true).open(&self.path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Delete the file and its backup, ignoring whichever is missing.
    pub fn remove(&self) -> Result<(), DatabaseError> {
        for path in [self.path.clone(), self.backup_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}
