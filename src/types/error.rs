use thiserror::Error;

use crate::types::PageNumber;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page is full (page: {page_number}, needs {required} bytes, has {available})")]
    PageFull {
        page_number: PageNumber,
        required: usize,
        available: usize,
    },

    #[error("Column index {index} out of bounds")]
    ColumnIndexOutOfBounds { index: usize },

    #[error("Serialization/deserialization error: {details}")]
    SerializationError { details: String },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Table '{name}' already exists")]
    TableAlreadyExists { name: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Key {key} not found")]
    KeyNotFound { key: String },

    #[error("Key {key} already present")]
    DuplicateKey { key: String },

    #[error("Cannot coerce {value} to {expected}: {details}")]
    TypeCoercion {
        value: String,
        expected: String,
        details: String,
    },

    #[error("Value {value} is out of range for {data_type}")]
    Range { value: String, data_type: String },

    #[error("Column '{column}' cannot be NULL")]
    NullConstraintViolation { column: String },

    #[error("Duplicate value {value} for unique column '{column}'")]
    UniquenessViolation { column: String, value: String },

    #[error("Record of {size} bytes exceeds the {max} byte budget")]
    RecordTooLarge { size: usize, max: usize },

    #[error("Malformed page {page_number}: {reason}")]
    MalformedPage {
        page_number: PageNumber,
        reason: String,
    },

    #[error("Unknown page type: {0}")]
    UnknownPageType(u8),

    #[error("Invalid page size: {expected} bytes, got {actual} bytes")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Query execution error: {details}")]
    ExecutionError { details: String },

    #[error("Unsupported: {details}")]
    Unsupported { details: String },

    #[error("Corrupted tree: {reason}")]
    CorruptedTree { reason: String },
}
