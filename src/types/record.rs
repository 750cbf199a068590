use serde::{Deserialize, Serialize};

use crate::types::{
    RowId,
    error::DatabaseError,
    value::{ColumnCodec, DataType, Value},
};

/// payload_size(2) + row_id(4)
pub const CELL_PREFIX_SIZE: usize = 6;

/*
 * Record cell layout (big-endian)
 * ┌──────────────┬──────────┬───────────────┬──────────────────┬─────────────────┐
 * │ payload_size │  row_id  │  num_columns  │ type id × ncols  │ values × ncols  │
 * │     (2)      │   (4)    │      (1)      │   (1 each)       │   (variable)    │
 * └──────────────┴──────────┴───────────────┴──────────────────┴─────────────────┘
 * payload_size counts everything after row_id.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub row_id: RowId,
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(row_id: RowId, values: Vec<Value>) -> Self {
        Self { row_id, values }
    }

    pub fn row_id(&self) -> RowId {
        self.row_id
    }

    pub fn get_value(&self, column_index: usize) -> Option<&Value> {
        self.values.get(column_index)
    }

    pub fn set_value(&mut self, column_index: usize, value: Value) -> Result<(), DatabaseError> {
        if column_index >= self.values.len() {
            return Err(DatabaseError::ColumnIndexOutOfBounds {
                index: column_index,
            });
        }
        self.values[column_index] = value;
        Ok(())
    }

    pub fn num_columns(&self) -> usize {
        self.values.len()
    }

    /// num_columns byte, one id byte per column, then the encoded values.
    pub fn payload_size(&self) -> usize {
        1 + self.values.len() + self.values.iter().map(Value::size).sum::<usize>()
    }

    /// Full encoded cell size.
    pub fn size(&self) -> usize {
        CELL_PREFIX_SIZE + self.payload_size()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DatabaseError> {
        let num_columns = u8::try_from(self.values.len()).map_err(|_| {
            DatabaseError::SerializationError {
                details: format!("{} columns exceed the 255 column limit", self.values.len()),
            }
        })?;
        let payload_size = u16::try_from(self.payload_size()).map_err(|_| {
            DatabaseError::SerializationError {
                details: format!("payload of {} bytes is too large", self.payload_size()),
            }
        })?;

        let mut buffer = Vec::with_capacity(self.size());
        buffer.extend_from_slice(&payload_size.to_be_bytes());
        buffer.extend_from_slice(&self.row_id.to_be_bytes());
        buffer.push(num_columns);

        for value in &self.values {
            buffer.push(value.type_id_byte()?);
        }
        for value in &self.values {
            buffer.extend_from_slice(&value.to_bytes()?);
        }

        Ok(buffer)
    }

    /// Length of the cell starting at `bytes`, read from its payload_size field.
    pub fn cell_size(bytes: &[u8]) -> Result<usize, DatabaseError> {
        if bytes.len() < 2 {
            return Err(DatabaseError::SerializationError {
                details: "Incomplete payload size".to_string(),
            });
        }
        Ok(CELL_PREFIX_SIZE + u16::from_be_bytes([bytes[0], bytes[1]]) as usize)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        let cell_size = Self::cell_size(bytes)?;
        if bytes.len() < cell_size || cell_size < CELL_PREFIX_SIZE + 1 {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "Incomplete record: expected {} bytes, got {}",
                    cell_size,
                    bytes.len()
                ),
            });
        }
        let bytes = &bytes[..cell_size];

        let row_id = RowId::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        let num_columns = bytes[CELL_PREFIX_SIZE] as usize;
        let mut cursor = CELL_PREFIX_SIZE + 1;

        if cursor + num_columns > bytes.len() {
            return Err(DatabaseError::SerializationError {
                details: "Incomplete type id list".to_string(),
            });
        }
        let columns: Vec<(DataType, usize)> = bytes[cursor..cursor + num_columns]
            .iter()
            .map(|id| DataType::from_id_byte(*id))
            .collect();
        cursor += num_columns;

        let mut values = Vec::with_capacity(num_columns);
        for (data_type, len) in columns {
            if cursor + len > bytes.len() {
                return Err(DatabaseError::SerializationError {
                    details: format!(
                        "Insufficient bytes for {} value: expected {}, got {}",
                        data_type,
                        len,
                        bytes.len() - cursor
                    ),
                });
            }
            values.push(data_type.decode(&bytes[cursor..cursor + len])?);
            cursor += len;
        }

        if cursor != bytes.len() {
            return Err(DatabaseError::SerializationError {
                details: format!("{} trailing bytes after record", bytes.len() - cursor),
            });
        }

        Ok(Record { row_id, values })
    }
}
