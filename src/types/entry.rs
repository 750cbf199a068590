use crate::types::{PageNumber, ROUTER_CELL_SIZE, RowId, error::DatabaseError};

/// Interior page entry: children left of `key` live in `child_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterCell {
    pub key: RowId,
    pub child_page: PageNumber,
}

impl RouterCell {
    pub fn new(key: RowId, child_page: PageNumber) -> Self {
        Self { key, child_page }
    }

    /// Serialize to the fixed 8-byte interior cell
    pub fn to_bytes(&self) -> [u8; ROUTER_CELL_SIZE] {
        let mut bytes = [0u8; ROUTER_CELL_SIZE];
        bytes[0..4].copy_from_slice(&self.key.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.child_page.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() < ROUTER_CELL_SIZE {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "Insufficient bytes for router cell: expected {}, got {}",
                    ROUTER_CELL_SIZE,
                    bytes.len()
                ),
            });
        }
        let key = RowId::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let child_page = PageNumber::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(Self::new(key, child_page))
    }
}
