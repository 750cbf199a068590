use serde::{Deserialize, Serialize};

use crate::types::{
    CELL_OFFSET_SIZE, DEFAULT_PAGE_SIZE, PAGE_HEADER_SIZE, ROUTER_CELL_SIZE, error::DatabaseError,
};

pub const MIN_DEGREE: usize = 3;
pub const MIN_PAGE_SIZE: usize = 512;
pub const MAX_PAGE_SIZE: usize = 32768;

// Smallest useful record: header(7) + one id byte + a few payload bytes.
const MIN_RECORD_BUDGET: usize = 16;

/// Engine-wide settings threaded through tables and trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub page_size: usize,
    pub min_degree: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            min_degree: MIN_DEGREE,
        }
    }
}

impl EngineConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_min_degree(mut self, min_degree: usize) -> Self {
        self.min_degree = min_degree;
        self
    }

    /// Largest keys-per-node count for both leaves and internal nodes.
    pub fn max_keys(&self) -> usize {
        (2 * self.min_degree).saturating_sub(1)
    }

    /// Byte budget for a single encoded record.
    ///
    /// Derived from the key capacity so that a full leaf (`2t - 1` records
    /// plus their offsets and the page header) always fits in one page.
    pub fn max_record_bytes(&self) -> usize {
        (self.page_size.saturating_sub(PAGE_HEADER_SIZE) / (2 * self.min_degree.max(1)))
            .saturating_sub(CELL_OFFSET_SIZE)
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if !self.page_size.is_power_of_two()
            || self.page_size < MIN_PAGE_SIZE
            || self.page_size > MAX_PAGE_SIZE
        {
            return Err(DatabaseError::InvalidConfig {
                reason: format!(
                    "page size {} must be a power of two in {}..={}",
                    self.page_size, MIN_PAGE_SIZE, MAX_PAGE_SIZE
                ),
            });
        }
        if self.min_degree < MIN_DEGREE {
            return Err(DatabaseError::InvalidConfig {
                reason: format!("min degree {} is below {}", self.min_degree, MIN_DEGREE),
            });
        }
        let interior_bytes =
            PAGE_HEADER_SIZE + self.max_keys() * (ROUTER_CELL_SIZE + CELL_OFFSET_SIZE);
        if interior_bytes > self.page_size {
            return Err(DatabaseError::InvalidConfig {
                reason: format!(
                    "{} router cells do not fit a {} byte page",
                    self.max_keys(),
                    self.page_size
                ),
            });
        }
        if self.max_record_bytes() < MIN_RECORD_BUDGET {
            return Err(DatabaseError::InvalidConfig {
                reason: format!(
                    "record budget of {} bytes is too small (page size {}, min degree {})",
                    self.max_record_bytes(),
                    self.page_size,
                    self.min_degree
                ),
            });
        }
        Ok(())
    }
}
