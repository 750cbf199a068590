pub mod entry;
pub mod error;
pub mod page;
pub mod record;
pub mod value;

// Common type aliases
pub type PageNumber = u32;
pub type RowId = u32;

pub const DEFAULT_PAGE_SIZE: usize = 512;
pub const PAGE_HEADER_SIZE: usize = 16;
pub const CELL_OFFSET_SIZE: usize = 2; // one u16 per cell in the offset array
pub const ROUTER_CELL_SIZE: usize = 8; // separator(4) + child page(4)

/// Marks an absent parent / sibling page in a page header.
pub const NO_PAGE: PageNumber = u32::MAX;

pub const MAX_TEXT_BYTES: usize = 115;
