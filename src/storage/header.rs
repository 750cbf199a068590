use crate::types::{NO_PAGE, PAGE_HEADER_SIZE, PageNumber, error::DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    InteriorIndex = 2,
    InteriorTable = 5,
    LeafIndex = 10,
    LeafTable = 13,
}

impl PageType {
    pub fn from_u8(value: u8) -> Result<Self, DatabaseError> {
        match value {
            2 => Ok(PageType::InteriorIndex),
            5 => Ok(PageType::InteriorTable),
            10 => Ok(PageType::LeafIndex),
            13 => Ok(PageType::LeafTable),
            _ => Err(DatabaseError::UnknownPageType(value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, PageType::LeafIndex | PageType::LeafTable)
    }
}

/*
 * Page header (16 bytes, big-endian)
 * page_type(1) | reserved(1) | num_cells(2) | content_start(2) |
 * right_pointer(4) | parent(4) | reserved(2)
 *
 * right_pointer: rightmost child for interior pages, next leaf for leaves.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub num_cells: u16,
    /// Offset where cell content begins; cells fill the page from here to the end.
    pub content_start: u16,
    pub right_pointer: PageNumber,
    pub parent: PageNumber,
}

impl PageHeader {
    pub fn new(page_type: PageType, page_size: usize) -> Self {
        Self {
            page_type,
            num_cells: 0,
            content_start: page_size as u16,
            right_pointer: NO_PAGE,
            parent: NO_PAGE,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent == NO_PAGE
    }

    pub fn to_bytes(&self) -> [u8; PAGE_HEADER_SIZE] {
        let mut buffer = [0u8; PAGE_HEADER_SIZE];
        buffer[0] = self.page_type.as_u8();
        buffer[2..4].copy_from_slice(&self.num_cells.to_be_bytes());
        buffer[4..6].copy_from_slice(&self.content_start.to_be_bytes());
        buffer[6..10].copy_from_slice(&self.right_pointer.to_be_bytes());
        buffer[10..14].copy_from_slice(&self.parent.to_be_bytes());
        buffer
    }

    pub fn from_bytes(bytes: &[u8], page_number: PageNumber) -> Result<Self, DatabaseError> {
        if bytes.len() < PAGE_HEADER_SIZE {
            return Err(DatabaseError::MalformedPage {
                page_number,
                reason: "Header too short".to_string(),
            });
        }

        let page_type = PageType::from_u8(bytes[0])?;
        let num_cells = u16::from_be_bytes([bytes[2], bytes[3]]);
        let content_start = u16::from_be_bytes([bytes[4], bytes[5]]);
        let right_pointer = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let parent = u32::from_be_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);

        Ok(Self {
            page_type,
            num_cells,
            content_start,
            right_pointer,
            parent,
        })
    }
}
