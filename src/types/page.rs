use crate::{
    storage::header::{PageHeader, PageType},
    types::{
        CELL_OFFSET_SIZE, NO_PAGE, PAGE_HEADER_SIZE, PageNumber, ROUTER_CELL_SIZE,
        entry::RouterCell, error::DatabaseError, record::Record,
    },
};

/*
 * Page layout (page_size bytes, big-endian)
 * ┌─────────────────────────────────────────────────────────────────┐
 * │                    PAGE HEADER (16 bytes)                       │
 * ├─────────────────────────────────────────────────────────────────┤
 * │  CELL OFFSETS: [cell0(2)] [cell1(2)] ... in serialization order │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                    ZERO PADDING                                 │
 * ├─────────────────────────────────────────────────────────────────┤
 * │  CELL DATA:  [...cell N...] ... [...cell 1...] [...cell 0...]   │
 * └─────────────────────────────────────────────────────────────────┘
 * Cell 0 ends at the last byte of the page; each later cell sits
 * directly before the previous one.
 */

/// Leaf page of a table tree: whole records, in key order.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafPage {
    pub page_number: PageNumber,
    pub parent: PageNumber,
    /// Next leaf in key order, `NO_PAGE` for the last leaf.
    pub next_leaf: PageNumber,
    pub records: Vec<Record>,
}

/// Interior page: one router per child except the last, which lives in the header.
#[derive(Debug, Clone, PartialEq)]
pub struct InteriorPage {
    pub page_number: PageNumber,
    pub parent: PageNumber,
    pub right_pointer: PageNumber,
    pub cells: Vec<RouterCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Leaf(LeafPage),
    Interior(InteriorPage),
}

impl LeafPage {
    pub fn new(page_number: PageNumber) -> Self {
        Self {
            page_number,
            parent: NO_PAGE,
            next_leaf: NO_PAGE,
            records: Vec::new(),
        }
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    /// Bytes this page needs, before padding.
    pub fn encoded_size(&self) -> usize {
        PAGE_HEADER_SIZE
            + self
                .records
                .iter()
                .map(|r| CELL_OFFSET_SIZE + r.size())
                .sum::<usize>()
    }

    pub fn fits(&self, page_size: usize) -> bool {
        self.encoded_size() <= page_size
    }

    pub fn to_byte_stream(&self, page_size: usize) -> Result<Vec<u8>, DatabaseError> {
        let cells = self
            .records
            .iter()
            .map(Record::to_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        let header = PageHeader {
            right_pointer: self.next_leaf,
            parent: self.parent,
            ..PageHeader::new(PageType::LeafTable, page_size)
        };
        write_page(header, &cells, page_size, self.page_number)
    }

    pub fn from_byte_stream(bytes: &[u8], page_number: PageNumber) -> Result<Self, DatabaseError> {
        match Page::from_byte_stream(bytes, page_number)? {
            Page::Leaf(page) => Ok(page),
            Page::Interior(_) => Err(DatabaseError::MalformedPage {
                page_number,
                reason: "Expected a leaf page, found an interior page".to_string(),
            }),
        }
    }
}

impl InteriorPage {
    /// Child page numbers in key order, the right pointer last.
    pub fn children(&self) -> Vec<PageNumber> {
        let mut children: Vec<PageNumber> = self.cells.iter().map(|c| c.child_page).collect();
        if self.right_pointer != NO_PAGE {
            children.push(self.right_pointer);
        }
        children
    }

    pub fn encoded_size(&self) -> usize {
        PAGE_HEADER_SIZE + self.cells.len() * (CELL_OFFSET_SIZE + ROUTER_CELL_SIZE)
    }

    pub fn fits(&self, page_size: usize) -> bool {
        self.encoded_size() <= page_size
    }

    pub fn to_byte_stream(&self, page_size: usize) -> Result<Vec<u8>, DatabaseError> {
        let cells: Vec<Vec<u8>> = self.cells.iter().map(|c| c.to_bytes().to_vec()).collect();
        let header = PageHeader {
            right_pointer: self.right_pointer,
            parent: self.parent,
            ..PageHeader::new(PageType::InteriorTable, page_size)
        };
        write_page(header, &cells, page_size, self.page_number)
    }

    pub fn from_byte_stream(bytes: &[u8], page_number: PageNumber) -> Result<Self, DatabaseError> {
        match Page::from_byte_stream(bytes, page_number)? {
            Page::Interior(page) => Ok(page),
            Page::Leaf(_) => Err(DatabaseError::MalformedPage {
                page_number,
                reason: "Expected an interior page, found a leaf page".to_string(),
            }),
        }
    }
}

impl Page {
    pub fn page_number(&self) -> PageNumber {
        match self {
            Page::Leaf(page) => page.page_number,
            Page::Interior(page) => page.page_number,
        }
    }

    pub fn parent(&self) -> PageNumber {
        match self {
            Page::Leaf(page) => page.parent,
            Page::Interior(page) => page.parent,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Page::Leaf(_))
    }

    pub fn to_byte_stream(&self, page_size: usize) -> Result<Vec<u8>, DatabaseError> {
        match self {
            Page::Leaf(page) => page.to_byte_stream(page_size),
            Page::Interior(page) => page.to_byte_stream(page_size),
        }
    }

    /// Parse one page; the page size is the length of `bytes`.
    pub fn from_byte_stream(bytes: &[u8], page_number: PageNumber) -> Result<Self, DatabaseError> {
        let header = PageHeader::from_bytes(bytes, page_number)?;
        let page_size = bytes.len();
        let num_cells = header.num_cells as usize;
        let offsets_end = PAGE_HEADER_SIZE + num_cells * CELL_OFFSET_SIZE;

        if offsets_end > page_size || (header.content_start as usize) < offsets_end {
            return Err(DatabaseError::MalformedPage {
                page_number,
                reason: format!(
                    "{} cells do not fit a {} byte page (content starts at {})",
                    num_cells, page_size, header.content_start
                ),
            });
        }

        let offsets = bytes[PAGE_HEADER_SIZE..offsets_end]
            .chunks_exact(CELL_OFFSET_SIZE)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as usize);

        let mut cells = Vec::with_capacity(num_cells);
        for offset in offsets {
            if offset < offsets_end || offset >= page_size {
                return Err(DatabaseError::MalformedPage {
                    page_number,
                    reason: format!("Cell offset {} outside the content area", offset),
                });
            }
            cells.push(&bytes[offset..]);
        }

        match header.page_type {
            PageType::LeafTable => {
                let records = cells
                    .into_iter()
                    .map(Record::from_bytes)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| DatabaseError::MalformedPage {
                        page_number,
                        reason: e.to_string(),
                    })?;
                Ok(Page::Leaf(LeafPage {
                    page_number,
                    parent: header.parent,
                    next_leaf: header.right_pointer,
                    records,
                }))
            }
            PageType::InteriorTable => {
                let cells = cells
                    .into_iter()
                    .map(RouterCell::from_bytes)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Page::Interior(InteriorPage {
                    page_number,
                    parent: header.parent,
                    right_pointer: header.right_pointer,
                    cells,
                }))
            }
            PageType::InteriorIndex | PageType::LeafIndex => Err(DatabaseError::Unsupported {
                details: format!("Index page {} cannot be read as table data", page_number),
            }),
        }
    }
}

fn write_page(
    mut header: PageHeader,
    cells: &[Vec<u8>],
    page_size: usize,
    page_number: PageNumber,
) -> Result<Vec<u8>, DatabaseError> {
    if page_size > u16::MAX as usize {
        return Err(DatabaseError::InvalidPageSize {
            expected: u16::MAX as usize,
            actual: page_size,
        });
    }
    let required = PAGE_HEADER_SIZE
        + cells
            .iter()
            .map(|c| CELL_OFFSET_SIZE + c.len())
            .sum::<usize>();
    if required > page_size {
        return Err(DatabaseError::PageFull {
            page_number,
            required,
            available: page_size,
        });
    }

    let mut buffer = vec![0u8; page_size];
    let mut content_start = page_size;
    let mut offset = PAGE_HEADER_SIZE;

    for cell in cells {
        content_start -= cell.len();
        buffer[content_start..content_start + cell.len()].copy_from_slice(cell);
        buffer[offset..offset + CELL_OFFSET_SIZE]
            .copy_from_slice(&(content_start as u16).to_be_bytes());
        offset += CELL_OFFSET_SIZE;
    }

    header.num_cells = cells.len() as u16;
    header.content_start = content_start as u16;
    buffer[..PAGE_HEADER_SIZE].copy_from_slice(&header.to_bytes());

    Ok(buffer)
}
