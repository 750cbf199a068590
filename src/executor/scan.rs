use crate::types::error::DatabaseError;

pub trait Scanner {
    type Item;

    fn scan(&mut self) -> Result<Option<Self::Item>, DatabaseError>;
    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Self::Item>, DatabaseError>;
    fn reset(&mut self) -> Result<(), DatabaseError>;
}

pub struct ScanIterator<S: Scanner> {
    scanner: S,
}

impl<S: Scanner> ScanIterator<S> {
    pub fn new(scanner: S) -> Self {
        Self { scanner }
    }
}

impl<S: Scanner> Iterator for ScanIterator<S> {
    type Item = Result<S::Item, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.scanner.scan() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
