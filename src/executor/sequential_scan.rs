use crate::{
    executor::scan::Scanner,
    storage::bplus_tree::{BPlusTree, Keyed, NodeId},
    types::error::DatabaseError,
};

/// Full scan along the leaf chain, never revisiting internal nodes.
pub struct SequentialScanner<'a, T: Keyed> {
    tree: &'a BPlusTree<T>,
    current_leaf: Option<NodeId>,
    current_slot_index: usize,
    is_exhausted: bool,
}

impl<'a, T: Keyed> SequentialScanner<'a, T> {
    pub fn new(tree: &'a BPlusTree<T>) -> Self {
        Self {
            tree,
            current_leaf: None,
            current_slot_index: 0,
            is_exhausted: false,
        }
    }

    fn position(&mut self) -> Option<NodeId> {
        if self.is_exhausted {
            return None;
        }
        if self.current_leaf.is_none() {
            self.current_leaf = Some(self.tree.first_leaf());
            self.current_slot_index = 0;
        }
        self.current_leaf
    }

    fn advance_leaf(&mut self, leaf: NodeId) {
        self.current_leaf = self.tree.leaf(leaf).next();
        self.current_slot_index = 0;
        if self.current_leaf.is_none() {
            self.is_exhausted = true;
        }
    }

    /// The unread rest of the current leaf, then each following leaf whole.
    pub fn next_leaf(&mut self) -> Option<&'a [T]> {
        let tree = self.tree;
        let leaf = self.position()?;
        let entries = &tree.entries(leaf)[self.current_slot_index..];
        self.advance_leaf(leaf);
        Some(entries)
    }
}

impl<'a, T: Keyed> Scanner for SequentialScanner<'a, T> {
    type Item = &'a T;

    fn scan(&mut self) -> Result<Option<&'a T>, DatabaseError> {
        let tree = self.tree;
        while let Some(leaf) = self.position() {
            let entries = tree.entries(leaf);
            if self.current_slot_index < entries.len() {
                let entry = &entries[self.current_slot_index];
                self.current_slot_index += 1;
                return Ok(Some(entry));
            }
            self.advance_leaf(leaf);
        }
        Ok(None)
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<&'a T>, DatabaseError> {
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            match self.scan()? {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }
        Ok(batch)
    }

    fn reset(&mut self) -> Result<(), DatabaseError> {
        self.current_leaf = None;
        self.current_slot_index = 0;
        self.is_exhausted = false;
        Ok(())
    }
}
