use std::{fmt::Debug, mem};

use log::{debug, trace};

use crate::{
    config::MIN_DEGREE,
    types::{RowId, error::DatabaseError, record::Record},
};

/// Index of a node inside one of the tree's arenas.
pub type NodeId = usize;

/// Anything the tree can order: it only ever looks at `key()`.
pub trait Keyed {
    type Key: Ord + Copy + Debug;

    fn key(&self) -> Self::Key;
}

impl Keyed for u32 {
    type Key = u32;

    fn key(&self) -> u32 {
        *self
    }
}

/// Couples a row id with an opaque payload. The id is fixed at construction,
/// so handing out `&mut` to the payload can never reorder the tree.
#[derive(Debug, Clone)]
pub struct KeyPointer<T> {
    id: RowId,
    pub data: T,
}

impl<T> KeyPointer<T> {
    pub fn new(data: T, extract: impl FnOnce(&T) -> RowId) -> Self {
        let id = extract(&data);
        Self { id, data }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl From<Record> for KeyPointer<Record> {
    fn from(record: Record) -> Self {
        KeyPointer::new(record, Record::row_id)
    }
}

impl<T> Keyed for KeyPointer<T> {
    type Key = RowId;

    fn key(&self) -> RowId {
        self.id
    }
}

impl<T> PartialEq for KeyPointer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for KeyPointer<T> {}

impl<T> PartialOrd for KeyPointer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for KeyPointer<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> PartialEq<RowId> for KeyPointer<T> {
    fn eq(&self, other: &RowId) -> bool {
        self.id == *other
    }
}

impl<T> PartialOrd<RowId> for KeyPointer<T> {
    fn partial_cmp(&self, other: &RowId) -> Option<std::cmp::Ordering> {
        self.id.partial_cmp(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Leaf(NodeId),
    Internal(NodeId),
}

#[derive(Debug, Clone)]
pub struct LeafNode<T> {
    entries: Vec<T>,
    parent: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl<T> LeafNode<T> {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            parent: None,
            prev: None,
            next: None,
        }
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

#[derive(Debug, Clone)]
pub struct InternalNode<K> {
    keys: Vec<K>,
    children: Vec<NodeRef>,
    parent: Option<NodeId>,
}

impl<K> InternalNode<K> {
    fn empty() -> Self {
        Self {
            keys: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// In-memory B+Tree over two node arenas.
///
/// `min_degree` (t) counts pointers: non-root leaves hold `t..=2t-1` entries,
/// non-root internal nodes hold `t..=2t` children. Leaves form a doubly linked
/// chain in key order. Freed arena slots are recycled.
#[derive(Debug, Clone)]
pub struct BPlusTree<T: Keyed> {
    leaves: Vec<LeafNode<T>>,
    internals: Vec<InternalNode<T::Key>>,
    free_leaves: Vec<NodeId>,
    free_internals: Vec<NodeId>,
    root: NodeRef,
    min_degree: usize,
    len: usize,
}

impl<T: Keyed> BPlusTree<T> {
    pub fn new(min_degree: usize) -> Result<Self, DatabaseError> {
        if min_degree < MIN_DEGREE {
            return Err(DatabaseError::InvalidConfig {
                reason: format!(
                    "min_degree must be at least {}, got {}",
                    MIN_DEGREE, min_degree
                ),
            });
        }
        Ok(Self {
            leaves: vec![LeafNode::empty()],
            internals: Vec::new(),
            free_leaves: Vec::new(),
            free_internals: Vec::new(),
            root: NodeRef::Leaf(0),
            min_degree,
            len: 0,
        })
    }

    pub fn min_degree(&self) -> usize {
        self.min_degree
    }

    pub fn max_keys(&self) -> usize {
        2 * self.min_degree - 1
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Drop every entry, leaving a single empty root leaf.
    pub fn clear(&mut self) {
        self.leaves = vec![LeafNode::empty()];
        self.internals.clear();
        self.free_leaves.clear();
        self.free_internals.clear();
        self.root = NodeRef::Leaf(0);
        self.len = 0;
    }

    pub fn leaf(&self, id: NodeId) -> &LeafNode<T> {
        &self.leaves[id]
    }

    pub fn internal(&self, id: NodeId) -> &InternalNode<T::Key> {
        &self.internals[id]
    }

    pub fn entries(&self, leaf: NodeId) -> &[T] {
        &self.leaves[leaf].entries
    }

    /// Mutable access to a leaf's entries. Callers must not change keys.
    pub fn entries_mut(&mut self, leaf: NodeId) -> &mut [T] {
        &mut self.leaves[leaf].entries
    }

    /// Number of levels, a lone root leaf being 1.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = self.root;
        while let NodeRef::Internal(id) = node {
            node = self.internals[id].children[0];
            height += 1;
        }
        height
    }

    pub fn first_leaf(&self) -> NodeId {
        let mut node = self.root;
        loop {
            match node {
                NodeRef::Leaf(id) => return id,
                NodeRef::Internal(id) => node = self.internals[id].children[0],
            }
        }
    }

    pub fn last_leaf(&self) -> NodeId {
        let mut node = self.root;
        loop {
            match node {
                NodeRef::Leaf(id) => return id,
                NodeRef::Internal(id) => {
                    let children = &self.internals[id].children;
                    node = children[children.len() - 1];
                }
            }
        }
    }

    /// Leaves in chain order, starting from the leftmost.
    pub fn leaf_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut current = Some(self.first_leaf());
        while let Some(id) = current {
            if ids.len() > self.leaves.len() {
                break;
            }
            ids.push(id);
            current = self.leaves[id].next;
        }
        ids
    }

    /// Every live node, children before their parent, left to right.
    pub fn post_order(&self) -> Vec<NodeRef> {
        let mut order = Vec::new();
        self.collect_post_order(self.root, &mut order);
        order
    }

    fn collect_post_order(&self, node: NodeRef, order: &mut Vec<NodeRef>) {
        if let NodeRef::Internal(id) = node {
            for child in &self.internals[id].children {
                self.collect_post_order(*child, order);
            }
        }
        order.push(node);
    }

    fn find_leaf(&self, key: T::Key) -> NodeId {
        let mut node = self.root;
        loop {
            match node {
                NodeRef::Leaf(id) => return id,
                NodeRef::Internal(id) => {
                    let internal = &self.internals[id];
                    let index = internal.keys.partition_point(|k| *k <= key);
                    node = internal.children[index];
                }
            }
        }
    }

    /// Leaf that would hold `key`, and the key's index there if present.
    pub fn search(&self, key: T::Key) -> (NodeId, Option<usize>) {
        let leaf = self.find_leaf(key);
        let index = self.leaves[leaf]
            .entries
            .binary_search_by(|e| e.key().cmp(&key))
            .ok();
        (leaf, index)
    }

    pub fn get(&self, key: T::Key) -> Option<&T> {
        match self.search(key) {
            (leaf, Some(index)) => Some(&self.leaves[leaf].entries[index]),
            (_, None) => None,
        }
    }

    pub fn get_mut(&mut self, key: T::Key) -> Option<&mut T> {
        match self.search(key) {
            (leaf, Some(index)) => Some(&mut self.leaves[leaf].entries[index]),
            (_, None) => None,
        }
    }

    pub fn contains(&self, key: T::Key) -> bool {
        self.search(key).1.is_some()
    }

    pub fn find(&self, key: T::Key) -> Result<&T, DatabaseError> {
        self.get(key).ok_or_else(|| DatabaseError::KeyNotFound {
            key: format!("{:?}", key),
        })
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: self,
            front: Some((self.first_leaf(), 0)),
            back: {
                let last = self.last_leaf();
                Some((last, self.leaves[last].entries.len()))
            },
            remaining: self.len,
        }
    }

    pub fn insert(&mut self, item: T) -> Result<(), DatabaseError> {
        let key = item.key();
        let leaf = self.find_leaf(key);
        let entries = &mut self.leaves[leaf].entries;
        let position = match entries.binary_search_by(|e| e.key().cmp(&key)) {
            Ok(_) => {
                return Err(DatabaseError::DuplicateKey {
                    key: format!("{:?}", key),
                });
            }
            Err(position) => position,
        };
        entries.insert(position, item);
        self.len += 1;

        if self.leaves[leaf].entries.len() > self.max_keys() {
            self.split_leaf(leaf)?;
        }
        Ok(())
    }

    /// The lower half moves to a new leaf linked in before `id`; the first key
    /// of the upper half becomes the separator.
    fn split_leaf(&mut self, id: NodeId) -> Result<(), DatabaseError> {
        let t = self.min_degree;
        let lower: Vec<T> = self.leaves[id].entries.drain(..t).collect();
        let separator = self.leaves[id].entries[0].key();
        let prev = self.leaves[id].prev;
        let parent = self.leaves[id].parent;

        let new_leaf = self.alloc_leaf(LeafNode {
            entries: lower,
            parent,
            prev,
            next: Some(id),
        });
        self.leaves[id].prev = Some(new_leaf);
        if let Some(prev) = prev {
            self.leaves[prev].next = Some(new_leaf);
        }

        trace!("split leaf {} at {:?} into {}", id, separator, new_leaf);
        self.promote(NodeRef::Leaf(new_leaf), NodeRef::Leaf(id), separator)
    }

    /// The median key leaves the node entirely and moves up.
    fn split_internal(&mut self, id: NodeId) -> Result<(), DatabaseError> {
        let t = self.min_degree;
        let node = &mut self.internals[id];
        let left_keys: Vec<T::Key> = node.keys.drain(..t).collect();
        let median = node.keys.remove(0);
        let left_children: Vec<NodeRef> = node.children.drain(..=t).collect();
        let parent = node.parent;

        let new_node = self.alloc_internal(InternalNode {
            keys: left_keys,
            children: left_children,
            parent,
        });
        self.adopt_children(new_node);

        trace!("split internal {} at {:?} into {}", id, median, new_node);
        self.promote(NodeRef::Internal(new_node), NodeRef::Internal(id), median)
    }

    /// Hook a freshly split `left` into the parent of `right`, growing a new
    /// root when `right` was the root.
    fn promote(
        &mut self,
        left: NodeRef,
        right: NodeRef,
        separator: T::Key,
    ) -> Result<(), DatabaseError> {
        match self.parent_of(right) {
            None => {
                let root = self.alloc_internal(InternalNode {
                    keys: vec![separator],
                    children: vec![left, right],
                    parent: None,
                });
                self.set_parent(left, Some(root));
                self.set_parent(right, Some(root));
                self.root = NodeRef::Internal(root);
                debug!("tree grew to height {}", self.height());
                Ok(())
            }
            Some(parent) => {
                let position = self.child_position(parent, right)?;
                self.insert_up(parent, position, separator, left)
            }
        }
    }

    fn insert_up(
        &mut self,
        parent: NodeId,
        position: usize,
        separator: T::Key,
        left: NodeRef,
    ) -> Result<(), DatabaseError> {
        let node = &mut self.internals[parent];
        node.keys.insert(position, separator);
        node.children.insert(position, left);
        self.set_parent(left, Some(parent));

        if self.internals[parent].children.len() > 2 * self.min_degree {
            self.split_internal(parent)?;
        }
        Ok(())
    }

    pub fn delete(&mut self, key: T::Key) -> Result<T, DatabaseError> {
        let (leaf, index) = self.search(key);
        let index = index.ok_or_else(|| DatabaseError::KeyNotFound {
            key: format!("{:?}", key),
        })?;
        let item = self.leaves[leaf].entries.remove(index);
        self.len -= 1;

        if self.leaves[leaf].parent.is_some()
            && self.leaves[leaf].entries.len() < self.min_degree
        {
            self.rebalance_leaf(leaf)?;
        }
        Ok(item)
    }

    fn rebalance_leaf(&mut self, id: NodeId) -> Result<(), DatabaseError> {
        let Some(parent) = self.leaves[id].parent else {
            return Ok(());
        };
        let t = self.min_degree;
        let position = self.child_position(parent, NodeRef::Leaf(id))?;
        let (left, right) = self.siblings(parent, position);
        let len = self.leaves[id].entries.len();

        if let Some(NodeRef::Leaf(right)) = right {
            if len + self.leaves[right].entries.len() <= self.max_keys() {
                debug!("merging leaf {} into {}", right, id);
                self.merge_leaves(id, right, parent, position);
                return self.after_merge(parent);
            }
        }
        if let Some(NodeRef::Leaf(left)) = left {
            if self.leaves[left].entries.len() + len <= self.max_keys() {
                debug!("merging leaf {} into {}", id, left);
                self.merge_leaves(left, id, parent, position - 1);
                return self.after_merge(parent);
            }
        }
        if let Some(NodeRef::Leaf(right)) = right {
            while self.leaves[id].entries.len() < t && self.leaves[right].entries.len() > t {
                let moved = self.leaves[right].entries.remove(0);
                self.leaves[id].entries.push(moved);
                self.internals[parent].keys[position] = self.leaves[right].entries[0].key();
            }
            debug!("leaf {} borrowed from right sibling {}", id, right);
            return Ok(());
        }
        if let Some(NodeRef::Leaf(left)) = left {
            while self.leaves[id].entries.len() < t && self.leaves[left].entries.len() > t {
                let Some(moved) = self.leaves[left].entries.pop() else {
                    break;
                };
                self.leaves[id].entries.insert(0, moved);
                self.internals[parent].keys[position - 1] = self.leaves[id].entries[0].key();
            }
            debug!("leaf {} borrowed from left sibling {}", id, left);
            return Ok(());
        }

        Err(DatabaseError::CorruptedTree {
            reason: format!("leaf {} has no sibling to rebalance with", id),
        })
    }

    fn rebalance_internal(&mut self, id: NodeId) -> Result<(), DatabaseError> {
        let Some(parent) = self.internals[id].parent else {
            return Ok(());
        };
        let t = self.min_degree;
        let position = self.child_position(parent, NodeRef::Internal(id))?;
        let (left, right) = self.siblings(parent, position);
        let count = self.internals[id].children.len();

        if let Some(NodeRef::Internal(right)) = right {
            if count + self.internals[right].children.len() <= 2 * t {
                debug!("merging internal {} into {}", right, id);
                self.merge_internals(id, right, parent, position);
                return self.after_merge(parent);
            }
        }
        if let Some(NodeRef::Internal(left)) = left {
            if self.internals[left].children.len() + count <= 2 * t {
                debug!("merging internal {} into {}", id, left);
                self.merge_internals(left, id, parent, position - 1);
                return self.after_merge(parent);
            }
        }
        if let Some(NodeRef::Internal(right)) = right {
            while self.internals[id].children.len() < t && self.internals[right].children.len() > t
            {
                let up = self.internals[right].keys.remove(0);
                let down = mem::replace(&mut self.internals[parent].keys[position], up);
                let child = self.internals[right].children.remove(0);
                self.internals[id].keys.push(down);
                self.internals[id].children.push(child);
                self.set_parent(child, Some(id));
            }
            debug!("internal {} borrowed from right sibling {}", id, right);
            return Ok(());
        }
        if let Some(NodeRef::Internal(left)) = left {
            while self.internals[id].children.len() < t && self.internals[left].children.len() > t {
                let (Some(up), Some(child)) = (
                    self.internals[left].keys.pop(),
                    self.internals[left].children.pop(),
                ) else {
                    break;
                };
                let down = mem::replace(&mut self.internals[parent].keys[position - 1], up);
                self.internals[id].keys.insert(0, down);
                self.internals[id].children.insert(0, child);
                self.set_parent(child, Some(id));
            }
            debug!("internal {} borrowed from left sibling {}", id, left);
            return Ok(());
        }

        Err(DatabaseError::CorruptedTree {
            reason: format!("internal node {} has no sibling to rebalance with", id),
        })
    }

    /// Fold `right` into `left`; `separator` is the parent key between them.
    fn merge_leaves(&mut self, left: NodeId, right: NodeId, parent: NodeId, separator: usize) {
        let moved = mem::take(&mut self.leaves[right].entries);
        let next = self.leaves[right].next;
        self.leaves[left].entries.extend(moved);
        self.leaves[left].next = next;
        if let Some(next) = next {
            self.leaves[next].prev = Some(left);
        }

        self.internals[parent].keys.remove(separator);
        self.internals[parent].children.remove(separator + 1);
        self.free_leaf(right);
    }

    /// The parent separator comes down between the two key lists.
    fn merge_internals(&mut self, left: NodeId, right: NodeId, parent: NodeId, separator: usize) {
        let down = self.internals[parent].keys.remove(separator);
        self.internals[parent].children.remove(separator + 1);

        let keys = mem::take(&mut self.internals[right].keys);
        let children = mem::take(&mut self.internals[right].children);
        for child in &children {
            self.set_parent(*child, Some(left));
        }
        let node = &mut self.internals[left];
        node.keys.push(down);
        node.keys.extend(keys);
        node.children.extend(children);
        self.free_internal(right);
    }

    /// A parent lost a child: collapse an emptied root or keep rebalancing upward.
    fn after_merge(&mut self, id: NodeId) -> Result<(), DatabaseError> {
        let node = &self.internals[id];
        match node.parent {
            None => {
                if node.children.len() == 1 {
                    let child = node.children[0];
                    self.set_parent(child, None);
                    self.free_internal(id);
                    self.root = child;
                    debug!("tree shrank to height {}", self.height());
                }
                Ok(())
            }
            Some(_) if node.children.len() < self.min_degree => self.rebalance_internal(id),
            Some(_) => Ok(()),
        }
    }

    fn siblings(&self, parent: NodeId, position: usize) -> (Option<NodeRef>, Option<NodeRef>) {
        let children = &self.internals[parent].children;
        let left = position.checked_sub(1).map(|i| children[i]);
        let right = children.get(position + 1).copied();
        (left, right)
    }

    fn child_position(&self, parent: NodeId, child: NodeRef) -> Result<usize, DatabaseError> {
        self.internals[parent]
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| DatabaseError::CorruptedTree {
                reason: format!("{:?} is missing from its parent {}", child, parent),
            })
    }

    fn parent_of(&self, node: NodeRef) -> Option<NodeId> {
        match node {
            NodeRef::Leaf(id) => self.leaves[id].parent,
            NodeRef::Internal(id) => self.internals[id].parent,
        }
    }

    fn set_parent(&mut self, node: NodeRef, parent: Option<NodeId>) {
        match node {
            NodeRef::Leaf(id) => self.leaves[id].parent = parent,
            NodeRef::Internal(id) => self.internals[id].parent = parent,
        }
    }

    fn adopt_children(&mut self, id: NodeId) {
        for index in 0..self.internals[id].children.len() {
            let child = self.internals[id].children[index];
            self.set_parent(child, Some(id));
        }
    }

    fn alloc_leaf(&mut self, node: LeafNode<T>) -> NodeId {
        match self.free_leaves.pop() {
            Some(id) => {
                self.leaves[id] = node;
                id
            }
            None => {
                self.leaves.push(node);
                self.leaves.len() - 1
            }
        }
    }

    fn alloc_internal(&mut self, node: InternalNode<T::Key>) -> NodeId {
        match self.free_internals.pop() {
            Some(id) => {
                self.internals[id] = node;
                id
            }
            None => {
                self.internals.push(node);
                self.internals.len() - 1
            }
        }
    }

    fn free_leaf(&mut self, id: NodeId) {
        self.leaves[id] = LeafNode::empty();
        self.free_leaves.push(id);
    }

    fn free_internal(&mut self, id: NodeId) {
        self.internals[id] = InternalNode::empty();
        self.free_internals.push(id);
    }

    /// Verify occupancy, ordering, separator bounds, parent links, uniform
    /// leaf depth and the leaf chain.
    pub fn check_integrity(&self) -> Result<(), DatabaseError> {
        let mut walk = IntegrityWalk {
            leaf_depth: None,
            leaves: Vec::new(),
            count: 0,
        };
        self.check_node(self.root, None, None, None, 1, &mut walk)?;

        if walk.count != self.len {
            return Err(corrupted(format!(
                "tree holds {} entries but reports {}",
                walk.count, self.len
            )));
        }

        let chain = self.leaf_ids();
        if chain != walk.leaves {
            return Err(corrupted(format!(
                "leaf chain {:?} differs from in-order leaves {:?}",
                chain, walk.leaves
            )));
        }
        let mut prev = None;
        for id in chain {
            if self.leaves[id].prev != prev {
                return Err(corrupted(format!(
                    "leaf {} points back to {:?}, expected {:?}",
                    id, self.leaves[id].prev, prev
                )));
            }
            prev = Some(id);
        }
        Ok(())
    }

    fn check_node(
        &self,
        node: NodeRef,
        parent: Option<NodeId>,
        lower: Option<T::Key>,
        upper: Option<T::Key>,
        depth: usize,
        walk: &mut IntegrityWalk,
    ) -> Result<(), DatabaseError> {
        let t = self.min_degree;
        let is_root = parent.is_none();
        if self.parent_of(node) != parent {
            return Err(corrupted(format!(
                "{:?} has parent {:?}, expected {:?}",
                node,
                self.parent_of(node),
                parent
            )));
        }

        match node {
            NodeRef::Leaf(id) => {
                let entries = &self.leaves[id].entries;
                if entries.len() > self.max_keys() || (!is_root && entries.len() < t) {
                    return Err(corrupted(format!(
                        "leaf {} holds {} entries",
                        id,
                        entries.len()
                    )));
                }
                check_sorted(entries.iter().map(Keyed::key), lower, upper)
                    .map_err(|reason| corrupted(format!("leaf {}: {}", id, reason)))?;

                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(corrupted(format!(
                            "leaf {} at depth {}, expected {}",
                            id, depth, expected
                        )));
                    }
                    Some(_) => {}
                }
                walk.leaves.push(id);
                walk.count += entries.len();
            }
            NodeRef::Internal(id) => {
                let internal = &self.internals[id];
                let children = internal.children.len();
                let min_children = if is_root { 2 } else { t };
                if children != internal.keys.len() + 1
                    || children < min_children
                    || children > 2 * t
                {
                    return Err(corrupted(format!(
                        "internal {} has {} keys and {} children",
                        id,
                        internal.keys.len(),
                        children
                    )));
                }
                check_sorted(internal.keys.iter().copied(), lower, upper)
                    .map_err(|reason| corrupted(format!("internal {}: {}", id, reason)))?;

                for (index, child) in internal.children.iter().enumerate() {
                    let child_lower = if index == 0 {
                        lower
                    } else {
                        Some(internal.keys[index - 1])
                    };
                    let child_upper = internal.keys.get(index).copied().or(upper);
                    self.check_node(*child, Some(id), child_lower, child_upper, depth + 1, walk)?;
                }
            }
        }
        Ok(())
    }
}

struct IntegrityWalk {
    leaf_depth: Option<usize>,
    leaves: Vec<NodeId>,
    count: usize,
}

fn corrupted(reason: String) -> DatabaseError {
    DatabaseError::CorruptedTree { reason }
}

/// Strictly ascending and inside `[lower, upper)`.
fn check_sorted<K: Ord + Debug>(
    keys: impl Iterator<Item = K>,
    lower: Option<K>,
    upper: Option<K>,
) -> Result<(), String> {
    let mut previous: Option<K> = None;
    for key in keys {
        if let Some(prev) = &previous {
            if *prev >= key {
                return Err(format!("{:?} follows {:?}", key, prev));
            }
        }
        if let Some(lower) = &lower {
            if key < *lower {
                return Err(format!("{:?} below separator {:?}", key, lower));
            }
        }
        if let Some(upper) = &upper {
            if key >= *upper {
                return Err(format!("{:?} not below separator {:?}", key, upper));
            }
        }
        previous = Some(key);
    }
    Ok(())
}

/// Walks the leaf chain from both ends without touching internal nodes.
pub struct Iter<'a, T: Keyed> {
    tree: &'a BPlusTree<T>,
    front: Option<(NodeId, usize)>,
    back: Option<(NodeId, usize)>,
    remaining: usize,
}

impl<'a, T: Keyed> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        loop {
            let (leaf, index) = self.front?;
            let node = &tree.leaves[leaf];
            if index < node.entries.len() {
                self.front = Some((leaf, index + 1));
                self.remaining -= 1;
                return Some(&node.entries[index]);
            }
            self.front = node.next.map(|next| (next, 0));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Keyed> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        loop {
            let (leaf, end) = self.back?;
            let node = &tree.leaves[leaf];
            if end > 0 {
                self.back = Some((leaf, end - 1));
                self.remaining -= 1;
                return Some(&node.entries[end - 1]);
            }
            self.back = node
                .prev
                .map(|prev| (prev, tree.leaves[prev].entries.len()));
        }
    }
}

impl<T: Keyed> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T: Keyed> IntoIterator for &'a BPlusTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
