use lumbung::{
    storage::bplus_tree::{BPlusTree, KeyPointer, NodeRef},
    types::{error::DatabaseError, record::Record, value::Value},
};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

fn shuffled(n: u32, seed: u64) -> Vec<u32> {
    let mut keys: Vec<u32> = (0..n).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

fn tree_of(keys: impl IntoIterator<Item = u32>) -> BPlusTree<u32> {
    let mut tree = BPlusTree::new(3).unwrap();
    for key in keys {
        tree.insert(key).unwrap();
    }
    tree
}

fn root_keys(tree: &BPlusTree<u32>) -> Vec<u32> {
    match tree.root() {
        NodeRef::Internal(id) => tree.internal(id).keys().to_vec(),
        NodeRef::Leaf(_) => Vec::new(),
    }
}

#[test]
fn test_min_degree_below_three_is_rejected() {
    assert!(matches!(
        BPlusTree::<u32>::new(2),
        Err(DatabaseError::InvalidConfig { .. })
    ));
}

#[test]
fn test_search_300k_shuffled_keys() {
    let keys = shuffled(300_000, 7);
    let tree = tree_of(keys.iter().copied());
    assert_eq!(tree.len(), 300_000);

    for key in keys {
        let (leaf, index) = tree.search(key);
        let index = index.unwrap();
        assert_eq!(tree.entries(leaf)[index], key);
    }
    let (_, missing) = tree.search(300_000);
    assert_eq!(missing, None);
    tree.check_integrity().unwrap();
}

#[test]
fn test_leaf_split_keeps_upper_half_in_place() {
    let mut tree = tree_of(1..=5);
    assert_eq!(tree.height(), 1);

    tree.insert(6).unwrap();
    assert_eq!(tree.height(), 2);
    assert_eq!(root_keys(&tree), vec![4]);

    let leaves = tree.leaf_ids();
    assert_eq!(leaves.len(), 2);
    assert_eq!(tree.entries(leaves[0]), &[1, 2, 3]);
    assert_eq!(tree.entries(leaves[1]), &[4, 5, 6]);
    assert_eq!(tree.leaf(leaves[1]).prev(), Some(leaves[0]));
    tree.check_integrity().unwrap();
}

#[test]
fn test_underflow_borrows_from_right_sibling() {
    let mut tree = tree_of(1..=7);
    assert_eq!(tree.delete(1).unwrap(), 1);

    assert_eq!(root_keys(&tree), vec![5]);
    let leaves = tree.leaf_ids();
    assert_eq!(tree.entries(leaves[0]), &[2, 3, 4]);
    assert_eq!(tree.entries(leaves[1]), &[5, 6, 7]);
    tree.check_integrity().unwrap();
}

#[test]
fn test_underflow_merges_and_collapses_root() {
    let mut tree = tree_of(1..=6);
    tree.delete(6).unwrap();

    assert_eq!(tree.height(), 1);
    assert!(matches!(tree.root(), NodeRef::Leaf(_)));
    assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    tree.check_integrity().unwrap();
}

#[test]
fn test_delete_everything_leaves_an_empty_root_leaf() {
    let keys = shuffled(5_000, 11);
    let mut tree = tree_of(keys.iter().copied());
    assert!(tree.height() > 3);

    let order = shuffled(5_000, 12);
    for (count, key) in order.iter().enumerate() {
        assert_eq!(tree.delete(*key).unwrap(), *key);
        if count % 499 == 0 {
            tree.check_integrity().unwrap();
        }
    }

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 1);
    match tree.root() {
        NodeRef::Leaf(id) => assert!(tree.entries(id).is_empty()),
        NodeRef::Internal(_) => panic!("root should be a leaf"),
    }
    tree.check_integrity().unwrap();
}

#[test]
fn test_missing_and_duplicate_keys_are_errors() {
    let mut tree = tree_of([10, 20, 30]);
    assert!(matches!(tree.delete(15), Err(DatabaseError::KeyNotFound { .. })));
    assert!(matches!(tree.insert(20), Err(DatabaseError::DuplicateKey { .. })));
    assert!(matches!(tree.find(99), Err(DatabaseError::KeyNotFound { .. })));
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_leaf_chain_walks_both_directions() {
    let tree = tree_of(shuffled(1_000, 3));
    let forward: Vec<u32> = tree.iter().copied().collect();
    assert_eq!(forward, (0..1_000).collect::<Vec<_>>());

    let backward: Vec<u32> = tree.iter().rev().copied().collect();
    assert_eq!(backward, (0..1_000).rev().collect::<Vec<_>>());

    let mut iter = tree.iter();
    assert_eq!(iter.next(), Some(&0));
    assert_eq!(iter.next_back(), Some(&999));
    assert_eq!(iter.len(), 998);
    assert_eq!(iter.count(), 998);
}

#[test]
fn test_post_order_visits_children_first() {
    let tree = tree_of(0..200);
    let order = tree.post_order();
    assert_eq!(order.last(), Some(&tree.root()));

    for (position, node) in order.iter().enumerate() {
        if let NodeRef::Internal(id) = node {
            for child in tree.internal(*id).children() {
                let child_position = order.iter().position(|n| n == child).unwrap();
                assert!(child_position < position);
            }
        }
    }
}

#[test]
fn test_key_pointer_orders_by_row_id() {
    let mut tree: BPlusTree<KeyPointer<Record>> = BPlusTree::new(3).unwrap();
    for row_id in [3, 1, 2] {
        let record = Record::new(row_id, vec![Value::Int(row_id as i32 * 10)]);
        tree.insert(KeyPointer::from(record)).unwrap();
    }

    let first = tree.iter().next().unwrap();
    assert!(*first == 1u32);
    assert!(*first < 2u32);
    assert_eq!(first.data.values, vec![Value::Int(10)]);

    tree.get_mut(2).unwrap().data.values[0] = Value::Int(99);
    assert_eq!(tree.find(2).unwrap().data.values[0], Value::Int(99));
}
