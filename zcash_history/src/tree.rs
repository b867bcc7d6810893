use std::collections::HashMap;

use tracing::trace;

use crate::{Entry, EntryKind, EntryLink, Error, Version};

/// Represents partially loaded tree.
///
/// Some kind of "view" into the array representation of the MMR tree.
/// With only some of the leaves/nodes pre-loaded / pre-generated.
/// Exact amount of the loaded data can be calculated by the constructing party,
/// depending on the length of the tree and maximum amount of operations that are going
/// to happen after construction. `Tree` should not be used as self-contained data structure,
/// since it's internal state can grow indefinitely after serial operations.
/// Intended use of this `Tree` is to instantiate it based on partially loaded data, perform
/// several operations (append-s/delete-s) and then drop it.
///
/// Stored entries are the persistent array representation; generated entries are the
/// nodes bagging the peaks together, which are recomputed rather than persisted. Parents
/// refer to their children by [`EntryLink`], so children are shared and never copied.
pub struct Tree<V: Version> {
    stored: HashMap<u32, Entry<V>>,

    // This can grow indefinitely if `Tree` is misused as a self-contained data structure
    generated: Vec<Entry<V>>,

    // number of persistent(!) tree entries
    stored_count: u32,

    root: Option<EntryLink>,
}

impl<V: Version> Tree<V> {
    /// Resolve link originated from this tree
    pub fn resolve_link(&self, link: EntryLink) -> Result<IndexedNode<V>, Error> {
        match link {
            EntryLink::Generated(index) => self.generated.get(index as usize),
            EntryLink::Stored(index) => self.stored.get(&index),
        }
        .map(|node| IndexedNode { node, link })
        .ok_or(Error::ExpectedInMemory(link))
    }

    fn push(&mut self, data: Entry<V>) -> EntryLink {
        let idx = self.stored_count;
        self.stored_count += 1;
        self.stored.insert(idx, data);
        EntryLink::Stored(idx)
    }

    fn push_generated(&mut self, data: Entry<V>) -> EntryLink {
        self.generated.push(data);
        EntryLink::Generated(self.generated.len() as u32 - 1)
    }

    /// Populate tree with plain list of the leaves/nodes. For now, only for tests,
    /// since this `Tree` structure is for partially loaded tree (but it might change)
    #[cfg(test)]
    pub fn populate(loaded: Vec<Entry<V>>, root: EntryLink) -> Self {
        let mut result = Tree::empty();
        result.stored_count = loaded.len() as u32;
        for (idx, item) in loaded.into_iter().enumerate() {
            result.stored.insert(idx as u32, item);
        }
        result.root = Some(root);

        result
    }

    /// A tree with no leaves.
    pub fn empty() -> Self {
        Tree {
            root: None,
            generated: Default::default(),
            stored: Default::default(),
            stored_count: 0,
        }
    }

    /// New view into the the tree array representation
    ///
    /// `length` is total length of the array representation (is generally not a sum of
    ///     peaks.len + extra.len)
    /// `peaks` is peaks of the mmr tree
    /// `extra` is some extra nodes that calculated to be required during next one or more
    /// operations on the tree.
    ///
    /// # Panics
    ///
    /// Will panic if `peaks` is empty.
    pub fn new(length: u32, peaks: Vec<(u32, Entry<V>)>, extra: Vec<(u32, Entry<V>)>) -> Self {
        assert!(!peaks.is_empty(), "a non-empty tree has at least one peak");

        let mut result = Tree::empty();

        result.stored_count = length;

        let mut peak_links = Vec::with_capacity(peaks.len());
        for (idx, node) in peaks.into_iter() {
            result.stored.insert(idx, node);
            peak_links.push(EntryLink::Stored(idx));
        }

        for (idx, node) in extra {
            result.stored.insert(idx, node);
        }

        result.root = result
            .bag_peaks(&peak_links)
            .expect("Inserted before, cannot fail; qed");

        result
    }

    fn collect_peaks(&self, root: EntryLink, target: &mut Vec<EntryLink>) -> Result<(), Error> {
        let (left_child_link, right_child_link) = {
            let root = self.resolve_link(root)?;
            if root.node.complete() {
                target.push(root.link);
                return Ok(());
            }
            (root.left()?, root.right()?)
        };

        self.collect_peaks(left_child_link, target)?;
        self.collect_peaks(right_child_link, target)?;
        Ok(())
    }

    /// Returns the peaks of the subtree rooted at `node`, in ascending height order.
    ///
    /// A node covering `2^k` leaves is its own single peak; any other node contributes the
    /// peaks of its left child followed by those of its right child.
    pub fn get_peaks(&self, node: EntryLink) -> Result<Vec<EntryLink>, Error> {
        let mut peaks = Vec::new();
        self.collect_peaks(node, &mut peaks)?;
        Ok(peaks)
    }

    /// Folds the given peaks (in ascending height order) into a single root, left to
    /// right, generating one parent for each combination.
    ///
    /// Returns `None` if `peaks` is empty.
    pub fn bag_peaks(&mut self, peaks: &[EntryLink]) -> Result<Option<EntryLink>, Error> {
        let mut peaks = peaks.iter();
        let mut root = match peaks.next() {
            Some(link) => *link,
            None => return Ok(None),
        };

        for next_peak in peaks {
            let parent = make_parent(&self.resolve_link(root)?, &self.resolve_link(*next_peak)?);
            root = self.push_generated(parent);
        }

        Ok(Some(root))
    }

    /// Append one leaf to the tree.
    ///
    /// Returns links to actual nodes that has to be persisted as the result of the append.
    /// If completed without error, at least one link to the appended
    /// node (with metadata provided in `new_leaf`) will be returned.
    pub fn append_leaf(&mut self, new_leaf: V::NodeData) -> Result<Vec<EntryLink>, Error> {
        let new_leaf_link = self.push(Entry::new_leaf(new_leaf));
        let mut appended = vec![new_leaf_link];

        let root = match self.root {
            Some(root) => root,
            None => {
                self.root = Some(new_leaf_link);
                trace!(stored = self.stored_count, "appended first history leaf");
                return Ok(appended);
            }
        };

        let mut peaks = self.get_peaks(root)?;

        let mut merge_stack = vec![new_leaf_link];

        // Scan the peaks right-to-left, merging together equal-sized adjacent
        // complete subtrees. After this, merge_stack only contains peaks of
        // unequal-sized subtrees.
        while let Some(next_peak) = peaks.pop() {
            let next_merge = merge_stack
                .pop()
                .expect("there should be at least one, initial or re-pushed");

            if let Some(stored) = {
                let peak = self.resolve_link(next_peak)?;
                let m = self.resolve_link(next_merge)?;
                if peak.node.leaf_count() == m.node.leaf_count() {
                    Some(make_parent(&peak, &m))
                } else {
                    None
                }
            } {
                let link = self.push(stored);
                merge_stack.push(link);
                appended.push(link);
            } else {
                merge_stack.push(next_merge);
                merge_stack.push(next_peak);
            }
        }

        // Scan the peaks left-to-right, producing new generated nodes that
        // connect the subtrees
        merge_stack.reverse();
        self.root = self.bag_peaks(&merge_stack)?;

        trace!(
            stored = self.stored_count,
            persisted = appended.len(),
            peaks = merge_stack.len(),
            "appended history leaf"
        );

        Ok(appended)
    }

    #[cfg(test)]
    fn for_children<F: Fn(EntryLink, EntryLink)>(&self, node: EntryLink, f: F) {
        let (left, right) = {
            let link = self
                .resolve_link(node)
                .expect("Failed to resolve link in test");
            (
                link.left().expect("Failed to find node in test"),
                link.right().expect("Failed to find node in test"),
            )
        };
        f(left, right);
    }

    fn pop(&mut self) {
        self.stored.remove(&(self.stored_count - 1));
        self.stored_count -= 1;
    }

    /// Truncate one leaf from the end of the tree.
    ///
    /// Returns actual number of nodes that should be removed by the caller
    /// from the end of the array representation.
    ///
    /// # Panics
    ///
    /// Will panic if the tree is empty.
    pub fn truncate_leaf(&mut self) -> Result<u32, Error> {
        let root_link = match self.root {
            Some(link) => link,
            None => panic!("cannot truncate a leaf from an empty history tree"),
        };

        let root = {
            let (leaves, is_leaf) = {
                let n = self.resolve_link(root_link)?;
                (n.node.leaf_count(), n.node.leaf())
            };
            if is_leaf {
                self.pop();
                self.root = None;
                trace!(stored = self.stored_count, "truncated last history leaf");
                return Ok(1);
            }
            if leaves & 1 != 0 {
                let root_left_child = self.resolve_link(root_link)?.left()?;
                self.pop();
                self.root = Some(root_left_child);
                trace!(stored = self.stored_count, "truncated history leaf");
                return Ok(1);
            }
            self.resolve_link(root_link)?
        };

        let mut peaks = vec![root.left()?];
        let mut subtree_root_link = root.right()?;
        let mut truncated = 1;

        loop {
            let subtree_root = self.resolve_link(subtree_root_link)?.node;
            if let EntryKind::Node(left, right) = subtree_root.kind {
                peaks.push(left);
                subtree_root_link = right;
                truncated += 1;
            } else {
                if root.node.complete() {
                    truncated += 1;
                }
                break;
            }
        }

        for _ in 0..truncated {
            self.pop();
        }

        self.root = self.bag_peaks(&peaks)?;

        trace!(
            stored = self.stored_count,
            removed = truncated,
            "truncated history leaf"
        );

        Ok(truncated)
    }

    /// Length of array representation of the tree.
    pub fn len(&self) -> u32 {
        self.stored_count
    }

    /// Link to the root node, or `None` for an empty tree.
    pub fn root(&self) -> Option<EntryLink> {
        self.root
    }

    /// Reference to the root node.
    pub fn root_node(&self) -> Result<IndexedNode<V>, Error> {
        match self.root {
            Some(root) => self.resolve_link(root),
            None => Err(Error::EmptyTree),
        }
    }

    /// The commitment to the whole tree: the hash of the root node's serialized metadata.
    ///
    /// An empty tree commits to all-zero bytes, which is the value carried by block headers
    /// before any leaf has been appended.
    pub fn root_commitment(&self) -> Result<[u8; 32], Error> {
        match self.root {
            Some(root) => Ok(V::hash(self.resolve_link(root)?.data())),
            None => Ok([0u8; 32]),
        }
    }

    /// If this tree is empty.
    pub fn is_empty(&self) -> bool {
        self.stored_count == 0
    }
}

/// Reference to the node with link attached.
#[derive(Debug)]
pub struct IndexedNode<'a, V: Version> {
    node: &'a Entry<V>,
    link: EntryLink,
}

impl<'a, V: Version> IndexedNode<'a, V> {
    fn left(&self) -> Result<EntryLink, Error> {
        self.node.left().map_err(|e| e.augment(self.link))
    }

    fn right(&self) -> Result<EntryLink, Error> {
        self.node.right().map_err(|e| e.augment(self.link))
    }

    /// Reference to the entry struct.
    pub fn node(&self) -> &Entry<V> {
        self.node
    }

    /// Reference to the entry metadata.
    pub fn data(&self) -> &V::NodeData {
        &self.node.data
    }

    /// Actual link by what this node was resolved.
    pub fn link(&self) -> EntryLink {
        self.link
    }
}

/// Creates the parent of two adjacent subtrees.
///
/// # Panics
///
/// Panics if the subtrees are not adjacent (`left` must end at the height just before
/// `right` starts) or belong to different consensus branches.
pub fn make_parent<V: Version>(left: &IndexedNode<V>, right: &IndexedNode<V>) -> Entry<V> {
    Entry::new(
        V::combine(&left.node.data, &right.node.data),
        left.link,
        right.link,
    )
}

#[cfg(test)]
mod tests {

    use super::{make_parent, Entry, EntryKind, EntryLink, Tree};
    use crate::{node_data, NodeData, Version, V1, V2};
    use assert_matches::assert_matches;
    use primitive_types::U256;
    use quickcheck::{quickcheck, TestResult};

    fn leaf(height: u32) -> NodeData {
        NodeData {
            consensus_branch_id: 1,
            subtree_commitment: [0u8; 32],
            start_time: 0,
            end_time: 0,
            start_target: 0,
            end_target: 0,
            start_sapling_root: [0u8; 32],
            end_sapling_root: [0u8; 32],
            subtree_total_work: U256::zero(),
            start_height: height as u64,
            end_height: height as u64,
            sapling_tx: 7,
        }
    }

    // Heartwood-era leaf whose fields all vary with height.
    fn heartwood_leaf(height: u32) -> NodeData {
        NodeData {
            consensus_branch_id: 0xf5b9_230b,
            subtree_commitment: [height as u8; 32],
            start_time: 1_600_000_000 + height,
            end_time: 1_600_000_000 + height,
            start_target: 0x1f07_ffff,
            end_target: 0x1f07_ffff,
            start_sapling_root: [0x5a; 32],
            end_sapling_root: [0x5a; 32],
            subtree_total_work: U256::from(height as u64 * 1000),
            start_height: height as u64,
            end_height: height as u64,
            sapling_tx: height as u64 % 3,
        }
    }

    fn nu5_leaf(height: u32) -> node_data::V2 {
        node_data::V2 {
            v1: heartwood_leaf(height),
            start_orchard_root: [0xc3; 32],
            end_orchard_root: [0xc3; 32],
            orchard_tx: height as u64 % 2,
        }
    }

    fn initial() -> Tree<V1> {
        let node1 = Entry::new_leaf(leaf(1));
        let node2 = Entry::new_leaf(leaf(2));

        let node3 = Entry::new(
            V1::combine(&node1.data, &node2.data),
            EntryLink::Stored(0),
            EntryLink::Stored(1),
        );

        Tree::populate(vec![node1, node2, node3], EntryLink::Stored(2))
    }

    // returns tree with specified number of leafs and it's root
    fn generated(length: u32) -> Tree<V1> {
        assert!(length >= 3);
        let mut tree = initial();
        for i in 2..length {
            tree.append_leaf(leaf(i + 1)).expect("Failed to append");
        }

        tree
    }

    fn peak_leaf_counts<V: Version>(tree: &Tree<V>) -> Vec<u64> {
        let peaks = tree
            .get_peaks(tree.root().expect("non-empty"))
            .expect("Failed to get peaks");
        peaks
            .into_iter()
            .map(|p| tree.resolve_link(p).unwrap().node().leaf_count())
            .collect()
    }

    #[test]
    fn discrete_append() {
        let mut tree = initial();

        // ** APPEND 3 **
        let appended = tree.append_leaf(leaf(3)).expect("Failed to append");
        let new_root = tree.root_node().expect("Failed to resolve root").node;

        // initial tree:  (2)
        //               /   \
        //             (0)   (1)
        //
        // new tree:
        //                (4g)
        //               /   \
        //             (2)    \
        //             /  \    \
        //           (0)  (1)  (3)
        //
        // so only (3) is added as real leaf
        // while new root, (4g) is generated one
        assert_eq!(new_root.data.end_height, 3);
        assert_eq!(appended.len(), 1);

        // ** APPEND 4 **
        let appended = tree.append_leaf(leaf(4)).expect("Failed to append");

        let new_root = tree.root_node().expect("Failed to resolve root").node;

        // new tree:
        //                 ( 6 )
        //                /     \
        //             (2)       (5)
        //             /  \     /   \
        //           (0)  (1) (3)   (4)
        //
        // so (4), (5), (6) are added as real leaves
        // and new root, (6) is stored one
        assert_eq!(new_root.data.end_height, 4);
        assert_eq!(appended.len(), 3);
        assert_matches!(tree.root(), Some(EntryLink::Stored(6)));

        // ** APPEND 5 **

        let appended = tree.append_leaf(leaf(5)).expect("Failed to append");
        let new_root = tree.root_node().expect("Failed to resolve root").node;

        // new tree:
        //                     ( 8g )
        //                    /      \
        //                 ( 6 )      \
        //                /     \      \
        //             (2)       (5)    \
        //             /  \     /   \    \
        //           (0)  (1) (3)   (4)  (7)
        //
        // so (7) is added as real leaf
        // and new root, (8g) is generated one
        assert_eq!(new_root.data.end_height, 5);
        assert_eq!(appended.len(), 1);
        let root = tree.root().unwrap();
        assert_matches!(root, EntryLink::Generated(_));
        tree.for_children(root, |l, r| {
            assert_matches!(l, EntryLink::Stored(6));
            assert_matches!(r, EntryLink::Stored(7));
        });

        // *** APPEND #6 ***
        let appended = tree.append_leaf(leaf(6)).expect("Failed to append");
        let new_root = tree.root_node().expect("Failed to resolve root").node;

        // new tree:
        //                     (---10g--)
        //                    /          \
        //                 ( 6 )          \
        //                /     \          \
        //             (2)       (5)       (9)
        //             /  \     /   \     /   \
        //           (0)  (1) (3)   (4)  (7)  (8)
        //
        // so (8) and (9) are added as real entries
        // and new root, (10g) is generated one
        assert_eq!(new_root.data.end_height, 6);
        assert_eq!(appended.len(), 2);
        let root = tree.root().unwrap();
        assert_matches!(root, EntryLink::Generated(_));
        tree.for_children(root, |l, r| {
            assert_matches!(l, EntryLink::Stored(6));
            assert_matches!(r, EntryLink::Stored(9));
        });

        // *** APPEND #7 ***

        let appended = tree.append_leaf(leaf(7)).expect("Failed to append");
        let new_root = tree.root_node().expect("Failed to resolve root").node;

        // new tree:
        //                          (---12g--)
        //                         /          \
        //                    (---11g---)      \
        //                   /           \      \
        //                 ( 6 )          \      \
        //                /     \          \      \
        //             (2)       (5)       (9)     \
        //             /  \     /   \     /   \     \
        //           (0)  (1) (3)   (4) (7)   (8)  (10)
        //
        // so (10) is added as real leaf
        // and new root, (12g) is generated one
        assert_eq!(new_root.data.end_height, 7);
        assert_eq!(appended.len(), 1);
        let root = tree.root().unwrap();
        assert_matches!(root, EntryLink::Generated(_));
        tree.for_children(root, |l, r| {
            assert_matches!(l, EntryLink::Generated(_));
            tree.for_children(l, |l, r| {
                assert_matches!((l, r), (EntryLink::Stored(6), EntryLink::Stored(9)))
            });
            assert_matches!(r, EntryLink::Stored(10));
        });
    }

    #[test]
    fn truncate_simple() {
        let mut tree = generated(9);
        let total_truncated = tree.truncate_leaf().expect("Failed to truncate");

        // initial tree:
        //
        //                               (-------16g------)
        //                              /                  \
        //                    (--------14-------)           \
        //                   /                   \           \
        //                 ( 6 )              (  13  )        \
        //                /     \            /        \        \
        //             (2)       (5)       (9)        (12)      \
        //             /  \     /   \     /   \      /    \      \
        //           (0)  (1) (3)   (4) (7)   (8)  (10)  (11)    (15)
        //
        // new tree:
        //                    (--------14-------)
        //                   /                   \
        //                 ( 6 )              (  13  )
        //                /     \            /        \
        //             (2)       (5)       (9)        (12)
        //             /  \     /   \     /   \      /    \
        //           (0)  (1) (3)   (4) (7)   (8)  (10)  (11)
        //
        // so (15) is truncated
        // and new root, (14) is a stored one now

        assert_matches!(tree.root(), Some(EntryLink::Stored(14)));
        assert_eq!(total_truncated, 1);
        assert_eq!(tree.len(), 15);
    }

    #[test]
    fn truncate_generated() {
        let mut tree = generated(10);
        let deleted = tree.truncate_leaf().expect("Failed to truncate");

        // initial tree:
        //
        //                               (--------18g--------)
        //                              /                     \
        //                    (--------14-------)              \
        //                   /                   \              \
        //                 ( 6 )              (  13  )           \
        //                /     \            /        \           \
        //             (2)       (5)       (9)        (12)        (17)
        //             /  \     /   \     /   \      /    \      /    \
        //           (0)  (1) (3)   (4) (7)   (8)  (10)  (11)  (15)  (16)
        //
        // new tree:
        //                               (-------16g------)
        //                              /                  \
        //                    (--------14-------)           \
        //                   /                   \           \
        //                 ( 6 )              (  13  )        \
        //                /     \            /        \        \
        //             (2)       (5)       (9)        (12)      \
        //             /  \     /   \     /   \      /    \      \
        //           (0)  (1) (3)   (4) (7)   (8)  (10)  (11)    (15)

        // new root is generated
        let root = tree.root().unwrap();
        assert_matches!(root, EntryLink::Generated(_));

        tree.for_children(root, |left, right| {
            assert_matches!(
                (left, right),
                (EntryLink::Stored(14), EntryLink::Stored(15))
            )
        });

        // two stored nodes should leave us (leaf 16 and no longer needed node 17)
        assert_eq!(deleted, 2);
        assert_eq!(tree.len(), 16);
    }

    #[test]
    fn tree_len() {
        let mut tree = initial();

        assert_eq!(tree.len(), 3);

        for i in 0..2 {
            tree.append_leaf(leaf(i + 3)).expect("Failed to append");
        }
        assert_eq!(tree.len(), 7);

        tree.truncate_leaf().expect("Failed to truncate");

        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn tree_len_long() {
        let mut tree = initial();

        assert_eq!(tree.len(), 3);

        for i in 0..4094 {
            tree.append_leaf(leaf(i + 3)).expect("Failed to append");
        }
        assert_eq!(tree.len(), 8191); // 4096*2-1 (full tree)

        for _ in 0..2049 {
            tree.truncate_leaf().expect("Failed to truncate");
        }

        assert_eq!(tree.len(), 4083); // 4095 - log2(4096)
    }

    #[test]
    fn empty_tree() {
        let tree = Tree::<V1>::empty();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_matches!(tree.root_node(), Err(crate::Error::EmptyTree));
        assert_eq!(tree.root_commitment().unwrap(), [0u8; 32]);
    }

    #[test]
    #[should_panic]
    fn truncate_empty_tree_panics() {
        let mut tree = Tree::<V1>::empty();
        let _ = tree.truncate_leaf();
    }

    #[test]
    fn append_and_truncate_back_to_empty() {
        let mut tree = Tree::<V1>::empty();
        for height in 1..=11 {
            tree.append_leaf(heartwood_leaf(height))
                .expect("Failed to append");
        }
        assert_eq!(tree.len(), 19);
        for _ in 0..11 {
            tree.truncate_leaf().expect("Failed to truncate");
        }
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
    }

    #[test]
    fn root_commitment_v1() {
        let mut tree = Tree::<V1>::empty();
        let expected = [
            (1, "a44d9dd319b73717608e4eff591b5e1b78fb54cbcb91f2646de0ca610a7427da"),
            (2, "bf25477a87ed318901a609b2ebca877776cf7df661fd6afe334ddf0ee7b0de71"),
            (3, "1f53de989cf4f770816e0ae3e5344a24313b5411120914e3ad9a8c4d5a081c00"),
            (7, "83e3448cf3ef49da244e6ffb50133740b9f114f242c28c2ae3fadf257608eb75"),
        ];
        let mut checks = expected.iter().peekable();
        for height in 1..=7 {
            tree.append_leaf(heartwood_leaf(height))
                .expect("Failed to append");
            if let Some((h, commitment)) = checks.next_if(|(h, _)| *h == height) {
                assert_eq!(
                    hex::encode(tree.root_commitment().unwrap()),
                    *commitment,
                    "root commitment after {} leaves",
                    h
                );
            }
        }
        assert!(checks.next().is_none());
    }

    #[test]
    fn root_commitment_v2() {
        let mut tree = Tree::<V2>::empty();
        for height in 1..=3 {
            tree.append_leaf(nu5_leaf(height)).expect("Failed to append");
        }
        assert_eq!(
            hex::encode(tree.root_commitment().unwrap()),
            "e965bee03451379617d1db43bb3f9271e46146a0b6ebf24c34ce9290e7990c6a"
        );

        let root = tree.root_node().unwrap();
        assert_eq!(root.data().v1.sapling_tx, 1 + 2);
        assert_eq!(root.data().orchard_tx, 1 + 1);
        assert_eq!(root.data().v1.subtree_total_work, U256::from(6000));

        for height in 4..=7 {
            tree.append_leaf(nu5_leaf(height)).expect("Failed to append");
        }
        assert_eq!(
            hex::encode(tree.root_commitment().unwrap()),
            "c05c2b5fa366866a7c375c11b5c20e2be14701f987908bd400508d989b032e8e"
        );
    }

    #[test]
    fn partial_view_matches_full_tree() {
        let mut full = Tree::<V1>::empty();
        let mut entries = Vec::new();
        for height in 1..=6 {
            full.append_leaf(heartwood_leaf(height))
                .expect("Failed to append");
        }
        for idx in 0..full.len() {
            entries.push(full.resolve_link(EntryLink::Stored(idx)).unwrap().node().clone());
        }

        // 6 leaves: peaks are the 4-leaf node at index 6 and the 2-leaf node at index 9.
        let view = Tree::<V1>::new(
            full.len(),
            vec![(6, entries[6].clone()), (9, entries[9].clone())],
            vec![],
        );
        assert_eq!(view.len(), full.len());
        assert_eq!(view.root_commitment().unwrap(), full.root_commitment().unwrap());
    }

    #[test]
    fn bag_peaks_folds_left() {
        let mut tree = Tree::<V1>::empty();
        assert_eq!(tree.bag_peaks(&[]).unwrap(), None);

        for height in 1..=7 {
            tree.append_leaf(heartwood_leaf(height))
                .expect("Failed to append");
        }
        let peaks = tree.get_peaks(tree.root().unwrap()).unwrap();
        assert_eq!(peak_leaf_counts(&tree), vec![4, 2, 1]);

        let bagged = tree.bag_peaks(&peaks).unwrap().unwrap();
        let expected = {
            let inner = make_parent(
                &tree.resolve_link(peaks[0]).unwrap(),
                &tree.resolve_link(peaks[1]).unwrap(),
            );
            V1::combine(&inner.data, tree.resolve_link(peaks[2]).unwrap().data())
        };
        assert_eq!(tree.resolve_link(bagged).unwrap().data(), &expected);
    }

    #[test]
    #[should_panic(expected = "adjacent height ranges")]
    fn make_parent_requires_adjacency() {
        let tree = Tree::<V1>::populate(
            vec![
                Entry::new_leaf(heartwood_leaf(1)),
                Entry::new_leaf(heartwood_leaf(3)),
            ],
            EntryLink::Stored(0),
        );
        make_parent(
            &tree.resolve_link(EntryLink::Stored(0)).unwrap(),
            &tree.resolve_link(EntryLink::Stored(1)).unwrap(),
        );
    }

    #[test]
    fn leaf_entries_are_leaves() {
        let entry = Entry::<V1>::new_leaf(leaf(1));
        assert!(entry.leaf());
        assert_matches!(entry.kind, EntryKind::Leaf);
    }

    quickcheck! {
        fn there_and_back(number: u32) -> TestResult {
            if number > 1024*1024 {
                TestResult::discard()
            } else {
                let mut tree = initial();
                for i in 0..number {
                    tree.append_leaf(leaf(i+3)).expect("Failed to append");
                }
                for _ in 0..number {
                    tree.truncate_leaf().expect("Failed to truncate");
                }

                TestResult::from_bool(matches!(tree.root(), Some(EntryLink::Stored(2))))
            }
        }

        fn leaf_count(number: u32) -> TestResult {
            if number > 1024 * 1024 || number < 3 {
                TestResult::discard()
            } else {
                let mut tree = initial();
                for i in 1..(number-1) {
                    tree.append_leaf(leaf(i+2)).expect("Failed to append");
                }

                TestResult::from_bool(
                    tree.root_node().expect("no root").node.leaf_count() == number as u64
                )
            }
        }

        fn peaks_are_distinct_powers_of_two(number: u32) -> TestResult {
            if number > 4096 || number < 1 {
                TestResult::discard()
            } else {
                let mut tree = Tree::<V1>::empty();
                for i in 0..number {
                    tree.append_leaf(leaf(i + 1)).expect("Failed to append");
                }
                let counts = peak_leaf_counts(&tree);

                TestResult::from_bool(
                    counts.iter().all(|c| c.is_power_of_two())
                        && counts.windows(2).all(|w| w[0] > w[1])
                        && counts.iter().sum::<u64>() == number as u64
                )
            }
        }

        fn parity(number: u32) -> TestResult {
            if number > 2048 * 2048 || number < 3 {
                TestResult::discard()
            } else {
                let mut tree = initial();
                for i in 1..(number-1) {
                    tree.append_leaf(leaf(i+2)).expect("Failed to append");
                }

                TestResult::from_bool(
                    if number & (number - 1) == 0 {
                        matches!(tree.root(), Some(EntryLink::Stored(_)))
                    } else {
                        matches!(tree.root(), Some(EntryLink::Generated(_)))
                    }
                )
            }
        }

        fn parity_with_truncate(add: u32, delete: u32) -> TestResult {
            // First we add `add` number of leaves, then delete `delete` number of leaves
            // What is left should be consistent with generated-stored structure
            if add > 2048 * 2048 || add < delete {
                TestResult::discard()
            } else {
                let mut tree = initial();
                for i in 0..add {
                    tree.append_leaf(leaf(i+3)).expect("Failed to append");
                }
                for _ in 0..delete {
                    tree.truncate_leaf().expect("Failed to truncate");
                }

                let total = add - delete + 2;

                TestResult::from_bool(
                    if total & (total - 1) == 0 {
                        matches!(tree.root(), Some(EntryLink::Stored(_)))
                    } else {
                        matches!(tree.root(), Some(EntryLink::Generated(_)))
                    }
                )
            }
        }

        // Length of tree is always less than number of leaves squared
        fn stored_length(add: u32, delete: u32) -> TestResult {
            if add > 2048 * 2048 || add < delete {
                TestResult::discard()
            } else {
                let mut tree = initial();
                for i in 0..add {
                    tree.append_leaf(leaf(i+3)).expect("Failed to append");
                }
                for _ in 0..delete {
                    tree.truncate_leaf().expect("Failed to truncate");
                }

                let total = add - delete + 2;

                TestResult::from_bool(total * total > tree.len())
            }
        }
    }
}
