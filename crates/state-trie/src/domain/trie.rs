//! # Merkle Patricia Trie
//!
//! Content-addressed key/value tree rooted at a single hash.
//!
//! Every node is stored under its Keccak256 hash. Mutation is never in
//! place: an update rewrites the path from the touched leaf up to the root,
//! producing new nodes while every node reachable from an older root stays
//! untouched in the store. Opening a trie at any previously committed root
//! therefore gives random access to that historical state.
//!
//! Mutations are staged in an in-memory overlay; nothing reaches the
//! backing store until [`MerkleTrie::commit`]. Cloning a trie clones only
//! the overlay, so clones are mutation-isolated while sharing all
//! persisted nodes (copy-on-write).

use super::{Nibbles, NodeCache, TrieError, TrieNode, EMPTY_TRIE_ROOT};
use crate::ports::TrieDatabase;
use chain_types::{short_hash, Hash, ZERO_HASH};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// True for the two sentinels that denote an empty trie.
pub fn is_empty_root(root: &Hash) -> bool {
    *root == ZERO_HASH || *root == EMPTY_TRIE_ROOT
}

/// A Merkle Patricia Trie handle over a shared node store.
#[derive(Clone)]
pub struct MerkleTrie {
    root: Hash,
    db: Arc<dyn TrieDatabase>,
    cache: Arc<NodeCache>,
    /// Encoded nodes created by uncommitted mutations, keyed by hash.
    pending: HashMap<Hash, Vec<u8>>,
}

impl MerkleTrie {
    /// Open a trie at the given root.
    ///
    /// The zero hash and [`EMPTY_TRIE_ROOT`] both open an empty trie. Any
    /// other root must resolve to a stored node, otherwise the root is
    /// unopenable and [`TrieError::MissingNode`] is returned.
    pub fn open(
        db: Arc<dyn TrieDatabase>,
        cache: Arc<NodeCache>,
        root: Hash,
    ) -> Result<Self, TrieError> {
        let root = if is_empty_root(&root) {
            EMPTY_TRIE_ROOT
        } else {
            root
        };
        let trie = Self {
            root,
            db,
            cache,
            pending: HashMap::new(),
        };
        if !is_empty_root(&trie.root) {
            trie.resolve(&trie.root)?;
        }
        Ok(trie)
    }

    /// Current root hash, without persisting anything.
    pub fn hash(&self) -> Hash {
        self.root
    }

    /// Look up the value stored under `key`.
    ///
    /// An absent key is `Ok(None)`; storage and decode failures are errors.
    pub fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        let path = Nibbles::from_bytes(key);
        let mut node = self.resolve(&self.root)?;
        let mut depth = 0;

        loop {
            match node {
                TrieNode::Empty => return Ok(None),

                TrieNode::Leaf {
                    path: leaf_path,
                    value,
                } => {
                    if leaf_path == path.slice(depth) {
                        return Ok(Some(value));
                    }
                    return Ok(None);
                }

                TrieNode::Extension {
                    path: ext_path,
                    child,
                } => {
                    if !ext_path.is_prefix_of(&path.slice(depth)) {
                        return Ok(None);
                    }
                    depth += ext_path.len();
                    node = self.resolve(&child)?;
                }

                TrieNode::Branch { children, value } => {
                    if depth == path.len() {
                        return Ok(value);
                    }
                    match children[path.at(depth) as usize] {
                        Some(child) => {
                            node = self.resolve(&child)?;
                            depth += 1;
                        }
                        None => return Ok(None),
                    }
                }
            }
        }
    }

    /// Insert or overwrite the value under `key`.
    ///
    /// An empty value is a deletion: the node codec uses the empty byte
    /// string as the "no value" sentinel, so empty values cannot be stored.
    pub fn try_update(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), TrieError> {
        if value.is_empty() {
            return self.try_delete(key);
        }
        let path = Nibbles::from_bytes(key);
        let root_node = self.resolve(&self.root)?;
        let new_root = self.insert(root_node, path, value)?;
        self.root = self.store(new_root);
        Ok(())
    }

    /// Remove the value under `key`. Removing an absent key is a no-op.
    pub fn try_delete(&mut self, key: &[u8]) -> Result<(), TrieError> {
        let path = Nibbles::from_bytes(key);
        let root_node = self.resolve(&self.root)?;
        let new_root = self.remove(root_node, path)?;
        self.root = self.store(new_root);
        Ok(())
    }

    /// Persist all staged nodes to the backing store and return the root.
    ///
    /// Commit with no staged mutations returns the current root unchanged.
    /// On a storage failure nothing is considered durable and the error is
    /// propagated; the caller reopens at the last known-good root.
    pub fn commit(&mut self) -> Result<Hash, TrieError> {
        if !self.pending.is_empty() {
            let batch: Vec<(Hash, Vec<u8>)> = self
                .pending
                .iter()
                .map(|(hash, data)| (*hash, data.clone()))
                .collect();
            let count = batch.len();
            self.db.batch_put(batch)?;

            // Warm the shared cache only once the nodes are durable; a
            // failed root must stay unresolvable from sibling handles.
            for (hash, data) in self.pending.drain() {
                self.cache.put(hash, data);
            }
            debug!(nodes = count, root = %short_hash(&self.root), "trie nodes persisted");
        }
        Ok(self.root)
    }

    /// Lazy depth-first traversal of all nodes, starting at the subtree
    /// containing `start_key` (empty key = full traversal).
    pub fn node_iter(&self, start_key: &[u8]) -> NodeIter<'_> {
        NodeIter::new(self, Nibbles::from_bytes(start_key))
    }

    // =========================================================================
    // NODE RESOLUTION AND STAGING
    // =========================================================================

    /// Resolve a node hash into a decoded node.
    ///
    /// Lookup order: staged overlay, shared cache, backing store. A hash
    /// that resolves nowhere is a dangling reference.
    fn resolve(&self, hash: &Hash) -> Result<TrieNode, TrieError> {
        if is_empty_root(hash) {
            return Ok(TrieNode::Empty);
        }
        if let Some(data) = self.pending.get(hash) {
            return TrieNode::rlp_decode(hash, data);
        }
        if let Some(data) = self.cache.get(hash) {
            return TrieNode::rlp_decode(hash, &data);
        }
        match self.db.get_node(hash)? {
            Some(data) => {
                let node = TrieNode::rlp_decode(hash, &data)?;
                self.cache.put(*hash, data);
                Ok(node)
            }
            None => Err(TrieError::MissingNode { hash: *hash }),
        }
    }

    /// Stage a node in the overlay and return its hash.
    fn store(&mut self, node: TrieNode) -> Hash {
        if matches!(node, TrieNode::Empty) {
            return EMPTY_TRIE_ROOT;
        }
        let encoded = node.rlp_encode();
        let hash = node.hash();
        self.pending.insert(hash, encoded);
        hash
    }

    // =========================================================================
    // INSERTION
    // =========================================================================

    fn insert(
        &mut self,
        node: TrieNode,
        path: Nibbles,
        value: Vec<u8>,
    ) -> Result<TrieNode, TrieError> {
        match node {
            TrieNode::Empty => Ok(TrieNode::Leaf { path, value }),

            TrieNode::Leaf {
                path: leaf_path,
                value: leaf_value,
            } => {
                if leaf_path == path {
                    return Ok(TrieNode::Leaf { path, value });
                }
                let common = leaf_path.common_prefix_len(&path);
                let branch = self.branch_of(
                    (leaf_path.slice(common), leaf_value),
                    (path.slice(common), value),
                );
                Ok(self.wrap_prefix(path.slice_range(0, common), branch))
            }

            TrieNode::Extension {
                path: ext_path,
                child,
            } => {
                let common = ext_path.common_prefix_len(&path);
                if common == ext_path.len() {
                    // Descend through the extension
                    let child_node = self.resolve(&child)?;
                    let new_child = self.insert(child_node, path.slice(common), value)?;
                    let child_hash = self.store(new_child);
                    return Ok(TrieNode::Extension {
                        path: ext_path,
                        child: child_hash,
                    });
                }

                // Split the extension at the divergence point
                let (mut children, mut branch_value) = TrieNode::empty_branch();

                let ext_rem = ext_path.slice(common);
                let slot = ext_rem.at(0) as usize;
                children[slot] = Some(if ext_rem.len() == 1 {
                    child
                } else {
                    self.store(TrieNode::Extension {
                        path: ext_rem.slice(1),
                        child,
                    })
                });

                let new_rem = path.slice(common);
                if new_rem.is_empty() {
                    branch_value = Some(value);
                } else {
                    let leaf = TrieNode::Leaf {
                        path: new_rem.slice(1),
                        value,
                    };
                    children[new_rem.at(0) as usize] = Some(self.store(leaf));
                }

                let branch = TrieNode::Branch {
                    children,
                    value: branch_value,
                };
                Ok(self.wrap_prefix(path.slice_range(0, common), branch))
            }

            TrieNode::Branch {
                mut children,
                value: branch_value,
            } => {
                if path.is_empty() {
                    return Ok(TrieNode::Branch {
                        children,
                        value: Some(value),
                    });
                }
                let slot = path.at(0) as usize;
                let child_node = match children[slot] {
                    Some(hash) => self.resolve(&hash)?,
                    None => TrieNode::Empty,
                };
                let new_child = self.insert(child_node, path.slice(1), value)?;
                children[slot] = Some(self.store(new_child));
                Ok(TrieNode::Branch {
                    children,
                    value: branch_value,
                })
            }
        }
    }

    /// Build a branch holding two diverging (path, value) remainders.
    fn branch_of(&mut self, a: (Nibbles, Vec<u8>), b: (Nibbles, Vec<u8>)) -> TrieNode {
        let (mut children, mut value) = TrieNode::empty_branch();
        for (rem, val) in [a, b] {
            if rem.is_empty() {
                value = Some(val);
            } else {
                let leaf = TrieNode::Leaf {
                    path: rem.slice(1),
                    value: val,
                };
                children[rem.at(0) as usize] = Some(self.store(leaf));
            }
        }
        TrieNode::Branch { children, value }
    }

    /// Wrap a node in an extension for a shared prefix, if any.
    fn wrap_prefix(&mut self, prefix: Nibbles, node: TrieNode) -> TrieNode {
        if prefix.is_empty() {
            node
        } else {
            let child = self.store(node);
            TrieNode::Extension {
                path: prefix,
                child,
            }
        }
    }

    // =========================================================================
    // DELETION
    // =========================================================================

    fn remove(&mut self, node: TrieNode, path: Nibbles) -> Result<TrieNode, TrieError> {
        match node {
            TrieNode::Empty => Ok(TrieNode::Empty),

            TrieNode::Leaf {
                path: leaf_path,
                value,
            } => {
                if leaf_path == path {
                    Ok(TrieNode::Empty)
                } else {
                    Ok(TrieNode::Leaf {
                        path: leaf_path,
                        value,
                    })
                }
            }

            TrieNode::Extension {
                path: ext_path,
                child,
            } => {
                if !ext_path.is_prefix_of(&path) {
                    return Ok(TrieNode::Extension {
                        path: ext_path,
                        child,
                    });
                }
                let child_node = self.resolve(&child)?;
                let new_child = self.remove(child_node, path.slice(ext_path.len()))?;

                // An extension may not point at a leaf, another extension,
                // or nothing; fold those shapes into one node.
                Ok(match new_child {
                    TrieNode::Empty => TrieNode::Empty,
                    TrieNode::Leaf { path: p, value } => TrieNode::Leaf {
                        path: ext_path.join(&p),
                        value,
                    },
                    TrieNode::Extension { path: p, child: c } => TrieNode::Extension {
                        path: ext_path.join(&p),
                        child: c,
                    },
                    branch @ TrieNode::Branch { .. } => {
                        let child = self.store(branch);
                        TrieNode::Extension {
                            path: ext_path,
                            child,
                        }
                    }
                })
            }

            TrieNode::Branch {
                mut children,
                mut value,
            } => {
                if path.is_empty() {
                    value = None;
                } else {
                    let slot = path.at(0) as usize;
                    match children[slot] {
                        None => {
                            return Ok(TrieNode::Branch { children, value });
                        }
                        Some(hash) => {
                            let child_node = self.resolve(&hash)?;
                            let new_child = self.remove(child_node, path.slice(1))?;
                            children[slot] = match new_child {
                                TrieNode::Empty => None,
                                other => Some(self.store(other)),
                            };
                        }
                    }
                }
                self.collapse_branch(children, value)
            }
        }
    }

    /// Collapse a branch left with too few entries after a deletion.
    fn collapse_branch(
        &mut self,
        children: Box<[Option<Hash>; 16]>,
        value: Option<Vec<u8>>,
    ) -> Result<TrieNode, TrieError> {
        let occupied: Vec<(usize, Hash)> = children
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|hash| (i, hash)))
            .collect();

        if occupied.is_empty() {
            return Ok(match value {
                Some(value) => TrieNode::Leaf {
                    path: Nibbles(vec![]),
                    value,
                },
                None => TrieNode::Empty,
            });
        }

        if let ([(slot, child_hash)], None) = (occupied.as_slice(), &value) {
            let prefix = Nibbles(vec![*slot as u8]);

            // Merge the single remaining child upward
            return Ok(match self.resolve(child_hash)? {
                TrieNode::Leaf { path, value } => TrieNode::Leaf {
                    path: prefix.join(&path),
                    value,
                },
                TrieNode::Extension { path, child } => TrieNode::Extension {
                    path: prefix.join(&path),
                    child,
                },
                TrieNode::Branch { .. } => TrieNode::Extension {
                    path: prefix,
                    child: *child_hash,
                },
                TrieNode::Empty => TrieNode::Empty,
            });
        }

        Ok(TrieNode::Branch { children, value })
    }
}

// =============================================================================
// NODE ITERATOR
// =============================================================================

/// A node yielded during traversal.
#[derive(Clone, Debug)]
pub struct NodeItem {
    pub hash: Hash,
    pub node: TrieNode,
}

struct IterFrame {
    hash: Hash,
    node: TrieNode,
    next_child: usize,
    yielded: bool,
}

/// Lazy depth-first pre-order traversal over trie nodes.
///
/// Used for proof generation and full-state walks. With a start key, the
/// iterator descends along the key's path first, yielding the nodes on
/// that path and then everything after it in branch order.
pub struct NodeIter<'a> {
    trie: &'a MerkleTrie,
    stack: Vec<IterFrame>,
    failed: Option<TrieError>,
}

impl<'a> NodeIter<'a> {
    fn new(trie: &'a MerkleTrie, start: Nibbles) -> Self {
        let mut iter = Self {
            trie,
            stack: Vec::new(),
            failed: None,
        };
        let seeded = iter.push_node(trie.root).and_then(|_| {
            if start.is_empty() {
                Ok(())
            } else {
                iter.seek(&start)
            }
        });
        if let Err(e) = seeded {
            // Surface the error from next()
            iter.failed = Some(e);
        }
        iter
    }

    fn push_node(&mut self, hash: Hash) -> Result<(), TrieError> {
        if is_empty_root(&hash) {
            return Ok(());
        }
        let node = self.trie.resolve(&hash)?;
        self.stack.push(IterFrame {
            hash,
            node,
            next_child: 0,
            yielded: false,
        });
        Ok(())
    }

    /// Position the stack on the path to `start`, skipping earlier siblings.
    fn seek(&mut self, start: &Nibbles) -> Result<(), TrieError> {
        let mut depth = 0;
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(());
            };
            match frame.node.clone() {
                TrieNode::Empty | TrieNode::Leaf { .. } => return Ok(()),

                TrieNode::Extension { path, child } => {
                    if path.is_prefix_of(&start.slice(depth)) {
                        depth += path.len();
                        frame.next_child = 1;
                        self.push_node(child)?;
                    } else {
                        return Ok(());
                    }
                }

                TrieNode::Branch { children, .. } => {
                    if depth >= start.len() {
                        return Ok(());
                    }
                    let slot = start.at(depth) as usize;
                    frame.next_child = slot + 1;
                    match children[slot] {
                        Some(child) => {
                            depth += 1;
                            self.push_node(child)?;
                        }
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = Result<NodeItem, TrieError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.failed.take() {
            self.stack.clear();
            return Some(Err(e));
        }

        loop {
            let frame = self.stack.last_mut()?;

            if !frame.yielded {
                frame.yielded = true;
                return Some(Ok(NodeItem {
                    hash: frame.hash,
                    node: frame.node.clone(),
                }));
            }

            let descend = match &frame.node {
                TrieNode::Empty | TrieNode::Leaf { .. } => None,

                TrieNode::Extension { child, .. } => {
                    if frame.next_child == 0 {
                        frame.next_child = 1;
                        Some(*child)
                    } else {
                        None
                    }
                }

                TrieNode::Branch { children, .. } => {
                    let mut found = None;
                    while frame.next_child < 16 {
                        let slot = frame.next_child;
                        frame.next_child += 1;
                        if let Some(child) = children[slot] {
                            found = Some(child);
                            break;
                        }
                    }
                    found
                }
            };

            match descend {
                Some(child) => {
                    if let Err(e) = self.push_node(child) {
                        self.stack.clear();
                        return Some(Err(e));
                    }
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
