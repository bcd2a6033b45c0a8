use super::{nibbles::Nibbles, TrieError, EMPTY_TRIE_ROOT};
use chain_types::rlp::{self, Item};
use chain_types::Hash;

// =============================================================================
// TRIE NODE: The four node types in the MPT
// =============================================================================

/// Node types in the Merkle Patricia Trie.
///
/// - Empty (null reference)
/// - Leaf (remaining path + value)
/// - Extension (shared prefix + single child)
/// - Branch (16 children + optional value)
///
/// Children are always referenced by their 32-byte content hash and stored
/// under that hash in the node store; the trie never embeds child nodes
/// inline. That keeps every node independently addressable, which is what
/// open-by-root and structural sharing rely on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrieNode {
    /// Empty node (null reference, hash = EMPTY_TRIE_ROOT).
    Empty,

    /// Leaf node: stores remaining key path and the value.
    /// RLP: [hex_prefix(path, leaf=true), value]
    Leaf { path: Nibbles, value: Vec<u8> },

    /// Extension node: shared prefix optimization.
    /// RLP: [hex_prefix(path, leaf=false), child_hash]
    Extension { path: Nibbles, child: Hash },

    /// Branch node: 16-way branch for each nibble value.
    /// RLP: [child_0, ..., child_15, value]
    Branch {
        children: Box<[Option<Hash>; 16]>,
        value: Option<Vec<u8>>,
    },
}

impl TrieNode {
    /// RLP-encode this node for hashing and storage.
    pub fn rlp_encode(&self) -> Vec<u8> {
        match self {
            TrieNode::Empty => vec![0x80],

            TrieNode::Leaf { path, value } => {
                let mut payload = rlp::encode_bytes(&path.encode_hex_prefix(true));
                payload.extend(rlp::encode_bytes(value));
                rlp::wrap_list(payload)
            }

            TrieNode::Extension { path, child } => {
                let mut payload = rlp::encode_bytes(&path.encode_hex_prefix(false));
                payload.extend(rlp::encode_bytes(child));
                rlp::wrap_list(payload)
            }

            TrieNode::Branch { children, value } => {
                let mut payload = Vec::with_capacity(17 * 33);
                for child in children.iter() {
                    match child {
                        Some(hash) => payload.extend(rlp::encode_bytes(hash)),
                        None => payload.extend(rlp::encode_bytes(&[])),
                    }
                }
                match value {
                    Some(v) => payload.extend(rlp::encode_bytes(v)),
                    None => payload.extend(rlp::encode_bytes(&[])),
                }
                rlp::wrap_list(payload)
            }
        }
    }

    /// Compute the Keccak256 hash of the RLP-encoded node.
    pub fn hash(&self) -> Hash {
        if matches!(self, TrieNode::Empty) {
            return EMPTY_TRIE_ROOT;
        }
        rlp::keccak256(&self.rlp_encode())
    }

    /// Decode a node from its stored RLP encoding.
    ///
    /// `hash` is only used to tag the decode error with the offending node.
    pub fn rlp_decode(hash: &Hash, data: &[u8]) -> Result<TrieNode, TrieError> {
        let tag = |reason| TrieError::Decode {
            hash: *hash,
            reason,
        };

        let item = rlp::decode(data).map_err(tag)?;

        // Empty node encodes as the empty byte string.
        if let Item::Bytes(bytes) = &item {
            if bytes.is_empty() {
                return Ok(TrieNode::Empty);
            }
            return Err(tag(chain_types::RlpError::ExpectedList));
        }

        let items = item.as_list().map_err(tag)?;
        match items.len() {
            2 => {
                let encoded_path = items[0].as_bytes().map_err(tag)?;
                let (path, is_leaf) = Nibbles::decode_hex_prefix(encoded_path);
                if is_leaf {
                    Ok(TrieNode::Leaf {
                        path,
                        value: items[1].as_bytes().map_err(tag)?.to_vec(),
                    })
                } else {
                    Ok(TrieNode::Extension {
                        path,
                        child: items[1].as_array::<32>().map_err(tag)?,
                    })
                }
            }

            17 => {
                let mut children: Box<[Option<Hash>; 16]> = Box::new([None; 16]);
                for (i, slot) in children.iter_mut().enumerate() {
                    let bytes = items[i].as_bytes().map_err(tag)?;
                    if !bytes.is_empty() {
                        *slot = Some(items[i].as_array::<32>().map_err(tag)?);
                    }
                }
                let value_bytes = items[16].as_bytes().map_err(tag)?;
                let value = if value_bytes.is_empty() {
                    None
                } else {
                    Some(value_bytes.to_vec())
                };
                Ok(TrieNode::Branch { children, value })
            }

            n => Err(tag(chain_types::RlpError::BadItemCount {
                expected: 17,
                got: n,
            })),
        }
    }

    /// Build a branch node with all children empty.
    pub fn empty_branch() -> (Box<[Option<Hash>; 16]>, Option<Vec<u8>>) {
        (Box::new([None; 16]), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trie_node_hashing() {
        let leaf = TrieNode::Leaf {
            path: Nibbles(vec![1, 2, 3, 4]),
            value: vec![0xAB, 0xCD],
        };

        assert_eq!(leaf.hash(), leaf.hash());
        assert_ne!(leaf.hash(), EMPTY_TRIE_ROOT);
        assert_eq!(TrieNode::Empty.hash(), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_node_codec_roundtrip() {
        let mut children: Box<[Option<Hash>; 16]> = Box::new([None; 16]);
        children[3] = Some([0x33; 32]);
        children[15] = Some([0xFF; 32]);

        let nodes = vec![
            TrieNode::Leaf {
                path: Nibbles(vec![1, 2, 3]),
                value: vec![9, 9, 9],
            },
            TrieNode::Extension {
                path: Nibbles(vec![0xA, 0xB]),
                child: [0x77; 32],
            },
            TrieNode::Branch {
                children,
                value: Some(vec![0x01]),
            },
            TrieNode::Empty,
        ];

        for node in nodes {
            let encoded = node.rlp_encode();
            let hash = node.hash();
            let decoded = TrieNode::rlp_decode(&hash, &encoded).unwrap();
            assert_eq!(decoded, node);
        }
    }

    #[test]
    fn test_corrupt_node_reports_decode_error() {
        let garbage = vec![0xC5, 0x01, 0x02];
        let result = TrieNode::rlp_decode(&[0xAA; 32], &garbage);
        assert!(matches!(result, Err(TrieError::Decode { .. })));
    }
}
