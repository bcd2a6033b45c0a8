// =============================================================================
// NIBBLES: Half-byte path representation
// =============================================================================

/// Nibble path for trie traversal.
///
/// Keys are converted to nibbles (half-bytes, 0-15) for traversal through
/// the trie. A 32-byte hashed account path becomes 64 nibbles.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Nibbles(pub Vec<u8>);

impl Nibbles {
    /// Create nibbles from arbitrary key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut nibbles = Vec::with_capacity(bytes.len() * 2);
        for byte in bytes {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0F);
        }
        Nibbles(nibbles)
    }

    /// Get a slice of nibbles starting at offset.
    pub fn slice(&self, start: usize) -> Self {
        Nibbles(self.0[start..].to_vec())
    }

    /// Get a range slice of nibbles.
    pub fn slice_range(&self, start: usize, end: usize) -> Self {
        Nibbles(self.0[start..end].to_vec())
    }

    /// Find common prefix length with another nibbles path.
    pub fn common_prefix_len(&self, other: &Nibbles) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// True if `self` is a prefix of `other`.
    pub fn is_prefix_of(&self, other: &Nibbles) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get nibble at index.
    pub fn at(&self, index: usize) -> u8 {
        self.0[index]
    }

    /// Append another nibble path.
    pub fn join(&self, other: &Nibbles) -> Self {
        let mut joined = self.0.clone();
        joined.extend_from_slice(&other.0);
        Nibbles(joined)
    }

    /// Append a single nibble.
    pub fn push(&self, nibble: u8) -> Self {
        let mut joined = self.0.clone();
        joined.push(nibble);
        Nibbles(joined)
    }

    /// Encode nibbles with hex-prefix for RLP encoding.
    ///
    /// First nibble encodes flags: 0=extension even, 1=extension odd,
    /// 2=leaf even, 3=leaf odd. If the path has odd length, the first
    /// path nibble shares the prefix byte.
    pub fn encode_hex_prefix(&self, is_leaf: bool) -> Vec<u8> {
        let odd = self.len() % 2 == 1;
        let prefix = if is_leaf { 2 } else { 0 } + if odd { 1 } else { 0 };

        let mut result = Vec::with_capacity(self.len() / 2 + 1);

        if odd {
            result.push((prefix << 4) | self.0[0]);
            for chunk in self.0[1..].chunks(2) {
                result.push((chunk[0] << 4) | chunk.get(1).copied().unwrap_or(0));
            }
        } else {
            result.push(prefix << 4);
            for chunk in self.0.chunks(2) {
                result.push((chunk[0] << 4) | chunk.get(1).copied().unwrap_or(0));
            }
        }

        result
    }

    /// Decode hex-prefix encoded bytes back to nibbles.
    pub fn decode_hex_prefix(encoded: &[u8]) -> (Self, bool) {
        if encoded.is_empty() {
            return (Nibbles(vec![]), false);
        }

        let prefix = encoded[0] >> 4;
        let is_leaf = prefix >= 2;
        let odd = prefix % 2 == 1;

        let mut nibbles = Vec::new();

        if odd {
            nibbles.push(encoded[0] & 0x0F);
        }

        for &byte in &encoded[1..] {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0F);
        }

        (Nibbles(nibbles), is_leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nibbles_from_bytes() {
        let nibbles = Nibbles::from_bytes(&[0xAB, 0xCD]);
        assert_eq!(nibbles.0, vec![0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[test]
    fn test_common_prefix() {
        let a = Nibbles(vec![1, 2, 3, 4]);
        let b = Nibbles(vec![1, 2, 7, 8]);
        assert_eq!(a.common_prefix_len(&b), 2);
        assert!(a.slice_range(0, 2).is_prefix_of(&b));
    }

    #[test]
    fn test_hex_prefix_encoding_flags() {
        // Even length leaf
        let encoded = Nibbles(vec![1, 2, 3, 4]).encode_hex_prefix(true);
        assert_eq!(encoded[0] >> 4, 2);

        // Odd length leaf
        let encoded = Nibbles(vec![1, 2, 3]).encode_hex_prefix(true);
        assert_eq!(encoded[0] >> 4, 3);

        // Even length extension
        let encoded = Nibbles(vec![1, 2, 3, 4]).encode_hex_prefix(false);
        assert_eq!(encoded[0] >> 4, 0);
    }

    #[test]
    fn test_hex_prefix_roundtrip() {
        for path in [vec![], vec![5], vec![1, 2, 3, 4, 5], vec![0xF; 64]] {
            for is_leaf in [true, false] {
                let original = Nibbles(path.clone());
                let encoded = original.encode_hex_prefix(is_leaf);
                let (decoded, leaf) = Nibbles::decode_hex_prefix(&encoded);
                assert_eq!(leaf, is_leaf);
                assert_eq!(decoded, original);
            }
        }
    }
}
