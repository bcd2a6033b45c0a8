//! # RLP Codec
//!
//! Deterministic recursive-length-prefix encoding used for everything that
//! ends up content-addressed: trie nodes, account records, receipts.
//!
//! Serde formats are deliberately not used here. Content addressing requires
//! one canonical byte representation, and RLP gives us exactly that.

use primitive_types::U256;
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::entities::Hash;

/// Errors produced when decoding RLP payloads.
///
/// A decode failure always means the persisted bytes are corrupt or were
/// written by an incompatible encoder. It is never coerced into a default
/// value by callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RlpError {
    #[error("RLP input truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("RLP length prefix is not minimal or overflows")]
    BadLengthPrefix,

    #[error("expected RLP byte string, found list")]
    ExpectedBytes,

    #[error("expected RLP list, found byte string")]
    ExpectedList,

    #[error("integer field has leading zero bytes or is too wide")]
    BadInteger,

    #[error("expected {expected}-byte field, got {got} bytes")]
    BadFieldWidth { expected: usize, got: usize },

    #[error("trailing bytes after RLP item")]
    TrailingBytes,

    #[error("RLP list has {got} items, expected {expected}")]
    BadItemCount { expected: usize, got: usize },
}

// =============================================================================
// ENCODING
// =============================================================================

/// RLP-encode a byte slice.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        vec![data[0]]
    } else if data.len() < 56 {
        let mut result = vec![0x80 + data.len() as u8];
        result.extend_from_slice(data);
        result
    } else {
        let len_bytes = encode_length(data.len());
        let mut result = vec![0xb7 + len_bytes.len() as u8];
        result.extend_from_slice(&len_bytes);
        result.extend_from_slice(data);
        result
    }
}

/// RLP-encode a u64 as a minimal big-endian byte string.
pub fn encode_u64(value: u64) -> Vec<u8> {
    if value == 0 {
        return vec![0x80];
    }
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    encode_bytes(&bytes[start..])
}

/// RLP-encode a U256 as a minimal big-endian byte string.
pub fn encode_u256(value: &U256) -> Vec<u8> {
    if value.is_zero() {
        return vec![0x80];
    }
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(31);
    encode_bytes(&bytes[start..])
}

/// Wrap already-encoded items into an RLP list.
pub fn wrap_list(payload: Vec<u8>) -> Vec<u8> {
    let mut result = Vec::with_capacity(payload.len() + 9);
    if payload.len() < 56 {
        result.push(0xc0 + payload.len() as u8);
    } else {
        let len_bytes = encode_length(payload.len());
        result.push(0xf7 + len_bytes.len() as u8);
        result.extend_from_slice(&len_bytes);
    }
    result.extend(payload);
    result
}

/// RLP-encode a slice of raw byte strings as a list.
pub fn encode_list_of_bytes(items: &[&[u8]]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        payload.extend(encode_bytes(item));
    }
    wrap_list(payload)
}

/// Encode a length as minimal big-endian bytes.
fn encode_length(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

// =============================================================================
// DECODING
// =============================================================================

/// A decoded RLP item: either a byte string or a list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Bytes(Vec<u8>),
    List(Vec<Item>),
}

impl Item {
    /// Interpret this item as a byte string.
    pub fn as_bytes(&self) -> Result<&[u8], RlpError> {
        match self {
            Item::Bytes(b) => Ok(b),
            Item::List(_) => Err(RlpError::ExpectedBytes),
        }
    }

    /// Interpret this item as a list of items.
    pub fn as_list(&self) -> Result<&[Item], RlpError> {
        match self {
            Item::List(items) => Ok(items),
            Item::Bytes(_) => Err(RlpError::ExpectedList),
        }
    }

    /// Interpret this item as a list with exactly `n` entries.
    pub fn as_list_of(&self, n: usize) -> Result<&[Item], RlpError> {
        let items = self.as_list()?;
        if items.len() != n {
            return Err(RlpError::BadItemCount {
                expected: n,
                got: items.len(),
            });
        }
        Ok(items)
    }

    /// Decode a minimal big-endian u64.
    pub fn as_u64(&self) -> Result<u64, RlpError> {
        let bytes = self.as_bytes()?;
        if bytes.len() > 8 || (!bytes.is_empty() && bytes[0] == 0) {
            return Err(RlpError::BadInteger);
        }
        let mut buf = [0u8; 8];
        buf[8 - bytes.len()..].copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    /// Decode a minimal big-endian U256.
    pub fn as_u256(&self) -> Result<U256, RlpError> {
        let bytes = self.as_bytes()?;
        if bytes.len() > 32 || (!bytes.is_empty() && bytes[0] == 0) {
            return Err(RlpError::BadInteger);
        }
        Ok(U256::from_big_endian(bytes))
    }

    /// Decode a fixed 32-byte hash. An empty string decodes to the zero hash.
    pub fn as_hash(&self) -> Result<Hash, RlpError> {
        let bytes = self.as_bytes()?;
        if bytes.is_empty() {
            return Ok([0u8; 32]);
        }
        if bytes.len() != 32 {
            return Err(RlpError::BadFieldWidth {
                expected: 32,
                got: bytes.len(),
            });
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(bytes);
        Ok(hash)
    }

    /// Decode a fixed-width byte array.
    pub fn as_array<const N: usize>(&self) -> Result<[u8; N], RlpError> {
        let bytes = self.as_bytes()?;
        if bytes.len() != N {
            return Err(RlpError::BadFieldWidth {
                expected: N,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

/// Decode a complete RLP item, rejecting trailing bytes.
pub fn decode(data: &[u8]) -> Result<Item, RlpError> {
    let (item, consumed) = decode_at(data)?;
    if consumed != data.len() {
        return Err(RlpError::TrailingBytes);
    }
    Ok(item)
}

/// Decode one item starting at the beginning of `data`.
///
/// Returns the item and the number of bytes consumed. Iterative over list
/// payloads; recursion depth is bounded by nesting, which for trie nodes
/// and receipts is a small constant.
fn decode_at(data: &[u8]) -> Result<(Item, usize), RlpError> {
    let first = *data.first().ok_or(RlpError::Truncated { need: 1, have: 0 })?;

    match first {
        0x00..=0x7f => Ok((Item::Bytes(vec![first]), 1)),

        0x80..=0xb7 => {
            let len = (first - 0x80) as usize;
            take(data, 1, len).map(|b| (Item::Bytes(b.to_vec()), 1 + len))
        }

        0xb8..=0xbf => {
            let len_len = (first - 0xb7) as usize;
            let len = decode_length(take(data, 1, len_len)?)?;
            let payload = take(data, 1 + len_len, len)?;
            Ok((Item::Bytes(payload.to_vec()), 1 + len_len + len))
        }

        0xc0..=0xf7 => {
            let len = (first - 0xc0) as usize;
            let payload = take(data, 1, len)?;
            Ok((Item::List(decode_list_payload(payload)?), 1 + len))
        }

        0xf8..=0xff => {
            let len_len = (first - 0xf7) as usize;
            let len = decode_length(take(data, 1, len_len)?)?;
            let payload = take(data, 1 + len_len, len)?;
            Ok((Item::List(decode_list_payload(payload)?), 1 + len_len + len))
        }
    }
}

fn decode_list_payload(mut payload: &[u8]) -> Result<Vec<Item>, RlpError> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, consumed) = decode_at(payload)?;
        items.push(item);
        payload = &payload[consumed..];
    }
    Ok(items)
}

fn decode_length(bytes: &[u8]) -> Result<usize, RlpError> {
    if bytes.is_empty() || bytes[0] == 0 || bytes.len() > 8 {
        return Err(RlpError::BadLengthPrefix);
    }
    let mut len: usize = 0;
    for &b in bytes {
        len = len
            .checked_mul(256)
            .and_then(|l| l.checked_add(b as usize))
            .ok_or(RlpError::BadLengthPrefix)?;
    }
    Ok(len)
}

fn take(data: &[u8], offset: usize, len: usize) -> Result<&[u8], RlpError> {
    data.get(offset..offset + len).ok_or(RlpError::Truncated {
        need: offset + len,
        have: data.len(),
    })
}

// =============================================================================
// HASHING
// =============================================================================

/// Compute the Keccak256 hash of a byte slice.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
