//! Huffman codec for the packed-tree format consumed by handheld console
//! BIOS decompression routines (format tag `0x28`, 8-bit symbols).
//!
//! The encoder builds a Huffman tree from a byte histogram, lays it out as
//! an array of one-byte node descriptors whose child references must fit a
//! 6-bit offset field, and appends the input's codes as 32-bit
//! little-endian words read MSB first. The decoder walks that array one bit
//! at a time.
//!
//! ```
//! let data = b"aaaabbbccd";
//! let packed = bioshuff::huffman::compress(data).unwrap();
//! assert_eq!(packed.len() % 4, 0);
//! assert_eq!(bioshuff::huffman::decompress(&packed).unwrap(), data);
//! ```

pub mod bitstream;
pub mod frequency;
pub mod header;
pub mod huffman;
pub mod pack;
pub mod tree;

pub mod ffi;

#[cfg(test)]
mod validation;

/// Error types for bioshuff operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HuffError {
    /// Output buffer is too small to hold the result.
    BufferTooSmall,
    /// Input data is invalid or truncated.
    InvalidInput,
    /// The stream uses a format this crate does not decode.
    Unsupported,
    /// Input is longer than the stream header can describe.
    InputTooLarge,
    /// A Huffman code would need 32 or more bits.
    CodeTooLong,
    /// A packed node offset does not fit the 6-bit field.
    OffsetOverflow,
    /// A packed node's children are not where its offset says they are.
    LayoutMismatch,
}

impl std::fmt::Display for HuffError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "output buffer too small"),
            Self::InvalidInput => write!(f, "invalid input"),
            Self::Unsupported => write!(f, "unsupported operation"),
            Self::InputTooLarge => write!(f, "input too large for stream header"),
            Self::CodeTooLong => write!(f, "huffman code exceeds 31 bits"),
            Self::OffsetOverflow => write!(f, "packed tree offset exceeds 6 bits"),
            Self::LayoutMismatch => write!(f, "packed tree layout is inconsistent"),
        }
    }
}

impl std::error::Error for HuffError {}

pub type HuffResult<T> = Result<T, HuffError>;
