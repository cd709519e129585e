/// BIOS compression stream header.
///
/// Every compressed stream starts with a format tag and the uncompressed
/// length:
///
/// ```text
/// byte 0      format tag (0x28 = Huffman, 8-bit symbols)
/// bytes 1..4  uncompressed length, 24-bit little-endian
/// bytes 4..8  only when bytes 1..4 are zero: 32-bit little-endian length
/// ```
///
/// Lengths that do not fit 24 bits, and a length of zero, use the 8-byte
/// form so a zero 24-bit field always means "read the extended length".
use crate::{HuffError, HuffResult};

/// Largest length the short header form can carry.
pub const MAX_SHORT_LEN: u32 = 0x00FF_FFFF;

/// Compression formats understood by the BIOS decompression routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Format {
    Lz10 = 0x10,
    Lz11 = 0x11,
    Huffman4 = 0x24,
    Huffman8 = 0x28,
    Rle = 0x30,
}

impl Format {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Format {
    type Error = HuffError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0x10 => Ok(Self::Lz10),
            0x11 => Ok(Self::Lz11),
            0x24 => Ok(Self::Huffman4),
            0x28 => Ok(Self::Huffman8),
            0x30 => Ok(Self::Rle),
            _ => Err(HuffError::Unsupported),
        }
    }
}

/// A parsed stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub format: Format,
    /// Uncompressed length in bytes.
    pub len: u32,
    /// Bytes the header occupies: 4 or 8.
    pub header_len: usize,
}

/// Number of header bytes [`write_header`] emits for `len`.
pub fn header_size(len: usize) -> usize {
    if len == 0 || len > MAX_SHORT_LEN as usize {
        8
    } else {
        4
    }
}

/// Append the header for a stream of `len` uncompressed bytes.
///
/// Returns `InputTooLarge` if `len` does not fit 32 bits.
pub fn write_header(out: &mut Vec<u8>, format: Format, len: usize) -> HuffResult<()> {
    let len32 = u32::try_from(len).map_err(|_| HuffError::InputTooLarge)?;
    out.push(format.tag());
    if header_size(len) == 4 {
        out.extend_from_slice(&len32.to_le_bytes()[..3]);
    } else {
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(&len32.to_le_bytes());
    }
    Ok(())
}

/// Parse the header at the start of `data`.
pub fn parse_header(data: &[u8]) -> HuffResult<Header> {
    if data.len() < 4 {
        return Err(HuffError::InvalidInput);
    }
    let format = Format::try_from(data[0])?;
    let short = u32::from_le_bytes([data[1], data[2], data[3], 0]);
    if short != 0 {
        return Ok(Header {
            format,
            len: short,
            header_len: 4,
        });
    }

    let extended: [u8; 4] = data
        .get(4..8)
        .and_then(|b| b.try_into().ok())
        .ok_or(HuffError::InvalidInput)?;
    Ok(Header {
        format,
        len: u32::from_le_bytes(extended),
        header_len: 8,
    })
}
