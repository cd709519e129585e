/// Huffman encode and decode entry points.
///
/// A compressed stream is laid out as
///
/// ```text
/// [stream header][packed tree][bitstream words]
/// ```
///
/// and its total length is always a multiple of 4. [`compress`] and
/// [`decompress`] handle the whole stream; [`encode_body`] and
/// [`decode_to_buf`] handle only the part after the header, for callers
/// that manage the header themselves.
use crate::bitstream::{BitWriter, WordReader};
use crate::header::{self, Format};
use crate::pack::{self, PackedTree, LEAF_LEFT, LEAF_RIGHT};
use crate::tree::HuffmanTree;
use crate::{HuffError, HuffResult};

/// Slot of the root descriptor in the packed tree.
const ROOT_SLOT: usize = 1;

/// Compress `input` into a complete stream, header included.
pub fn compress(input: &[u8]) -> HuffResult<Vec<u8>> {
    // Hopefully the output is no larger than the input.
    let mut out = Vec::with_capacity(input.len() + header::header_size(input.len()) + 512);
    header::write_header(&mut out, Format::Huffman8, input.len())?;
    encode_body(input, &mut out)?;
    Ok(out)
}

/// Append the packed tree and bitstream for `input` to `out`, then pad
/// `out` with zeros to a multiple of 4 bytes.
///
/// Returns the number of bytes appended.
pub fn encode_body(input: &[u8], out: &mut Vec<u8>) -> HuffResult<usize> {
    let start = out.len();
    let tree = HuffmanTree::from_data(input)?;
    let packed = pack::pack(&tree)?;
    out.extend_from_slice(packed.as_bytes());

    let mut bits = BitWriter::new(out);
    for &byte in input {
        // Every byte of the input has a leaf in a tree built from it.
        let (code, len) = tree.code(byte).ok_or(HuffError::InvalidInput)?;
        bits.push(code, len);
    }
    bits.flush();

    // Word flushes keep the bitstream aligned; this covers a header or
    // tree that left `out` misaligned.
    let padded = out.len().next_multiple_of(4);
    out.resize(padded, 0);

    tracing::debug!(
        input = input.len(),
        tree = packed.len(),
        output = out.len() - start,
        "huffman encoded"
    );
    Ok(out.len() - start)
}

/// Decode exactly `out.len()` bytes from `data`, which starts at the
/// packed tree (the stream header already stripped).
///
/// The tree is trusted to be well formed; a descriptor or bitstream read
/// that falls outside `data` returns `InvalidInput` rather than reading
/// past it. Returns the number of bytes of `data` consumed.
pub fn decode_to_buf(data: &[u8], out: &mut [u8]) -> HuffResult<usize> {
    let size = *data.first().ok_or(HuffError::InvalidInput)?;
    let tree_len = PackedTree::encoded_len_from_header(size);
    let tree = data.get(..tree_len).ok_or(HuffError::InvalidInput)?;
    let mut bits = WordReader::new(&data[tree_len..]);

    let mut node = ROOT_SLOT;
    let mut written = 0;
    while written < out.len() {
        let bit = bits.next_bit()?;
        let descriptor = *tree.get(node).ok_or(HuffError::InvalidInput)?;
        let pair = PackedTree::child_pair(node, descriptor);

        let (child, is_leaf) = if bit {
            (pair + 1, descriptor & LEAF_RIGHT != 0)
        } else {
            (pair, descriptor & LEAF_LEFT != 0)
        };

        if is_leaf {
            out[written] = *tree.get(child).ok_or(HuffError::InvalidInput)?;
            written += 1;
            node = ROOT_SLOT;
        } else {
            node = child;
        }
    }

    Ok(tree_len + bits.bytes_consumed())
}

/// Decode `len` bytes from `data`, which starts at the packed tree.
pub fn decode(data: &[u8], len: usize) -> HuffResult<Vec<u8>> {
    let mut out = vec![0u8; len];
    decode_to_buf(data, &mut out)?;
    tracing::debug!(input = data.len(), output = len, "huffman decoded");
    Ok(out)
}

/// Decompress a complete stream produced by [`compress`].
///
/// Returns `Unsupported` for any format other than 8-bit Huffman.
pub fn decompress(stream: &[u8]) -> HuffResult<Vec<u8>> {
    let header = header::parse_header(stream)?;
    if header.format != Format::Huffman8 {
        return Err(HuffError::Unsupported);
    }
    decode(&stream[header.header_len..], header.len as usize)
}
