//! C-callable FFI layer for bioshuff.
//!
//! Mirrors the pointer-and-length entry points firmware toolchains expect:
//! compress a buffer into a full stream, decode a header-less body into a
//! caller-sized buffer, or decompress a full stream.
//!
//! # Safety
//!
//! All `unsafe extern "C"` functions in this module require:
//! - Non-null pointers
//! - Valid pointer/length pairs (caller must ensure the pointed-to memory
//!   is valid for the specified length)
//! - Input and output buffers that do not overlap
#![allow(clippy::missing_safety_doc)]

use std::slice;

use crate::header;
use crate::huffman;
use crate::HuffError;

// Error codes matching the C API design
pub const BH_OK: i64 = 0;
pub const BH_ERROR_BUFFER_TOO_SMALL: i64 = -1;
pub const BH_ERROR_INVALID_INPUT: i64 = -2;
pub const BH_ERROR_UNSUPPORTED: i64 = -3;
pub const BH_ERROR_INTERNAL: i64 = -4;

fn error_code(err: HuffError) -> i64 {
    match err {
        HuffError::BufferTooSmall => BH_ERROR_BUFFER_TOO_SMALL,
        HuffError::InvalidInput | HuffError::InputTooLarge => BH_ERROR_INVALID_INPUT,
        HuffError::Unsupported => BH_ERROR_UNSUPPORTED,
        HuffError::CodeTooLong | HuffError::OffsetOverflow | HuffError::LayoutMismatch => {
            BH_ERROR_INTERNAL
        }
    }
}

/// Copy `data` into the caller's buffer, returning its length or an error
/// code if it does not fit.
fn copy_out(data: &[u8], output: &mut [u8]) -> i64 {
    match output.get_mut(..data.len()) {
        Some(dst) => {
            dst.copy_from_slice(data);
            data.len() as i64
        }
        None => BH_ERROR_BUFFER_TOO_SMALL,
    }
}

/// Upper bound on the compressed size of `input_len` bytes.
///
/// Codes are at most 31 bits, the tree at most 512 bytes and the header
/// at most 8.
#[no_mangle]
pub extern "C" fn bh_compress_bound(input_len: usize) -> usize {
    let bits = input_len.saturating_mul(31);
    8 + 512 + bits.div_ceil(32).saturating_mul(4)
}

/// Compress `input` into a complete stream (header, tree, bitstream).
///
/// Returns bytes written on success, or a negative error code on failure.
#[no_mangle]
pub unsafe extern "C" fn bh_compress(
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_len: usize,
) -> i64 {
    if input.is_null() || output.is_null() {
        return BH_ERROR_INVALID_INPUT;
    }

    let input_slice = slice::from_raw_parts(input, input_len);
    let output_slice = slice::from_raw_parts_mut(output, output_len);

    match huffman::compress(input_slice) {
        Ok(stream) => copy_out(&stream, output_slice),
        Err(e) => error_code(e),
    }
}

/// Decode exactly `output_len` bytes from data starting at the packed tree.
///
/// `input_len` bounds every read; the output length comes from the stream
/// header the caller already parsed. Returns `output_len` on success.
#[no_mangle]
pub unsafe extern "C" fn bh_decode(
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_len: usize,
) -> i64 {
    if input.is_null() || output.is_null() {
        return BH_ERROR_INVALID_INPUT;
    }

    let input_slice = slice::from_raw_parts(input, input_len);
    let output_slice = slice::from_raw_parts_mut(output, output_len);

    match huffman::decode_to_buf(input_slice, output_slice) {
        Ok(_) => output_len as i64,
        Err(e) => error_code(e),
    }
}

/// Decompress a complete stream.
///
/// Returns bytes written on success, or a negative error code on failure.
#[no_mangle]
pub unsafe extern "C" fn bh_decompress(
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_len: usize,
) -> i64 {
    if input.is_null() || output.is_null() {
        return BH_ERROR_INVALID_INPUT;
    }

    let input_slice = slice::from_raw_parts(input, input_len);
    let output_slice = slice::from_raw_parts_mut(output, output_len);

    let header = match header::parse_header(input_slice) {
        Ok(h) => h,
        Err(e) => return error_code(e),
    };
    if header.format != header::Format::Huffman8 {
        return BH_ERROR_UNSUPPORTED;
    }
    let len = header.len as usize;
    let Some(dst) = output_slice.get_mut(..len) else {
        return BH_ERROR_BUFFER_TOO_SMALL;
    };
    match huffman::decode_to_buf(&input_slice[header.header_len..], dst) {
        Ok(_) => len as i64,
        Err(e) => error_code(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress_round_trip() {
        let input = b"abracadabra, abracadabra";
        let mut compressed = vec![0u8; bh_compress_bound(input.len())];
        let n = unsafe {
            bh_compress(
                input.as_ptr(),
                input.len(),
                compressed.as_mut_ptr(),
                compressed.len(),
            )
        };
        assert!(n > 0);
        assert_eq!(n % 4, 0);

        let mut out = vec![0u8; input.len()];
        let m = unsafe {
            bh_decompress(compressed.as_ptr(), n as usize, out.as_mut_ptr(), out.len())
        };
        assert_eq!(m, input.len() as i64);
        assert_eq!(&out, input);
    }

    #[test]
    fn test_decode_body() {
        let input = b"aaaabbbccd";
        let stream = huffman::compress(input).unwrap();
        let body = &stream[4..];
        let mut out = vec![0u8; input.len()];
        let n = unsafe { bh_decode(body.as_ptr(), body.len(), out.as_mut_ptr(), out.len()) };
        assert_eq!(n, input.len() as i64);
        assert_eq!(&out, input);
    }

    #[test]
    fn test_output_too_small() {
        let input = vec![7u8; 64];
        let mut small = vec![0u8; 4];
        let n = unsafe { bh_compress(input.as_ptr(), input.len(), small.as_mut_ptr(), small.len()) };
        assert_eq!(n, BH_ERROR_BUFFER_TOO_SMALL);

        let stream = huffman::compress(&input).unwrap();
        let mut out = vec![0u8; 10];
        let m = unsafe { bh_decompress(stream.as_ptr(), stream.len(), out.as_mut_ptr(), out.len()) };
        assert_eq!(m, BH_ERROR_BUFFER_TOO_SMALL);
    }

    #[test]
    fn test_null_pointers() {
        let mut out = [0u8; 4];
        let n = unsafe { bh_compress(std::ptr::null(), 0, out.as_mut_ptr(), out.len()) };
        assert_eq!(n, BH_ERROR_INVALID_INPUT);
        let n = unsafe { bh_decode(out.as_ptr(), out.len(), std::ptr::null_mut(), 0) };
        assert_eq!(n, BH_ERROR_INVALID_INPUT);
    }

    #[test]
    fn test_bound_covers_worst_case() {
        let input: Vec<u8> = (0..=255).collect();
        let stream = huffman::compress(&input).unwrap();
        assert!(stream.len() <= bh_compress_bound(input.len()));
        assert!(huffman::compress(&[]).unwrap().len() <= bh_compress_bound(0));
    }

    #[test]
    fn test_ok_code_is_zero() {
        let input: [u8; 0] = [];
        let mut out = [0u8; 16];
        let n = unsafe { bh_compress(input.as_ptr(), 0, out.as_mut_ptr(), out.len()) };
        assert_eq!(n, 12);
        let mut dst = [0u8; 1];
        let m = unsafe { bh_decompress(out.as_ptr(), n as usize, dst.as_mut_ptr(), 0) };
        assert_eq!(m, BH_OK);
    }
}
