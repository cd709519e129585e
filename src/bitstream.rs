/// 32-bit word bitstreams in the BIOS Huffman layout.
///
/// Bits are packed MSB-first into a 32-bit word, and each full word is
/// stored little-endian. A partially filled word is flushed with its unused
/// low bits left at zero.
use crate::{HuffError, HuffResult};

const WORD_BITS: u32 = 32;

/// Appends codes to an output buffer one 32-bit word at a time.
#[derive(Debug)]
pub struct BitWriter<'a> {
    out: &'a mut Vec<u8>,
    /// Next bit to write counts down from 32; 32 means the word is empty.
    pos: u32,
    word: u32,
}

impl<'a> BitWriter<'a> {
    /// Start a new word stream at the end of `out`.
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        BitWriter {
            out,
            pos: WORD_BITS,
            word: 0,
        }
    }

    /// Push the low `len` bits of `code`, most significant first.
    pub fn push(&mut self, code: u32, len: u8) {
        for i in (0..len).rev() {
            self.pos -= 1;
            if (code >> i) & 1 != 0 {
                self.word |= 1 << self.pos;
            } else {
                self.word &= !(1 << self.pos);
            }
            if self.pos == 0 {
                self.flush();
            }
        }
    }

    /// Write out the pending word, zero-padded. Does nothing if no bits
    /// are pending.
    pub fn flush(&mut self) {
        if self.pos >= WORD_BITS {
            return;
        }
        self.out.extend_from_slice(&self.word.to_le_bytes());
        self.pos = WORD_BITS;
        self.word = 0;
    }

    /// Number of bits waiting in the current word.
    pub fn pending_bits(&self) -> u32 {
        WORD_BITS - self.pos
    }
}

/// Reads single bits from a stream of little-endian 32-bit words.
#[derive(Debug, Clone)]
pub struct WordReader<'a> {
    data: &'a [u8],
    cursor: usize,
    word: u32,
    /// Bit to read next; zero means the word is used up.
    mask: u32,
}

impl<'a> WordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        WordReader {
            data,
            cursor: 0,
            word: 0,
            mask: 0,
        }
    }

    /// Read the next bit, loading a new word when the current one is spent.
    ///
    /// Returns `InvalidInput` if the stream ends mid-read.
    #[inline]
    pub fn next_bit(&mut self) -> HuffResult<bool> {
        if self.mask == 0 {
            let bytes: [u8; 4] = self
                .data
                .get(self.cursor..self.cursor + 4)
                .and_then(|b| b.try_into().ok())
                .ok_or(HuffError::InvalidInput)?;
            self.word = u32::from_le_bytes(bytes);
            self.cursor += 4;
            self.mask = 1 << (WORD_BITS - 1);
        }
        let bit = self.word & self.mask != 0;
        self.mask >>= 1;
        Ok(bit)
    }

    /// Number of bytes consumed so far, always a multiple of 4.
    pub fn bytes_consumed(&self) -> usize {
        self.cursor
    }
}
