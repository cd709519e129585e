//! Byte histogram feeding the Huffman tree builder.
//!
//! Counts the occurrence of each byte value (0-255) in an input buffer.

/// Occurrence counts for every byte value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    /// Count of each byte value (index = byte value, value = count).
    pub byte: [u32; 256],
    /// Sum of all counts.
    pub total: u64,
    /// Number of distinct byte values with nonzero count.
    pub used: u32,
}

impl FrequencyTable {
    /// Create a new, zeroed frequency table.
    pub fn new() -> Self {
        Self {
            byte: [0u32; 256],
            total: 0,
            used: 0,
        }
    }

    /// Build a table from explicit per-symbol counts.
    pub fn from_counts(byte: [u32; 256]) -> Self {
        let mut table = Self {
            byte,
            total: 0,
            used: 0,
        };
        table.refresh_totals();
        table
    }

    /// Add the byte counts of `input` to the table.
    ///
    /// Counts saturate at `u32::MAX`; the stream header cannot describe
    /// inputs that long anyway.
    pub fn count(&mut self, input: &[u8]) {
        // Four banks break the store-to-load dependency on runs of one byte.
        let mut banks = [[0u32; 256]; 4];
        let mut chunks = input.chunks_exact(4);
        for chunk in &mut chunks {
            banks[0][chunk[0] as usize] += 1;
            banks[1][chunk[1] as usize] += 1;
            banks[2][chunk[2] as usize] += 1;
            banks[3][chunk[3] as usize] += 1;
        }
        for &b in chunks.remainder() {
            banks[0][b as usize] += 1;
        }

        for (i, slot) in self.byte.iter_mut().enumerate() {
            let sum = banks.iter().map(|bank| bank[i] as u64).sum::<u64>();
            *slot = u32::try_from(*slot as u64 + sum).unwrap_or(u32::MAX);
        }
        self.refresh_totals();
    }

    fn refresh_totals(&mut self) {
        let mut total = 0u64;
        let mut used = 0u32;
        for &c in &self.byte {
            total += c as u64;
            used += (c > 0) as u32;
        }
        self.total = total;
        self.used = used;
    }

    /// Get the count for a specific byte value.
    pub fn get(&self, byte: u8) -> u32 {
        self.byte[byte as usize]
    }

    /// Iterate `(symbol, count)` for every byte value that occurs, in
    /// ascending symbol order.
    pub fn symbols(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.byte
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(i, &c)| (i as u8, c))
    }

    /// Compute the Shannon entropy of the distribution (in bits per symbol).
    ///
    /// Returns 0.0 if the table is empty.
    pub fn entropy(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f32;
        self.symbols()
            .map(|(_, c)| {
                let prob = c as f32 / total;
                -prob * prob.log2()
            })
            .sum()
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function: compute a frequency table from input.
pub fn get_frequency(input: &[u8]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    table.count(input);
    table
}
