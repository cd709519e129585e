/// Validation tests across the whole codec.
///
/// These tests verify:
/// 1. **Round-trip correctness** on a broad set of generated vectors
/// 2. **Layout properties** - size byte, offset range, child resolution
/// 3. **Stream properties** - alignment, determinism, header agreement
/// 4. **Randomized inputs** via proptest
#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::frequency::FrequencyTable;
    use crate::header;
    use crate::huffman;
    use crate::pack::{self, PackedTree, LEAF_LEFT, LEAF_RIGHT};
    use crate::tree::HuffmanTree;

    // ---------------------------------------------------------------
    // Helper: generate diverse test vectors
    // ---------------------------------------------------------------

    /// Single byte repeated.
    fn data_all_zeros(n: usize) -> Vec<u8> {
        vec![0u8; n]
    }

    /// Every byte value once.
    fn data_uniform() -> Vec<u8> {
        (0..=255u8).collect()
    }

    /// 90% one byte, 10% another.
    fn data_skewed(n: usize) -> Vec<u8> {
        (0..n).map(|i| if i % 10 == 0 { 1 } else { 0 }).collect()
    }

    fn data_repeating_text() -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog. ".repeat(100)
    }

    /// All 256 values with nearly equal weights.
    fn data_sawtooth(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 256) as u8).collect()
    }

    /// Long runs of decreasing length.
    fn data_runs() -> Vec<u8> {
        let mut v = Vec::new();
        for i in 0..50u8 {
            v.extend(std::iter::repeat(i).take((256 - i as usize * 4).max(1)));
        }
        v
    }

    /// Deterministic pseudo-random bytes (xorshift).
    fn data_noise(n: usize, seed: u32) -> Vec<u8> {
        let mut x = seed.max(1);
        (0..n)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                (x >> 24) as u8
            })
            .collect()
    }

    fn round_trip(input: &[u8]) {
        let stream = huffman::compress(input).unwrap();
        assert_eq!(stream.len() % 4, 0);
        let header = header::parse_header(&stream).unwrap();
        assert_eq!(header.len as usize, input.len());
        let body = &stream[header.header_len..];
        assert_eq!(huffman::decode(body, input.len()).unwrap(), input);
    }

    // ---------------------------------------------------------------
    // 1. Round trips
    // ---------------------------------------------------------------

    macro_rules! round_trip_test {
        ($name:ident, $data:expr) => {
            #[test]
            fn $name() {
                round_trip(&$data);
            }
        };
    }

    round_trip_test!(round_trip_empty, Vec::<u8>::new());
    round_trip_test!(round_trip_one_byte, vec![0x42u8]);
    round_trip_test!(round_trip_zeros, data_all_zeros(1000));
    round_trip_test!(round_trip_uniform, data_uniform());
    round_trip_test!(round_trip_skewed, data_skewed(1000));
    round_trip_test!(round_trip_text, data_repeating_text());
    round_trip_test!(round_trip_sawtooth, data_sawtooth(1000));
    round_trip_test!(round_trip_runs, data_runs());
    round_trip_test!(round_trip_noise, data_noise(20_000, 0x1234_5678));
    round_trip_test!(round_trip_uniform_twice, data_uniform().repeat(2));

    // ---------------------------------------------------------------
    // 2. Layout properties
    // ---------------------------------------------------------------

    /// Walk the packed tree and collect the code of every leaf slot, the
    /// way the decoder would reach it.
    fn packed_codes(packed: &PackedTree) -> Vec<(u8, u32, u8)> {
        let bytes = packed.as_bytes();
        let mut codes = Vec::new();
        let mut stack = vec![(1usize, 0u32, 0u8)];
        while let Some((slot, code, len)) = stack.pop() {
            let descriptor = bytes[slot];
            let pair = PackedTree::child_pair(slot, descriptor);
            for (child, bit, flag) in [(pair, 0, LEAF_LEFT), (pair + 1, 1, LEAF_RIGHT)] {
                let child_code = (code << 1) | bit;
                if descriptor & flag != 0 {
                    codes.push((bytes[child], child_code, len + 1));
                } else {
                    stack.push((child, child_code, len + 1));
                }
            }
        }
        codes
    }

    #[test]
    fn packed_tree_resolves_every_code() {
        for input in [
            data_repeating_text(),
            data_uniform(),
            data_sawtooth(3000),
            data_runs(),
            data_noise(5000, 99),
        ] {
            let tree = HuffmanTree::from_data(&input).unwrap();
            let packed = pack::pack(&tree).unwrap();
            let mut walked = packed_codes(&packed);
            walked.sort_unstable();
            let mut built = tree.leaves();
            built.sort_unstable();
            assert_eq!(walked, built);
        }
    }

    #[test]
    fn header_byte_matches_tree_length() {
        for leaves in 2..=256usize {
            let mut counts = [0u32; 256];
            for (i, c) in counts.iter_mut().take(leaves).enumerate() {
                *c = 1 + i as u32;
            }
            let tree = HuffmanTree::from_frequency_table(&FrequencyTable::from_counts(counts))
                .unwrap();
            let packed = pack::pack(&tree).unwrap();
            assert_eq!(packed.len(), 2 * leaves);
            assert_eq!(
                PackedTree::encoded_len_from_header(packed.header_byte()),
                packed.len()
            );
        }
    }

    #[test]
    fn uniform_alphabet_forces_fixup() {
        let packed = pack::pack(&HuffmanTree::from_data(&data_sawtooth(1000)).unwrap()).unwrap();
        assert!(packed.fixup_repairs() > 0);
        assert_eq!(packed.internal_slots().unwrap().len(), 255);
    }

    // ---------------------------------------------------------------
    // 3. Stream properties
    // ---------------------------------------------------------------

    #[test]
    fn compression_ratio_on_skewed_data() {
        let input = data_skewed(10_000);
        let stream = huffman::compress(&input).unwrap();
        assert!(stream.len() * 4 < input.len());
    }

    #[test]
    fn tree_and_bitstream_sizes() {
        let input = data_uniform();
        let stream = huffman::compress(&input).unwrap();
        let body = &stream[4..];
        let tree_len = PackedTree::encoded_len_from_header(body[0]);
        assert_eq!(tree_len, 512);
        assert_eq!(body.len() - tree_len, 256);
    }

    // ---------------------------------------------------------------
    // 4. Randomized
    // ---------------------------------------------------------------

    proptest! {
        #[test]
        fn prop_round_trip(input in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let stream = huffman::compress(&input).unwrap();
            prop_assert_eq!(stream.len() % 4, 0);
            prop_assert_eq!(huffman::decompress(&stream).unwrap(), input);
        }

        #[test]
        fn prop_small_alphabet_round_trip(
            input in proptest::collection::vec(0u8..4, 0..4096)
        ) {
            let stream = huffman::compress(&input).unwrap();
            prop_assert_eq!(huffman::decompress(&stream).unwrap(), input);
        }

        #[test]
        fn prop_deterministic(input in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(huffman::compress(&input).unwrap(), huffman::compress(&input).unwrap());
        }

        #[test]
        fn prop_any_histogram_packs(
            weights in proptest::collection::vec(1u32..10_000, 2..=256)
        ) {
            let mut counts = [0u32; 256];
            counts[..weights.len()].copy_from_slice(&weights);
            let tree = HuffmanTree::from_frequency_table(&FrequencyTable::from_counts(counts))
                .unwrap();
            let packed = pack::pack(&tree).unwrap();
            prop_assert_eq!(packed.internal_slots().unwrap().len(), weights.len() - 1);
            prop_assert_eq!(
                PackedTree::encoded_len_from_header(packed.header_byte()),
                packed.len()
            );
        }
    }
}
