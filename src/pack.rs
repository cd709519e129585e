/// Packed tree serialization.
///
/// The BIOS decoder reads the Huffman tree as a byte array. Slot 0 holds
/// `node_count / 2`, slot 1 the root. Every internal node is one descriptor
/// byte:
///
/// ```text
///  7   6   5       0
/// +---+---+---------+
/// | L | R | offset  |
/// +---+---+---------+
/// ```
///
/// Its children sit in the slot pair starting at
/// `(slot & !1) + 2 * offset + 2`. `L`/`R` mark that the first/second
/// child is a leaf, in which case that slot holds the literal byte.
///
/// Laying the tree out breadth-first keeps offsets small, but a subtree
/// with more than 64 leaves can push a pair out of reach of the 6-bit
/// field. Such subtrees are split: each child is packed as its own block,
/// smaller first. Offsets that still overflow are repaired afterwards by
/// sliding the offending child pair towards its parent.
use std::collections::VecDeque;

use crate::tree::{HuffmanTree, NodeId};
use crate::{HuffError, HuffResult};

/// Largest value the 6-bit offset field can hold.
pub const MAX_OFFSET: u32 = 0x3F;

/// Descriptor flag: the first (even-slot) child is a leaf.
pub const LEAF_LEFT: u8 = 0x80;

/// Descriptor flag: the second (odd-slot) child is a leaf.
pub const LEAF_RIGHT: u8 = 0x40;

/// Subtrees with more leaves than this are split instead of laid out
/// breadth-first.
pub const SPLIT_THRESHOLD: u32 = 0x40;

/// A serialized Huffman tree, ready to be followed by the bitstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTree {
    bytes: Vec<u8>,
    repairs: usize,
}

impl PackedTree {
    /// The serialized tree, size byte included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Length in bytes, always even.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The size byte stored in slot 0.
    pub fn header_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// Number of offsets the fixup pass had to repair.
    pub fn fixup_repairs(&self) -> usize {
        self.repairs
    }

    /// Tree length in bytes as the decoder derives it from the size byte.
    pub fn encoded_len_from_header(header: u8) -> usize {
        (header as usize + 1) * 2
    }

    /// Slot of the child pair referenced by the descriptor at `slot`.
    pub fn child_pair(slot: usize, descriptor: u8) -> usize {
        (slot & !1) + 2 * (descriptor as u32 & MAX_OFFSET) as usize + 2
    }

    /// Slots of every internal node reachable from the root, found by
    /// following the descriptors the way the decoder does.
    ///
    /// Returns `InvalidInput` if a descriptor points outside the array.
    pub fn internal_slots(&self) -> HuffResult<Vec<usize>> {
        let mut found = Vec::new();
        let mut stack = vec![1usize];
        while let Some(slot) = stack.pop() {
            let descriptor = *self.bytes.get(slot).ok_or(HuffError::InvalidInput)?;
            let pair = Self::child_pair(slot, descriptor);
            if pair + 1 >= self.bytes.len() {
                return Err(HuffError::InvalidInput);
            }
            found.push(slot);
            if descriptor & LEAF_RIGHT == 0 {
                stack.push(pair + 1);
            }
            if descriptor & LEAF_LEFT == 0 {
                stack.push(pair);
            }
        }
        Ok(found)
    }
}

/// Serialize `tree` into the packed BIOS layout.
pub fn pack(tree: &HuffmanTree) -> HuffResult<PackedTree> {
    let count = tree.node_count(tree.root());
    let size = (count + 2) & !1;

    let mut layout = Layout::new(tree, size);
    layout.slots[1] = Some(tree.root());
    layout.place(tree.root(), 2);

    let slots = layout
        .slots
        .iter()
        .skip(1)
        .copied()
        .collect::<Option<Vec<NodeId>>>()
        .ok_or(HuffError::LayoutMismatch)?;
    let mut fixup = Fixup {
        tree,
        slots,
        offsets: layout.offsets,
        repairs: 0,
    };
    fixup.run();
    fixup.verify()?;

    let mut bytes = vec![0u8; size];
    bytes[0] = (count / 2) as u8;
    for slot in 1..size {
        let id = fixup.at(slot);
        let node = tree.node(id);
        bytes[slot] = match node.children() {
            None => node.symbol().unwrap_or(0),
            Some((left, right)) => {
                let mut descriptor = fixup.offsets[id.index()] as u8;
                if !tree.node(left).is_internal() {
                    descriptor |= LEAF_LEFT;
                }
                if !tree.node(right).is_internal() {
                    descriptor |= LEAF_RIGHT;
                }
                descriptor
            }
        };
    }

    tracing::debug!(
        nodes = count,
        bytes = size,
        repairs = fixup.repairs,
        "packed huffman tree"
    );

    Ok(PackedTree {
        bytes,
        repairs: fixup.repairs,
    })
}

/// First pass: assigns every node a slot and every internal node an offset.
struct Layout<'t> {
    tree: &'t HuffmanTree,
    slots: Vec<Option<NodeId>>,
    /// Offset of each internal node, indexed by `NodeId`. Leaves stay 0.
    offsets: Vec<u32>,
}

impl<'t> Layout<'t> {
    fn new(tree: &'t HuffmanTree, size: usize) -> Self {
        Layout {
            tree,
            slots: vec![None; size],
            offsets: vec![0; tree.len()],
        }
    }

    /// Lay out the descendants of `node` starting at slot `next`. The
    /// caller has already placed `node` and chosen its offset so that its
    /// children land at `next`.
    fn place(&mut self, node: NodeId, mut next: usize) {
        let Some((left, right)) = self.tree.node(node).children() else {
            return;
        };

        if self.tree.leaf_count(node) > SPLIT_THRESHOLD {
            self.slots[next] = Some(left);
            self.slots[next + 1] = Some(right);

            let (small, large) = if self.tree.leaf_count(right) < self.tree.leaf_count(left) {
                (right, left)
            } else {
                (left, right)
            };
            let small_leaves = self.tree.leaf_count(small);

            // The smaller block starts right after the pair; the larger one
            // follows the 2 * leaves - 2 slots the smaller block occupies.
            if self.tree.node(small).is_internal() {
                self.offsets[small.index()] = 0;
                self.place(small, next + 2);
            }
            if self.tree.node(large).is_internal() {
                self.offsets[large.index()] = small_leaves - 1;
                self.place(large, next + 2 * small_leaves as usize);
            }
            return;
        }

        let mut queue: VecDeque<NodeId> = VecDeque::with_capacity(SPLIT_THRESHOLD as usize * 2);
        queue.push_back(left);
        queue.push_back(right);

        while let Some(id) = queue.pop_front() {
            self.slots[next] = Some(id);
            next += 1;

            let Some((left, right)) = self.tree.node(id).children() else {
                continue;
            };
            // Everything still queued lands between this node and its
            // children.
            self.offsets[id.index()] = (queue.len() / 2) as u32;
            queue.push_back(left);
            queue.push_back(right);
        }
    }
}

/// Second pass: pulls child pairs whose offset overflows back into range.
struct Fixup<'t> {
    tree: &'t HuffmanTree,
    /// Node at each slot, starting from slot 1.
    slots: Vec<NodeId>,
    offsets: Vec<u32>,
    repairs: usize,
}

impl Fixup<'_> {
    fn at(&self, slot: usize) -> NodeId {
        self.slots[slot - 1]
    }

    /// Number of slots including the size byte.
    fn size(&self) -> usize {
        self.slots.len() + 1
    }

    /// Offset of the internal node at `slot`, or `None` for a leaf.
    fn offset(&self, slot: usize) -> Option<u32> {
        let id = self.at(slot);
        self.tree
            .node(id)
            .is_internal()
            .then(|| self.offsets[id.index()])
    }

    fn offset_mut(&mut self, slot: usize) -> &mut u32 {
        let id = self.at(slot);
        &mut self.offsets[id.index()]
    }

    /// Index of the child pair an internal node at `slot` points at.
    /// Pair `p` covers slots `2p` and `2p + 1`.
    fn target_pair(slot: usize, offset: u32) -> usize {
        slot / 2 + 1 + offset as usize
    }

    /// Single left-to-right repair pass.
    ///
    /// For a node whose children are `shift` pairs too far away, the child
    /// pair is moved `shift` pairs towards its parent and each pair it jumps
    /// over moves one pair further out. Offsets of every node after the repaired one that point
    /// into or out of the moved range are corrected.
    fn run(&mut self) {
        let mut i = 1;
        while i < self.size() {
            let offset = match self.offset(i) {
                Some(offset) if offset > MAX_OFFSET => offset,
                _ => {
                    i += 1;
                    continue;
                }
            };

            let mut shift = offset - MAX_OFFSET;
            if i & 1 == 1 && i > 1 && self.offset(i - 1) == Some(MAX_OFFSET) {
                // Moving this pair would push the left sibling's children
                // out of range; move the sibling's pair one step instead and
                // revisit this slot afterwards.
                i -= 1;
                shift = 1;
            }

            let node_end = Self::target_pair(i, self.offset(i).unwrap_or(0));
            let node_begin = node_end - shift as usize;
            let shift_begin = 2 * node_begin;
            let shift_end = 2 * node_end;

            self.slots[shift_begin - 1..shift_end + 1].rotate_right(2);

            *self.offset_mut(i) -= shift;
            for slot in i + 1..shift_begin {
                if let Some(offset) = self.offset(slot) {
                    let pair = Self::target_pair(slot, offset);
                    if pair >= node_begin && pair < node_end {
                        *self.offset_mut(slot) += 1;
                    }
                }
            }

            for slot in [shift_begin, shift_begin + 1] {
                if self.offset(slot).is_some() {
                    *self.offset_mut(slot) += shift;
                }
            }

            for slot in shift_begin + 2..shift_end + 2 {
                if let Some(offset) = self.offset(slot) {
                    if Self::target_pair(slot, offset) > node_end {
                        *self.offset_mut(slot) -= 1;
                    }
                }
            }

            tracing::trace!(slot = i, shift, from = node_end, to = node_begin, "moved child pair");
            self.repairs += 1;
            i += 1;
        }
    }

    /// Check that every offset fits and that each internal node's children
    /// are where its offset says.
    fn verify(&self) -> HuffResult<()> {
        let mut position = vec![0usize; self.tree.len()];
        for slot in 1..self.size() {
            position[self.at(slot).index()] = slot;
        }

        for slot in 1..self.size() {
            let id = self.at(slot);
            let Some((left, right)) = self.tree.node(id).children() else {
                continue;
            };
            let offset = self.offsets[id.index()];
            if offset > MAX_OFFSET {
                return Err(HuffError::OffsetOverflow);
            }
            let pair = (slot & !1) + 2 * offset as usize + 2;
            if position[left.index()] != pair || position[right.index()] != pair + 1 {
                return Err(HuffError::LayoutMismatch);
            }
        }
        Ok(())
    }
}
