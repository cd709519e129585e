/// Huffman tree construction and code assignment.
///
/// Nodes live in a flat arena and refer to their children by [`NodeId`].
/// The tree is always a full binary tree with at least one internal node:
/// inputs with fewer than two distinct byte values get a zero-weight `0x00`
/// companion leaf so the packed form always has a root with two children.
use std::cell::OnceCell;

use crate::frequency::{self, FrequencyTable};
use crate::{HuffError, HuffResult};

/// Longest code the bit packer accepts, exclusive.
pub const MAX_CODE_BITS: u8 = 32;

/// Index of a node in a [`HuffmanTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node is: a literal byte, or a branch with exactly two children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Leaf {
        symbol: u8,
        /// Codeword, right-aligned.
        code: u32,
        /// Number of bits in `code`.
        code_len: u8,
    },
    Internal {
        left: NodeId,
        right: NodeId,
    },
}

/// A node in the Huffman tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Occurrence count of this symbol, or the sum of the children's weights.
    pub weight: u64,
    pub kind: NodeKind,
    /// Number of leaves below this node, filled in on first request.
    leaves: OnceCell<u32>,
}

impl Node {
    fn leaf(symbol: u8, weight: u64) -> Self {
        Self {
            weight,
            kind: NodeKind::Leaf {
                symbol,
                code: 0,
                code_len: 0,
            },
            leaves: OnceCell::new(),
        }
    }

    /// Returns true if this node has children.
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, NodeKind::Internal { .. })
    }

    /// The `(left, right)` children of an internal node.
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Internal { left, right } => Some((left, right)),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// The byte value of a leaf.
    pub fn symbol(&self) -> Option<u8> {
        match self.kind {
            NodeKind::Leaf { symbol, .. } => Some(symbol),
            NodeKind::Internal { .. } => None,
        }
    }

    /// Merge ordering: weight first, then symbol. Internal nodes sort as
    /// symbol 0, the tie-break existing BIOS Huffman encoders use.
    fn sort_key(&self) -> (u64, u8) {
        (self.weight, self.symbol().unwrap_or(0))
    }
}

/// A Huffman tree over byte symbols.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// For each byte value that occurs in the input, (codeword, code_bits).
    /// Zero bits means the byte does not occur.
    lookup: [(u32, u8); 256],
}

impl HuffmanTree {
    /// Build a Huffman tree from input data.
    ///
    /// Empty input produces a valid two-leaf tree that encodes nothing.
    pub fn from_data(input: &[u8]) -> HuffResult<Self> {
        Self::from_frequency_table(&frequency::get_frequency(input))
    }

    /// Build a Huffman tree from a pre-computed frequency table.
    pub fn from_frequency_table(freq: &FrequencyTable) -> HuffResult<Self> {
        let mut nodes: Vec<Node> = Vec::with_capacity(2 * freq.used.max(2) as usize);
        let mut pending: Vec<NodeId> = Vec::with_capacity(freq.used as usize);

        for (symbol, count) in freq.symbols() {
            pending.push(push_node(&mut nodes, Node::leaf(symbol, count as u64)));
        }
        if pending.is_empty() {
            pending.push(push_node(&mut nodes, Node::leaf(0x00, 0)));
        }

        // Repeatedly merge the two lightest nodes. The merged node takes the
        // first slot and the last node fills the second, so the stable sort
        // sees the same sequence on every run.
        while pending.len() > 1 {
            pending.sort_by_key(|id| nodes[id.index()].sort_key());
            let merged = push_internal(&mut nodes, pending[0], pending[1]);
            pending[0] = merged;
            pending.swap_remove(1);
        }

        let mut root = pending[0];
        if !nodes[root.index()].is_internal() {
            let companion = push_node(&mut nodes, Node::leaf(0x00, 0));
            root = push_internal(&mut nodes, root, companion);
        }

        let mut tree = HuffmanTree {
            nodes,
            root,
            lookup: [(0u32, 0u8); 256],
        };
        tree.assign_codes(root, 0, 0)?;
        Ok(tree)
    }

    /// Walk the tree assigning `0` to left branches and `1` to right
    /// branches, then record every weighted leaf in the lookup table.
    fn assign_codes(&mut self, id: NodeId, code: u32, code_len: u8) -> HuffResult<()> {
        if code_len >= MAX_CODE_BITS {
            return Err(HuffError::CodeTooLong);
        }

        let weight = self.nodes[id.index()].weight;
        match &mut self.nodes[id.index()].kind {
            NodeKind::Internal { left, right } => {
                let (left, right) = (*left, *right);
                self.assign_codes(left, code << 1, code_len + 1)?;
                self.assign_codes(right, (code << 1) | 1, code_len + 1)?;
            }
            NodeKind::Leaf {
                symbol,
                code: leaf_code,
                code_len: leaf_len,
            } => {
                *leaf_code = code;
                *leaf_len = code_len;
                // The synthetic companion never appears in the input; leaving
                // it out keeps a real 0x00 mapped to its own leaf.
                if weight > 0 {
                    self.lookup[*symbol as usize] = (code, code_len);
                }
            }
        }
        Ok(())
    }

    /// The root node, always internal.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Total number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds at least three nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves below `id` (1 for a leaf).
    ///
    /// Computed once per node and cached; later calls return the stored
    /// value without visiting the children.
    pub fn leaf_count(&self, id: NodeId) -> u32 {
        let node = &self.nodes[id.index()];
        *node.leaves.get_or_init(|| match node.kind {
            NodeKind::Leaf { .. } => 1,
            NodeKind::Internal { left, right } => self.leaf_count(left) + self.leaf_count(right),
        })
    }

    /// The cached leaf count of `id`, if [`leaf_count`](Self::leaf_count)
    /// has reached it.
    pub fn cached_leaf_count(&self, id: NodeId) -> Option<u32> {
        self.nodes[id.index()].leaves.get().copied()
    }

    /// Number of nodes in the subtree rooted at `id`, itself included.
    pub fn node_count(&self, id: NodeId) -> usize {
        // Full binary tree: n leaves, n - 1 internal nodes.
        2 * self.leaf_count(id) as usize - 1
    }

    /// Get the codeword and number of bits for a byte that occurs in the
    /// input the tree was built from.
    pub fn code(&self, byte: u8) -> Option<(u32, u8)> {
        let (code, bits) = self.lookup[byte as usize];
        (bits > 0).then_some((code, bits))
    }

    /// Every leaf as `(symbol, code, code_len)`, left to right.
    pub fn leaves(&self) -> Vec<(u8, u32, u8)> {
        let mut out = Vec::with_capacity(self.leaf_count(self.root) as usize);
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.nodes[id.index()].kind {
                NodeKind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
                NodeKind::Leaf {
                    symbol,
                    code,
                    code_len,
                } => out.push((symbol, code, code_len)),
            }
        }
        out
    }
}

fn push_node(nodes: &mut Vec<Node>, node: Node) -> NodeId {
    let id = NodeId(nodes.len() as u32);
    nodes.push(node);
    id
}

fn push_internal(nodes: &mut Vec<Node>, left: NodeId, right: NodeId) -> NodeId {
    let weight = nodes[left.index()].weight + nodes[right.index()].weight;
    push_node(
        nodes,
        Node {
            weight,
            kind: NodeKind::Internal { left, right },
            leaves: OnceCell::new(),
        },
    )
}
