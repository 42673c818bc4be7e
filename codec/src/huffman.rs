//! Entropy code for field-path operations.
//!
//! The code is a Huffman tree built deterministically from the
//! operation weight table. Both sides of the wire derive the same tree
//! from the same weights, so no code table is transmitted. Zero-weight
//! operations participate with weight one, which keeps every operation
//! decodable at the cost of a long code.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::OnceLock;

use bitstream::{BitReader, BitWriter};

use crate::error::{DecodeError, DecodeResult};
use crate::ops::{FieldOp, ALL_FIELD_OPS, FIELD_OP_COUNT};

/// Upper bound on the length of any operation code.
///
/// The deepest leaf in the derived tree sits well above this only if
/// the weight table changes shape drastically; a walk that exceeds the
/// bound can only mean corrupt input.
const MAX_OP_CODE_BITS: usize = 32;

enum Node {
    Leaf(FieldOp),
    Branch { left: Box<Node>, right: Box<Node> },
}

/// A heap entry during construction. Ties on weight are broken by
/// construction order: later-built nodes leave the heap first, which
/// pins down a single canonical tree.
struct HeapItem {
    weight: u64,
    num: u32,
    node: Node,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.num == other.num
    }
}

impl Eq for HeapItem {}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the greatest item; we want the smallest
        // weight out first, and on equal weight the highest number.
        other
            .weight
            .cmp(&self.weight)
            .then(self.num.cmp(&other.num))
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) struct OpTable {
    root: Node,
    codes: [(u32, u8); FIELD_OP_COUNT],
}

impl OpTable {
    pub(crate) fn shared() -> &'static Self {
        static TABLE: OnceLock<OpTable> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    fn build() -> Self {
        let mut heap: BinaryHeap<HeapItem> = ALL_FIELD_OPS
            .iter()
            .map(|&op| HeapItem {
                weight: u64::from(op.weight().max(1)),
                num: op.index() as u32,
                node: Node::Leaf(op),
            })
            .collect();

        let mut next_num = FIELD_OP_COUNT as u32;
        while heap.len() > 1 {
            if let (Some(left), Some(right)) = (heap.pop(), heap.pop()) {
                heap.push(HeapItem {
                    weight: left.weight + right.weight,
                    num: next_num,
                    node: Node::Branch {
                        left: Box::new(left.node),
                        right: Box::new(right.node),
                    },
                });
                next_num += 1;
            }
        }

        let root = heap
            .pop()
            .map_or(Node::Leaf(FieldOp::FieldPathEncodeFinish), |item| item.node);

        let mut codes = [(0u32, 0u8); FIELD_OP_COUNT];
        collect_codes(&root, 0, 0, &mut codes);
        Self { root, codes }
    }

    pub(crate) fn code_for(&self, op: FieldOp) -> (u32, u8) {
        self.codes[op.index()]
    }
}

fn collect_codes(node: &Node, code: u32, len: u8, codes: &mut [(u32, u8); FIELD_OP_COUNT]) {
    match node {
        Node::Leaf(op) => codes[op.index()] = (code, len),
        Node::Branch { left, right } => {
            collect_codes(left, code << 1, len + 1, codes);
            collect_codes(right, (code << 1) | 1, len + 1, codes);
        }
    }
}

/// Reads one operation code from the stream.
///
/// A set bit walks to the right child. Returns
/// [`DecodeError::UnknownOperation`] if the walk runs past the longest
/// assigned code.
pub fn read_field_op(reader: &mut BitReader<'_>) -> DecodeResult<FieldOp> {
    let mut node = &OpTable::shared().root;
    for _ in 0..=MAX_OP_CODE_BITS {
        node = match node {
            Node::Leaf(op) => return Ok(*op),
            Node::Branch { left, right } => {
                if reader.read_bit()? {
                    right
                } else {
                    left
                }
            }
        };
    }
    Err(DecodeError::UnknownOperation {
        bits_walked: MAX_OP_CODE_BITS,
    })
}

/// Writes the code for `op` to the stream.
pub fn write_field_op(writer: &mut BitWriter, op: FieldOp) -> DecodeResult<()> {
    let (code, len) = OpTable::shared().code_for(op);
    writer.write_bits(u64::from(code), len)?;
    Ok(())
}
