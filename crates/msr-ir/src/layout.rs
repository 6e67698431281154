//! Instruction placement.
//!
//! The layout records where instructions sit: which block, and where inside
//! it. Per-block instruction order is a doubly linked list threaded through
//! per-instruction nodes, so insertion before an existing instruction,
//! prepending at a block head, and unlinking are all O(1) and never move
//! other instructions. Block order itself is append-only creation order.

use alloc::vec::Vec;

use crate::{
    entity::{Block, Inst},
    entity_map::PrimaryMap,
};

#[derive(Debug, Clone, Default)]
struct InstNode {
    block: Option<Block>,
    prev: Option<Inst>,
    next: Option<Inst>,
}

#[derive(Debug, Clone, Default)]
struct BlockNode {
    first_inst: Option<Inst>,
    last_inst: Option<Inst>,
}

/// Block and instruction ordering for one function.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    blocks: PrimaryMap<Block, BlockNode>,
    insts: PrimaryMap<Inst, InstNode>,
    block_order: Vec<Block>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly created block. Called once per block, in entity
    /// creation order.
    pub(crate) fn ensure_block(&mut self, block: Block) {
        debug_assert_eq!(self.blocks.len(), crate::entity::EntityRef::index(block));
        self.blocks.push(BlockNode::default());
    }

    /// Register a freshly created instruction. Called once per instruction,
    /// in entity creation order.
    pub(crate) fn ensure_inst(&mut self, inst: Inst) {
        debug_assert_eq!(self.insts.len(), crate::entity::EntityRef::index(inst));
        self.insts.push(InstNode::default());
    }

    /// Append a block to the function's block order.
    pub fn append_block(&mut self, block: Block) {
        debug_assert!(!self.block_order.contains(&block), "{block} appended twice");
        self.block_order.push(block);
    }

    /// Blocks in layout order.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.block_order.iter().copied()
    }

    /// The entry block, once one has been appended.
    pub fn entry_block(&self) -> Option<Block> {
        self.block_order.first().copied()
    }

    /// The block holding `inst`, if it has been placed.
    pub fn inst_block(&self, inst: Inst) -> Option<Block> {
        self.insts.get(inst)?.block
    }

    /// First instruction of a block.
    pub fn first_inst(&self, block: Block) -> Option<Inst> {
        self.blocks[block].first_inst
    }

    /// Last instruction of a block.
    pub fn last_inst(&self, block: Block) -> Option<Inst> {
        self.blocks[block].last_inst
    }

    /// Successor of `inst` inside its block.
    pub fn next_inst(&self, inst: Inst) -> Option<Inst> {
        self.insts[inst].next
    }

    /// Predecessor of `inst` inside its block.
    pub fn prev_inst(&self, inst: Inst) -> Option<Inst> {
        self.insts[inst].prev
    }

    /// Place `inst` at the end of `block`.
    pub fn append_inst(&mut self, inst: Inst, block: Block) {
        debug_assert!(self.inst_block(inst).is_none(), "{inst} is already placed");
        let last = self.blocks[block].last_inst;
        {
            let node = &mut self.insts[inst];
            node.block = Some(block);
            node.prev = last;
            node.next = None;
        }
        match last {
            Some(prev) => self.insts[prev].next = Some(inst),
            None => self.blocks[block].first_inst = Some(inst),
        }
        self.blocks[block].last_inst = Some(inst);
    }

    /// Place `inst` immediately before `before`, in the same block.
    pub fn insert_inst(&mut self, inst: Inst, before: Inst) {
        debug_assert!(self.inst_block(inst).is_none(), "{inst} is already placed");
        let block = self
            .inst_block(before)
            .expect("insertion point must be placed");
        let prev = self.insts[before].prev;
        {
            let node = &mut self.insts[inst];
            node.block = Some(block);
            node.prev = prev;
            node.next = Some(before);
        }
        self.insts[before].prev = Some(inst);
        match prev {
            Some(p) => self.insts[p].next = Some(inst),
            None => self.blocks[block].first_inst = Some(inst),
        }
    }

    /// Place `inst` at the head of `block`.
    pub fn prepend_inst(&mut self, inst: Inst, block: Block) {
        match self.first_inst(block) {
            Some(first) => self.insert_inst(inst, first),
            None => self.append_inst(inst, block),
        }
    }

    /// Unlink `inst` from its block. The instruction itself survives in the
    /// arena and can be re-placed.
    pub fn remove_inst(&mut self, inst: Inst) {
        let block = self.inst_block(inst).expect("instruction is not placed");
        let (prev, next) = {
            let node = &mut self.insts[inst];
            let links = (node.prev, node.next);
            node.block = None;
            node.prev = None;
            node.next = None;
            links
        };
        match prev {
            Some(p) => self.insts[p].next = next,
            None => self.blocks[block].first_inst = next,
        }
        match next {
            Some(n) => self.insts[n].prev = prev,
            None => self.blocks[block].last_inst = prev,
        }
    }

    /// Iterate the instructions of a block in order.
    pub fn block_insts(&self, block: Block) -> BlockInsts<'_> {
        BlockInsts {
            layout: self,
            next: self.first_inst(block),
        }
    }
}

/// Iterator over the instructions of one block.
pub struct BlockInsts<'a> {
    layout: &'a Layout,
    next: Option<Inst>,
}

impl Iterator for BlockInsts<'_> {
    type Item = Inst;

    fn next(&mut self) -> Option<Inst> {
        let current = self.next?;
        self.next = self.layout.next_inst(current);
        Some(current)
    }
}
