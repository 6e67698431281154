//! Functions: an instruction arena, a layout, and per-block CFG data.

use alloc::collections::BTreeSet;
use alloc::vec;
use alloc::vec::Vec;

use crate::{
    block::BlockData,
    dfg::DataFlowGraph,
    entity::{Block, Inst},
    entity_map::PrimaryMap,
    error::IrResult,
    flags::InstFlags,
    layout::{BlockInsts, Layout},
    opcode::Opcode,
    value::Value,
};

/// One function of a shader program.
///
/// The function exclusively owns its arena; instruction handles never cross
/// function boundaries, which is what makes per-function compilation
/// trivially parallel.
#[derive(Debug, Clone, Default)]
pub struct Function {
    pub dfg: DataFlowGraph,
    pub layout: Layout,
    blocks: PrimaryMap<Block, BlockData>,
    post_order: Vec<Block>,
}

impl Function {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a block and append it to the layout.
    pub fn create_block(&mut self) -> Block {
        let block = self.blocks.push(BlockData::new());
        self.layout.ensure_block(block);
        self.layout.append_block(block);
        block
    }

    pub fn block_data(&self, block: Block) -> &BlockData {
        &self.blocks[block]
    }

    pub fn block_data_mut(&mut self, block: Block) -> &mut BlockData {
        &mut self.blocks[block]
    }

    /// Number of blocks created so far.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Validated instruction creation; the instruction is not yet placed.
    pub fn make_inst(&mut self, opcode: Opcode, flags: InstFlags, args: &[Value]) -> IrResult<Inst> {
        let inst = self.dfg.make_inst(opcode, flags, args)?;
        self.layout.ensure_inst(inst);
        Ok(inst)
    }

    /// Create an instruction and append it to `block`.
    pub fn append_new_inst(
        &mut self,
        block: Block,
        opcode: Opcode,
        flags: InstFlags,
        args: &[Value],
    ) -> IrResult<Inst> {
        let inst = self.make_inst(opcode, flags, args)?;
        self.layout.append_inst(inst, block);
        Ok(inst)
    }

    /// Insert an operand-less phi at the head of `block`, keeping the
    /// phi-prefix invariant.
    pub fn prepend_phi(&mut self, block: Block) -> Inst {
        let phi = self.dfg.make_phi();
        self.layout.ensure_inst(phi);
        self.layout.prepend_inst(phi, block);
        phi
    }

    /// First instruction of `block` that is not a phi.
    pub fn first_non_phi(&self, block: Block) -> Option<Inst> {
        self.layout
            .block_insts(block)
            .find(|&inst| !self.dfg.opcode(inst).is_phi())
    }

    /// Insert a fresh instruction after the phi prefix of `block` but before
    /// every non-phi instruction.
    pub fn prepend_after_phis(
        &mut self,
        block: Block,
        opcode: Opcode,
        flags: InstFlags,
        args: &[Value],
    ) -> IrResult<Inst> {
        let inst = self.make_inst(opcode, flags, args)?;
        match self.first_non_phi(block) {
            Some(before) => self.layout.insert_inst(inst, before),
            None => self.layout.append_inst(inst, block),
        }
        Ok(inst)
    }

    pub fn entry_block(&self) -> Option<Block> {
        self.layout.entry_block()
    }

    /// Blocks in layout order.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.layout.blocks()
    }

    /// Instructions of `block` in order.
    pub fn block_insts(&self, block: Block) -> BlockInsts<'_> {
        self.layout.block_insts(block)
    }

    /// Recompute the cached post-order block list by iterative depth-first
    /// search over branch successors. Unreachable blocks are not listed.
    pub fn compute_post_order(&mut self) {
        self.post_order.clear();
        let Some(entry) = self.layout.entry_block() else {
            return;
        };
        let mut visited: BTreeSet<Block> = BTreeSet::new();
        let mut stack: Vec<(Block, usize)> = vec![(entry, 0)];
        visited.insert(entry);
        while let Some(frame) = stack.last_mut() {
            let (block, next_index) = (frame.0, frame.1);
            let successors = self.blocks[block].successors();
            if let Some(&succ) = successors.get(next_index) {
                frame.1 += 1;
                if visited.insert(succ) {
                    stack.push((succ, 0));
                }
            } else {
                self.post_order.push(block);
                stack.pop();
            }
        }
    }

    /// Cached post-order list. Valid after
    /// [`compute_post_order`](Self::compute_post_order).
    pub fn post_order(&self) -> &[Block] {
        &self.post_order
    }

    /// Cached blocks in reverse post-order (forward, loop back-edges last).
    pub fn reverse_post_order(&self) -> impl Iterator<Item = Block> + '_ {
        self.post_order.iter().rev().copied()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::condition::Condition;

    #[test]
    fn phi_prefix_helpers() {
        let mut func = Function::new();
        let block = func.create_block();
        let ret = func
            .append_new_inst(block, Opcode::Return, InstFlags::None, &[])
            .unwrap();
        let phi = func.prepend_phi(block);
        let undef = func
            .prepend_after_phis(block, Opcode::UndefU32, InstFlags::None, &[])
            .unwrap();

        let insts: Vec<Inst> = func.block_insts(block).collect();
        assert_eq!(insts, [phi, undef, ret]);
        assert_eq!(func.first_non_phi(block), Some(undef));
    }

    #[test]
    fn post_order_of_diamond() {
        let mut func = Function::new();
        let entry = func.create_block();
        let left = func.create_block();
        let right = func.create_block();
        let merge = func.create_block();
        func.block_data_mut(entry)
            .set_branches(Condition::always(true), left, right);
        func.block_data_mut(left).set_branch(merge);
        func.block_data_mut(right).set_branch(merge);

        func.compute_post_order();
        let po = func.post_order();
        assert_eq!(po.len(), 4);
        assert_eq!(po[3], entry);
        assert_eq!(po[0], merge);

        let rpo: Vec<Block> = func.reverse_post_order().collect();
        assert_eq!(rpo[0], entry);
        assert_eq!(rpo[3], merge);
    }

    #[test]
    fn post_order_skips_unreachable_blocks() {
        let mut func = Function::new();
        let entry = func.create_block();
        let orphan = func.create_block();
        let _ = orphan;
        func.compute_post_order();
        assert_eq!(func.post_order(), &[entry]);
    }

    #[test]
    fn post_order_with_loop() {
        let mut func = Function::new();
        let entry = func.create_block();
        let header = func.create_block();
        let latch = func.create_block();
        let exit = func.create_block();
        func.block_data_mut(entry).set_branch(header);
        func.block_data_mut(header)
            .set_branches(Condition::always(true), latch, exit);
        func.block_data_mut(latch).set_branch(header);

        func.compute_post_order();
        let po = func.post_order();
        assert_eq!(po.len(), 4);
        // Entry is last, the header precedes it, and the loop body precedes
        // the header.
        assert_eq!(po[3], entry);
        assert_eq!(po[2], header);
    }
}
