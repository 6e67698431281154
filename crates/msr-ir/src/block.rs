//! Basic block data.

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::{condition::Condition, entity::Block};

/// Outgoing control flow of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockBranch {
    /// No terminator emitted yet, or the block returns.
    #[default]
    None,
    /// Unconditional branch.
    Unconditional(Block),
    /// Two-way branch on a condition.
    Conditional {
        cond: Condition,
        true_target: Block,
        false_target: Block,
    },
}

/// Per-block CFG data: immediate predecessors and the outgoing branch.
///
/// Instruction contents live in the layout; this records only edges. The
/// predecessor list keeps insertion order and is append-only during frontend
/// emission, which is what lets phi operands line up with predecessors by
/// position.
#[derive(Debug, Clone, Default)]
pub struct BlockData {
    preds: Vec<Block>,
    branch: BlockBranch,
}

impl BlockData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `pred` as an immediate predecessor. Repeated calls with the
    /// same block are no-ops; first insertion wins the position.
    pub fn add_immediate_predecessor(&mut self, pred: Block) {
        if !self.preds.contains(&pred) {
            self.preds.push(pred);
        }
    }

    /// Immediate predecessors in insertion order.
    pub fn immediate_predecessors(&self) -> &[Block] {
        &self.preds
    }

    /// Record an unconditional branch to `target`.
    pub fn set_branch(&mut self, target: Block) {
        self.branch = BlockBranch::Unconditional(target);
    }

    /// Record a conditional branch.
    pub fn set_branches(&mut self, cond: Condition, true_target: Block, false_target: Block) {
        self.branch = BlockBranch::Conditional {
            cond,
            true_target,
            false_target,
        };
    }

    pub fn branch(&self) -> BlockBranch {
        self.branch
    }

    /// Successor blocks: zero, one, or two targets.
    pub fn successors(&self) -> SmallVec<[Block; 2]> {
        match self.branch {
            BlockBranch::None => SmallVec::new(),
            BlockBranch::Unconditional(target) => SmallVec::from_slice(&[target]),
            BlockBranch::Conditional {
                true_target,
                false_target,
                ..
            } => SmallVec::from_slice(&[true_target, false_target]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predecessors_are_ordered_and_deduped() {
        let mut data = BlockData::new();
        data.add_immediate_predecessor(Block::new(3));
        data.add_immediate_predecessor(Block::new(1));
        data.add_immediate_predecessor(Block::new(3));
        assert_eq!(data.immediate_predecessors(), &[Block::new(3), Block::new(1)]);
    }

    #[test]
    fn successors_follow_branch_record() {
        let mut data = BlockData::new();
        assert!(data.successors().is_empty());

        data.set_branch(Block::new(2));
        assert_eq!(data.successors().as_slice(), &[Block::new(2)]);

        data.set_branches(Condition::always(true), Block::new(4), Block::new(5));
        assert_eq!(data.successors().as_slice(), &[Block::new(4), Block::new(5)]);
    }
}
