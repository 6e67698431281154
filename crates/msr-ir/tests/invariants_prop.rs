//! Property tests: SSA construction keeps the arena invariants intact for
//! arbitrary write patterns.

use msr_ir::opt::{ssa_rewrite_pass, verify};
use msr_ir::{IREmitter, Opcode, Program, Reg};
use proptest::prelude::*;

const TRACKED_REGS: u64 = 6;

fn reg(n: u64) -> Reg {
    Reg::from_raw(n).unwrap()
}

fn is_context_opcode(opcode: Opcode) -> bool {
    matches!(
        opcode,
        Opcode::GetRegister
            | Opcode::GetPred
            | Opcode::GetZFlag
            | Opcode::GetSFlag
            | Opcode::GetCFlag
            | Opcode::GetOFlag
            | Opcode::GetGotoVariable
            | Opcode::GetIndirectBranchVariable
            | Opcode::SetRegister
            | Opcode::SetPred
            | Opcode::SetZFlag
            | Opcode::SetSFlag
            | Opcode::SetCFlag
            | Opcode::SetOFlag
            | Opcode::SetGotoVariable
            | Opcode::SetIndirectBranchVariable
    )
}

/// After the pass, no lifted context access may survive (sink accesses are
/// never generated here) and the verifier must be clean.
fn assert_rewritten(program: &Program) {
    for func in &program.functions {
        for block in func.blocks() {
            for inst in func.block_insts(block) {
                assert!(
                    !is_context_opcode(func.dfg.opcode(inst)),
                    "context opcode survived in {block}"
                );
            }
        }
        verify(func).unwrap();
    }
}

type Writes = Vec<(u64, u32)>;

fn writes_strategy() -> impl Strategy<Value = Writes> {
    proptest::collection::vec((1..TRACKED_REGS, any::<u32>()), 0..8)
}

proptest! {
    /// Diamond CFG with arbitrary writes in all four blocks and a read of
    /// every tracked register at the merge.
    #[test]
    fn diamond_stays_consistent(
        entry_writes in writes_strategy(),
        left_writes in writes_strategy(),
        right_writes in writes_strategy(),
    ) {
        let mut program = Program::new();
        let func = program.add_function();
        let entry = func.create_block();
        let left = func.create_block();
        let right = func.create_block();
        let merge = func.create_block();

        {
            let mut ir = IREmitter::new(func, entry);
            for &(r, value) in &entry_writes {
                let imm = ir.imm32(value);
                ir.set_reg(reg(r), imm).unwrap();
            }
            let cond = ir.imm1(true);
            ir.branch_conditional(cond, left, right).unwrap();
        }
        for (block, writes) in [(left, &left_writes), (right, &right_writes)] {
            let mut ir = IREmitter::new(func, block);
            for &(r, value) in writes {
                let imm = ir.imm32(value);
                ir.set_reg(reg(r), imm).unwrap();
            }
            ir.branch(merge).unwrap();
        }
        {
            let mut ir = IREmitter::new(func, merge);
            for r in 1..TRACKED_REGS {
                let read = ir.get_reg(reg(r)).unwrap();
                let zero = ir.imm32(0);
                ir.iadd(read, zero).unwrap();
            }
            ir.return_().unwrap();
        }

        ssa_rewrite_pass(&mut program);
        assert_rewritten(&program);

        // Any surviving merge phi must key its operands by the merge
        // block's predecessors, in order.
        let func = &program.functions[0];
        for inst in func.block_insts(merge) {
            if func.dfg.opcode(inst).is_phi() {
                let preds: Vec<_> = func.dfg.phi_args(inst).iter().map(|&(b, _)| b).collect();
                prop_assert_eq!(preds, vec![left, right]);
            }
        }
    }

    /// Loop CFG: writes before the loop and in the latch, reads in the
    /// latch and after the exit.
    #[test]
    fn loop_stays_consistent(
        entry_writes in writes_strategy(),
        latch_writes in writes_strategy(),
        exit_first in any::<bool>(),
    ) {
        let mut program = Program::new();
        let func = program.add_function();
        let entry = func.create_block();
        let header = func.create_block();
        let latch = func.create_block();
        let exit = func.create_block();

        {
            let mut ir = IREmitter::new(func, entry);
            for &(r, value) in &entry_writes {
                let imm = ir.imm32(value);
                ir.set_reg(reg(r), imm).unwrap();
            }
            ir.branch(header).unwrap();
        }
        {
            let mut ir = IREmitter::new(func, header);
            let cond = ir.imm1(exit_first);
            if exit_first {
                ir.branch_conditional(cond, exit, latch).unwrap();
            } else {
                ir.branch_conditional(cond, latch, exit).unwrap();
            }
        }
        {
            let mut ir = IREmitter::new(func, latch);
            for r in 1..TRACKED_REGS {
                let read = ir.get_reg(reg(r)).unwrap();
                let one = ir.imm32(1);
                ir.iadd(read, one).unwrap();
            }
            for &(r, value) in &latch_writes {
                let imm = ir.imm32(value);
                ir.set_reg(reg(r), imm).unwrap();
            }
            ir.branch(header).unwrap();
        }
        {
            let mut ir = IREmitter::new(func, exit);
            for r in 1..TRACKED_REGS {
                let read = ir.get_reg(reg(r)).unwrap();
                let zero = ir.imm32(0);
                ir.iadd(read, zero).unwrap();
            }
            ir.return_().unwrap();
        }

        ssa_rewrite_pass(&mut program);
        assert_rewritten(&program);
    }
}
