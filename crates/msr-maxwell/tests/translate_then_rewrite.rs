//! Translated handlers feed the SSA pass cleanly.

use msr_ir::opt::{ssa_rewrite_pass, verify};
use msr_ir::{Opcode, Program, Reg, Value};
use msr_maxwell::TranslatorVisitor;

#[test]
fn fcmp_then_f2i_survives_ssa_rewrite() {
    let mut program = Program::new();
    let func = program.add_function();
    let block = func.create_block();
    {
        let mut v = TranslatorVisitor::new(func, block);
        // Give every source register a defined value.
        for (reg, value) in [(3u64, 11u32), (4, 22), (5, 2.5f32.to_bits())] {
            let imm = v.ir.imm32(value);
            v.set_x(Reg::from_raw(reg).unwrap(), imm).unwrap();
        }
        // FCMP: dest R2, src R3, src_a R4, operand R5, LT.
        let fcmp = 2u64 | (3u64 << 8) | (4u64 << 20) | (5u64 << 39) | (1u64 << 48);
        v.fcmp_reg(fcmp).unwrap();
        // F2I: dest R6, I32 from F32, source R2 (the FCMP result), trunc.
        let f2i = 6u64 | (2u64 << 8) | (2u64 << 10) | (3u64 << 39) | (2u64 << 20);
        v.f2i_reg(f2i).unwrap();
        v.ir.return_().unwrap();
    }

    ssa_rewrite_pass(&mut program);
    let func = &program.functions[0];
    verify(func).unwrap();

    let block = func.entry_block().unwrap();
    for inst in func.block_insts(block) {
        let opcode = func.dfg.opcode(inst);
        assert!(
            !matches!(opcode, Opcode::GetRegister | Opcode::SetRegister),
            "register access {opcode} survived the rewrite"
        );
        assert_ne!(opcode, Opcode::UndefU32, "all reads had definitions");
    }

    // The F2I source register was written by FCMP, so its conversion chain
    // consumes the select result rather than an undefined value.
    let select = func
        .block_insts(block)
        .find(|&inst| func.dfg.opcode(inst) == Opcode::SelectU32)
        .unwrap();
    assert!(
        func.block_insts(block).any(|inst| {
            func.dfg.opcode(inst) == Opcode::BitCastF32U32
                && func.dfg.arg(inst, 0) == Value::Inst(select)
        }),
        "the rewritten read must reference the FCMP result"
    );
}
