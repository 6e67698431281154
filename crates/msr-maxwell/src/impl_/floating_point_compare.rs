//! FCMP: fused floating point compare-and-select.

use msr_ir::{FmzMode, FpControl, IrResult, Value};

use crate::bitfield::{bit, bits};
use crate::common::{floating_point_compare, FpCompareOp};
use crate::visitor::TranslatorVisitor;

/// FCMP selects between `src_reg` and `src_a` depending on how `operand`
/// compares against zero.
fn fcmp(v: &mut TranslatorVisitor, insn: u64, src_a: Value, operand: Value) -> IrResult<()> {
    let dest_reg = v.reg0(insn)?;
    let compare_op = FpCompareOp::from_raw(bits(insn, 48, 4))?;
    let control = FpControl {
        fmz_mode: if bit(insn, 47) {
            FmzMode::Ftz
        } else {
            FmzMode::None
        },
        ..FpControl::default()
    };

    let zero = v.ir.imm32_float(0.0);
    let cmp_result = floating_point_compare(&mut v.ir, operand, zero, compare_op, control)?;
    let src_reg = v.get_reg8(insn)?;
    let result = v.ir.select(cmp_result, src_reg, src_a)?;

    v.set_x(dest_reg, result)
}

impl TranslatorVisitor<'_> {
    pub fn fcmp_reg(&mut self, insn: u64) -> IrResult<()> {
        let src_a = self.get_reg20(insn)?;
        let operand = self.get_float_reg39(insn)?;
        fcmp(self, insn, src_a, operand)
    }

    pub fn fcmp_rc(&mut self, insn: u64) -> IrResult<()> {
        let src_a = self.get_reg39(insn)?;
        let operand = self.get_float_cbuf(insn)?;
        fcmp(self, insn, src_a, operand)
    }

    pub fn fcmp_cr(&mut self, insn: u64) -> IrResult<()> {
        let src_a = self.get_cbuf(insn)?;
        let operand = self.get_float_reg39(insn)?;
        fcmp(self, insn, src_a, operand)
    }

    pub fn fcmp_imm(&mut self, insn: u64) -> IrResult<()> {
        let src_a = self.get_reg39(insn)?;
        let operand = self.get_float_imm20(insn)?;
        fcmp(self, insn, src_a, operand)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use msr_ir::{Function, Opcode};

    use super::*;

    #[test]
    fn fcmp_reg_emits_compare_select_store() {
        let mut func = Function::new();
        let block = func.create_block();
        {
            let mut v = TranslatorVisitor::new(&mut func, block);
            // dest R2, src R3, src_a R4, operand R5, compare op LT.
            let insn = 2u64 | (3u64 << 8) | (4u64 << 20) | (5u64 << 39) | (1u64 << 48);
            v.fcmp_reg(insn).unwrap();
        }
        let opcodes: Vec<Opcode> = func
            .block_insts(block)
            .map(|inst| func.dfg.opcode(inst))
            .collect();
        assert!(opcodes.contains(&Opcode::FPOrdLessThan32));
        assert!(opcodes.contains(&Opcode::SelectU32));
        assert!(opcodes.contains(&Opcode::SetRegister));
    }

    #[test]
    fn fcmp_with_ftz_records_the_flush_mode() {
        let mut func = Function::new();
        let block = func.create_block();
        {
            let mut v = TranslatorVisitor::new(&mut func, block);
            let insn = 1u64 | (2u64 << 8) | (3u64 << 20) | (4u64 << 39) | (1u64 << 47) | (1u64 << 48);
            v.fcmp_reg(insn).unwrap();
        }
        // The comparison itself carries no flags; FTZ affects the zero
        // compare through the control word path only. The select result is
        // stored, which is what this asserts.
        let stores: Vec<_> = func
            .block_insts(block)
            .filter(|&inst| func.dfg.opcode(inst) == Opcode::SetRegister)
            .collect();
        assert_eq!(stores.len(), 1);
    }
}
