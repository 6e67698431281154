//! Translator visitor: the context handlers run inside.

use msr_ir::{Block, Function, IREmitter, IrError, IrResult, Reg, Type, Value};

use crate::bitfield::{bit, bits, signed_bits};

const MAX_CBUF_BINDING: u64 = 18;
const CBUF_SIZE_WORDS: i64 = 0x4000;

/// Per-block translation context.
///
/// Instruction handlers read hardware operands through this type and write
/// results back; all state access goes through virtual register and
/// predicate reads that the SSA construction pass later lifts.
pub struct TranslatorVisitor<'f> {
    pub ir: IREmitter<'f>,
}

impl<'f> TranslatorVisitor<'f> {
    pub fn new(func: &'f mut Function, block: Block) -> Self {
        Self {
            ir: IREmitter::new(func, block),
        }
    }

    /// Read a register as a 32-bit integer.
    pub fn x(&mut self, reg: Reg) -> IrResult<Value> {
        self.ir.get_reg(reg)
    }

    /// Write a 32-bit integer to a register.
    pub fn set_x(&mut self, reg: Reg, value: Value) -> IrResult<()> {
        self.ir.set_reg(reg, value)
    }

    /// Read a register as a 32-bit float.
    pub fn f(&mut self, reg: Reg) -> IrResult<Value> {
        let raw = self.x(reg)?;
        self.ir.bit_cast(raw, Type::F32)
    }

    /// Write a 32-bit float to a register.
    pub fn set_f(&mut self, reg: Reg, value: Value) -> IrResult<()> {
        let raw = self.ir.bit_cast(value, Type::U32)?;
        self.set_x(reg, raw)
    }

    pub fn reg0(&self, insn: u64) -> IrResult<Reg> {
        Reg::from_raw(bits(insn, 0, 8))
    }

    pub fn reg8(&self, insn: u64) -> IrResult<Reg> {
        Reg::from_raw(bits(insn, 8, 8))
    }

    pub fn reg20(&self, insn: u64) -> IrResult<Reg> {
        Reg::from_raw(bits(insn, 20, 8))
    }

    pub fn reg39(&self, insn: u64) -> IrResult<Reg> {
        Reg::from_raw(bits(insn, 39, 8))
    }

    pub fn get_reg8(&mut self, insn: u64) -> IrResult<Value> {
        let reg = self.reg8(insn)?;
        self.x(reg)
    }

    pub fn get_reg20(&mut self, insn: u64) -> IrResult<Value> {
        let reg = self.reg20(insn)?;
        self.x(reg)
    }

    pub fn get_reg39(&mut self, insn: u64) -> IrResult<Value> {
        let reg = self.reg39(insn)?;
        self.x(reg)
    }

    pub fn get_float_reg20(&mut self, insn: u64) -> IrResult<Value> {
        let reg = self.reg20(insn)?;
        self.f(reg)
    }

    pub fn get_float_reg39(&mut self, insn: u64) -> IrResult<Value> {
        let reg = self.reg39(insn)?;
        self.f(reg)
    }

    fn cbuf_fields(&self, insn: u64) -> IrResult<(u64, i64)> {
        let binding = bits(insn, 34, 5);
        let offset = signed_bits(insn, 20, 14);
        if binding >= MAX_CBUF_BINDING {
            return Err(IrError::not_implemented(format_args!(
                "out of bounds constant buffer binding {binding}"
            )));
        }
        if !(0..CBUF_SIZE_WORDS).contains(&offset) {
            return Err(IrError::not_implemented(format_args!(
                "out of bounds constant buffer offset {}",
                offset * 4
            )));
        }
        Ok((binding, offset))
    }

    /// Read the constant buffer word addressed by the instruction.
    pub fn get_cbuf(&mut self, insn: u64) -> IrResult<Value> {
        let (binding, offset) = self.cbuf_fields(insn)?;
        let binding = self.ir.imm32(binding as u32);
        let byte_offset = self.ir.imm32(offset as u32 * 4);
        self.ir.get_cbuf(binding, byte_offset)
    }

    /// Read the constant buffer word addressed by the instruction as F32.
    pub fn get_float_cbuf(&mut self, insn: u64) -> IrResult<Value> {
        let raw = self.get_cbuf(insn)?;
        self.ir.bit_cast(raw, Type::F32)
    }

    /// Read a 64-bit float whose low word is zero and whose high word comes
    /// from the constant buffer slot after the addressed one.
    pub fn get_double_cbuf(&mut self, insn: u64) -> IrResult<Value> {
        let (binding, offset) = self.cbuf_fields(insn)?;
        if offset % 2 != 0 {
            return Err(IrError::not_implemented(format_args!(
                "unaligned 64-bit constant buffer offset {}",
                offset * 4
            )));
        }
        let binding = self.ir.imm32(binding as u32);
        let byte_offset = self.ir.imm32(offset as u32 * 4 + 4);
        let high = self.ir.get_cbuf(binding, byte_offset)?;
        let zero = self.ir.imm32(0);
        let vector = self.ir.composite_construct(&[zero, high])?;
        self.ir.pack_double_2x32(vector)
    }

    /// Sign-extended 20-bit integer immediate.
    pub fn get_imm20(&mut self, insn: u64) -> IrResult<Value> {
        let value = bits(insn, 20, 19);
        let result = if bit(insn, 56) {
            (-(1i64 << 19) + value as i64) as i32 as u32
        } else {
            value as u32
        };
        Ok(self.ir.imm32(result))
    }

    /// 20-bit float immediate: the encoded bits land in the mantissa-high
    /// position, the sign sits apart.
    pub fn get_float_imm20(&mut self, insn: u64) -> IrResult<Value> {
        let value = (bits(insn, 20, 19) as u32) << 12;
        let sign = (bit(insn, 56) as u32) << 31;
        Ok(self.ir.imm32_float(f32::from_bits(value | sign)))
    }
}
