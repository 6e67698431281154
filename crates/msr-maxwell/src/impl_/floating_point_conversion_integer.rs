//! F2I: floating point to integer conversion.

use msr_ir::{FmzMode, FpControl, FpRounding, IrError, IrResult, Value};

use crate::bitfield::{bit, bits};
use crate::visitor::TranslatorVisitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DestFormat {
    I16,
    I32,
    I64,
}

impl DestFormat {
    fn from_raw(raw: u64) -> IrResult<Self> {
        match raw {
            1 => Ok(DestFormat::I16),
            2 => Ok(DestFormat::I32),
            3 => Ok(DestFormat::I64),
            _ => Err(IrError::not_implemented(format_args!(
                "invalid destination format {raw}"
            ))),
        }
    }

    fn bit_size(self) -> usize {
        match self {
            DestFormat::I16 => 16,
            DestFormat::I32 => 32,
            DestFormat::I64 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SrcFormat {
    F16,
    F32,
    F64,
}

impl SrcFormat {
    fn from_raw(raw: u64) -> IrResult<Self> {
        match raw {
            1 => Ok(SrcFormat::F16),
            2 => Ok(SrcFormat::F32),
            3 => Ok(SrcFormat::F64),
            _ => Err(IrError::not_implemented(format_args!(
                "invalid source format {raw}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Rounding {
    Round,
    Floor,
    Ceil,
    Trunc,
}

impl Rounding {
    fn from_raw(raw: u64) -> Self {
        match raw & 3 {
            0 => Rounding::Round,
            1 => Rounding::Floor,
            2 => Rounding::Ceil,
            _ => Rounding::Trunc,
        }
    }
}

fn src_format(insn: u64) -> IrResult<SrcFormat> {
    SrcFormat::from_raw(bits(insn, 10, 2))
}

fn translate_f2i(v: &mut TranslatorVisitor, insn: u64, src_a: Value) -> IrResult<()> {
    let dest_reg = v.reg0(insn)?;
    let dest_format = DestFormat::from_raw(bits(insn, 8, 2))?;
    let src = src_format(insn)?;
    let is_signed = bit(insn, 12);
    let rounding = Rounding::from_raw(bits(insn, 39, 2));
    let abs = bit(insn, 45);
    let neg = bit(insn, 49);

    // Only F32-to-narrow conversions observe the flush-to-zero bit.
    let denorm_cares = src != SrcFormat::F16 && src != SrcFormat::F64 && dest_format != DestFormat::I64;
    let fmz_mode = if denorm_cares {
        if bit(insn, 44) {
            FmzMode::Ftz
        } else {
            FmzMode::None
        }
    } else {
        FmzMode::DontCare
    };
    let control = FpControl {
        no_contraction: true,
        rounding: FpRounding::DontCare,
        fmz_mode,
    };

    let op_a = v.ir.fp_abs_neg(src_a, abs, neg)?;
    let rounded = match rounding {
        Rounding::Round => v.ir.fp_round_even(op_a, control)?,
        Rounding::Floor => v.ir.fp_floor(op_a, control)?,
        Rounding::Ceil => v.ir.fp_ceil(op_a, control)?,
        Rounding::Trunc => v.ir.fp_trunc(op_a, control)?,
    };

    // TODO: clamp out-of-range conversions; 65537.0 to I16 should saturate
    // at 0xffff.
    let result = v.ir.convert_f_to_i(dest_format.bit_size(), is_signed, rounded)?;

    if dest_format == DestFormat::I64 {
        let vector = v.ir.unpack_uint_2x32(result)?;
        let low = v.ir.composite_extract(vector, 0)?;
        let high = v.ir.composite_extract(vector, 1)?;
        v.set_x(dest_reg, low)?;
        v.set_x(dest_reg.offset(1)?, high)?;
    } else {
        v.set_x(dest_reg, result)?;
    }

    if bit(insn, 47) {
        return Err(IrError::not_implemented("F2I CC"));
    }
    Ok(())
}

impl TranslatorVisitor<'_> {
    pub fn f2i_reg(&mut self, insn: u64) -> IrResult<()> {
        let src_reg = self.reg20(insn)?;
        let src_a = match src_format(insn)? {
            SrcFormat::F16 => {
                let half = bits(insn, 49, 1) as usize;
                let raw = self.x(src_reg)?;
                let halves = self.ir.unpack_float_2x16(raw)?;
                self.ir.composite_extract(halves, half)?
            }
            SrcFormat::F32 => self.f(src_reg)?,
            SrcFormat::F64 => {
                let low = self.x(src_reg)?;
                let high = self.x(src_reg.offset(1)?)?;
                let vector = self.ir.composite_construct(&[low, high])?;
                self.ir.pack_double_2x32(vector)?
            }
        };
        translate_f2i(self, insn, src_a)
    }

    pub fn f2i_cbuf(&mut self, insn: u64) -> IrResult<()> {
        let src_a = match src_format(insn)? {
            SrcFormat::F16 => {
                let half = bits(insn, 49, 1) as usize;
                let raw = self.get_cbuf(insn)?;
                let halves = self.ir.unpack_float_2x16(raw)?;
                self.ir.composite_extract(halves, half)?
            }
            SrcFormat::F32 => self.get_float_cbuf(insn)?,
            SrcFormat::F64 => self.get_double_cbuf(insn)?,
        };
        translate_f2i(self, insn, src_a)
    }

    pub fn f2i_imm(&mut self, _insn: u64) -> IrResult<()> {
        Err(IrError::not_implemented("F2I (immediate)"))
    }
}
