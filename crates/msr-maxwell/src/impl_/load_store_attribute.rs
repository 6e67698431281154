//! IPA: fragment shader varying interpolation.

use msr_ir::{Attribute, FpControl, IrError, IrResult};

use crate::bitfield::{bit, bits};
use crate::visitor::TranslatorVisitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterpolationMode {
    Pass,
    Multiply,
    Constant,
    Sc,
}

impl InterpolationMode {
    fn from_raw(raw: u64) -> Self {
        match raw & 3 {
            0 => InterpolationMode::Pass,
            1 => InterpolationMode::Multiply,
            2 => InterpolationMode::Constant,
            _ => InterpolationMode::Sc,
        }
    }
}

impl TranslatorVisitor<'_> {
    /// Read a varying. Outside the fragment stage the result is undefined
    /// by the hardware.
    pub fn ipa(&mut self, insn: u64) -> IrResult<()> {
        let dest_reg = self.reg0(insn)?;
        let index_reg = self.reg8(insn)?;
        let multiplier = self.reg20(insn)?;
        let attribute = Attribute::from_raw(bits(insn, 30, 8))?;
        let interpolation_mode = InterpolationMode::from_raw(bits(insn, 54, 2));

        // Indexed IPAs address varying arrays through a register.
        let is_indexed = bit(insn, 38) && !index_reg.is_zero();
        if is_indexed {
            return Err(IrError::not_implemented("IPA.IDX"));
        }

        let mut value = self.ir.get_attribute(attribute)?;
        match interpolation_mode {
            InterpolationMode::Pass => {}
            InterpolationMode::Multiply => {
                let factor = self.f(multiplier)?;
                value = self.ir.fp_mul(value, factor, FpControl::default())?;
            }
            InterpolationMode::Constant => {
                return Err(IrError::not_implemented("IPA.CONSTANT"))
            }
            InterpolationMode::Sc => return Err(IrError::not_implemented("IPA.SC")),
        }

        // Saturated IPAs come from clamped varyings.
        if bit(insn, 51) {
            if attribute == Attribute::FrontFace {
                return Err(IrError::not_implemented("IPA.SAT on FrontFace"));
            }
            value = self.ir.fp_saturate(value)?;
        }

        self.set_f(dest_reg, value)
    }
}
