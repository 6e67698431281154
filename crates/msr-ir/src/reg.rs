//! General purpose and predicate register names.

use core::fmt;

use crate::error::{IrError, IrResult};

/// Number of general purpose registers addressable by an instruction word.
pub const NUM_REGS: usize = 256;
/// Registers a program may write. R255 is the RZ zero sink.
pub const NUM_USER_REGS: usize = NUM_REGS - 1;

/// Number of predicate registers addressable by an instruction word.
pub const NUM_PREDS: usize = 8;
/// Predicates a program may write. P7 is the PT true sink.
pub const NUM_USER_PREDS: usize = NUM_PREDS - 1;

/// A general purpose register name, R0 through R254 plus the RZ sink.
///
/// RZ always reads zero and discards writes. The SSA pass never tracks it as
/// a variable; reads of RZ are folded downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reg(u8);

impl Reg {
    /// The zero sink.
    pub const RZ: Reg = Reg(255);

    /// Register name from a raw 8-bit instruction field.
    pub fn from_raw(raw: u64) -> IrResult<Reg> {
        if raw < NUM_REGS as u64 {
            Ok(Reg(raw as u8))
        } else {
            Err(IrError::invalid_argument(format_args!(
                "register encoding {raw} out of range"
            )))
        }
    }

    /// Hardware encoding of this register.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the RZ sink.
    pub fn is_zero(self) -> bool {
        self == Reg::RZ
    }

    /// The register `n` slots above this one, for multi-word results.
    ///
    /// Stepping past R254 is an encoding bug in the caller.
    pub fn offset(self, n: u8) -> IrResult<Reg> {
        let index = self.0 as usize + n as usize;
        if index < NUM_USER_REGS {
            Ok(Reg(index as u8))
        } else {
            Err(IrError::invalid_argument(format_args!(
                "register pair {self}+{n} overflows the register file"
            )))
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            f.write_str("RZ")
        } else {
            write!(f, "R{}", self.0)
        }
    }
}

/// A predicate register name, P0 through P6 plus the PT sink.
///
/// PT always reads true and discards writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pred(u8);

impl Pred {
    /// The true sink.
    pub const PT: Pred = Pred(7);

    /// Predicate name from a raw 3-bit instruction field.
    pub fn from_raw(raw: u64) -> IrResult<Pred> {
        if raw < NUM_PREDS as u64 {
            Ok(Pred(raw as u8))
        } else {
            Err(IrError::invalid_argument(format_args!(
                "predicate encoding {raw} out of range"
            )))
        }
    }

    /// Hardware encoding of this predicate.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the PT sink.
    pub fn is_true(self) -> bool {
        self == Pred::PT
    }
}

impl fmt::Display for Pred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_true() {
            f.write_str("PT")
        } else {
            write!(f, "P{}", self.0)
        }
    }
}
