//! Tagged IR values.

use core::fmt;

use crate::{attribute::Attribute, entity::Block, entity::Inst, reg::Pred, reg::Reg, types::Type};

/// An operand or result value.
///
/// A value is either an immediate constant, an opaque name (label, register,
/// predicate, attribute), or a reference to the instruction that computes it.
/// Immediates compare structurally; instruction references compare by handle
/// identity. Float immediates are stored as raw bits so `Value` stays
/// `Copy + Eq + Hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Value {
    /// No value. Operands never hold Void; it marks "not yet known" in pass
    /// state.
    #[default]
    Void,
    /// The result of an instruction.
    Inst(Inst),
    /// A branch target.
    Label(Block),
    /// A general purpose register name.
    Reg(Reg),
    /// A predicate register name.
    Pred(Pred),
    /// An attribute name.
    Attr(Attribute),
    ImmU1(bool),
    ImmU8(u8),
    ImmU16(u16),
    ImmU32(u32),
    ImmU64(u64),
    /// Raw bits of a 16-bit float.
    ImmF16(u16),
    /// Raw bits of a 32-bit float.
    ImmF32(u32),
    /// Raw bits of a 64-bit float.
    ImmF64(u64),
}

impl Value {
    /// Wrap a 32-bit float.
    pub fn from_f32(value: f32) -> Value {
        Value::ImmF32(value.to_bits())
    }

    /// Wrap a 64-bit float.
    pub fn from_f64(value: f64) -> Value {
        Value::ImmF64(value.to_bits())
    }

    /// True for anything that is not an instruction reference, Void included.
    pub fn is_immediate(self) -> bool {
        !matches!(self, Value::Inst(_))
    }

    /// True only for the Void marker.
    pub fn is_void(self) -> bool {
        matches!(self, Value::Void)
    }

    /// The instruction computing this value, if any.
    pub fn inst(self) -> Option<Inst> {
        match self {
            Value::Inst(inst) => Some(inst),
            _ => None,
        }
    }

    /// The label payload, if this is a label.
    pub fn label(self) -> Option<Block> {
        match self {
            Value::Label(block) => Some(block),
            _ => None,
        }
    }

    /// The register payload, if this is a register name.
    pub fn reg(self) -> Option<Reg> {
        match self {
            Value::Reg(reg) => Some(reg),
            _ => None,
        }
    }

    /// The predicate payload, if this is a predicate name.
    pub fn pred(self) -> Option<Pred> {
        match self {
            Value::Pred(pred) => Some(pred),
            _ => None,
        }
    }

    /// The attribute payload, if this is an attribute name.
    pub fn attribute(self) -> Option<Attribute> {
        match self {
            Value::Attr(attr) => Some(attr),
            _ => None,
        }
    }

    /// Immediate u32 payload.
    pub fn u32(self) -> Option<u32> {
        match self {
            Value::ImmU32(v) => Some(v),
            _ => None,
        }
    }

    /// Immediate u1 payload.
    pub fn u1(self) -> Option<bool> {
        match self {
            Value::ImmU1(v) => Some(v),
            _ => None,
        }
    }

    /// Immediate f32 payload.
    pub fn f32(self) -> Option<f32> {
        match self {
            Value::ImmF32(bits) => Some(f32::from_bits(bits)),
            _ => None,
        }
    }

    /// Immediate f64 payload.
    pub fn f64(self) -> Option<f64> {
        match self {
            Value::ImmF64(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }

    /// Type of an immediate value. Instruction references have no intrinsic
    /// type; ask the data-flow graph instead.
    pub fn immediate_type(self) -> Option<Type> {
        match self {
            Value::Void => Some(Type::Void),
            Value::Inst(_) => None,
            Value::Label(_) => Some(Type::Label),
            Value::Reg(_) => Some(Type::Reg),
            Value::Pred(_) => Some(Type::Pred),
            Value::Attr(_) => Some(Type::Attribute),
            Value::ImmU1(_) => Some(Type::U1),
            Value::ImmU8(_) => Some(Type::U8),
            Value::ImmU16(_) => Some(Type::U16),
            Value::ImmU32(_) => Some(Type::U32),
            Value::ImmU64(_) => Some(Type::U64),
            Value::ImmF16(_) => Some(Type::F16),
            Value::ImmF32(_) => Some(Type::F32),
            Value::ImmF64(_) => Some(Type::F64),
        }
    }
}

impl From<Inst> for Value {
    fn from(inst: Inst) -> Value {
        Value::Inst(inst)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Inst(inst) => write!(f, "%{}", crate::entity::EntityRef::index(*inst)),
            Value::Label(block) => write!(f, "{block}"),
            Value::Reg(reg) => write!(f, "{reg}"),
            Value::Pred(pred) => write!(f, "{pred}"),
            Value::Attr(attr) => write!(f, "{attr}"),
            Value::ImmU1(v) => write!(f, "{v}"),
            Value::ImmU8(v) => write!(f, "{v}u8"),
            Value::ImmU16(v) => write!(f, "{v}u16"),
            Value::ImmU32(v) => write!(f, "{v}u32"),
            Value::ImmU64(v) => write!(f, "{v}u64"),
            Value::ImmF16(bits) => write!(f, "f16:{bits:#06x}"),
            Value::ImmF32(bits) => write!(f, "{}f32", f32::from_bits(*bits)),
            Value::ImmF64(bits) => write!(f, "{}f64", f64::from_bits(*bits)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_immediates_compare_by_bits() {
        assert_eq!(Value::from_f32(1.5), Value::from_f32(1.5));
        assert_ne!(Value::from_f32(0.0), Value::from_f32(-0.0));
        assert_eq!(Value::from_f32(2.0).f32(), Some(2.0));
    }

    #[test]
    fn inst_refs_compare_by_handle() {
        let a = Value::Inst(Inst::new(1));
        let b = Value::Inst(Inst::new(1));
        let c = Value::Inst(Inst::new(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_immediate());
    }

    #[test]
    fn immediate_types() {
        assert_eq!(Value::ImmU32(7).immediate_type(), Some(Type::U32));
        assert_eq!(Value::from_f32(1.0).immediate_type(), Some(Type::F32));
        assert_eq!(Value::Reg(Reg::RZ).immediate_type(), Some(Type::Reg));
        assert_eq!(Value::Inst(Inst::new(0)).immediate_type(), None);
    }
}
