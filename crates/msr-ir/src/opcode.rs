//! Instruction opcodes and their static signatures.
//!
//! Every opcode declares a result type and an operand signature in the table
//! below. A `Void` slot in an operand signature means the slot is
//! polymorphic and skipped during validation (phi operands, identity
//! forwards, pseudo-operation inputs, image coordinate vectors). Phi and
//! Identity report a `Void` result here; their real type is derived from
//! their first operand by the data-flow graph.

use core::fmt;

use crate::types::Type;

macro_rules! opcodes {
    ($( $name:ident : $result:ident [ $( $arg:ident ),* ] ),+ $(,)?) => {
        /// An instruction opcode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Opcode {
            $( $name, )+
        }

        impl Opcode {
            /// Result type declared in the opcode table.
            pub fn result_type(self) -> Type {
                match self {
                    $( Opcode::$name => Type::$result, )+
                }
            }

            /// Operand signature declared in the opcode table.
            pub fn arg_types(self) -> &'static [Type] {
                match self {
                    $( Opcode::$name => &[ $( Type::$arg ),* ], )+
                }
            }

            /// Mnemonic of this opcode.
            pub fn name(self) -> &'static str {
                match self {
                    $( Opcode::$name => stringify!($name), )+
                }
            }
        }
    };
}

opcodes! {
    // Structural
    Phi: Void [],
    Identity: Void [Void],
    Invalid: Void [],
    UndefU1: U1 [],
    UndefU8: U8 [],
    UndefU16: U16 [],
    UndefU32: U32 [],
    UndefU64: U64 [],

    // Control flow
    Branch: Void [Label],
    BranchConditional: Void [U1, Label, Label],
    LoopMerge: Void [Label, Label],
    SelectionMerge: Void [Label],
    Return: Void [],

    // Virtual context state
    GetRegister: U32 [Reg],
    SetRegister: Void [Reg, U32],
    GetPred: U1 [Pred],
    SetPred: Void [Pred, U1],
    GetGotoVariable: U32 [U32],
    SetGotoVariable: Void [U32, U32],
    GetIndirectBranchVariable: U32 [],
    SetIndirectBranchVariable: Void [U32],
    GetZFlag: U1 [],
    GetSFlag: U1 [],
    GetCFlag: U1 [],
    GetOFlag: U1 [],
    SetZFlag: Void [U1],
    SetSFlag: Void [U1],
    SetCFlag: Void [U1],
    SetOFlag: Void [U1],
    GetCbuf: U32 [U32, U32],
    GetAttribute: F32 [Attribute],
    SetAttribute: Void [Attribute, F32],

    // Pseudo-operation consumers
    GetZeroFromOp: U1 [Void],
    GetSignFromOp: U1 [Void],
    GetCarryFromOp: U1 [Void],
    GetOverflowFromOp: U1 [Void],
    GetSparseFromOp: U1 [Void],

    // Global memory
    LoadGlobalU8: U32 [U64],
    LoadGlobalS8: U32 [U64],
    LoadGlobalU16: U32 [U64],
    LoadGlobalS16: U32 [U64],
    LoadGlobal32: U32 [U64],
    LoadGlobal64: U32x2 [U64],
    LoadGlobal128: U32x4 [U64],
    WriteGlobalU8: Void [U64, U32],
    WriteGlobalS8: Void [U64, U32],
    WriteGlobalU16: Void [U64, U32],
    WriteGlobalS16: Void [U64, U32],
    WriteGlobal32: Void [U64, U32],
    WriteGlobal64: Void [U64, U32x2],
    WriteGlobal128: Void [U64, U32x4],

    // Integer arithmetic
    IAdd32: U32 [U32, U32],
    IAdd64: U64 [U64, U64],
    ISub32: U32 [U32, U32],
    ISub64: U64 [U64, U64],
    IMul32: U32 [U32, U32],
    INeg32: U32 [U32],
    IAbs32: U32 [U32],
    ShiftLeftLogical32: U32 [U32, U32],
    ShiftRightLogical32: U32 [U32, U32],
    ShiftRightArithmetic32: U32 [U32, U32],
    BitwiseAnd32: U32 [U32, U32],
    BitwiseOr32: U32 [U32, U32],
    BitwiseXor32: U32 [U32, U32],
    BitFieldInsert: U32 [U32, U32, U32, U32],
    BitFieldSExtract: U32 [U32, U32, U32],
    BitFieldUExtract: U32 [U32, U32, U32],
    SLessThan: U1 [U32, U32],
    SLessThanEqual: U1 [U32, U32],
    SGreaterThan: U1 [U32, U32],
    SGreaterThanEqual: U1 [U32, U32],
    ULessThan: U1 [U32, U32],
    ULessThanEqual: U1 [U32, U32],
    UGreaterThan: U1 [U32, U32],
    UGreaterThanEqual: U1 [U32, U32],
    IEqual: U1 [U32, U32],
    INotEqual: U1 [U32, U32],

    // Logical
    LogicalOr: U1 [U1, U1],
    LogicalAnd: U1 [U1, U1],
    LogicalXor: U1 [U1, U1],
    LogicalNot: U1 [U1],

    // Select
    SelectU8: U8 [U1, U8, U8],
    SelectU16: U16 [U1, U16, U16],
    SelectU32: U32 [U1, U32, U32],
    SelectU64: U64 [U1, U64, U64],
    SelectF32: F32 [U1, F32, F32],

    // Floating point arithmetic
    FPAdd16: F16 [F16, F16],
    FPAdd32: F32 [F32, F32],
    FPAdd64: F64 [F64, F64],
    FPMul16: F16 [F16, F16],
    FPMul32: F32 [F32, F32],
    FPMul64: F64 [F64, F64],
    FPFma16: F16 [F16, F16, F16],
    FPFma32: F32 [F32, F32, F32],
    FPFma64: F64 [F64, F64, F64],
    FPAbs16: F16 [F16],
    FPAbs32: F32 [F32],
    FPAbs64: F64 [F64],
    FPNeg16: F16 [F16],
    FPNeg32: F32 [F32],
    FPNeg64: F64 [F64],
    FPSaturate16: F16 [F16],
    FPSaturate32: F32 [F32],
    FPSaturate64: F64 [F64],
    FPRoundEven16: F16 [F16],
    FPRoundEven32: F32 [F32],
    FPRoundEven64: F64 [F64],
    FPFloor16: F16 [F16],
    FPFloor32: F32 [F32],
    FPFloor64: F64 [F64],
    FPCeil16: F16 [F16],
    FPCeil32: F32 [F32],
    FPCeil64: F64 [F64],
    FPTrunc16: F16 [F16],
    FPTrunc32: F32 [F32],
    FPTrunc64: F64 [F64],
    FPRecip32: F32 [F32],
    FPRecip64: F64 [F64],
    FPRecipSqrt32: F32 [F32],
    FPRecipSqrt64: F64 [F64],
    FPSqrt: F32 [F32],
    FPSin: F32 [F32],
    FPCos: F32 [F32],
    FPExp2: F32 [F32],
    FPLog2: F32 [F32],

    // Floating point comparisons
    FPOrdEqual16: U1 [F16, F16],
    FPOrdEqual32: U1 [F32, F32],
    FPOrdEqual64: U1 [F64, F64],
    FPUnordEqual16: U1 [F16, F16],
    FPUnordEqual32: U1 [F32, F32],
    FPUnordEqual64: U1 [F64, F64],
    FPOrdNotEqual16: U1 [F16, F16],
    FPOrdNotEqual32: U1 [F32, F32],
    FPOrdNotEqual64: U1 [F64, F64],
    FPUnordNotEqual16: U1 [F16, F16],
    FPUnordNotEqual32: U1 [F32, F32],
    FPUnordNotEqual64: U1 [F64, F64],
    FPOrdLessThan16: U1 [F16, F16],
    FPOrdLessThan32: U1 [F32, F32],
    FPOrdLessThan64: U1 [F64, F64],
    FPUnordLessThan16: U1 [F16, F16],
    FPUnordLessThan32: U1 [F32, F32],
    FPUnordLessThan64: U1 [F64, F64],
    FPOrdGreaterThan16: U1 [F16, F16],
    FPOrdGreaterThan32: U1 [F32, F32],
    FPOrdGreaterThan64: U1 [F64, F64],
    FPUnordGreaterThan16: U1 [F16, F16],
    FPUnordGreaterThan32: U1 [F32, F32],
    FPUnordGreaterThan64: U1 [F64, F64],
    FPOrdLessThanEqual16: U1 [F16, F16],
    FPOrdLessThanEqual32: U1 [F32, F32],
    FPOrdLessThanEqual64: U1 [F64, F64],
    FPUnordLessThanEqual16: U1 [F16, F16],
    FPUnordLessThanEqual32: U1 [F32, F32],
    FPUnordLessThanEqual64: U1 [F64, F64],
    FPOrdGreaterThanEqual16: U1 [F16, F16],
    FPOrdGreaterThanEqual32: U1 [F32, F32],
    FPOrdGreaterThanEqual64: U1 [F64, F64],
    FPUnordGreaterThanEqual16: U1 [F16, F16],
    FPUnordGreaterThanEqual32: U1 [F32, F32],
    FPUnordGreaterThanEqual64: U1 [F64, F64],

    // Composite construction
    CompositeConstructU32x2: U32x2 [U32, U32],
    CompositeConstructU32x3: U32x3 [U32, U32, U32],
    CompositeConstructU32x4: U32x4 [U32, U32, U32, U32],
    CompositeConstructF16x2: F16x2 [F16, F16],
    CompositeConstructF16x3: F16x3 [F16, F16, F16],
    CompositeConstructF16x4: F16x4 [F16, F16, F16, F16],
    CompositeConstructF32x2: F32x2 [F32, F32],
    CompositeConstructF32x3: F32x3 [F32, F32, F32],
    CompositeConstructF32x4: F32x4 [F32, F32, F32, F32],
    CompositeConstructF64x2: F64x2 [F64, F64],
    CompositeConstructF64x3: F64x3 [F64, F64, F64],
    CompositeConstructF64x4: F64x4 [F64, F64, F64, F64],

    // Composite extraction
    CompositeExtractU32x2: U32 [U32x2, U32],
    CompositeExtractU32x3: U32 [U32x3, U32],
    CompositeExtractU32x4: U32 [U32x4, U32],
    CompositeExtractF16x2: F16 [F16x2, U32],
    CompositeExtractF16x3: F16 [F16x3, U32],
    CompositeExtractF16x4: F16 [F16x4, U32],
    CompositeExtractF32x2: F32 [F32x2, U32],
    CompositeExtractF32x3: F32 [F32x3, U32],
    CompositeExtractF32x4: F32 [F32x4, U32],
    CompositeExtractF64x2: F64 [F64x2, U32],
    CompositeExtractF64x3: F64 [F64x3, U32],
    CompositeExtractF64x4: F64 [F64x4, U32],

    // Packing
    PackUint2x32: U64 [U32x2],
    UnpackUint2x32: U32x2 [U64],
    PackFloat2x16: U32 [F16x2],
    UnpackFloat2x16: F16x2 [U32],
    PackDouble2x32: F64 [U32x2],
    UnpackDouble2x32: U32x2 [F64],

    // Bit casts
    BitCastU16F16: U16 [F16],
    BitCastU32F32: U32 [F32],
    BitCastU64F64: U64 [F64],
    BitCastF16U16: F16 [U16],
    BitCastF32U32: F32 [U32],
    BitCastF64U64: F64 [U64],

    // Float to integer conversions
    ConvertS16F16: U32 [F16],
    ConvertS16F32: U32 [F32],
    ConvertS16F64: U32 [F64],
    ConvertS32F16: U32 [F16],
    ConvertS32F32: U32 [F32],
    ConvertS32F64: U32 [F64],
    ConvertS64F16: U64 [F16],
    ConvertS64F32: U64 [F32],
    ConvertS64F64: U64 [F64],
    ConvertU16F16: U32 [F16],
    ConvertU16F32: U32 [F32],
    ConvertU16F64: U32 [F64],
    ConvertU32F16: U32 [F16],
    ConvertU32F32: U32 [F32],
    ConvertU32F64: U32 [F64],
    ConvertU64F16: U64 [F16],
    ConvertU64F32: U64 [F32],
    ConvertU64F64: U64 [F64],

    // Integer width conversions
    ConvertU32U64: U32 [U64],
    ConvertU64U32: U64 [U32],

    // Integer to float conversions
    ConvertF16S32: F16 [U32],
    ConvertF32S32: F32 [U32],
    ConvertF64S32: F64 [U32],
    ConvertF16U32: F16 [U32],
    ConvertF32U32: F32 [U32],
    ConvertF64U32: F64 [U32],
    ConvertF16S64: F16 [U64],
    ConvertF32S64: F32 [U64],
    ConvertF64S64: F64 [U64],
    ConvertF16U64: F16 [U64],
    ConvertF32U64: F32 [U64],
    ConvertF64U64: F64 [U64],

    // Float width conversions
    ConvertF16F32: F16 [F32],
    ConvertF16F64: F16 [F64],
    ConvertF32F16: F32 [F16],
    ConvertF32F64: F32 [F64],
    ConvertF64F16: F64 [F16],
    ConvertF64F32: F64 [F32],

    // Image sampling
    ImageSampleImplicitLod: F32x4 [U32, Void],
    ImageSampleExplicitLod: F32x4 [U32, Void, F32],
}

impl Opcode {
    /// Number of operands required by this opcode.
    pub fn num_args(self) -> usize {
        self.arg_types().len()
    }

    /// True for the phi pseudo-instruction.
    pub fn is_phi(self) -> bool {
        self == Opcode::Phi
    }

    /// True for the pseudo-operation consumers attached to a producing
    /// instruction.
    pub fn is_pseudo_operation(self) -> bool {
        matches!(
            self,
            Opcode::GetZeroFromOp
                | Opcode::GetSignFromOp
                | Opcode::GetCarryFromOp
                | Opcode::GetOverflowFromOp
                | Opcode::GetSparseFromOp
        )
    }

    /// True for opcodes whose result type depends on their operands.
    pub fn has_dynamic_type(self) -> bool {
        matches!(self, Opcode::Phi | Opcode::Identity)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures() {
        assert_eq!(Opcode::IAdd32.result_type(), Type::U32);
        assert_eq!(Opcode::IAdd32.arg_types(), &[Type::U32, Type::U32]);
        assert_eq!(Opcode::BranchConditional.num_args(), 3);
        assert_eq!(
            Opcode::FPFma64.arg_types(),
            &[Type::F64, Type::F64, Type::F64]
        );
    }

    #[test]
    fn classification() {
        assert!(Opcode::Phi.is_phi());
        assert!(!Opcode::Identity.is_phi());
        assert!(Opcode::GetSparseFromOp.is_pseudo_operation());
        assert!(!Opcode::GetCbuf.is_pseudo_operation());
        assert!(Opcode::Identity.has_dynamic_type());
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Opcode::FPOrdLessThan32.name(), "FPOrdLessThan32");
        assert_eq!(Opcode::UndefU1.result_type(), Type::U1);
    }
}
