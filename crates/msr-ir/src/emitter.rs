//! Typed instruction emission.
//!
//! `IREmitter` is the surface instruction translators program against. Emit
//! methods pick the concrete opcode from the operand's type tag, validate
//! widths, thread `FpControl` payloads through floating point operations,
//! and keep block predecessor/successor records in sync with emitted
//! control flow.

use crate::{
    attribute::Attribute,
    condition::{Condition, FlowTest},
    entity::Block,
    error::{IrError, IrResult},
    flags::{FpControl, InstFlags, TextureInstInfo},
    function::Function,
    opcode::Opcode,
    reg::{Pred, Reg},
    types::Type,
    value::Value,
};

/// Instruction emitter positioned at the end of one block.
pub struct IREmitter<'f> {
    pub func: &'f mut Function,
    pub block: Block,
}

impl<'f> IREmitter<'f> {
    pub fn new(func: &'f mut Function, block: Block) -> Self {
        Self { func, block }
    }

    /// Type of any value in the enclosing function.
    pub fn type_of(&self, value: Value) -> Type {
        self.func.dfg.value_type(value)
    }

    fn inst(&mut self, opcode: Opcode, args: &[Value]) -> IrResult<Value> {
        let inst = self
            .func
            .append_new_inst(self.block, opcode, InstFlags::None, args)?;
        Ok(Value::Inst(inst))
    }

    fn inst_fp(&mut self, opcode: Opcode, control: FpControl, args: &[Value]) -> IrResult<Value> {
        let inst = self
            .func
            .append_new_inst(self.block, opcode, InstFlags::Fp(control), args)?;
        Ok(Value::Inst(inst))
    }

    fn invalid_type(ty: Type) -> IrError {
        IrError::invalid_argument(format_args!("invalid type {ty}"))
    }

    fn mismatch(a: Type, b: Type) -> IrError {
        IrError::invalid_argument(format_args!("mismatching types {a} and {b}"))
    }

    // ------------------------------------------------------------------
    // Immediates
    // ------------------------------------------------------------------

    pub fn imm1(&self, value: bool) -> Value {
        Value::ImmU1(value)
    }

    pub fn imm8(&self, value: u8) -> Value {
        Value::ImmU8(value)
    }

    pub fn imm16(&self, value: u16) -> Value {
        Value::ImmU16(value)
    }

    pub fn imm32(&self, value: u32) -> Value {
        Value::ImmU32(value)
    }

    pub fn imm32_signed(&self, value: i32) -> Value {
        Value::ImmU32(value as u32)
    }

    pub fn imm32_float(&self, value: f32) -> Value {
        Value::from_f32(value)
    }

    pub fn imm64(&self, value: u64) -> Value {
        Value::ImmU64(value)
    }

    pub fn imm64_float(&self, value: f64) -> Value {
        Value::from_f64(value)
    }

    // ------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------

    /// Unconditional branch. Updates the CFG records of both blocks.
    pub fn branch(&mut self, label: Block) -> IrResult<()> {
        self.func
            .block_data_mut(label)
            .add_immediate_predecessor(self.block);
        self.func.block_data_mut(self.block).set_branch(label);
        self.inst(Opcode::Branch, &[Value::Label(label)])?;
        Ok(())
    }

    /// Two-way branch on `condition`. Updates the CFG records of all three
    /// blocks.
    pub fn branch_conditional(
        &mut self,
        condition: Value,
        true_label: Block,
        false_label: Block,
    ) -> IrResult<()> {
        self.func.block_data_mut(self.block).set_branches(
            Condition::always(true),
            true_label,
            false_label,
        );
        self.func
            .block_data_mut(true_label)
            .add_immediate_predecessor(self.block);
        self.func
            .block_data_mut(false_label)
            .add_immediate_predecessor(self.block);
        self.inst(
            Opcode::BranchConditional,
            &[
                condition,
                Value::Label(true_label),
                Value::Label(false_label),
            ],
        )?;
        Ok(())
    }

    /// Structured loop annotation: merge block and continue target.
    pub fn loop_merge(&mut self, merge: Block, continue_target: Block) -> IrResult<()> {
        self.inst(
            Opcode::LoopMerge,
            &[Value::Label(merge), Value::Label(continue_target)],
        )?;
        Ok(())
    }

    /// Structured selection annotation.
    pub fn selection_merge(&mut self, merge: Block) -> IrResult<()> {
        self.inst(Opcode::SelectionMerge, &[Value::Label(merge)])?;
        Ok(())
    }

    pub fn return_(&mut self) -> IrResult<()> {
        self.inst(Opcode::Return, &[])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Virtual context state
    // ------------------------------------------------------------------

    /// Read a general purpose register as U32.
    pub fn get_reg(&mut self, reg: Reg) -> IrResult<Value> {
        self.inst(Opcode::GetRegister, &[Value::Reg(reg)])
    }

    pub fn set_reg(&mut self, reg: Reg, value: Value) -> IrResult<()> {
        self.inst(Opcode::SetRegister, &[Value::Reg(reg), value])?;
        Ok(())
    }

    /// Read a predicate, optionally negated at the read site.
    pub fn get_pred(&mut self, pred: Pred, is_negated: bool) -> IrResult<Value> {
        let value = self.inst(Opcode::GetPred, &[Value::Pred(pred)])?;
        if is_negated {
            self.logical_not(value)
        } else {
            Ok(value)
        }
    }

    pub fn set_pred(&mut self, pred: Pred, value: Value) -> IrResult<()> {
        self.inst(Opcode::SetPred, &[Value::Pred(pred), value])?;
        Ok(())
    }

    pub fn get_goto_variable(&mut self, id: u32) -> IrResult<Value> {
        self.inst(Opcode::GetGotoVariable, &[Value::ImmU32(id)])
    }

    pub fn set_goto_variable(&mut self, id: u32, value: Value) -> IrResult<()> {
        self.inst(Opcode::SetGotoVariable, &[Value::ImmU32(id), value])?;
        Ok(())
    }

    pub fn get_indirect_branch_variable(&mut self) -> IrResult<Value> {
        self.inst(Opcode::GetIndirectBranchVariable, &[])
    }

    pub fn set_indirect_branch_variable(&mut self, value: Value) -> IrResult<()> {
        self.inst(Opcode::SetIndirectBranchVariable, &[value])?;
        Ok(())
    }

    /// Read a constant buffer word at `(binding, byte_offset)`.
    pub fn get_cbuf(&mut self, binding: Value, byte_offset: Value) -> IrResult<Value> {
        self.inst(Opcode::GetCbuf, &[binding, byte_offset])
    }

    pub fn get_zflag(&mut self) -> IrResult<Value> {
        self.inst(Opcode::GetZFlag, &[])
    }

    pub fn get_sflag(&mut self) -> IrResult<Value> {
        self.inst(Opcode::GetSFlag, &[])
    }

    pub fn get_cflag(&mut self) -> IrResult<Value> {
        self.inst(Opcode::GetCFlag, &[])
    }

    pub fn get_oflag(&mut self) -> IrResult<Value> {
        self.inst(Opcode::GetOFlag, &[])
    }

    pub fn set_zflag(&mut self, value: Value) -> IrResult<()> {
        self.inst(Opcode::SetZFlag, &[value])?;
        Ok(())
    }

    pub fn set_sflag(&mut self, value: Value) -> IrResult<()> {
        self.inst(Opcode::SetSFlag, &[value])?;
        Ok(())
    }

    pub fn set_cflag(&mut self, value: Value) -> IrResult<()> {
        self.inst(Opcode::SetCFlag, &[value])?;
        Ok(())
    }

    pub fn set_oflag(&mut self, value: Value) -> IrResult<()> {
        self.inst(Opcode::SetOFlag, &[value])?;
        Ok(())
    }

    fn flow_test(&mut self, flow_test: FlowTest) -> IrResult<Value> {
        match flow_test {
            FlowTest::T => Ok(self.imm1(true)),
            FlowTest::F => Ok(self.imm1(false)),
            FlowTest::Eq => self.get_zflag(),
            FlowTest::Ne => {
                let zflag = self.get_zflag()?;
                self.logical_not(zflag)
            }
            other => Err(IrError::not_implemented(format_args!(
                "flow test {other}"
            ))),
        }
    }

    /// Materialize a branch condition as a U1 value: the flow test and the
    /// optionally negated predicate, conjoined.
    pub fn condition(&mut self, cond: Condition) -> IrResult<Value> {
        let (pred, is_negated) = cond.predicate();
        let pred_value = self.get_pred(pred, is_negated)?;
        let flow_value = self.flow_test(cond.flow_test())?;
        self.logical_and(pred_value, flow_value)
    }

    /// Read an attribute as F32.
    pub fn get_attribute(&mut self, attribute: Attribute) -> IrResult<Value> {
        self.inst(Opcode::GetAttribute, &[Value::Attr(attribute)])
    }

    pub fn set_attribute(&mut self, attribute: Attribute, value: Value) -> IrResult<()> {
        self.inst(Opcode::SetAttribute, &[Value::Attr(attribute), value])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pseudo-operation consumers
    // ------------------------------------------------------------------

    pub fn get_zero_from_op(&mut self, op: Value) -> IrResult<Value> {
        self.inst(Opcode::GetZeroFromOp, &[op])
    }

    pub fn get_sign_from_op(&mut self, op: Value) -> IrResult<Value> {
        self.inst(Opcode::GetSignFromOp, &[op])
    }

    pub fn get_carry_from_op(&mut self, op: Value) -> IrResult<Value> {
        self.inst(Opcode::GetCarryFromOp, &[op])
    }

    pub fn get_overflow_from_op(&mut self, op: Value) -> IrResult<Value> {
        self.inst(Opcode::GetOverflowFromOp, &[op])
    }

    pub fn get_sparse_from_op(&mut self, op: Value) -> IrResult<Value> {
        self.inst(Opcode::GetSparseFromOp, &[op])
    }

    // ------------------------------------------------------------------
    // Global memory
    // ------------------------------------------------------------------

    pub fn load_global_u8(&mut self, address: Value) -> IrResult<Value> {
        self.inst(Opcode::LoadGlobalU8, &[address])
    }

    pub fn load_global_s8(&mut self, address: Value) -> IrResult<Value> {
        self.inst(Opcode::LoadGlobalS8, &[address])
    }

    pub fn load_global_u16(&mut self, address: Value) -> IrResult<Value> {
        self.inst(Opcode::LoadGlobalU16, &[address])
    }

    pub fn load_global_s16(&mut self, address: Value) -> IrResult<Value> {
        self.inst(Opcode::LoadGlobalS16, &[address])
    }

    pub fn load_global_32(&mut self, address: Value) -> IrResult<Value> {
        self.inst(Opcode::LoadGlobal32, &[address])
    }

    pub fn load_global_64(&mut self, address: Value) -> IrResult<Value> {
        self.inst(Opcode::LoadGlobal64, &[address])
    }

    pub fn load_global_128(&mut self, address: Value) -> IrResult<Value> {
        self.inst(Opcode::LoadGlobal128, &[address])
    }

    pub fn write_global_u8(&mut self, address: Value, value: Value) -> IrResult<()> {
        self.inst(Opcode::WriteGlobalU8, &[address, value])?;
        Ok(())
    }

    pub fn write_global_s8(&mut self, address: Value, value: Value) -> IrResult<()> {
        self.inst(Opcode::WriteGlobalS8, &[address, value])?;
        Ok(())
    }

    pub fn write_global_u16(&mut self, address: Value, value: Value) -> IrResult<()> {
        self.inst(Opcode::WriteGlobalU16, &[address, value])?;
        Ok(())
    }

    pub fn write_global_s16(&mut self, address: Value, value: Value) -> IrResult<()> {
        self.inst(Opcode::WriteGlobalS16, &[address, value])?;
        Ok(())
    }

    pub fn write_global_32(&mut self, address: Value, value: Value) -> IrResult<()> {
        self.inst(Opcode::WriteGlobal32, &[address, value])?;
        Ok(())
    }

    pub fn write_global_64(&mut self, address: Value, vector: Value) -> IrResult<()> {
        self.inst(Opcode::WriteGlobal64, &[address, vector])?;
        Ok(())
    }

    pub fn write_global_128(&mut self, address: Value, vector: Value) -> IrResult<()> {
        self.inst(Opcode::WriteGlobal128, &[address, vector])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Integer arithmetic
    // ------------------------------------------------------------------

    /// Integer add, dispatching on 32 or 64 bit operands.
    pub fn iadd(&mut self, a: Value, b: Value) -> IrResult<Value> {
        let (ta, tb) = (self.type_of(a), self.type_of(b));
        if ta != tb {
            return Err(Self::mismatch(ta, tb));
        }
        match ta {
            Type::U32 => self.inst(Opcode::IAdd32, &[a, b]),
            Type::U64 => self.inst(Opcode::IAdd64, &[a, b]),
            other => Err(Self::invalid_type(other)),
        }
    }

    /// Integer subtract, dispatching on 32 or 64 bit operands.
    pub fn isub(&mut self, a: Value, b: Value) -> IrResult<Value> {
        let (ta, tb) = (self.type_of(a), self.type_of(b));
        if ta != tb {
            return Err(Self::mismatch(ta, tb));
        }
        match ta {
            Type::U32 => self.inst(Opcode::ISub32, &[a, b]),
            Type::U64 => self.inst(Opcode::ISub64, &[a, b]),
            other => Err(Self::invalid_type(other)),
        }
    }

    pub fn imul(&mut self, a: Value, b: Value) -> IrResult<Value> {
        self.inst(Opcode::IMul32, &[a, b])
    }

    pub fn ineg(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::INeg32, &[value])
    }

    pub fn iabs(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::IAbs32, &[value])
    }

    pub fn shift_left_logical(&mut self, base: Value, shift: Value) -> IrResult<Value> {
        self.inst(Opcode::ShiftLeftLogical32, &[base, shift])
    }

    pub fn shift_right_logical(&mut self, base: Value, shift: Value) -> IrResult<Value> {
        self.inst(Opcode::ShiftRightLogical32, &[base, shift])
    }

    pub fn shift_right_arithmetic(&mut self, base: Value, shift: Value) -> IrResult<Value> {
        self.inst(Opcode::ShiftRightArithmetic32, &[base, shift])
    }

    pub fn bitwise_and(&mut self, a: Value, b: Value) -> IrResult<Value> {
        self.inst(Opcode::BitwiseAnd32, &[a, b])
    }

    pub fn bitwise_or(&mut self, a: Value, b: Value) -> IrResult<Value> {
        self.inst(Opcode::BitwiseOr32, &[a, b])
    }

    pub fn bitwise_xor(&mut self, a: Value, b: Value) -> IrResult<Value> {
        self.inst(Opcode::BitwiseXor32, &[a, b])
    }

    pub fn bit_field_insert(
        &mut self,
        base: Value,
        insert: Value,
        offset: Value,
        count: Value,
    ) -> IrResult<Value> {
        self.inst(Opcode::BitFieldInsert, &[base, insert, offset, count])
    }

    pub fn bit_field_extract(
        &mut self,
        base: Value,
        offset: Value,
        count: Value,
        is_signed: bool,
    ) -> IrResult<Value> {
        let opcode = if is_signed {
            Opcode::BitFieldSExtract
        } else {
            Opcode::BitFieldUExtract
        };
        self.inst(opcode, &[base, offset, count])
    }

    pub fn i_less_than(&mut self, lhs: Value, rhs: Value, is_signed: bool) -> IrResult<Value> {
        let opcode = if is_signed {
            Opcode::SLessThan
        } else {
            Opcode::ULessThan
        };
        self.inst(opcode, &[lhs, rhs])
    }

    pub fn i_less_than_equal(
        &mut self,
        lhs: Value,
        rhs: Value,
        is_signed: bool,
    ) -> IrResult<Value> {
        let opcode = if is_signed {
            Opcode::SLessThanEqual
        } else {
            Opcode::ULessThanEqual
        };
        self.inst(opcode, &[lhs, rhs])
    }

    pub fn i_greater_than(&mut self, lhs: Value, rhs: Value, is_signed: bool) -> IrResult<Value> {
        let opcode = if is_signed {
            Opcode::SGreaterThan
        } else {
            Opcode::UGreaterThan
        };
        self.inst(opcode, &[lhs, rhs])
    }

    pub fn i_greater_than_equal(
        &mut self,
        lhs: Value,
        rhs: Value,
        is_signed: bool,
    ) -> IrResult<Value> {
        let opcode = if is_signed {
            Opcode::SGreaterThanEqual
        } else {
            Opcode::UGreaterThanEqual
        };
        self.inst(opcode, &[lhs, rhs])
    }

    pub fn i_equal(&mut self, lhs: Value, rhs: Value) -> IrResult<Value> {
        self.inst(Opcode::IEqual, &[lhs, rhs])
    }

    pub fn i_not_equal(&mut self, lhs: Value, rhs: Value) -> IrResult<Value> {
        self.inst(Opcode::INotEqual, &[lhs, rhs])
    }

    // ------------------------------------------------------------------
    // Logical
    // ------------------------------------------------------------------

    pub fn logical_or(&mut self, a: Value, b: Value) -> IrResult<Value> {
        self.inst(Opcode::LogicalOr, &[a, b])
    }

    pub fn logical_and(&mut self, a: Value, b: Value) -> IrResult<Value> {
        self.inst(Opcode::LogicalAnd, &[a, b])
    }

    pub fn logical_xor(&mut self, a: Value, b: Value) -> IrResult<Value> {
        self.inst(Opcode::LogicalXor, &[a, b])
    }

    pub fn logical_not(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::LogicalNot, &[value])
    }

    // ------------------------------------------------------------------
    // Select
    // ------------------------------------------------------------------

    pub fn select(
        &mut self,
        condition: Value,
        true_value: Value,
        false_value: Value,
    ) -> IrResult<Value> {
        let (tt, tf) = (self.type_of(true_value), self.type_of(false_value));
        if tt != tf {
            return Err(Self::mismatch(tt, tf));
        }
        let opcode = match tt {
            Type::U8 => Opcode::SelectU8,
            Type::U16 => Opcode::SelectU16,
            Type::U32 => Opcode::SelectU32,
            Type::U64 => Opcode::SelectU64,
            Type::F32 => Opcode::SelectF32,
            other => return Err(Self::invalid_type(other)),
        };
        self.inst(opcode, &[condition, true_value, false_value])
    }

    // ------------------------------------------------------------------
    // Floating point arithmetic
    // ------------------------------------------------------------------

    fn fp_binary(
        &mut self,
        a: Value,
        b: Value,
        control: FpControl,
        ops: [Opcode; 3],
    ) -> IrResult<Value> {
        let (ta, tb) = (self.type_of(a), self.type_of(b));
        if ta != tb {
            return Err(Self::mismatch(ta, tb));
        }
        let opcode = match ta {
            Type::F16 => ops[0],
            Type::F32 => ops[1],
            Type::F64 => ops[2],
            other => return Err(Self::invalid_type(other)),
        };
        self.inst_fp(opcode, control, &[a, b])
    }

    fn fp_unary(&mut self, value: Value, control: FpControl, ops: [Opcode; 3]) -> IrResult<Value> {
        let opcode = match self.type_of(value) {
            Type::F16 => ops[0],
            Type::F32 => ops[1],
            Type::F64 => ops[2],
            other => return Err(Self::invalid_type(other)),
        };
        self.inst_fp(opcode, control, &[value])
    }

    pub fn fp_add(&mut self, a: Value, b: Value, control: FpControl) -> IrResult<Value> {
        self.fp_binary(
            a,
            b,
            control,
            [Opcode::FPAdd16, Opcode::FPAdd32, Opcode::FPAdd64],
        )
    }

    pub fn fp_mul(&mut self, a: Value, b: Value, control: FpControl) -> IrResult<Value> {
        self.fp_binary(
            a,
            b,
            control,
            [Opcode::FPMul16, Opcode::FPMul32, Opcode::FPMul64],
        )
    }

    pub fn fp_fma(&mut self, a: Value, b: Value, c: Value, control: FpControl) -> IrResult<Value> {
        let (ta, tb, tc) = (self.type_of(a), self.type_of(b), self.type_of(c));
        if ta != tb || ta != tc {
            return Err(IrError::invalid_argument(format_args!(
                "mismatching types {ta}, {tb}, and {tc}"
            )));
        }
        let opcode = match ta {
            Type::F16 => Opcode::FPFma16,
            Type::F32 => Opcode::FPFma32,
            Type::F64 => Opcode::FPFma64,
            other => return Err(Self::invalid_type(other)),
        };
        self.inst_fp(opcode, control, &[a, b, c])
    }

    pub fn fp_abs(&mut self, value: Value) -> IrResult<Value> {
        self.fp_unary(
            value,
            FpControl::default(),
            [Opcode::FPAbs16, Opcode::FPAbs32, Opcode::FPAbs64],
        )
    }

    pub fn fp_neg(&mut self, value: Value) -> IrResult<Value> {
        self.fp_unary(
            value,
            FpControl::default(),
            [Opcode::FPNeg16, Opcode::FPNeg32, Opcode::FPNeg64],
        )
    }

    /// Apply the encoded absolute-value and negate modifiers.
    pub fn fp_abs_neg(&mut self, value: Value, abs: bool, neg: bool) -> IrResult<Value> {
        let mut result = value;
        if abs {
            result = self.fp_abs(result)?;
        }
        if neg {
            result = self.fp_neg(result)?;
        }
        Ok(result)
    }

    pub fn fp_saturate(&mut self, value: Value) -> IrResult<Value> {
        self.fp_unary(
            value,
            FpControl::default(),
            [
                Opcode::FPSaturate16,
                Opcode::FPSaturate32,
                Opcode::FPSaturate64,
            ],
        )
    }

    pub fn fp_round_even(&mut self, value: Value, control: FpControl) -> IrResult<Value> {
        self.fp_unary(
            value,
            control,
            [
                Opcode::FPRoundEven16,
                Opcode::FPRoundEven32,
                Opcode::FPRoundEven64,
            ],
        )
    }

    pub fn fp_floor(&mut self, value: Value, control: FpControl) -> IrResult<Value> {
        self.fp_unary(
            value,
            control,
            [Opcode::FPFloor16, Opcode::FPFloor32, Opcode::FPFloor64],
        )
    }

    pub fn fp_ceil(&mut self, value: Value, control: FpControl) -> IrResult<Value> {
        self.fp_unary(
            value,
            control,
            [Opcode::FPCeil16, Opcode::FPCeil32, Opcode::FPCeil64],
        )
    }

    pub fn fp_trunc(&mut self, value: Value, control: FpControl) -> IrResult<Value> {
        self.fp_unary(
            value,
            control,
            [Opcode::FPTrunc16, Opcode::FPTrunc32, Opcode::FPTrunc64],
        )
    }

    pub fn fp_recip(&mut self, value: Value) -> IrResult<Value> {
        match self.type_of(value) {
            Type::F32 => self.inst(Opcode::FPRecip32, &[value]),
            Type::F64 => self.inst(Opcode::FPRecip64, &[value]),
            other => Err(Self::invalid_type(other)),
        }
    }

    pub fn fp_recip_sqrt(&mut self, value: Value) -> IrResult<Value> {
        match self.type_of(value) {
            Type::F32 => self.inst(Opcode::FPRecipSqrt32, &[value]),
            Type::F64 => self.inst(Opcode::FPRecipSqrt64, &[value]),
            other => Err(Self::invalid_type(other)),
        }
    }

    pub fn fp_sqrt(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::FPSqrt, &[value])
    }

    pub fn fp_sin(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::FPSin, &[value])
    }

    pub fn fp_cos(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::FPCos, &[value])
    }

    pub fn fp_exp2(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::FPExp2, &[value])
    }

    pub fn fp_log2(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::FPLog2, &[value])
    }

    // ------------------------------------------------------------------
    // Floating point comparisons
    // ------------------------------------------------------------------

    fn fp_compare(&mut self, lhs: Value, rhs: Value, ops: [Opcode; 3]) -> IrResult<Value> {
        let (tl, tr) = (self.type_of(lhs), self.type_of(rhs));
        if tl != tr {
            return Err(Self::mismatch(tl, tr));
        }
        let opcode = match tl {
            Type::F16 => ops[0],
            Type::F32 => ops[1],
            Type::F64 => ops[2],
            other => return Err(Self::invalid_type(other)),
        };
        self.inst(opcode, &[lhs, rhs])
    }

    pub fn fp_equal(&mut self, lhs: Value, rhs: Value, ordered: bool) -> IrResult<Value> {
        let ops = if ordered {
            [
                Opcode::FPOrdEqual16,
                Opcode::FPOrdEqual32,
                Opcode::FPOrdEqual64,
            ]
        } else {
            [
                Opcode::FPUnordEqual16,
                Opcode::FPUnordEqual32,
                Opcode::FPUnordEqual64,
            ]
        };
        self.fp_compare(lhs, rhs, ops)
    }

    pub fn fp_not_equal(&mut self, lhs: Value, rhs: Value, ordered: bool) -> IrResult<Value> {
        let ops = if ordered {
            [
                Opcode::FPOrdNotEqual16,
                Opcode::FPOrdNotEqual32,
                Opcode::FPOrdNotEqual64,
            ]
        } else {
            [
                Opcode::FPUnordNotEqual16,
                Opcode::FPUnordNotEqual32,
                Opcode::FPUnordNotEqual64,
            ]
        };
        self.fp_compare(lhs, rhs, ops)
    }

    pub fn fp_less_than(&mut self, lhs: Value, rhs: Value, ordered: bool) -> IrResult<Value> {
        let ops = if ordered {
            [
                Opcode::FPOrdLessThan16,
                Opcode::FPOrdLessThan32,
                Opcode::FPOrdLessThan64,
            ]
        } else {
            [
                Opcode::FPUnordLessThan16,
                Opcode::FPUnordLessThan32,
                Opcode::FPUnordLessThan64,
            ]
        };
        self.fp_compare(lhs, rhs, ops)
    }

    pub fn fp_greater_than(&mut self, lhs: Value, rhs: Value, ordered: bool) -> IrResult<Value> {
        let ops = if ordered {
            [
                Opcode::FPOrdGreaterThan16,
                Opcode::FPOrdGreaterThan32,
                Opcode::FPOrdGreaterThan64,
            ]
        } else {
            [
                Opcode::FPUnordGreaterThan16,
                Opcode::FPUnordGreaterThan32,
                Opcode::FPUnordGreaterThan64,
            ]
        };
        self.fp_compare(lhs, rhs, ops)
    }

    pub fn fp_less_than_equal(&mut self, lhs: Value, rhs: Value, ordered: bool) -> IrResult<Value> {
        let ops = if ordered {
            [
                Opcode::FPOrdLessThanEqual16,
                Opcode::FPOrdLessThanEqual32,
                Opcode::FPOrdLessThanEqual64,
            ]
        } else {
            [
                Opcode::FPUnordLessThanEqual16,
                Opcode::FPUnordLessThanEqual32,
                Opcode::FPUnordLessThanEqual64,
            ]
        };
        self.fp_compare(lhs, rhs, ops)
    }

    pub fn fp_greater_than_equal(
        &mut self,
        lhs: Value,
        rhs: Value,
        ordered: bool,
    ) -> IrResult<Value> {
        let ops = if ordered {
            [
                Opcode::FPOrdGreaterThanEqual16,
                Opcode::FPOrdGreaterThanEqual32,
                Opcode::FPOrdGreaterThanEqual64,
            ]
        } else {
            [
                Opcode::FPUnordGreaterThanEqual16,
                Opcode::FPUnordGreaterThanEqual32,
                Opcode::FPUnordGreaterThanEqual64,
            ]
        };
        self.fp_compare(lhs, rhs, ops)
    }

    // ------------------------------------------------------------------
    // Composites
    // ------------------------------------------------------------------

    /// Construct a vector from 2, 3, or 4 same-typed scalar elements.
    pub fn composite_construct(&mut self, elements: &[Value]) -> IrResult<Value> {
        let first = *elements.first().ok_or_else(|| {
            IrError::invalid_argument("composite construction needs at least two elements")
        })?;
        let scalar = self.type_of(first);
        for &element in &elements[1..] {
            let ty = self.type_of(element);
            if ty != scalar {
                return Err(Self::mismatch(scalar, ty));
            }
        }
        let opcode = match (scalar, elements.len()) {
            (Type::U32, 2) => Opcode::CompositeConstructU32x2,
            (Type::U32, 3) => Opcode::CompositeConstructU32x3,
            (Type::U32, 4) => Opcode::CompositeConstructU32x4,
            (Type::F16, 2) => Opcode::CompositeConstructF16x2,
            (Type::F16, 3) => Opcode::CompositeConstructF16x3,
            (Type::F16, 4) => Opcode::CompositeConstructF16x4,
            (Type::F32, 2) => Opcode::CompositeConstructF32x2,
            (Type::F32, 3) => Opcode::CompositeConstructF32x3,
            (Type::F32, 4) => Opcode::CompositeConstructF32x4,
            (Type::F64, 2) => Opcode::CompositeConstructF64x2,
            (Type::F64, 3) => Opcode::CompositeConstructF64x3,
            (Type::F64, 4) => Opcode::CompositeConstructF64x4,
            (ty, count) => {
                return Err(IrError::invalid_argument(format_args!(
                    "cannot construct a {count}-wide composite of {ty}"
                )))
            }
        };
        self.inst(opcode, elements)
    }

    /// Extract element `element` from a vector, with bounds checking.
    pub fn composite_extract(&mut self, vector: Value, element: usize) -> IrResult<Value> {
        let ty = self.type_of(vector);
        let opcode = match ty {
            Type::U32x2 => Opcode::CompositeExtractU32x2,
            Type::U32x3 => Opcode::CompositeExtractU32x3,
            Type::U32x4 => Opcode::CompositeExtractU32x4,
            Type::F16x2 => Opcode::CompositeExtractF16x2,
            Type::F16x3 => Opcode::CompositeExtractF16x3,
            Type::F16x4 => Opcode::CompositeExtractF16x4,
            Type::F32x2 => Opcode::CompositeExtractF32x2,
            Type::F32x3 => Opcode::CompositeExtractF32x3,
            Type::F32x4 => Opcode::CompositeExtractF32x4,
            Type::F64x2 => Opcode::CompositeExtractF64x2,
            Type::F64x3 => Opcode::CompositeExtractF64x3,
            Type::F64x4 => Opcode::CompositeExtractF64x4,
            other => return Err(Self::invalid_type(other)),
        };
        if element >= ty.element_count() {
            return Err(IrError::invalid_argument(format_args!(
                "out of bounds element {element} for {ty}"
            )));
        }
        self.inst(opcode, &[vector, Value::ImmU32(element as u32)])
    }

    // ------------------------------------------------------------------
    // Bit casts and packing
    // ------------------------------------------------------------------

    /// Reinterpret `value` as `dest`, which must be the equally wide
    /// integer/float counterpart.
    pub fn bit_cast(&mut self, value: Value, dest: Type) -> IrResult<Value> {
        let src = self.type_of(value);
        let opcode = match (dest, src) {
            (Type::U16, Type::F16) => Opcode::BitCastU16F16,
            (Type::U32, Type::F32) => Opcode::BitCastU32F32,
            (Type::U64, Type::F64) => Opcode::BitCastU64F64,
            (Type::F16, Type::U16) => Opcode::BitCastF16U16,
            (Type::F32, Type::U32) => Opcode::BitCastF32U32,
            (Type::F64, Type::U64) => Opcode::BitCastF64U64,
            _ => {
                return Err(IrError::invalid_argument(format_args!(
                    "cannot bit cast {src} to {dest}"
                )))
            }
        };
        self.inst(opcode, &[value])
    }

    pub fn pack_uint_2x32(&mut self, vector: Value) -> IrResult<Value> {
        self.inst(Opcode::PackUint2x32, &[vector])
    }

    pub fn unpack_uint_2x32(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::UnpackUint2x32, &[value])
    }

    pub fn pack_float_2x16(&mut self, vector: Value) -> IrResult<Value> {
        self.inst(Opcode::PackFloat2x16, &[vector])
    }

    pub fn unpack_float_2x16(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::UnpackFloat2x16, &[value])
    }

    pub fn pack_double_2x32(&mut self, vector: Value) -> IrResult<Value> {
        self.inst(Opcode::PackDouble2x32, &[vector])
    }

    pub fn unpack_double_2x32(&mut self, value: Value) -> IrResult<Value> {
        self.inst(Opcode::UnpackDouble2x32, &[value])
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    /// Float to signed integer of the given destination bit size. 16 and 32
    /// bit destinations produce a U32, 64 bit a U64.
    pub fn convert_f_to_s(&mut self, bitsize: usize, value: Value) -> IrResult<Value> {
        let src = self.type_of(value);
        let opcode = match (bitsize, src) {
            (16, Type::F16) => Opcode::ConvertS16F16,
            (16, Type::F32) => Opcode::ConvertS16F32,
            (16, Type::F64) => Opcode::ConvertS16F64,
            (32, Type::F16) => Opcode::ConvertS32F16,
            (32, Type::F32) => Opcode::ConvertS32F32,
            (32, Type::F64) => Opcode::ConvertS32F64,
            (64, Type::F16) => Opcode::ConvertS64F16,
            (64, Type::F32) => Opcode::ConvertS64F32,
            (64, Type::F64) => Opcode::ConvertS64F64,
            (16 | 32 | 64, other) => return Err(Self::invalid_type(other)),
            _ => {
                return Err(IrError::invalid_argument(format_args!(
                    "invalid destination bitsize {bitsize}"
                )))
            }
        };
        self.inst(opcode, &[value])
    }

    /// Float to unsigned integer of the given destination bit size.
    pub fn convert_f_to_u(&mut self, bitsize: usize, value: Value) -> IrResult<Value> {
        let src = self.type_of(value);
        let opcode = match (bitsize, src) {
            (16, Type::F16) => Opcode::ConvertU16F16,
            (16, Type::F32) => Opcode::ConvertU16F32,
            (16, Type::F64) => Opcode::ConvertU16F64,
            (32, Type::F16) => Opcode::ConvertU32F16,
            (32, Type::F32) => Opcode::ConvertU32F32,
            (32, Type::F64) => Opcode::ConvertU32F64,
            (64, Type::F16) => Opcode::ConvertU64F16,
            (64, Type::F32) => Opcode::ConvertU64F32,
            (64, Type::F64) => Opcode::ConvertU64F64,
            (16 | 32 | 64, other) => return Err(Self::invalid_type(other)),
            _ => {
                return Err(IrError::invalid_argument(format_args!(
                    "invalid destination bitsize {bitsize}"
                )))
            }
        };
        self.inst(opcode, &[value])
    }

    pub fn convert_f_to_i(
        &mut self,
        bitsize: usize,
        is_signed: bool,
        value: Value,
    ) -> IrResult<Value> {
        if is_signed {
            self.convert_f_to_s(bitsize, value)
        } else {
            self.convert_f_to_u(bitsize, value)
        }
    }

    /// Unsigned integer width conversion. Same-width conversion is the
    /// identity and emits nothing.
    pub fn convert_u(&mut self, result_bitsize: usize, value: Value) -> IrResult<Value> {
        let src = self.type_of(value);
        match (result_bitsize, src) {
            (32, Type::U32) | (64, Type::U64) => Ok(value),
            (32, Type::U64) => self.inst(Opcode::ConvertU32U64, &[value]),
            (64, Type::U32) => self.inst(Opcode::ConvertU64U32, &[value]),
            _ => Err(IrError::not_implemented(format_args!(
                "conversion from {src} to {result_bitsize} bits"
            ))),
        }
    }

    /// Integer to float of the given destination bit size.
    pub fn convert_i_to_f(
        &mut self,
        bitsize: usize,
        is_signed: bool,
        value: Value,
    ) -> IrResult<Value> {
        let src = self.type_of(value);
        let opcode = match (bitsize, is_signed, src) {
            (16, true, Type::U32) => Opcode::ConvertF16S32,
            (32, true, Type::U32) => Opcode::ConvertF32S32,
            (64, true, Type::U32) => Opcode::ConvertF64S32,
            (16, false, Type::U32) => Opcode::ConvertF16U32,
            (32, false, Type::U32) => Opcode::ConvertF32U32,
            (64, false, Type::U32) => Opcode::ConvertF64U32,
            (16, true, Type::U64) => Opcode::ConvertF16S64,
            (32, true, Type::U64) => Opcode::ConvertF32S64,
            (64, true, Type::U64) => Opcode::ConvertF64S64,
            (16, false, Type::U64) => Opcode::ConvertF16U64,
            (32, false, Type::U64) => Opcode::ConvertF32U64,
            (64, false, Type::U64) => Opcode::ConvertF64U64,
            (16 | 32 | 64, _, other) => return Err(Self::invalid_type(other)),
            _ => {
                return Err(IrError::invalid_argument(format_args!(
                    "invalid destination bitsize {bitsize}"
                )))
            }
        };
        self.inst(opcode, &[value])
    }

    /// Float width conversion. Same-width conversion is the identity and
    /// emits nothing.
    pub fn convert_f_to_f(&mut self, result_bitsize: usize, value: Value) -> IrResult<Value> {
        let src = self.type_of(value);
        let opcode = match (result_bitsize, src) {
            (16, Type::F16) | (32, Type::F32) | (64, Type::F64) => return Ok(value),
            (16, Type::F32) => Opcode::ConvertF16F32,
            (16, Type::F64) => Opcode::ConvertF16F64,
            (32, Type::F16) => Opcode::ConvertF32F16,
            (32, Type::F64) => Opcode::ConvertF32F64,
            (64, Type::F16) => Opcode::ConvertF64F16,
            (64, Type::F32) => Opcode::ConvertF64F32,
            (16 | 32 | 64, other) => return Err(Self::invalid_type(other)),
            _ => {
                return Err(IrError::invalid_argument(format_args!(
                    "invalid destination bitsize {result_bitsize}"
                )))
            }
        };
        self.inst(opcode, &[value])
    }

    // ------------------------------------------------------------------
    // Image sampling
    // ------------------------------------------------------------------

    pub fn image_sample_implicit_lod(
        &mut self,
        handle: Value,
        coords: Value,
        info: TextureInstInfo,
    ) -> IrResult<Value> {
        let inst = self.func.append_new_inst(
            self.block,
            Opcode::ImageSampleImplicitLod,
            InstFlags::Texture(info),
            &[handle, coords],
        )?;
        Ok(Value::Inst(inst))
    }

    pub fn image_sample_explicit_lod(
        &mut self,
        handle: Value,
        coords: Value,
        lod: Value,
        info: TextureInstInfo,
    ) -> IrResult<Value> {
        let inst = self.func.append_new_inst(
            self.block,
            Opcode::ImageSampleExplicitLod,
            InstFlags::Texture(info),
            &[handle, coords, lod],
        )?;
        Ok(Value::Inst(inst))
    }
}
