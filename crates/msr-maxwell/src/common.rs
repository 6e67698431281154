//! Operand enums and comparison emit helpers shared across handlers.

use msr_ir::{FpControl, IREmitter, IrError, IrResult, Value};

/// Integer comparison operation encoded in compare instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    False,
    LessThan,
    Equal,
    LessThanEqual,
    GreaterThan,
    NotEqual,
    GreaterThanEqual,
    True,
}

impl ComparisonOp {
    pub fn from_raw(raw: u64) -> IrResult<Self> {
        match raw {
            0 => Ok(ComparisonOp::False),
            1 => Ok(ComparisonOp::LessThan),
            2 => Ok(ComparisonOp::Equal),
            3 => Ok(ComparisonOp::LessThanEqual),
            4 => Ok(ComparisonOp::GreaterThan),
            5 => Ok(ComparisonOp::NotEqual),
            6 => Ok(ComparisonOp::GreaterThanEqual),
            7 => Ok(ComparisonOp::True),
            _ => Err(IrError::invalid_argument(format_args!(
                "comparison op encoding {raw}"
            ))),
        }
    }
}

/// Predicate combining operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    And,
    Or,
    Xor,
}

impl BooleanOp {
    pub fn from_raw(raw: u64) -> IrResult<Self> {
        match raw {
            0 => Ok(BooleanOp::And),
            1 => Ok(BooleanOp::Or),
            2 => Ok(BooleanOp::Xor),
            _ => Err(IrError::invalid_argument(format_args!(
                "boolean op encoding {raw}"
            ))),
        }
    }
}

/// Floating point comparison operation. The upper half of the encoding
/// space holds the unordered variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpCompareOp {
    F,
    Lt,
    Eq,
    Le,
    Gt,
    Ne,
    Ge,
    Num,
    Nan,
    LtU,
    EqU,
    LeU,
    GtU,
    NeU,
    GeU,
    T,
}

impl FpCompareOp {
    pub fn from_raw(raw: u64) -> IrResult<Self> {
        match raw {
            0 => Ok(FpCompareOp::F),
            1 => Ok(FpCompareOp::Lt),
            2 => Ok(FpCompareOp::Eq),
            3 => Ok(FpCompareOp::Le),
            4 => Ok(FpCompareOp::Gt),
            5 => Ok(FpCompareOp::Ne),
            6 => Ok(FpCompareOp::Ge),
            7 => Ok(FpCompareOp::Num),
            8 => Ok(FpCompareOp::Nan),
            9 => Ok(FpCompareOp::LtU),
            10 => Ok(FpCompareOp::EqU),
            11 => Ok(FpCompareOp::LeU),
            12 => Ok(FpCompareOp::GtU),
            13 => Ok(FpCompareOp::NeU),
            14 => Ok(FpCompareOp::GeU),
            15 => Ok(FpCompareOp::T),
            _ => Err(IrError::invalid_argument(format_args!(
                "floating point comparison op encoding {raw}"
            ))),
        }
    }
}

/// Emit an integer comparison.
pub fn integer_compare(
    ir: &mut IREmitter,
    operand_1: Value,
    operand_2: Value,
    compare_op: ComparisonOp,
    is_signed: bool,
) -> IrResult<Value> {
    match compare_op {
        ComparisonOp::False => Ok(ir.imm1(false)),
        ComparisonOp::LessThan => ir.i_less_than(operand_1, operand_2, is_signed),
        ComparisonOp::Equal => ir.i_equal(operand_1, operand_2),
        ComparisonOp::LessThanEqual => ir.i_less_than_equal(operand_1, operand_2, is_signed),
        ComparisonOp::GreaterThan => ir.i_greater_than(operand_1, operand_2, is_signed),
        ComparisonOp::NotEqual => ir.i_not_equal(operand_1, operand_2),
        ComparisonOp::GreaterThanEqual => {
            ir.i_greater_than_equal(operand_1, operand_2, is_signed)
        }
        ComparisonOp::True => Ok(ir.imm1(true)),
    }
}

/// Combine two predicate values.
pub fn predicate_combine(
    ir: &mut IREmitter,
    predicate_1: Value,
    predicate_2: Value,
    bop: BooleanOp,
) -> IrResult<Value> {
    match bop {
        BooleanOp::And => ir.logical_and(predicate_1, predicate_2),
        BooleanOp::Or => ir.logical_or(predicate_1, predicate_2),
        BooleanOp::Xor => ir.logical_xor(predicate_1, predicate_2),
    }
}

/// Both operands are numbers (neither is NaN).
fn fp_ordered(ir: &mut IREmitter, operand_1: Value, operand_2: Value) -> IrResult<Value> {
    let lhs_num = ir.fp_equal(operand_1, operand_1, true)?;
    let rhs_num = ir.fp_equal(operand_2, operand_2, true)?;
    ir.logical_and(lhs_num, rhs_num)
}

/// At least one operand is NaN.
fn fp_unordered(ir: &mut IREmitter, operand_1: Value, operand_2: Value) -> IrResult<Value> {
    let lhs_nan = ir.fp_not_equal(operand_1, operand_1, false)?;
    let rhs_nan = ir.fp_not_equal(operand_2, operand_2, false)?;
    ir.logical_or(lhs_nan, rhs_nan)
}

/// Emit a floating point comparison. The `control` word is accepted for
/// interface parity with the arithmetic helpers; comparisons themselves
/// carry no flags.
pub fn floating_point_compare(
    ir: &mut IREmitter,
    operand_1: Value,
    operand_2: Value,
    compare_op: FpCompareOp,
    control: FpControl,
) -> IrResult<Value> {
    let _ = control;
    match compare_op {
        FpCompareOp::F => Ok(ir.imm1(false)),
        FpCompareOp::Lt => ir.fp_less_than(operand_1, operand_2, true),
        FpCompareOp::Eq => ir.fp_equal(operand_1, operand_2, true),
        FpCompareOp::Le => ir.fp_less_than_equal(operand_1, operand_2, true),
        FpCompareOp::Gt => ir.fp_greater_than(operand_1, operand_2, true),
        FpCompareOp::Ne => ir.fp_not_equal(operand_1, operand_2, true),
        FpCompareOp::Ge => ir.fp_greater_than_equal(operand_1, operand_2, true),
        FpCompareOp::Num => fp_ordered(ir, operand_1, operand_2),
        FpCompareOp::Nan => fp_unordered(ir, operand_1, operand_2),
        FpCompareOp::LtU => ir.fp_less_than(operand_1, operand_2, false),
        FpCompareOp::EqU => ir.fp_equal(operand_1, operand_2, false),
        FpCompareOp::LeU => ir.fp_less_than_equal(operand_1, operand_2, false),
        FpCompareOp::GtU => ir.fp_greater_than(operand_1, operand_2, false),
        FpCompareOp::NeU => ir.fp_not_equal(operand_1, operand_2, false),
        FpCompareOp::GeU => ir.fp_greater_than_equal(operand_1, operand_2, false),
        FpCompareOp::T => Ok(ir.imm1(true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msr_ir::{Function, Opcode};

    #[test]
    fn encodings_round_trip() {
        assert_eq!(ComparisonOp::from_raw(4).unwrap(), ComparisonOp::GreaterThan);
        assert!(ComparisonOp::from_raw(8).is_err());
        assert_eq!(FpCompareOp::from_raw(9).unwrap(), FpCompareOp::LtU);
        assert!(FpCompareOp::from_raw(16).is_err());
        assert_eq!(BooleanOp::from_raw(2).unwrap(), BooleanOp::Xor);
    }

    #[test]
    fn unordered_ops_pick_unordered_opcodes() {
        let mut func = Function::new();
        let block = func.create_block();
        let mut ir = IREmitter::new(&mut func, block);
        let a = ir.imm32_float(1.0);
        let b = ir.imm32_float(2.0);
        let lt_u =
            floating_point_compare(&mut ir, a, b, FpCompareOp::LtU, FpControl::default()).unwrap();
        assert_eq!(
            ir.func.dfg.opcode(lt_u.inst().unwrap()),
            Opcode::FPUnordLessThan32
        );
    }

    #[test]
    fn constant_compare_ops_fold_to_immediates() {
        let mut func = Function::new();
        let block = func.create_block();
        let mut ir = IREmitter::new(&mut func, block);
        let a = ir.imm32(1);
        let b = ir.imm32(2);
        let always =
            integer_compare(&mut ir, a, b, ComparisonOp::True, false).unwrap();
        assert_eq!(always, Value::ImmU1(true));
    }
}
