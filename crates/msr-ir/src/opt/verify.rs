//! IR consistency checking.
//!
//! The verifier recounts what the arena tracks incrementally and reports
//! every disagreement. It is the layer that surfaces damage left behind by a
//! malformed frontend (for example a predecessor list that was missing an
//! edge when the SSA pass ran).

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::{
    block::BlockBranch,
    entity::{Block, Inst},
    function::Function,
    opcode::Opcode,
    program::Program,
    types::Type,
    value::Value,
};

/// A single verifier finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierError {
    pub message: String,
    /// Entity the finding is anchored to, e.g. `inst5` or `block2`.
    pub location: Option<String>,
}

impl VerifierError {
    fn at(message: String, location: String) -> Self {
        Self {
            message,
            location: Some(location),
        }
    }
}

/// Verify one function. Returns every finding rather than stopping at the
/// first.
pub fn verify(func: &Function) -> Result<(), Vec<VerifierError>> {
    let mut errors = Vec::new();
    verify_use_counts(func, &mut errors);
    verify_phi_placement(func, &mut errors);
    verify_signatures(func, &mut errors);
    verify_branches(func, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Verify every function of a program.
pub fn verification_pass(program: &Program) -> Result<(), Vec<VerifierError>> {
    let mut errors = Vec::new();
    for func in &program.functions {
        if let Err(func_errors) = verify(func) {
            errors.extend(func_errors);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Recount operand references across the arena and compare with the stored
/// use counts.
fn verify_use_counts(func: &Function, errors: &mut Vec<VerifierError>) {
    let mut counts: BTreeMap<Inst, u32> = BTreeMap::new();
    for (_, data) in func.dfg.insts() {
        if data.opcode() == Opcode::Invalid {
            continue;
        }
        for &arg in data.args() {
            if let Value::Inst(target) = arg {
                *counts.entry(target).or_default() += 1;
            }
        }
        for &(_, value) in data.phi_args() {
            if let Value::Inst(target) = value {
                *counts.entry(target).or_default() += 1;
            }
        }
    }
    for (inst, data) in func.dfg.insts() {
        let counted = counts.get(&inst).copied().unwrap_or(0);
        if counted != data.uses() {
            errors.push(VerifierError::at(
                format!(
                    "use count out of sync: stored {}, counted {counted}",
                    data.uses()
                ),
                format!("{inst}"),
            ));
        }
    }
}

/// All phis of a block must precede its first non-phi instruction, and a
/// phi's operands must line up with the block's predecessor list.
fn verify_phi_placement(func: &Function, errors: &mut Vec<VerifierError>) {
    for block in func.blocks() {
        let mut seen_non_phi = false;
        for inst in func.block_insts(block) {
            if func.dfg.opcode(inst).is_phi() {
                if seen_non_phi {
                    errors.push(VerifierError::at(
                        format!("phi {inst} after non-phi instructions"),
                        format!("{block}"),
                    ));
                }
                verify_phi_operands(func, block, inst, errors);
            } else {
                seen_non_phi = true;
            }
        }
    }
}

fn verify_phi_operands(
    func: &Function,
    block: Block,
    phi: Inst,
    errors: &mut Vec<VerifierError>,
) {
    let preds = func.block_data(block).immediate_predecessors();
    let phi_args = func.dfg.phi_args(phi);
    if phi_args.len() != preds.len() {
        errors.push(VerifierError::at(
            format!(
                "phi has {} operands for {} predecessors",
                phi_args.len(),
                preds.len()
            ),
            format!("{phi}"),
        ));
        return;
    }
    for (index, (&(pred, _), &expected)) in phi_args.iter().zip(preds).enumerate() {
        if pred != expected {
            errors.push(VerifierError::at(
                format!("phi operand {index} keyed by {pred}, expected {expected}"),
                format!("{phi}"),
            ));
        }
    }
}

/// Check operand arity and types of every placed instruction against the
/// opcode table.
fn verify_signatures(func: &Function, errors: &mut Vec<VerifierError>) {
    for block in func.blocks() {
        for inst in func.block_insts(block) {
            let opcode = func.dfg.opcode(inst);
            if opcode.is_phi() {
                continue;
            }
            let expected = opcode.arg_types();
            let args = func.dfg.args(inst);
            if args.len() != expected.len() {
                errors.push(VerifierError::at(
                    format!(
                        "{opcode} has {} operands, expected {}",
                        args.len(),
                        expected.len()
                    ),
                    format!("{inst}"),
                ));
                continue;
            }
            for (index, (&arg, &want)) in args.iter().zip(expected).enumerate() {
                if want == Type::Void {
                    continue;
                }
                let got = func.dfg.value_type(arg);
                if got != want {
                    errors.push(VerifierError::at(
                        format!("{opcode} operand {index} has type {got}, expected {want}"),
                        format!("{inst}"),
                    ));
                }
            }
        }
    }
}

/// A block's branch record must agree with its terminator instruction.
fn verify_branches(func: &Function, errors: &mut Vec<VerifierError>) {
    for block in func.blocks() {
        let last = func.block_insts(block).last();
        match func.block_data(block).branch() {
            BlockBranch::None => {}
            BlockBranch::Unconditional(target) => match last {
                Some(inst)
                    if func.dfg.opcode(inst) == Opcode::Branch
                        && func.dfg.arg(inst, 0) == Value::Label(target) => {}
                _ => errors.push(VerifierError::at(
                    format!("branch record to {target} without a matching terminator"),
                    format!("{block}"),
                )),
            },
            BlockBranch::Conditional {
                true_target,
                false_target,
                ..
            } => match last {
                Some(inst)
                    if func.dfg.opcode(inst) == Opcode::BranchConditional
                        && func.dfg.arg(inst, 1) == Value::Label(true_target)
                        && func.dfg.arg(inst, 2) == Value::Label(false_target) => {}
                _ => errors.push(VerifierError::at(
                    format!(
                        "conditional branch record to {true_target}/{false_target} without a \
                         matching terminator"
                    ),
                    format!("{block}"),
                )),
            },
        }
    }
}
