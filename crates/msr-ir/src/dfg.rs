//! Instruction arena and use tracking.

use alloc::vec::Vec;
use core::mem;

use smallvec::smallvec;

use crate::{
    entity::{Block, EntityRef, Inst},
    entity_map::PrimaryMap,
    error::{IrError, IrResult},
    flags::InstFlags,
    inst::{Args, InstData},
    opcode::Opcode,
    types::Type,
    value::Value,
};

/// The instruction arena of one function.
///
/// Owns every instruction for the lifetime of the function. Instructions
/// refer to each other through stable `Inst` handles; slots are never
/// reclaimed while the function lives, so handles cannot dangle. Deletion is
/// explicit invalidation, which clears the slot and marks it with the
/// `Invalid` opcode.
#[derive(Debug, Clone, Default)]
pub struct DataFlowGraph {
    insts: PrimaryMap<Inst, InstData>,
}

impl DataFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validated instruction.
    ///
    /// Checks operand arity and types against the opcode signature and bumps
    /// the use count of every instruction operand. Pseudo-operation
    /// consumers are attached to their producing instruction automatically.
    pub fn make_inst(&mut self, opcode: Opcode, flags: InstFlags, args: &[Value]) -> IrResult<Inst> {
        let expected = opcode.arg_types();
        if args.len() != expected.len() {
            return Err(IrError::invalid_argument(format_args!(
                "{opcode} expects {} operands, got {}",
                expected.len(),
                args.len()
            )));
        }
        for (index, (&arg, &want)) in args.iter().zip(expected).enumerate() {
            if arg.is_void() {
                return Err(IrError::invalid_argument(format_args!(
                    "{opcode} operand {index} is void"
                )));
            }
            if want == Type::Void {
                continue;
            }
            let got = self.value_type(arg);
            if got != want {
                return Err(IrError::invalid_argument(format_args!(
                    "{opcode} operand {index} has type {got}, expected {want}"
                )));
            }
        }
        for &arg in args {
            self.use_value(arg);
        }
        let inst = self
            .insts
            .push(InstData::new(opcode, flags, Args::from_slice(args)));
        if opcode.is_pseudo_operation() {
            if let Some(parent) = args.first().and_then(|v| v.inst()) {
                self.attach_pseudo(parent, inst);
            }
        }
        Ok(inst)
    }

    /// Create an operand-less phi. Operands are appended later, one per
    /// predecessor, via [`add_phi_operand`](Self::add_phi_operand).
    pub fn make_phi(&mut self) -> Inst {
        self.insts
            .push(InstData::new(Opcode::Phi, InstFlags::None, Args::new()))
    }

    /// Append a `(predecessor, value)` operand to a phi.
    pub fn add_phi_operand(&mut self, phi: Inst, pred: Block, value: Value) {
        debug_assert!(self.insts[phi].is_phi(), "{phi} is not a phi");
        self.use_value(value);
        self.insts[phi].phi_args.push((pred, value));
    }

    /// Borrow the data of an instruction.
    pub fn inst(&self, inst: Inst) -> &InstData {
        &self.insts[inst]
    }

    pub fn opcode(&self, inst: Inst) -> Opcode {
        self.insts[inst].opcode
    }

    pub fn flags(&self, inst: Inst) -> InstFlags {
        self.insts[inst].flags
    }

    pub fn args(&self, inst: Inst) -> &[Value] {
        self.insts[inst].args()
    }

    /// One operand of a non-phi instruction.
    pub fn arg(&self, inst: Inst, index: usize) -> Value {
        self.insts[inst].args[index]
    }

    pub fn phi_args(&self, inst: Inst) -> &[(Block, Value)] {
        self.insts[inst].phi_args()
    }

    pub fn uses(&self, inst: Inst) -> u32 {
        self.insts[inst].uses
    }

    /// Number of slots in the arena, invalidated ones included.
    pub fn num_insts(&self) -> usize {
        self.insts.len()
    }

    /// Iterate over every slot in the arena.
    pub fn insts(&self) -> impl Iterator<Item = (Inst, &InstData)> {
        self.insts.iter()
    }

    /// The type of a value. Instruction results come from the opcode table;
    /// phi and identity types are derived from their first operand.
    pub fn value_type(&self, value: Value) -> Type {
        let mut current = match value {
            Value::Inst(inst) => inst,
            other => return other.immediate_type().unwrap_or(Type::Void),
        };
        // A chain of dynamic-typed nodes is finite unless every link is a
        // phi/identity cycle, which only unreachable code can build.
        for _ in 0..=self.insts.len() {
            let data = &self.insts[current];
            let forwarded = match data.opcode {
                Opcode::Phi => data.phi_args.first().map(|&(_, v)| v),
                Opcode::Identity => data.args.first().copied(),
                opcode => return opcode.result_type(),
            };
            match forwarded {
                Some(Value::Inst(next)) => current = next,
                Some(imm) => return imm.immediate_type().unwrap_or(Type::Void),
                None => return Type::Void,
            }
        }
        Type::Void
    }

    /// Chase identity forwards to the authoritative value.
    pub fn resolve(&self, value: Value) -> Value {
        let mut current = value;
        for _ in 0..=self.insts.len() {
            match current {
                Value::Inst(inst) if self.insts[inst].opcode == Opcode::Identity => {
                    current = self.insts[inst].args[0];
                }
                other => return other,
            }
        }
        current
    }

    /// Substitute `replacement` for every operand occurrence of `target`
    /// across the arena, then turn `target` into an identity forward of
    /// `replacement` so values cached outside the arena still resolve.
    ///
    /// Afterwards `target` has zero uses and can be invalidated.
    pub fn replace_uses_with(&mut self, target: Inst, replacement: Value) {
        debug_assert_ne!(
            Value::Inst(target),
            replacement,
            "cannot replace {target} with itself"
        );
        let mut moved: u32 = 0;
        let mut moved_pseudo: Vec<Inst> = Vec::new();
        for index in 0..self.insts.len() {
            let user = Inst::from_index(index);
            if user == target {
                continue;
            }
            let data = &mut self.insts[user];
            if data.opcode == Opcode::Invalid {
                continue;
            }
            let mut local: u32 = 0;
            for arg in data.args.iter_mut() {
                if *arg == Value::Inst(target) {
                    *arg = replacement;
                    local += 1;
                }
            }
            for (_, value) in data.phi_args.iter_mut() {
                if *value == Value::Inst(target) {
                    *value = replacement;
                    local += 1;
                }
            }
            if local > 0 {
                if data.opcode.is_pseudo_operation() {
                    moved_pseudo.push(user);
                }
                moved += local;
            }
        }
        self.insts[target].uses -= moved;
        if let Value::Inst(new_parent) = replacement {
            self.insts[new_parent].uses += moved;
            for &consumer in &moved_pseudo {
                self.attach_pseudo(new_parent, consumer);
            }
        }
        for consumer in moved_pseudo {
            self.insts[target].pseudo_ops.retain(|c| *c != consumer);
        }

        // Turn the husk into an identity forward. If the husk was itself a
        // pseudo-operation consumer, its producer association ends here.
        if self.insts[target].opcode.is_pseudo_operation() {
            if let Some(parent) = self.insts[target].args.first().and_then(|v| v.inst()) {
                self.insts[parent].pseudo_ops.retain(|c| *c != target);
            }
        }
        let old_args = mem::take(&mut self.insts[target].args);
        let old_phi_args = mem::take(&mut self.insts[target].phi_args);
        for arg in old_args {
            self.undo_use(arg);
        }
        for (_, value) in old_phi_args {
            self.undo_use(value);
        }
        let data = &mut self.insts[target];
        data.opcode = Opcode::Identity;
        data.flags = InstFlags::None;
        data.args = smallvec![replacement];
        self.use_value(replacement);
        debug_assert_eq!(self.insts[target].uses, 0, "stale uses on {target}");
    }

    /// Clear an unused instruction and mark its slot dead.
    ///
    /// The slot survives (handles never dangle) but holds the `Invalid`
    /// opcode and no operands.
    pub fn invalidate(&mut self, inst: Inst) {
        debug_assert_eq!(
            self.insts[inst].uses, 0,
            "invalidating {inst} while it still has uses"
        );
        if self.insts[inst].opcode.is_pseudo_operation() {
            if let Some(parent) = self.insts[inst].args.first().and_then(|v| v.inst()) {
                self.insts[parent].pseudo_ops.retain(|c| *c != inst);
            }
        }
        let old_args = mem::take(&mut self.insts[inst].args);
        let old_phi_args = mem::take(&mut self.insts[inst].phi_args);
        for arg in old_args {
            self.undo_use(arg);
        }
        for (_, value) in old_phi_args {
            self.undo_use(value);
        }
        let data = &mut self.insts[inst];
        data.opcode = Opcode::Invalid;
        data.flags = InstFlags::None;
    }

    /// Record `pseudo` as a pseudo-operation consumer of `parent`.
    pub fn attach_pseudo(&mut self, parent: Inst, pseudo: Inst) {
        let list = &mut self.insts[parent].pseudo_ops;
        if !list.contains(&pseudo) {
            list.push(pseudo);
        }
    }

    /// Find the pseudo-operation consumer of `parent` with the given opcode.
    pub fn get_associated_pseudo(&self, parent: Inst, opcode: Opcode) -> Option<Inst> {
        self.insts[parent]
            .pseudo_ops
            .iter()
            .copied()
            .find(|&consumer| self.insts[consumer].opcode == opcode)
    }

    fn use_value(&mut self, value: Value) {
        if let Value::Inst(inst) = value {
            self.insts[inst].uses += 1;
        }
    }

    fn undo_use(&mut self, value: Value) {
        if let Value::Inst(inst) = value {
            debug_assert!(self.insts[inst].uses > 0, "use count underflow on {inst}");
            self.insts[inst].uses -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imm(v: u32) -> Value {
        Value::ImmU32(v)
    }

    #[test]
    fn make_inst_counts_uses() {
        let mut dfg = DataFlowGraph::new();
        let a = dfg
            .make_inst(Opcode::UndefU32, InstFlags::None, &[])
            .unwrap();
        let add = dfg
            .make_inst(Opcode::IAdd32, InstFlags::None, &[Value::Inst(a), imm(1)])
            .unwrap();
        assert_eq!(dfg.uses(a), 1);
        assert_eq!(dfg.uses(add), 0);
        assert_eq!(dfg.value_type(Value::Inst(add)), Type::U32);
    }

    #[test]
    fn make_inst_rejects_arity_and_type_mismatch() {
        let mut dfg = DataFlowGraph::new();
        assert!(matches!(
            dfg.make_inst(Opcode::IAdd32, InstFlags::None, &[imm(1)]),
            Err(IrError::InvalidArgument(_))
        ));
        assert!(matches!(
            dfg.make_inst(
                Opcode::IAdd32,
                InstFlags::None,
                &[imm(1), Value::from_f32(1.0)]
            ),
            Err(IrError::InvalidArgument(_))
        ));
    }

    #[test]
    fn replace_uses_with_moves_counts_and_forwards() {
        let mut dfg = DataFlowGraph::new();
        let a = dfg
            .make_inst(Opcode::UndefU32, InstFlags::None, &[])
            .unwrap();
        let _u1 = dfg
            .make_inst(Opcode::INeg32, InstFlags::None, &[Value::Inst(a)])
            .unwrap();
        let _u2 = dfg
            .make_inst(Opcode::IAbs32, InstFlags::None, &[Value::Inst(a)])
            .unwrap();
        let b = dfg
            .make_inst(Opcode::UndefU32, InstFlags::None, &[])
            .unwrap();
        assert_eq!(dfg.uses(a), 2);

        dfg.replace_uses_with(a, Value::Inst(b));
        assert_eq!(dfg.uses(a), 0);
        // Two rerouted operands plus the identity forward.
        assert_eq!(dfg.uses(b), 3);
        assert_eq!(dfg.opcode(a), Opcode::Identity);
        assert_eq!(dfg.resolve(Value::Inst(a)), Value::Inst(b));
    }

    #[test]
    fn invalidate_clears_slot() {
        let mut dfg = DataFlowGraph::new();
        let a = dfg
            .make_inst(Opcode::UndefU32, InstFlags::None, &[])
            .unwrap();
        let neg = dfg
            .make_inst(Opcode::INeg32, InstFlags::None, &[Value::Inst(a)])
            .unwrap();
        dfg.invalidate(neg);
        assert_eq!(dfg.opcode(neg), Opcode::Invalid);
        assert_eq!(dfg.args(neg).len(), 0);
        assert_eq!(dfg.uses(a), 0);
    }

    #[test]
    fn pseudo_ops_attach_and_detach() {
        let mut dfg = DataFlowGraph::new();
        let op = dfg
            .make_inst(Opcode::IAdd32, InstFlags::None, &[imm(1), imm(2)])
            .unwrap();
        let zero = dfg
            .make_inst(Opcode::GetZeroFromOp, InstFlags::None, &[Value::Inst(op)])
            .unwrap();
        assert_eq!(dfg.get_associated_pseudo(op, Opcode::GetZeroFromOp), Some(zero));
        assert_eq!(dfg.get_associated_pseudo(op, Opcode::GetSignFromOp), None);

        dfg.invalidate(zero);
        assert_eq!(dfg.get_associated_pseudo(op, Opcode::GetZeroFromOp), None);
        assert_eq!(dfg.uses(op), 0);
    }

    #[test]
    fn phi_types_follow_first_operand() {
        let mut dfg = DataFlowGraph::new();
        let phi = dfg.make_phi();
        assert_eq!(dfg.value_type(Value::Inst(phi)), Type::Void);
        dfg.add_phi_operand(phi, Block::new(0), Value::ImmU1(true));
        assert_eq!(dfg.value_type(Value::Inst(phi)), Type::U1);
    }
}
