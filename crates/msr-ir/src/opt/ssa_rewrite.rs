//! SSA construction.
//!
//! Implements the on-the-fly SSA construction algorithm of Braun et al.,
//! "Simple and Efficient Construction of Static Single Assignment Form"
//! (CC 2013). Virtual register, predicate, flag, goto, and indirect-branch
//! reads and writes are rewritten into SSA values and phi nodes; phis
//! created while a block is still unsealed are completed at seal time.
//! Reads that reach no definition produce Undef.
//!
//! A block seals once its own visit and the visits of all its predecessors
//! have completed. Sealing a loop header before its latch is visited would
//! bind the header phi to the latch's pre-visit definitions, so headers
//! wait for their latches; every other block seals right after its own
//! visit because reverse post-order has already visited its predecessors.
//!
//! The algorithm's natural formulation is mutually recursive. Deep
//! predecessor chains would overflow the call stack, so `read_variable` runs
//! as a state machine over an explicit work stack instead.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec;
use alloc::vec::Vec;

use crate::{
    entity::{Block, Inst},
    flags::InstFlags,
    function::Function,
    opcode::Opcode,
    program::Program,
    reg::{Pred, Reg, NUM_USER_PREDS, NUM_USER_REGS},
    value::Value,
};

/// A virtual variable being lifted into SSA form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Variable {
    Reg(Reg),
    Pred(Pred),
    ZeroFlag,
    SignFlag,
    CarryFlag,
    OverflowFlag,
    Goto(u32),
    IndirectBranch,
}

impl Variable {
    /// Opcode materialized when a read reaches no definition. One-bit
    /// variables get a U1 undef, word-sized variables a U32 undef.
    fn undef_opcode(self) -> Opcode {
        match self {
            Variable::Pred(_)
            | Variable::ZeroFlag
            | Variable::SignFlag
            | Variable::CarryFlag
            | Variable::OverflowFlag => Opcode::UndefU1,
            Variable::Reg(_) | Variable::Goto(_) | Variable::IndirectBranch => Opcode::UndefU32,
        }
    }
}

type ValueMap = BTreeMap<Block, Value>;

/// Current definition of every variable, per block.
struct DefTable {
    regs: [ValueMap; NUM_USER_REGS],
    preds: [ValueMap; NUM_USER_PREDS],
    goto_vars: BTreeMap<u32, ValueMap>,
    indirect_branch_var: ValueMap,
    zero_flag: ValueMap,
    sign_flag: ValueMap,
    carry_flag: ValueMap,
    overflow_flag: ValueMap,
}

impl DefTable {
    fn new() -> Self {
        Self {
            regs: core::array::from_fn(|_| ValueMap::new()),
            preds: core::array::from_fn(|_| ValueMap::new()),
            goto_vars: BTreeMap::new(),
            indirect_branch_var: ValueMap::new(),
            zero_flag: ValueMap::new(),
            sign_flag: ValueMap::new(),
            carry_flag: ValueMap::new(),
            overflow_flag: ValueMap::new(),
        }
    }

    fn map_mut(&mut self, variable: Variable) -> &mut ValueMap {
        match variable {
            Variable::Reg(reg) => &mut self.regs[reg.index()],
            Variable::Pred(pred) => &mut self.preds[pred.index()],
            Variable::ZeroFlag => &mut self.zero_flag,
            Variable::SignFlag => &mut self.sign_flag,
            Variable::CarryFlag => &mut self.carry_flag,
            Variable::OverflowFlag => &mut self.overflow_flag,
            Variable::Goto(id) => self.goto_vars.entry(id).or_default(),
            Variable::IndirectBranch => &mut self.indirect_branch_var,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Status {
    Start,
    SetValue,
    PreparePhiArgument,
    PushPhiArgument,
}

/// One frame of the unrolled `read_variable` recursion.
struct ReadState {
    /// `None` only for the bottom sentinel, which receives the final result.
    block: Option<Block>,
    result: Value,
    phi: Option<Inst>,
    pred_index: usize,
    pred_count: usize,
    pc: Status,
}

impl ReadState {
    fn new(block: Block) -> Self {
        Self {
            block: Some(block),
            result: Value::Void,
            phi: None,
            pred_index: 0,
            pred_count: 0,
            pc: Status::Start,
        }
    }

    fn sentinel() -> Self {
        Self {
            block: None,
            result: Value::Void,
            phi: None,
            pred_index: 0,
            pred_count: 0,
            pc: Status::Start,
        }
    }
}

struct Pass {
    sealed_blocks: BTreeSet<Block>,
    incomplete_phis: BTreeMap<Block, BTreeMap<Variable, Inst>>,
    current_def: DefTable,
}

impl Pass {
    fn new() -> Self {
        Self {
            sealed_blocks: BTreeSet::new(),
            incomplete_phis: BTreeMap::new(),
            current_def: DefTable::new(),
        }
    }

    fn write_variable(&mut self, variable: Variable, block: Block, value: Value) {
        self.current_def.map_mut(variable).insert(block, value);
    }

    /// Find the definition of `variable` reaching the end of `root_block`,
    /// creating phis along the way as needed.
    fn read_variable(
        &mut self,
        func: &mut Function,
        variable: Variable,
        root_block: Block,
    ) -> Value {
        let mut stack = vec![ReadState::sentinel(), ReadState::new(root_block)];
        while stack.len() > 1 {
            let top = stack.len() - 1;
            let block = stack[top].block.expect("sentinel frame never executes");
            match stack[top].pc {
                Status::Start => {
                    if let Some(&value) = self.current_def.map_mut(variable).get(&block) {
                        stack[top].result = value;
                        stack[top].pc = Status::SetValue;
                    } else if !self.sealed_blocks.contains(&block) {
                        // Incomplete CFG: pend the phi until the block seals.
                        let phi = func.prepend_phi(block);
                        self.incomplete_phis
                            .entry(block)
                            .or_default()
                            .insert(variable, phi);
                        stack[top].result = Value::Inst(phi);
                        stack[top].pc = Status::SetValue;
                    } else {
                        let preds = func.block_data(block).immediate_predecessors();
                        if preds.len() == 1 {
                            // Common single-predecessor case: no phi needed.
                            let pred = preds[0];
                            stack[top].pc = Status::SetValue;
                            stack.push(ReadState::new(pred));
                        } else {
                            // Break potential cycles with an operandless phi
                            // before reading the predecessors.
                            let pred_count = preds.len();
                            let phi = func.prepend_phi(block);
                            self.write_variable(variable, block, Value::Inst(phi));
                            stack[top].phi = Some(phi);
                            stack[top].pred_index = 0;
                            stack[top].pred_count = pred_count;
                            stack[top].pc = Status::PreparePhiArgument;
                        }
                    }
                }
                Status::SetValue => {
                    let result = stack[top].result;
                    self.write_variable(variable, block, result);
                    stack.pop();
                    let parent = stack.len() - 1;
                    stack[parent].result = result;
                }
                Status::PushPhiArgument => {
                    let phi = stack[top].phi.expect("phi frame");
                    let index = stack[top].pred_index;
                    let pred = func.block_data(block).immediate_predecessors()[index];
                    let result = stack[top].result;
                    func.dfg.add_phi_operand(phi, pred, result);
                    stack[top].pred_index += 1;
                    stack[top].pc = Status::PreparePhiArgument;
                }
                Status::PreparePhiArgument => {
                    if stack[top].pred_index == stack[top].pred_count {
                        let phi = stack[top].phi.expect("phi frame");
                        let result =
                            self.try_remove_trivial_phi(func, phi, block, variable.undef_opcode());
                        stack.pop();
                        let parent = stack.len() - 1;
                        stack[parent].result = result;
                        self.write_variable(variable, block, result);
                    } else {
                        let index = stack[top].pred_index;
                        let pred = func.block_data(block).immediate_predecessors()[index];
                        stack[top].pc = Status::PushPhiArgument;
                        stack.push(ReadState::new(pred));
                    }
                }
            }
        }
        stack.pop().expect("sentinel frame").result
    }

    /// Complete every phi that was pending on `block`, then mark it sealed.
    fn seal_block(&mut self, func: &mut Function, block: Block) {
        if let Some(pending) = self.incomplete_phis.remove(&block) {
            for (variable, phi) in pending {
                self.add_phi_operands(func, variable, phi, block);
            }
        }
        self.sealed_blocks.insert(block);
    }

    fn add_phi_operands(
        &mut self,
        func: &mut Function,
        variable: Variable,
        phi: Inst,
        block: Block,
    ) -> Value {
        let preds: Vec<Block> = func.block_data(block).immediate_predecessors().to_vec();
        for pred in preds {
            let value = self.read_variable(func, variable, pred);
            func.dfg.add_phi_operand(phi, pred, value);
        }
        self.try_remove_trivial_phi(func, phi, block, variable.undef_opcode())
    }

    /// If `phi` merges a single distinct value, forward it to that value and
    /// unlink it. A phi with no real operand is unreachable or sits in the
    /// entry block; it is forwarded to a fresh Undef placed after the
    /// remaining phi prefix.
    fn try_remove_trivial_phi(
        &mut self,
        func: &mut Function,
        phi: Inst,
        block: Block,
        undef_opcode: Opcode,
    ) -> Value {
        let phi_value = Value::Inst(phi);
        if !func.dfg.inst(phi).is_phi() {
            // Already removed and forwarded; repeat calls are no-ops.
            return func.dfg.resolve(phi_value);
        }
        let mut same = Value::Void;
        let operands: Vec<Value> = func.dfg.phi_args(phi).iter().map(|&(_, value)| value).collect();
        for op in operands {
            if func.dfg.resolve(op) == func.dfg.resolve(same) || op == phi_value {
                // Repeated value or self-reference.
                continue;
            }
            if !same.is_void() {
                // Merges at least two distinct values: not trivial.
                return phi_value;
            }
            same = op;
        }
        func.layout.remove_inst(phi);
        if same.is_void() {
            let undef = func
                .prepend_after_phis(block, undef_opcode, InstFlags::None, &[])
                .expect("undef opcodes take no operands");
            same = Value::Inst(undef);
        }
        // TODO: revisit phi users here; removing this phi can make them
        // trivial in turn.
        func.dfg.replace_uses_with(phi, same);
        same
    }

    fn visit_inst(&mut self, func: &mut Function, block: Block, inst: Inst) {
        match func.dfg.opcode(inst) {
            Opcode::SetRegister => {
                let reg = func.dfg.arg(inst, 0).reg().expect("SetRegister operand");
                // Writes to the zero sink are dropped by the hardware.
                if reg.is_zero() {
                    return;
                }
                let value = func.dfg.arg(inst, 1);
                self.write_variable(Variable::Reg(reg), block, value);
                self.discard(func, inst);
            }
            Opcode::SetPred => {
                let pred = func.dfg.arg(inst, 0).pred().expect("SetPred operand");
                if pred.is_true() {
                    return;
                }
                let value = func.dfg.arg(inst, 1);
                self.write_variable(Variable::Pred(pred), block, value);
                self.discard(func, inst);
            }
            Opcode::SetGotoVariable => {
                let id = func.dfg.arg(inst, 0).u32().expect("goto variable id");
                let value = func.dfg.arg(inst, 1);
                self.write_variable(Variable::Goto(id), block, value);
                self.discard(func, inst);
            }
            Opcode::SetIndirectBranchVariable => {
                let value = func.dfg.arg(inst, 0);
                self.write_variable(Variable::IndirectBranch, block, value);
                self.discard(func, inst);
            }
            Opcode::SetZFlag => {
                let value = func.dfg.arg(inst, 0);
                self.write_variable(Variable::ZeroFlag, block, value);
                self.discard(func, inst);
            }
            Opcode::SetSFlag => {
                let value = func.dfg.arg(inst, 0);
                self.write_variable(Variable::SignFlag, block, value);
                self.discard(func, inst);
            }
            Opcode::SetCFlag => {
                let value = func.dfg.arg(inst, 0);
                self.write_variable(Variable::CarryFlag, block, value);
                self.discard(func, inst);
            }
            Opcode::SetOFlag => {
                let value = func.dfg.arg(inst, 0);
                self.write_variable(Variable::OverflowFlag, block, value);
                self.discard(func, inst);
            }
            Opcode::GetRegister => {
                let reg = func.dfg.arg(inst, 0).reg().expect("GetRegister operand");
                // Reads of the zero sink are folded downstream.
                if reg.is_zero() {
                    return;
                }
                let value = self.read_variable(func, Variable::Reg(reg), block);
                func.dfg.replace_uses_with(inst, value);
            }
            Opcode::GetPred => {
                let pred = func.dfg.arg(inst, 0).pred().expect("GetPred operand");
                if pred.is_true() {
                    return;
                }
                let value = self.read_variable(func, Variable::Pred(pred), block);
                func.dfg.replace_uses_with(inst, value);
            }
            Opcode::GetGotoVariable => {
                let id = func.dfg.arg(inst, 0).u32().expect("goto variable id");
                let value = self.read_variable(func, Variable::Goto(id), block);
                func.dfg.replace_uses_with(inst, value);
            }
            Opcode::GetIndirectBranchVariable => {
                let value = self.read_variable(func, Variable::IndirectBranch, block);
                func.dfg.replace_uses_with(inst, value);
            }
            Opcode::GetZFlag => {
                let value = self.read_variable(func, Variable::ZeroFlag, block);
                func.dfg.replace_uses_with(inst, value);
            }
            Opcode::GetSFlag => {
                let value = self.read_variable(func, Variable::SignFlag, block);
                func.dfg.replace_uses_with(inst, value);
            }
            Opcode::GetCFlag => {
                let value = self.read_variable(func, Variable::CarryFlag, block);
                func.dfg.replace_uses_with(inst, value);
            }
            Opcode::GetOFlag => {
                let value = self.read_variable(func, Variable::OverflowFlag, block);
                func.dfg.replace_uses_with(inst, value);
            }
            _ => {}
        }
    }

    /// Remove a consumed Set instruction from its block.
    fn discard(&mut self, func: &mut Function, inst: Inst) {
        func.layout.remove_inst(inst);
        func.dfg.invalidate(inst);
    }

    fn visit_block(&mut self, func: &mut Function, block: Block) {
        let insts: Vec<Inst> = func.block_insts(block).collect();
        for inst in insts {
            self.visit_inst(func, block, inst);
        }
    }

    fn is_sealed(&self, block: Block) -> bool {
        self.sealed_blocks.contains(&block)
    }
}

fn rewrite_function(func: &mut Function) {
    let order: Vec<Block> = func.reverse_post_order().collect();
    let reachable: BTreeSet<Block> = order.iter().copied().collect();
    let mut visited: BTreeSet<Block> = BTreeSet::new();
    let mut pass = Pass::new();
    for &block in &order {
        pass.visit_block(func, block);
        visited.insert(block);
        // Seal every visited block whose predecessors have all been visited.
        // Predecessors outside the reachable set can never be visited and do
        // not hold sealing back; their reads surface as Undef.
        for &candidate in &order {
            if !visited.contains(&candidate) || pass.is_sealed(candidate) {
                continue;
            }
            let ready = func
                .block_data(candidate)
                .immediate_predecessors()
                .iter()
                .all(|pred| visited.contains(pred) || !reachable.contains(pred));
            if ready {
                pass.seal_block(func, candidate);
            }
        }
    }
}

/// Rewrite every function of `program` into SSA form.
pub fn ssa_rewrite_pass(program: &mut Program) {
    for (index, func) in program.functions.iter_mut().enumerate() {
        func.compute_post_order();
        log::trace!(
            "ssa rewrite: function {index}, {} reachable blocks",
            func.post_order().len()
        );
        rewrite_function(func);
    }
}
