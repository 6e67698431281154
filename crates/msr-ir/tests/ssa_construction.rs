//! End-to-end SSA construction scenarios.

use msr_ir::opt::{ssa_rewrite_pass, verify};
use msr_ir::{
    Block, Function, IREmitter, Inst, Opcode, Program, Reg, Value,
};

fn reg(n: u64) -> Reg {
    Reg::from_raw(n).unwrap()
}

/// Find the placed instructions of `block` with the given opcode.
fn find_insts(func: &Function, block: Block, opcode: Opcode) -> Vec<Inst> {
    func.block_insts(block)
        .filter(|&inst| func.dfg.opcode(inst) == opcode)
        .collect()
}

fn assert_no_context_opcodes(func: &Function) {
    for block in func.blocks() {
        for inst in func.block_insts(block) {
            let opcode = func.dfg.opcode(inst);
            assert!(
                !matches!(
                    opcode,
                    Opcode::GetRegister
                        | Opcode::GetPred
                        | Opcode::GetZFlag
                        | Opcode::GetSFlag
                        | Opcode::GetCFlag
                        | Opcode::GetOFlag
                        | Opcode::GetGotoVariable
                        | Opcode::GetIndirectBranchVariable
                        | Opcode::SetRegister
                        | Opcode::SetPred
                        | Opcode::SetZFlag
                        | Opcode::SetSFlag
                        | Opcode::SetCFlag
                        | Opcode::SetOFlag
                        | Opcode::SetGotoVariable
                        | Opcode::SetIndirectBranchVariable
                ),
                "context opcode {opcode} left in {block}"
            );
        }
    }
}

#[test]
fn straight_line_reads_become_values() {
    let mut program = Program::new();
    let func = program.add_function();
    let block = func.create_block();
    {
        let mut ir = IREmitter::new(func, block);
        let seven = ir.imm32(7);
        ir.set_reg(reg(3), seven).unwrap();
        let five = ir.imm32(5);
        ir.set_reg(reg(4), five).unwrap();
        let a = ir.get_reg(reg(3)).unwrap();
        let b = ir.get_reg(reg(4)).unwrap();
        let sum = ir.iadd(a, b).unwrap();
        ir.set_reg(reg(5), sum).unwrap();
        ir.return_().unwrap();
    }

    ssa_rewrite_pass(&mut program);
    let func = &program.functions[0];

    let adds = find_insts(func, block, Opcode::IAdd32);
    assert_eq!(adds.len(), 1);
    assert_eq!(
        func.dfg.args(adds[0]),
        &[Value::ImmU32(7), Value::ImmU32(5)]
    );
    assert!(find_insts(func, block, Opcode::Phi).is_empty());
    assert_no_context_opcodes(func);
    verify(func).unwrap();
}

#[test]
fn diamond_merges_through_a_phi() {
    let mut program = Program::new();
    let func = program.add_function();
    let entry = func.create_block();
    let left = func.create_block();
    let right = func.create_block();
    let merge = func.create_block();
    {
        let mut ir = IREmitter::new(func, entry);
        let cond = ir.imm1(true);
        ir.branch_conditional(cond, left, right).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, left);
        let one = ir.imm32(1);
        ir.set_reg(reg(1), one).unwrap();
        ir.branch(merge).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, right);
        let two = ir.imm32(2);
        ir.set_reg(reg(1), two).unwrap();
        ir.branch(merge).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, merge);
        let read = ir.get_reg(reg(1)).unwrap();
        let zero = ir.imm32(0);
        ir.iadd(read, zero).unwrap();
        ir.return_().unwrap();
    }

    ssa_rewrite_pass(&mut program);
    let func = &program.functions[0];

    let phis = find_insts(func, merge, Opcode::Phi);
    assert_eq!(phis.len(), 1);
    let phi = phis[0];
    assert_eq!(
        func.dfg.phi_args(phi),
        &[(left, Value::ImmU32(1)), (right, Value::ImmU32(2))]
    );

    // The merge-block read now references the phi directly.
    let adds = find_insts(func, merge, Opcode::IAdd32);
    assert_eq!(func.dfg.arg(adds[0], 0), Value::Inst(phi));
    assert_no_context_opcodes(func);
    verify(func).unwrap();
}

#[test]
fn loop_carries_the_increment_through_the_header_phi() {
    let mut program = Program::new();
    let func = program.add_function();
    let entry = func.create_block();
    let header = func.create_block();
    let latch = func.create_block();
    let exit = func.create_block();
    {
        let mut ir = IREmitter::new(func, entry);
        let zero = ir.imm32(0);
        ir.set_reg(reg(2), zero).unwrap();
        ir.branch(header).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, header);
        let cond = ir.imm1(true);
        ir.branch_conditional(cond, latch, exit).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, latch);
        let current = ir.get_reg(reg(2)).unwrap();
        let one = ir.imm32(1);
        let incremented = ir.iadd(current, one).unwrap();
        ir.set_reg(reg(2), incremented).unwrap();
        ir.branch(header).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, exit);
        let read = ir.get_reg(reg(2)).unwrap();
        let zero = ir.imm32(0);
        ir.iadd(read, zero).unwrap();
        ir.return_().unwrap();
    }

    ssa_rewrite_pass(&mut program);
    let func = &program.functions[0];

    let phis = find_insts(func, header, Opcode::Phi);
    assert_eq!(phis.len(), 1);
    let phi = phis[0];

    let latch_adds = find_insts(func, latch, Opcode::IAdd32);
    assert_eq!(latch_adds.len(), 1);
    let incremented = latch_adds[0];

    // Exactly two operands, in predecessor order: the init from the entry
    // edge, the incremented value from the back edge.
    assert_eq!(
        func.dfg.phi_args(phi),
        &[
            (entry, Value::ImmU32(0)),
            (latch, Value::Inst(incremented))
        ]
    );
    // The increment consumes the phi.
    assert_eq!(func.dfg.arg(incremented, 0), Value::Inst(phi));

    // The exit read also resolves to the header phi.
    let exit_adds = find_insts(func, exit, Opcode::IAdd32);
    assert_eq!(func.dfg.arg(exit_adds[0], 0), Value::Inst(phi));

    assert_no_context_opcodes(func);
    verify(func).unwrap();
}

#[test]
fn entry_read_without_definition_yields_one_undef() {
    let mut program = Program::new();
    let func = program.add_function();
    let entry = func.create_block();
    {
        let mut ir = IREmitter::new(func, entry);
        let first = ir.get_reg(reg(7)).unwrap();
        let zero = ir.imm32(0);
        ir.iadd(first, zero).unwrap();
        let second = ir.get_reg(reg(7)).unwrap();
        ir.iadd(second, zero).unwrap();
        ir.return_().unwrap();
    }

    ssa_rewrite_pass(&mut program);
    let func = &program.functions[0];

    let undefs = find_insts(func, entry, Opcode::UndefU32);
    assert_eq!(undefs.len(), 1);
    let undef = Value::Inst(undefs[0]);

    // Both reads share the single cached undef, and no phi survives.
    let adds = find_insts(func, entry, Opcode::IAdd32);
    assert_eq!(adds.len(), 2);
    assert_eq!(func.dfg.arg(adds[0], 0), undef);
    assert_eq!(func.dfg.arg(adds[1], 0), undef);
    assert!(find_insts(func, entry, Opcode::Phi).is_empty());

    // The undef sits ahead of every consumer.
    assert_eq!(func.block_insts(entry).next(), Some(undefs[0]));
    verify(func).unwrap();
}

#[test]
fn trivial_phi_collapses_to_the_merged_value() {
    let mut program = Program::new();
    let func = program.add_function();
    let entry = func.create_block();
    let left = func.create_block();
    let right = func.create_block();
    let merge = func.create_block();
    let shared;
    {
        let mut ir = IREmitter::new(func, entry);
        let three = ir.imm32(3);
        let four = ir.imm32(4);
        shared = ir.iadd(three, four).unwrap();
        let cond = ir.imm1(true);
        ir.branch_conditional(cond, left, right).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, left);
        ir.set_reg(reg(1), shared).unwrap();
        ir.branch(merge).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, right);
        ir.set_reg(reg(1), shared).unwrap();
        ir.branch(merge).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, merge);
        let read = ir.get_reg(reg(1)).unwrap();
        let zero = ir.imm32(0);
        let five = ir.imm32(5);
        ir.iadd(read, zero).unwrap();
        ir.iadd(read, five).unwrap();
        ir.return_().unwrap();
    }

    ssa_rewrite_pass(&mut program);
    let func = &program.functions[0];

    // Both arms fed the same value, so the merge phi was trivial and is
    // gone; every former phi user references the shared value.
    assert!(find_insts(func, merge, Opcode::Phi).is_empty());
    let adds = find_insts(func, merge, Opcode::IAdd32);
    assert_eq!(adds.len(), 2);
    assert_eq!(func.dfg.arg(adds[0], 0), shared);
    assert_eq!(func.dfg.arg(adds[1], 0), shared);

    // Two rerouted users plus the phi's forwarding node.
    assert_eq!(func.dfg.uses(shared.inst().unwrap()), 3);
    assert_no_context_opcodes(func);
    verify(func).unwrap();
}

#[test]
fn sparse_consumer_is_resolved_and_invalidated() {
    use msr_ir::{TextureInstInfo, TextureType};

    let mut program = Program::new();
    let func = program.add_function();
    let block = func.create_block();
    let sample;
    let sparse;
    {
        let mut ir = IREmitter::new(func, block);
        let x = ir.imm32_float(0.5);
        let y = ir.imm32_float(0.5);
        let coords = ir.composite_construct(&[x, y]).unwrap();
        let handle = ir.imm32(0);
        let info = TextureInstInfo::new(TextureType::Color2D);
        sample = ir.image_sample_implicit_lod(handle, coords, info).unwrap();
        sparse = ir.get_sparse_from_op(sample).unwrap();
        let not = ir.logical_not(sparse).unwrap();
        let _ = not;
        ir.return_().unwrap();
    }

    // A later lowering finds the consumer through the producer, synthesizes
    // the residency value, reroutes, and retires the consumer.
    let func = &mut program.functions[0];
    let parent = sample.inst().unwrap();
    let consumer = func
        .dfg
        .get_associated_pseudo(parent, Opcode::GetSparseFromOp)
        .unwrap();
    assert_eq!(consumer, sparse.inst().unwrap());

    func.dfg.replace_uses_with(consumer, Value::ImmU1(true));
    func.layout.remove_inst(consumer);
    func.dfg.invalidate(consumer);

    assert_eq!(func.dfg.uses(consumer), 0);
    assert_eq!(func.dfg.opcode(consumer), Opcode::Invalid);
    assert_eq!(
        func.dfg.get_associated_pseudo(parent, Opcode::GetSparseFromOp),
        None
    );
    let nots = find_insts(func, block, Opcode::LogicalNot);
    assert_eq!(func.dfg.arg(nots[0], 0), Value::ImmU1(true));
    verify(func).unwrap();
}

#[test]
fn loop_exit_ordering_does_not_lose_the_back_edge() {
    // Same loop as above, but the conditional is emitted with the exit as
    // the taken target, flipping the depth-first successor order and with
    // it the reverse post-order of latch and exit.
    let mut program = Program::new();
    let func = program.add_function();
    let entry = func.create_block();
    let header = func.create_block();
    let latch = func.create_block();
    let exit = func.create_block();
    {
        let mut ir = IREmitter::new(func, entry);
        let zero = ir.imm32(0);
        ir.set_reg(reg(2), zero).unwrap();
        ir.branch(header).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, header);
        let cond = ir.imm1(false);
        ir.branch_conditional(cond, exit, latch).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, latch);
        let current = ir.get_reg(reg(2)).unwrap();
        let one = ir.imm32(1);
        let incremented = ir.iadd(current, one).unwrap();
        ir.set_reg(reg(2), incremented).unwrap();
        ir.branch(header).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, exit);
        let read = ir.get_reg(reg(2)).unwrap();
        let zero = ir.imm32(0);
        ir.iadd(read, zero).unwrap();
        ir.return_().unwrap();
    }

    ssa_rewrite_pass(&mut program);
    let func = &program.functions[0];

    let phis = find_insts(func, header, Opcode::Phi);
    assert_eq!(phis.len(), 1);
    let phi = phis[0];
    let latch_adds = find_insts(func, latch, Opcode::IAdd32);
    let incremented = latch_adds[0];
    assert_eq!(
        func.dfg.phi_args(phi),
        &[
            (entry, Value::ImmU32(0)),
            (latch, Value::Inst(incremented))
        ]
    );
    assert_no_context_opcodes(func);
    verify(func).unwrap();
}

#[test]
fn predicates_and_flags_lift_like_registers() {
    use msr_ir::Pred;

    let mut program = Program::new();
    let func = program.add_function();
    let entry = func.create_block();
    let body = func.create_block();
    {
        let mut ir = IREmitter::new(func, entry);
        let t = ir.imm1(true);
        ir.set_pred(Pred::from_raw(3).unwrap(), t).unwrap();
        ir.set_zflag(t).unwrap();
        ir.branch(body).unwrap();
    }
    {
        let mut ir = IREmitter::new(func, body);
        let p = ir.get_pred(Pred::from_raw(3).unwrap(), false).unwrap();
        let z = ir.get_zflag().unwrap();
        ir.logical_and(p, z).unwrap();
        ir.return_().unwrap();
    }

    ssa_rewrite_pass(&mut program);
    let func = &program.functions[0];

    let ands = find_insts(func, body, Opcode::LogicalAnd);
    assert_eq!(
        func.dfg.args(ands[0]),
        &[Value::ImmU1(true), Value::ImmU1(true)]
    );
    assert_no_context_opcodes(func);
    verify(func).unwrap();
}

#[test]
fn sinks_are_left_untouched() {
    use msr_ir::Pred;

    let mut program = Program::new();
    let func = program.add_function();
    let entry = func.create_block();
    {
        let mut ir = IREmitter::new(func, entry);
        let zero = ir.imm32(0);
        ir.set_reg(Reg::RZ, zero).unwrap();
        let rz = ir.get_reg(Reg::RZ).unwrap();
        ir.iadd(rz, zero).unwrap();
        let pt = ir.get_pred(Pred::PT, false).unwrap();
        let _ = pt;
        ir.return_().unwrap();
    }

    ssa_rewrite_pass(&mut program);
    let func = &program.functions[0];

    // Sink accesses survive for the downstream folding pass.
    assert_eq!(find_insts(func, entry, Opcode::SetRegister).len(), 1);
    assert_eq!(find_insts(func, entry, Opcode::GetRegister).len(), 1);
    assert_eq!(find_insts(func, entry, Opcode::GetPred).len(), 1);
    verify(func).unwrap();
}
