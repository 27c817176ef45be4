use jitsched::{
    BlockSchedule, Cond, Hazard, Instruction, IssuePort, MachineEntry, MachineModel, MemOperand,
    Mnemonic, OperandShape, PhysReg, SchedulerOptions, SlotId, schedule_block,
};

/// Unit-latency model with a few mnemonics pinned to fixed ports.
struct PortModel;

impl MachineModel for PortModel {
    fn lookup(&self, mnemonic: Mnemonic, _shape: OperandShape) -> Option<MachineEntry> {
        let port = match mnemonic {
            Mnemonic::Movd => IssuePort::Port0,
            Mnemonic::Movq => IssuePort::Port1,
            Mnemonic::Movapd => IssuePort::Both,
            _ => IssuePort::Either,
        };
        Some(MachineEntry::new(port, 1))
    }
}

fn schedule(block: &[Instruction]) -> BlockSchedule {
    schedule_block(&PortModel, &SchedulerOptions::default(), block).unwrap()
}

fn times(schedule: &BlockSchedule) -> Vec<u32> {
    schedule
        .records
        .iter()
        .map(|r| r.scheduled_time.unwrap())
        .collect()
}

#[test]
fn test_dependent_chain_issues_in_order() {
    let block = [
        Instruction::imm_to_reg(Mnemonic::Mov, 7, PhysReg::Eax),
        Instruction::reg_to_reg(Mnemonic::Add, PhysReg::Ecx, PhysReg::Eax),
        Instruction::reg_to_mem(
            Mnemonic::Mov,
            PhysReg::Eax,
            MemOperand::virtual_reg(PhysReg::Edi, 0),
        ),
    ];
    let schedule = schedule(&block);
    assert_eq!(schedule.order, vec![SlotId(0), SlotId(1), SlotId(2)]);
    assert_eq!(times(&schedule), vec![0, 1, 2]);
    assert_eq!(
        schedule
            .records
            .iter()
            .map(|r| r.longest_path.unwrap())
            .collect::<Vec<_>>(),
        vec![3, 2, 1]
    );
}

#[test]
fn test_independent_pair_on_distinct_ports_dual_issues() {
    let block = [
        Instruction::reg_to_reg(Mnemonic::Movd, PhysReg::Eax, PhysReg::Xmm0),
        Instruction::reg_to_reg(Mnemonic::Movq, PhysReg::Xmm1, PhysReg::Xmm2),
    ];
    let schedule = schedule(&block);
    assert_eq!(schedule.order, vec![SlotId(0), SlotId(1)]);
    assert_eq!(times(&schedule), vec![0, 0]);
    assert_eq!(schedule.cycles(), 1);
}

#[test]
fn test_same_port_pair_is_serialized() {
    let block = [
        Instruction::reg_to_reg(Mnemonic::Movd, PhysReg::Eax, PhysReg::Xmm0),
        Instruction::reg_to_reg(Mnemonic::Movd, PhysReg::Ecx, PhysReg::Xmm1),
    ];
    assert_eq!(times(&schedule(&block)), vec![0, 1]);
}

#[test]
fn test_both_port_instruction_issues_alone() {
    let block = [
        Instruction::reg_to_reg(Mnemonic::Movapd, PhysReg::Xmm1, PhysReg::Xmm0),
        Instruction::reg_to_reg(Mnemonic::Movq, PhysReg::Xmm2, PhysReg::Xmm3),
    ];
    assert_eq!(times(&schedule(&block)), vec![0, 1]);
}

#[test]
fn test_volatile_load_precedes_later_load() {
    let block = [
        Instruction::mem_to_reg(
            Mnemonic::Mov,
            MemOperand::unknown(PhysReg::Esi, 0),
            PhysReg::Eax,
        )
        .volatile(),
        Instruction::mem_to_reg(
            Mnemonic::Mov,
            MemOperand::unknown(PhysReg::Esi, 4),
            PhysReg::Ecx,
        ),
    ];
    let schedule = schedule(&block);
    assert!(schedule.graph.has_edge(SlotId(0), SlotId(1), Hazard::Raw));
    let t = times(&schedule);
    assert!(t[1] > t[0]);
}

#[test]
fn test_branch_waits_for_last_flag_writer() {
    let block = [
        Instruction::imm_to_reg(Mnemonic::Add, 1, PhysReg::Eax),
        Instruction::imm_to_reg(Mnemonic::Sub, 1, PhysReg::Ecx),
        Instruction::imm(Mnemonic::Jcc(Cond::Ne), 0),
    ];
    let schedule = schedule(&block);
    let graph = &schedule.graph;
    assert!(graph.has_edge(SlotId(1), SlotId(2), Hazard::Raw));
    assert!(!graph.has_edge(SlotId(0), SlotId(2), Hazard::Raw));
    assert!(graph.has_edge(SlotId(0), SlotId(1), Hazard::Waw));
    assert_eq!(schedule.order.last(), Some(&SlotId(2)));
    assert_eq!(times(&schedule), vec![0, 1, 2]);
}

#[test]
fn test_delimiter_without_dependencies_still_issues_last() {
    let block = [
        Instruction::imm_to_reg(Mnemonic::Mov, 1, PhysReg::Eax),
        Instruction::imm_to_reg(Mnemonic::Mov, 2, PhysReg::Ecx),
        Instruction::imm(Mnemonic::Jmp, 0),
    ];
    let schedule = schedule(&block);
    assert!(schedule.graph.predecessors(SlotId(2)).is_empty());
    assert_eq!(schedule.order, vec![SlotId(0), SlotId(1), SlotId(2)]);
    assert_eq!(times(&schedule), vec![0, 0, 1]);
}

#[test]
fn test_longest_path_wins_over_program_order() {
    let block = [
        Instruction::imm_to_reg(Mnemonic::Mov, 1, PhysReg::Ebx),
        Instruction::imm_to_reg(Mnemonic::Mov, 2, PhysReg::Eax),
        Instruction::reg_to_reg(Mnemonic::Mov, PhysReg::Eax, PhysReg::Ecx),
        Instruction::reg_to_reg(Mnemonic::Mov, PhysReg::Ecx, PhysReg::Edx),
    ];
    let schedule = schedule(&block);
    assert_eq!(schedule.order[0], SlotId(1));
    assert!(schedule.edit_distance() > 0.0);
}

#[test]
fn test_disabled_scheduling_keeps_program_order() {
    let options = SchedulerOptions {
        enabled: false,
        ..SchedulerOptions::default()
    };
    let block = [
        Instruction::imm_to_reg(Mnemonic::Mov, 1, PhysReg::Ebx),
        Instruction::imm_to_reg(Mnemonic::Mov, 2, PhysReg::Eax),
        Instruction::imm(Mnemonic::Jmp, 0),
    ];
    let schedule = schedule_block(&PortModel, &options, &block).unwrap();
    assert_eq!(schedule.order, vec![SlotId(0), SlotId(1), SlotId(2)]);
    assert!(schedule.records.iter().all(|r| r.scheduled_time.is_none()));
    assert_eq!(schedule.cycles(), 0);
    assert_eq!(schedule.edit_distance(), 0.0);
}
