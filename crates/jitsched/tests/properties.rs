use std::collections::BTreeMap;

use jitsched::{
    AtomMachineModel, BlockSchedule, Cond, Hazard, Instruction, IssuePort, MachineEntry,
    MachineModel, MemOperand, Mnemonic, OperandShape, OperandSize, PhysReg, Resource,
    SchedulerOptions, SlotId, accesses, schedule_block,
};
use proptest::prelude::*;

/// The Atom table, with forms it lacks issued on either port in one cycle.
struct Permissive;

impl MachineModel for Permissive {
    fn lookup(&self, mnemonic: Mnemonic, shape: OperandShape) -> Option<MachineEntry> {
        AtomMachineModel
            .lookup(mnemonic, shape)
            .or(Some(MachineEntry::new(IssuePort::Either, 1)))
    }
}

fn body_pool() -> Vec<Instruction> {
    vec![
        Instruction::imm_to_reg(Mnemonic::Mov, 1, PhysReg::Eax),
        Instruction::reg_to_reg(Mnemonic::Add, PhysReg::Ecx, PhysReg::Eax),
        Instruction::imm_to_reg(Mnemonic::Sub, 4, PhysReg::Edx),
        Instruction::mem_to_reg(
            Mnemonic::Mov,
            MemOperand::virtual_reg(PhysReg::Edi, 1),
            PhysReg::Ecx,
        ),
        Instruction::reg_to_mem(
            Mnemonic::Mov,
            PhysReg::Eax,
            MemOperand::virtual_reg(PhysReg::Edi, 2),
        ),
        Instruction::mem_to_reg(
            Mnemonic::Mov,
            MemOperand::unknown(PhysReg::Esi, 0),
            PhysReg::Ebx,
        ),
        Instruction::mem_to_reg(
            Mnemonic::Mov,
            MemOperand::unknown(PhysReg::Esi, 4),
            PhysReg::Edx,
        )
        .volatile(),
        Instruction::reg_to_mem(
            Mnemonic::Mov,
            PhysReg::Ebx,
            MemOperand::unknown(PhysReg::Esi, 8),
        ),
        Instruction::imm_to_reg(Mnemonic::Cmp, 0, PhysReg::Eax),
        Instruction::reg_to_reg(Mnemonic::Cmov(Cond::E), PhysReg::Edx, PhysReg::Ebx),
        Instruction::reg_to_reg(Mnemonic::Imul, PhysReg::Ecx, PhysReg::Eax),
        Instruction::reg_to_reg(Mnemonic::Adc, PhysReg::Edx, PhysReg::Ecx),
        Instruction::reg_to_reg(Mnemonic::Movq, PhysReg::Xmm0, PhysReg::Xmm1),
        Instruction::reg_to_reg(Mnemonic::Addsd, PhysReg::Xmm1, PhysReg::Xmm2),
        Instruction::mem_to_reg(Mnemonic::Movsd, MemOperand::constant(0x40), PhysReg::Xmm3),
        Instruction::reg_to_reg(Mnemonic::Divsd, PhysReg::Xmm2, PhysReg::Xmm0),
        Instruction::reg_to_mem(Mnemonic::Movq, PhysReg::Xmm1, MemOperand::spill(PhysReg::Ebp, 8))
            .with_size(OperandSize::S64),
        Instruction::mem_to_reg(
            Mnemonic::Lea,
            MemOperand::unknown(PhysReg::Esi, 16).with_index(PhysReg::Edi),
            PhysReg::Esi,
        ),
        Instruction::reg(Mnemonic::Push, PhysReg::Eax),
        Instruction::reg(Mnemonic::Mul, PhysReg::Ecx),
        Instruction::mem_to_reg(
            Mnemonic::Fld,
            MemOperand::virtual_reg(PhysReg::Edi, 3),
            PhysReg::St0,
        ),
        Instruction::reg_to_mem(
            Mnemonic::Fstp,
            PhysReg::St0,
            MemOperand::virtual_reg(PhysReg::Edi, 4),
        ),
        Instruction::imm(Mnemonic::Push, 1),
        Instruction::none(Mnemonic::Cdq),
        Instruction::none(Mnemonic::Fabs),
        Instruction::none(Mnemonic::Fsqrt),
        Instruction::imm_to_reg(Mnemonic::Mov, 0x1000, PhysReg::Ebx),
        Instruction::mem_to_reg(
            Mnemonic::Movsd,
            MemOperand {
                base: Some(PhysReg::Ebx),
                ..MemOperand::constant(0x40)
            },
            PhysReg::Xmm0,
        ),
    ]
}

fn delimiters() -> Vec<Instruction> {
    vec![
        Instruction::imm(Mnemonic::Jcc(Cond::Ne), 0),
        Instruction::imm(Mnemonic::Jmp, 0),
        Instruction::none(Mnemonic::Ret),
    ]
}

fn block_strategy() -> impl Strategy<Value = Vec<Instruction>> {
    let pool = body_pool();
    let len = pool.len();
    (
        prop::collection::vec(0..len, 1..24),
        prop::option::of(0..delimiters().len()),
    )
        .prop_map(move |(body, end)| {
            let mut block: Vec<Instruction> = body.into_iter().map(|i| pool[i].clone()).collect();
            if let Some(end) = end {
                block.push(delimiters()[end].clone());
            }
            block
        })
}

fn run(block: &[Instruction]) -> BlockSchedule {
    schedule_block(&Permissive, &SchedulerOptions::default(), block).unwrap()
}

/// Pairs in program order that touch the same non-flag resource with at least one write.
fn conflicting_pairs(block: &[Instruction]) -> Vec<(usize, usize, Resource)> {
    let accesses: Vec<_> = block.iter().map(accesses).collect();
    let mut pairs = Vec::new();
    for (i, earlier) in accesses.iter().enumerate() {
        for (j, later) in accesses.iter().enumerate().skip(i + 1) {
            for a in earlier.iter().filter(|a| a.resource != Resource::Flags) {
                let conflict = later
                    .iter()
                    .any(|b| b.resource == a.resource && (a.role.writes() || b.role.writes()));
                if conflict {
                    pairs.push((i, j, a.resource));
                }
            }
        }
    }
    pairs
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_order_is_permutation(block in block_strategy()) {
        let schedule = run(&block);
        let mut slots: Vec<usize> = schedule.order.iter().map(|s| s.0).collect();
        slots.sort_unstable();
        prop_assert_eq!(slots, (0..block.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_every_edge_is_respected(block in block_strategy()) {
        let schedule = run(&block);
        for (from, to, dep) in schedule.graph.edges() {
            let producer = &schedule.records[from.0];
            let delay = match dep.hazard {
                Hazard::Raw => producer.latency,
                Hazard::Waw | Hazard::War => 1,
            };
            let issued = producer.scheduled_time.unwrap();
            let consumer = schedule.records[to.0].scheduled_time.unwrap();
            prop_assert!(
                consumer >= issued + delay + dep.latency,
                "{} {} -> {} violated: {} < {} + {} + {}",
                dep.hazard, from, to, consumer, issued, delay, dep.latency
            );
        }
    }

    #[test]
    fn test_conflicting_accesses_keep_program_order(block in block_strategy()) {
        let schedule = run(&block);
        let mut position = vec![0; block.len()];
        for (pos, slot) in schedule.order.iter().enumerate() {
            position[slot.0] = pos;
        }
        for (i, j, resource) in conflicting_pairs(&block) {
            prop_assert!(
                position[i] < position[j],
                "{} and {} both touch {} but issued out of order: {:?}",
                i, j, resource, schedule.order
            );
        }
    }

    #[test]
    fn test_delimiter_is_last(block in block_strategy()) {
        let schedule = run(&block);
        if block.last().is_some_and(Instruction::is_delimiter) {
            prop_assert_eq!(schedule.order.last(), Some(&SlotId(block.len() - 1)));
        }
    }

    #[test]
    fn test_cycles_respect_ports(block in block_strategy()) {
        let schedule = run(&block);
        let mut cycles: BTreeMap<u32, Vec<IssuePort>> = BTreeMap::new();
        for record in &schedule.records {
            cycles
                .entry(record.scheduled_time.unwrap())
                .or_default()
                .push(record.port);
        }
        for (cycle, ports) in cycles {
            prop_assert!(ports.len() <= 2, "cycle {} issued {:?}", cycle, ports);
            if let [a, b] = ports[..] {
                prop_assert!(!a.conflicts_with(b), "cycle {} issued {} and {}", cycle, a, b);
            }
        }
    }

    #[test]
    fn test_scheduling_is_deterministic(block in block_strategy()) {
        let first = run(&block);
        let second = run(&block);
        prop_assert_eq!(first.order, second.order);
        prop_assert_eq!(first.records, second.records);
    }
}
