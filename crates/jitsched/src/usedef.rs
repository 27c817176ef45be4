//! Resource accesses of a single instruction.
//!
//! Accesses come out in the order they must be recorded: an instruction that
//! reads and then writes the same resource lists the read first.

use crate::instruction::{Instruction, MemOperand, MemoryClass, Mnemonic, Operands};
use crate::resource::{AccessRole, LatencyReason, PhysReg, Resource};
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub resource: Resource,
    pub role: AccessRole,
    pub reason: LatencyReason,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role, self.resource)?;
        if self.reason != LatencyReason::None {
            write!(f, " ({})", self.reason)?;
        }
        Ok(())
    }
}

pub type Accesses = SmallVec<[Access; 8]>;

/// Explicit and implicit accesses of `inst`.
pub fn accesses(inst: &Instruction) -> Accesses {
    let mut c = Collector {
        out: Accesses::new(),
        wide: inst.size.is_wide(),
    };
    let m = inst.mnemonic;
    match inst.operands {
        Operands::None | Operands::Imm(_) => {
            if m.is_delimiter() {
                c.control(m);
            } else if !matches!(m, Mnemonic::Push | Mnemonic::Cdq) && !m.is_x87() {
                c.flags(AccessRole::Def);
            }
            c.accumulator_pair(m);
            c.push(m);
        }
        Operands::Reg(reg) => {
            let role = if one_operand_reads_only(m) {
                AccessRole::Use
            } else {
                AccessRole::UseDef
            };
            c.reg(reg, role);
            if m.is_delimiter() {
                c.control(m);
            } else if m != Mnemonic::Push {
                c.flags(AccessRole::Def);
            }
            c.accumulator_pair(m);
            c.push(m);
        }
        Operands::Mem(mem) => {
            let role = match m {
                Mnemonic::Fldcw => AccessRole::Use,
                Mnemonic::Fnstcw => AccessRole::Def,
                m if one_operand_reads_only(m) => AccessRole::Use,
                _ => AccessRole::UseDef,
            };
            c.mem(&mem, role);
            if m.is_delimiter() {
                c.control(m);
            } else if !matches!(m, Mnemonic::Push | Mnemonic::Fldcw | Mnemonic::Fnstcw) {
                c.flags(AccessRole::Def);
            }
            c.accumulator_pair(m);
            c.push(m);
        }
        Operands::ImmToReg { dst, .. } => {
            c.alu_flags(m);
            c.reg(dst, dest_role(m));
        }
        Operands::ImmToMem { dst, .. } => {
            c.alu_flags(m);
            c.mem(&dst, dest_role(m));
        }
        Operands::RegToReg { src, dst } | Operands::ImmRegReg { src, dst, .. } => {
            if m == Mnemonic::Cdq {
                c.accumulator_pair(m);
                return c.out;
            }
            if matches!(m, Mnemonic::Cmov(_)) {
                c.flags(AccessRole::Use);
            } else if !m.is_move() && !m.is_convert() {
                c.alu_flags(m);
            }
            c.reg(src, AccessRole::Use);
            let role = if m.is_move()
                || m.is_convert()
                || m.is_shuffle()
                || matches!(m, Mnemonic::Cmov(_) | Mnemonic::Pextrw | Mnemonic::Pextrd)
            {
                AccessRole::Def
            } else {
                dest_role(m)
            };
            c.reg(dst, role);
        }
        Operands::MemToReg { src, dst } if m.is_x87() => {
            c.mem(&src, AccessRole::Use);
            let role = if matches!(m, Mnemonic::Fld | Mnemonic::Fild) {
                AccessRole::Def
            } else {
                AccessRole::UseDef
            };
            c.reg(dst, role);
        }
        Operands::MemToReg { src, dst } => {
            if m.reads_carry() {
                c.flags(AccessRole::Use);
            }
            if !m.is_move() && !m.is_convert() && m != Mnemonic::Lea {
                c.flags(AccessRole::Def);
            }
            if m == Mnemonic::Lea {
                c.address(&src);
            } else {
                c.mem(&src, AccessRole::Use);
            }
            let role = if m.is_convert() || m == Mnemonic::Lea {
                AccessRole::Def
            } else {
                dest_role(m)
            };
            c.reg(dst, role);
        }
        Operands::RegToMem { src, dst } if m.is_x87() => {
            c.reg(src, AccessRole::Use);
            c.mem(&dst, AccessRole::Def);
        }
        Operands::RegToMem { src, dst } => {
            c.alu_flags(m);
            if m == Mnemonic::Cmpxchg {
                c.reg(PhysReg::Eax, AccessRole::UseDef);
            }
            if m == Mnemonic::Xchg {
                c.reg(src, AccessRole::UseDef);
                c.mem(&dst, AccessRole::UseDef);
            } else {
                c.reg(src, AccessRole::Use);
                c.mem(&dst, dest_role(m));
            }
        }
    }
    if m.is_x87() {
        c.record(Resource::FpStack, AccessRole::UseDef, LatencyReason::None);
    }
    c.out
}

/// One-operand forms that only read their operand.
fn one_operand_reads_only(m: Mnemonic) -> bool {
    matches!(m, Mnemonic::Call | Mnemonic::Jmp | Mnemonic::Push) || m.uses_accumulator_pair()
}

fn dest_role(m: Mnemonic) -> AccessRole {
    if m.is_move() {
        AccessRole::Def
    } else if m.is_compare() {
        AccessRole::Use
    } else {
        AccessRole::UseDef
    }
}

struct Collector {
    out: Accesses,
    wide: bool,
}

impl Collector {
    fn record(&mut self, resource: Resource, role: AccessRole, reason: LatencyReason) {
        if resource.is_tracked() {
            self.out.push(Access {
                resource,
                role,
                reason,
            });
        }
    }

    fn reg(&mut self, reg: PhysReg, role: AccessRole) {
        self.record(Resource::of_reg(reg), role, LatencyReason::None);
    }

    fn flags(&mut self, role: AccessRole) {
        self.record(Resource::Flags, role, LatencyReason::None);
    }

    /// Carry consumers read the flags; every non-move writes them.
    fn alu_flags(&mut self, m: Mnemonic) {
        if m.reads_carry() {
            self.flags(AccessRole::Use);
        }
        if !m.is_move() {
            self.flags(AccessRole::Def);
        }
    }

    fn control(&mut self, m: Mnemonic) {
        match m {
            Mnemonic::Jcc(_) => self.flags(AccessRole::Use),
            _ => self.flags(AccessRole::Def),
        }
    }

    fn address(&mut self, mem: &MemOperand) {
        if let Some(base) = mem.base {
            self.record(Resource::of_reg(base), AccessRole::Use, LatencyReason::AgenStall);
        }
        if let Some(index) = mem.index {
            self.record(Resource::of_reg(index), AccessRole::Use, LatencyReason::AgenStall);
        }
    }

    fn mem(&mut self, mem: &MemOperand, role: AccessRole) {
        match mem.class {
            MemoryClass::Constants => self.address(mem),
            MemoryClass::VirtualReg(vr) => {
                self.address(mem);
                self.record(Resource::VirtualReg(vr), role, LatencyReason::None);
                if self.wide {
                    let high = Resource::VirtualReg(vr.wrapping_add(1));
                    self.record(high, role, LatencyReason::None);
                }
            }
            MemoryClass::Spill(slot) => {
                self.address(mem);
                self.record(Resource::Spill(slot), role, LatencyReason::None);
                if self.wide {
                    let high = Resource::Spill(slot.wrapping_add(4));
                    self.record(high, role, LatencyReason::None);
                }
            }
            MemoryClass::Unknown => {
                self.address(mem);
                self.record(Resource::UnknownMemory, role, LatencyReason::None);
            }
        }
    }

    fn accumulator_pair(&mut self, m: Mnemonic) {
        if !m.uses_accumulator_pair() {
            return;
        }
        self.reg(PhysReg::Eax, AccessRole::UseDef);
        let high = if matches!(m, Mnemonic::Div | Mnemonic::Idiv) {
            AccessRole::UseDef
        } else {
            AccessRole::Def
        };
        self.reg(PhysReg::Edx, high);
    }

    fn push(&mut self, m: Mnemonic) {
        if m == Mnemonic::Push {
            self.record(
                Resource::Reg(PhysReg::Esp),
                AccessRole::UseDef,
                LatencyReason::AgenStall,
            );
            self.record(Resource::UnknownMemory, AccessRole::Def, LatencyReason::None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::OperandSize;

    fn resources(inst: &Instruction) -> Vec<(Resource, AccessRole)> {
        accesses(inst)
            .into_iter()
            .map(|a| (a.resource, a.role))
            .collect()
    }

    #[test]
    fn test_add_reg_reg_defines_flags_and_dest() {
        let inst = Instruction::reg_to_reg(Mnemonic::Add, PhysReg::Ecx, PhysReg::Eax);
        assert_eq!(
            resources(&inst),
            vec![
                (Resource::Flags, AccessRole::Def),
                (Resource::Reg(PhysReg::Ecx), AccessRole::Use),
                (Resource::Reg(PhysReg::Eax), AccessRole::UseDef),
            ]
        );
    }

    #[test]
    fn test_cmp_only_reads_operands() {
        let inst = Instruction::imm_to_reg(Mnemonic::Cmp, 0, PhysReg::Eax);
        assert_eq!(
            resources(&inst),
            vec![
                (Resource::Flags, AccessRole::Def),
                (Resource::Reg(PhysReg::Eax), AccessRole::Use),
            ]
        );
    }

    #[test]
    fn test_lea_reads_address_registers_only() {
        let src = MemOperand::unknown(PhysReg::Esi, 8).with_index(PhysReg::Edi);
        let inst = Instruction::mem_to_reg(Mnemonic::Lea, src, PhysReg::Eax);
        let got = accesses(&inst);
        assert_eq!(got.len(), 3);
        assert!(got.iter().all(|a| a.resource != Resource::UnknownMemory));
        assert!(got.iter().all(|a| a.resource != Resource::Flags));
        assert_eq!(got[0].reason, LatencyReason::AgenStall);
        assert_eq!(got[2].resource, Resource::Reg(PhysReg::Eax));
        assert_eq!(got[2].role, AccessRole::Def);
    }

    #[test]
    fn test_wide_spill_store_covers_both_halves() {
        let dst = MemOperand::spill(PhysReg::Ebp, 8);
        let inst = Instruction::reg_to_mem(Mnemonic::Movq, PhysReg::Xmm1, dst)
            .with_size(OperandSize::S64);
        let got = resources(&inst);
        assert!(got.contains(&(Resource::Spill(8), AccessRole::Def)));
        assert!(got.contains(&(Resource::Spill(12), AccessRole::Def)));
    }

    #[test]
    fn test_constant_pool_is_not_tracked() {
        let inst =
            Instruction::mem_to_reg(Mnemonic::Movsd, MemOperand::constant(0x40), PhysReg::Xmm0);
        assert_eq!(
            resources(&inst),
            vec![(Resource::Reg(PhysReg::Xmm0), AccessRole::Def)]
        );
    }

    #[test]
    fn test_constant_pool_base_register_is_read() {
        let src = MemOperand {
            base: Some(PhysReg::Ebx),
            ..MemOperand::constant(0x40)
        };
        let inst = Instruction::mem_to_reg(Mnemonic::Movsd, src, PhysReg::Xmm0);
        let got = accesses(&inst);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].resource, Resource::Reg(PhysReg::Ebx));
        assert_eq!(got[0].role, AccessRole::Use);
        assert_eq!(got[0].reason, LatencyReason::AgenStall);
    }

    #[test]
    fn test_zero_operand_forms_keep_implicit_accesses() {
        assert_eq!(
            resources(&Instruction::none(Mnemonic::Cdq)),
            vec![
                (Resource::Reg(PhysReg::Eax), AccessRole::UseDef),
                (Resource::Reg(PhysReg::Edx), AccessRole::Def),
            ]
        );
        assert_eq!(
            resources(&Instruction::none(Mnemonic::Fabs)),
            vec![(Resource::FpStack, AccessRole::UseDef)]
        );
        assert_eq!(
            resources(&Instruction::imm(Mnemonic::Push, 1)),
            vec![
                (Resource::Reg(PhysReg::Esp), AccessRole::UseDef),
                (Resource::UnknownMemory, AccessRole::Def),
            ]
        );
    }

    #[test]
    fn test_wide_access_at_top_index_wraps() {
        let src = MemOperand::virtual_reg(PhysReg::Edi, u32::MAX);
        let inst = Instruction::mem_to_reg(Mnemonic::Movq, src, PhysReg::Xmm0)
            .with_size(OperandSize::S64);
        let got = resources(&inst);
        assert!(got.contains(&(Resource::VirtualReg(u32::MAX), AccessRole::Use)));
        assert!(got.contains(&(Resource::VirtualReg(0), AccessRole::Use)));

        let dst = MemOperand::spill(PhysReg::Ebp, u32::MAX - 1);
        let inst = Instruction::reg_to_mem(Mnemonic::Movq, PhysReg::Xmm0, dst)
            .with_size(OperandSize::S64);
        assert!(resources(&inst).contains(&(Resource::Spill(2), AccessRole::Def)));
    }

    #[test]
    fn test_x87_load_serializes_on_fp_stack() {
        let src = MemOperand::virtual_reg(PhysReg::Edi, 2);
        let inst = Instruction::mem_to_reg(Mnemonic::Fld, src, PhysReg::St0);
        let got = resources(&inst);
        assert!(got.contains(&(Resource::FpStack, AccessRole::Def)));
        assert_eq!(got.last(), Some(&(Resource::FpStack, AccessRole::UseDef)));
        assert!(!got.iter().any(|(r, _)| *r == Resource::Flags));
    }
}
