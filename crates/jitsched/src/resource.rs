use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical register as seen by the scheduler.
///
/// `St0` is the top of the x87 stack. It never becomes a [`Resource::Reg`]; all
/// x87 state is folded into [`Resource::FpStack`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysReg {
    Eax,
    Ecx,
    Edx,
    Ebx,
    Esp,
    Ebp,
    Esi,
    Edi,
    Xmm0,
    Xmm1,
    Xmm2,
    Xmm3,
    Xmm4,
    Xmm5,
    Xmm6,
    Xmm7,
    St0,
}

impl fmt::Display for PhysReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhysReg::Eax => "eax",
            PhysReg::Ecx => "ecx",
            PhysReg::Edx => "edx",
            PhysReg::Ebx => "ebx",
            PhysReg::Esp => "esp",
            PhysReg::Ebp => "ebp",
            PhysReg::Esi => "esi",
            PhysReg::Edi => "edi",
            PhysReg::Xmm0 => "xmm0",
            PhysReg::Xmm1 => "xmm1",
            PhysReg::Xmm2 => "xmm2",
            PhysReg::Xmm3 => "xmm3",
            PhysReg::Xmm4 => "xmm4",
            PhysReg::Xmm5 => "xmm5",
            PhysReg::Xmm6 => "xmm6",
            PhysReg::Xmm7 => "xmm7",
            PhysReg::St0 => "st0",
        };
        write!(f, "{}", name)
    }
}

/// Identity that dependency tracking is keyed on.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Resource {
    Reg(PhysReg),
    /// Condition flags. Also stands in for control state of branches.
    Flags,
    /// Virtual register home slot in the interpreter frame.
    VirtualReg(u32),
    /// Spill slot on the native stack.
    Spill(u32),
    /// Any memory the backend cannot disambiguate.
    UnknownMemory,
    FpStack,
    /// Read-only constants. Never tracked.
    ConstantPool,
}

impl Resource {
    pub fn of_reg(reg: PhysReg) -> Self {
        match reg {
            PhysReg::St0 => Resource::FpStack,
            reg => Resource::Reg(reg),
        }
    }

    pub fn is_tracked(&self) -> bool {
        !matches!(self, Resource::ConstantPool)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Reg(reg) => write!(f, "{}", reg),
            Resource::Flags => write!(f, "flags"),
            Resource::VirtualReg(index) => write!(f, "vr{}", index),
            Resource::Spill(index) => write!(f, "spill{}", index),
            Resource::UnknownMemory => write!(f, "mem"),
            Resource::FpStack => write!(f, "fpstack"),
            Resource::ConstantPool => write!(f, "const"),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum AccessRole {
    Use,
    Def,
    UseDef,
}

impl AccessRole {
    pub fn reads(self) -> bool {
        matches!(self, AccessRole::Use | AccessRole::UseDef)
    }

    pub fn writes(self) -> bool {
        matches!(self, AccessRole::Def | AccessRole::UseDef)
    }
}

impl fmt::Display for AccessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessRole::Use => "use",
            AccessRole::Def => "def",
            AccessRole::UseDef => "usedef",
        };
        write!(f, "{}", s)
    }
}

/// Why an edge carries extra latency.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LatencyReason {
    #[default]
    None,
    /// Address generation waits on a register written just before.
    AgenStall,
    LoadBlockedByStore,
    /// The producer is a load from memory.
    MemoryLoad,
}

impl fmt::Display for LatencyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LatencyReason::None => "none",
            LatencyReason::AgenStall => "agen-stall",
            LatencyReason::LoadBlockedByStore => "load-blocked-by-store",
            LatencyReason::MemoryLoad => "memory-load",
        };
        write!(f, "{}", s)
    }
}

/// Edge latency in cycles for each [`LatencyReason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyTable {
    pub none: u32,
    pub agen_stall: u32,
    pub load_blocked_by_store: u32,
    pub memory_load: u32,
}

impl Default for LatencyTable {
    fn default() -> Self {
        Self {
            none: 0,
            agen_stall: 3,
            load_blocked_by_store: 0,
            memory_load: 0,
        }
    }
}

impl LatencyTable {
    pub fn get(&self, reason: LatencyReason) -> u32 {
        match reason {
            LatencyReason::None => self.none,
            LatencyReason::AgenStall => self.agen_stall,
            LatencyReason::LoadBlockedByStore => self.load_blocked_by_store,
            LatencyReason::MemoryLoad => self.memory_load,
        }
    }

    pub fn set(&mut self, reason: LatencyReason, cycles: u32) {
        match reason {
            LatencyReason::None => self.none = cycles,
            LatencyReason::AgenStall => self.agen_stall = cycles,
            LatencyReason::LoadBlockedByStore => self.load_blocked_by_store = cycles,
            LatencyReason::MemoryLoad => self.memory_load = cycles,
        }
    }
}
