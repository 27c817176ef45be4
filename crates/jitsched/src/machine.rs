use crate::instruction::{IssuePort, Mnemonic, OperandShape};

mod atom;

pub use atom::AtomMachineModel;

/// Issue port and base latency of one mnemonic/operand-shape pair.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct MachineEntry {
    pub port: IssuePort,
    pub latency: u32,
}

impl MachineEntry {
    pub const fn new(port: IssuePort, latency: u32) -> Self {
        Self { port, latency }
    }
}

/// Per-mnemonic port and latency lookup.
///
/// `None` means the pair is not modeled. The scheduler rejects such
/// instructions rather than guessing.
pub trait MachineModel {
    fn lookup(&self, mnemonic: Mnemonic, shape: OperandShape) -> Option<MachineEntry>;
}

impl<M: MachineModel + ?Sized> MachineModel for &M {
    fn lookup(&self, mnemonic: Mnemonic, shape: OperandShape) -> Option<MachineEntry> {
        (**self).lookup(mnemonic, shape)
    }
}

impl<M: MachineModel + ?Sized> MachineModel for Box<M> {
    fn lookup(&self, mnemonic: Mnemonic, shape: OperandShape) -> Option<MachineEntry> {
        (**self).lookup(mnemonic, shape)
    }
}
