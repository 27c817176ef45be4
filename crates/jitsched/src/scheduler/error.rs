use crate::emit::EmitError;
use crate::instruction::{Mnemonic, OperandShape, SlotId};
use thiserror::Error;

/// Failure while scheduling one block. Every variant aborts the current trace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Dependency cycle through slot {slot}")]
    DependencyCycle { slot: SlotId },
    #[error("Scheduled block has {actual} instructions, expected {expected}")]
    ScheduleSizeMismatch { expected: usize, actual: usize },
    #[error("Block delimiter at slot {slot} is not scheduled last")]
    DelimiterNotLast { slot: SlotId },
    #[error("No instruction can issue at cycle {time}")]
    NoReadyInstruction { time: u32 },
    #[error("Machine model has no entry for {mnemonic} with {shape} operands")]
    UnmodeledInstruction {
        mnemonic: Mnemonic,
        shape: OperandShape,
    },
    #[error("Emission error: {0}")]
    Emit(#[from] EmitError),
}
