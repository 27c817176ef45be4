mod debug;
mod emit;
mod graph;
mod instruction;
mod list_scheduler;
mod machine;
mod resource;
mod scheduler;
mod usedef;

pub(crate) use fxhash::FxHashMap as HashMap;

pub use debug::{dump_dot, edit_distance, format_dot, log_statistics};
pub use emit::{EmitError, Encoder, RecordingEncoder};
pub use graph::{
    Dependency, DependencyBuilder, DependencyGraph, Edges, Hazard, longest_paths,
    reverse_topological_order,
};
pub use instruction::{
    Cond, InstRecord, Instruction, IssuePort, MemOperand, MemoryClass, Mnemonic, OperandShape,
    OperandSize, Operands, SlotId, load_block,
};
pub use list_scheduler::list_schedule;
pub use machine::{AtomMachineModel, MachineEntry, MachineModel};
pub use resource::{AccessRole, LatencyReason, LatencyTable, PhysReg, Resource};
pub use scheduler::{
    BlockSchedule, Scheduler, SchedulerBuilder, SchedulerError, SchedulerOptions, schedule_block,
};
pub use usedef::{Access, Accesses, accesses};
