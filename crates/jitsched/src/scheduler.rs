use crate::debug;
use crate::emit::Encoder;
use crate::graph::{DependencyBuilder, DependencyGraph, longest_paths};
use crate::instruction::{InstRecord, Instruction, SlotId};
use crate::list_scheduler::list_schedule;
use crate::machine::{MachineEntry, MachineModel};

mod builder;
mod error;

pub use builder::{SchedulerBuilder, SchedulerOptions};
pub use error::SchedulerError;

/// Result of scheduling one closed block.
#[derive(Debug, Clone)]
pub struct BlockSchedule {
    /// Slots in issue order.
    pub order: Vec<SlotId>,
    /// Records in program order, indexed by slot.
    pub records: Vec<InstRecord>,
    pub graph: DependencyGraph,
}

impl BlockSchedule {
    fn run(builder: DependencyBuilder, mut records: Vec<InstRecord>) -> Result<Self, SchedulerError> {
        let graph = builder.finish();
        let latencies: Vec<u32> = records.iter().map(|r| r.latency).collect();
        let paths = longest_paths(&graph, &latencies)?;
        for (record, path) in records.iter_mut().zip(paths) {
            record.longest_path = Some(path);
        }
        let order = list_schedule(&mut records, &graph)?;
        Ok(Self {
            order,
            records,
            graph,
        })
    }

    fn unscheduled(records: Vec<InstRecord>) -> Self {
        Self {
            order: records.iter().map(|r| r.slot).collect(),
            records,
            graph: DependencyGraph::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in issue order.
    pub fn scheduled(&self) -> impl Iterator<Item = &InstRecord> + '_ {
        self.order.iter().map(|slot| &self.records[slot.0])
    }

    /// Percentage of positions whose slot moved.
    pub fn edit_distance(&self) -> f64 {
        debug::edit_distance(&self.order)
    }

    /// Cycles from the first issue to the last, inclusive. Zero when nothing
    /// was scheduled.
    pub fn cycles(&self) -> u32 {
        self.records
            .iter()
            .filter_map(|r| r.scheduled_time)
            .max()
            .map_or(0, |last| last + 1)
    }
}

/// Schedules a whole block at once without an encoder.
///
/// A delimiter may only appear as the last instruction.
pub fn schedule_block<M: MachineModel + ?Sized>(
    model: &M,
    options: &SchedulerOptions,
    instructions: &[Instruction],
) -> Result<BlockSchedule, SchedulerError> {
    let mut builder = DependencyBuilder::new(options.latencies);
    let mut records = Vec::with_capacity(instructions.len());
    for (index, inst) in instructions.iter().enumerate() {
        let entry = lookup(model, inst)?;
        if inst.is_delimiter() && index + 1 != instructions.len() {
            return Err(SchedulerError::DelimiterNotLast {
                slot: SlotId(index),
            });
        }
        let slot = if options.enabled {
            builder.record_instruction(inst)
        } else {
            SlotId(index)
        };
        records.push(InstRecord::new(slot, inst.clone(), entry));
    }
    if !options.enabled {
        return Ok(BlockSchedule::unscheduled(records));
    }
    let schedule = BlockSchedule::run(builder, records)?;
    debug::report_block(options, "0", &schedule);
    Ok(schedule)
}

fn lookup<M: MachineModel + ?Sized>(
    model: &M,
    inst: &Instruction,
) -> Result<MachineEntry, SchedulerError> {
    let shape = inst.shape();
    model.lookup(inst.mnemonic, shape).ok_or_else(|| {
        log::error!("no machine model entry for {} ({})", inst, shape);
        SchedulerError::UnmodeledInstruction {
            mnemonic: inst.mnemonic,
            shape,
        }
    })
}

/// Block-at-a-time scheduler sitting between instruction selection and the
/// encoder.
///
/// Instructions are appended in program order. Appending a block delimiter,
/// or calling [`Scheduler::flush`], schedules the pending block, hands it to
/// the encoder in issue order and starts a new block.
pub struct Scheduler<M, E> {
    model: M,
    encoder: E,
    options: SchedulerOptions,
    builder: DependencyBuilder,
    records: Vec<InstRecord>,
    blocks: usize,
    passthrough: usize,
}

impl<M, E> std::fmt::Debug for Scheduler<M, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("options", &self.options)
            .field("pending", &self.records.len())
            .field("blocks", &self.blocks)
            .finish()
    }
}

impl<M: MachineModel, E: Encoder> Scheduler<M, E> {
    pub fn builder(model: M, encoder: E) -> SchedulerBuilder<M, E> {
        SchedulerBuilder::new(model, encoder)
    }

    pub fn new(model: M, encoder: E) -> Self {
        Self::with_options(model, encoder, SchedulerOptions::default())
    }

    pub fn with_options(model: M, encoder: E, options: SchedulerOptions) -> Self {
        Self {
            model,
            encoder,
            builder: DependencyBuilder::new(options.latencies),
            options,
            records: Vec::new(),
            blocks: 0,
            passthrough: 0,
        }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Adds the next instruction of the current block.
    ///
    /// An instruction the machine model does not know is rejected before
    /// any block state changes.
    pub fn append(&mut self, inst: Instruction) -> Result<SlotId, SchedulerError> {
        let entry = lookup(&self.model, &inst)?;
        if !self.options.enabled {
            let slot = SlotId(self.passthrough);
            let delimiter = inst.is_delimiter();
            self.passthrough = if delimiter { 0 } else { self.passthrough + 1 };
            self.encoder.emit(&InstRecord::new(slot, inst, entry))?;
            return Ok(slot);
        }
        let slot = self.builder.record_instruction(&inst);
        let delimiter = inst.is_delimiter();
        self.records.push(InstRecord::new(slot, inst, entry));
        if delimiter {
            self.on_delimiter_appended()?;
        }
        Ok(slot)
    }

    fn on_delimiter_appended(&mut self) -> Result<(), SchedulerError> {
        self.flush()
    }

    /// Schedules and emits the pending block. Block state is reset whether
    /// or not scheduling and emission succeed.
    pub fn flush(&mut self) -> Result<(), SchedulerError> {
        self.passthrough = 0;
        if self.records.is_empty() {
            return Ok(());
        }
        let latencies = self.options.latencies;
        let builder = std::mem::replace(&mut self.builder, DependencyBuilder::new(latencies));
        let records = std::mem::take(&mut self.records);
        let name = self.blocks.to_string();
        self.blocks += 1;

        let schedule = BlockSchedule::run(builder, records)?;
        debug::report_block(&self.options, &name, &schedule);
        for record in schedule.scheduled() {
            self.encoder.emit(record)?;
        }
        Ok(())
    }

    /// Drops the pending block without emitting it.
    pub fn discard(&mut self) {
        self.builder.reset();
        self.records.clear();
        self.passthrough = 0;
    }

    /// Number of instructions waiting in the current block.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pending(&self) -> &[InstRecord] {
        &self.records
    }

    /// Dependency graph of the current block. Successor lists are only
    /// filled once the block is scheduled.
    pub fn graph(&self) -> &DependencyGraph {
        self.builder.graph()
    }

    /// Number of blocks scheduled so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn encoder_mut(&mut self) -> &mut E {
        &mut self.encoder
    }

    pub fn into_encoder(self) -> E {
        self.encoder
    }
}
