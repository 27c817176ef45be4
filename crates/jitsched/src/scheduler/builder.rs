use super::Scheduler;
use crate::emit::Encoder;
use crate::machine::MachineModel;
use crate::resource::{LatencyReason, LatencyTable};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// When false, instructions go to the encoder in program order as they
    /// are appended.
    pub enabled: bool,
    pub latencies: LatencyTable,
    /// Log per-block size and reordering statistics at debug level.
    pub statistics: bool,
    /// Directory receiving one `<block>.dot` file per scheduled block.
    pub dump_dir: Option<PathBuf>,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            latencies: LatencyTable::default(),
            statistics: false,
            dump_dir: None,
        }
    }
}

/// A fluent builder for configuring a [`Scheduler`].
///
/// Use [`Scheduler::builder()`] to obtain one.
pub struct SchedulerBuilder<M, E> {
    model: M,
    encoder: E,
    options: SchedulerOptions,
}

impl<M: MachineModel, E: Encoder> SchedulerBuilder<M, E> {
    pub fn new(model: M, encoder: E) -> Self {
        Self {
            model,
            encoder,
            options: SchedulerOptions::default(),
        }
    }

    /// Enable or disable reordering. Disabled schedulers still validate
    /// every instruction against the machine model.
    pub fn enabled(mut self, enable: bool) -> Self {
        self.options.enabled = enable;
        self
    }

    pub fn latencies(mut self, latencies: LatencyTable) -> Self {
        self.options.latencies = latencies;
        self
    }

    /// Override the edge latency of a single reason.
    pub fn latency(mut self, reason: LatencyReason, cycles: u32) -> Self {
        self.options.latencies.set(reason, cycles);
        self
    }

    pub fn statistics(mut self, enable: bool) -> Self {
        self.options.statistics = enable;
        self
    }

    /// Write a DOT dependency graph for every scheduled block into `dir`.
    pub fn dump_dot<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.options.dump_dir = Some(dir.into());
        self
    }

    pub fn options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Scheduler<M, E> {
        Scheduler::with_options(self.model, self.encoder, self.options)
    }
}
