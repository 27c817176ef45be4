use super::{DependencyGraph, Hazard};
use crate::HashMap;
use crate::instruction::{Instruction, SlotId};
use crate::resource::{AccessRole, LatencyReason, LatencyTable, Resource};
use crate::usedef;
use bit_set::BitSet;

/// Incremental hazard tracking for the block being appended.
///
/// Every access of one instruction must be recorded before the next
/// instruction is added.
#[derive(Debug, Clone)]
pub struct DependencyBuilder {
    graph: DependencyGraph,
    latencies: LatencyTable,
    producers: HashMap<Resource, SlotId>,
    users: HashMap<Resource, Vec<SlotId>>,
    /// Flag writers not yet ordered against each other. The last one is the
    /// current producer of the flags.
    flag_writers: Vec<SlotId>,
    flag_readers: Vec<SlotId>,
    memory_loads: BitSet,
}

impl DependencyBuilder {
    pub fn new(latencies: LatencyTable) -> Self {
        Self {
            graph: DependencyGraph::new(),
            latencies,
            producers: HashMap::default(),
            users: HashMap::default(),
            flag_writers: Vec::new(),
            flag_readers: Vec::new(),
            memory_loads: BitSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn latencies(&self) -> &LatencyTable {
        &self.latencies
    }

    /// Allocates the next slot.
    pub fn add_node(&mut self, is_memory_load: bool) -> SlotId {
        let slot = self.graph.add_node();
        if is_memory_load {
            self.memory_loads.insert(slot.0);
        }
        slot
    }

    /// Adds `inst` as the next slot and records all of its accesses.
    pub fn record_instruction(&mut self, inst: &Instruction) -> SlotId {
        let slot = self.add_node(inst.is_memory_load());
        for access in usedef::accesses(inst) {
            self.record_access(access.resource, access.role, access.reason, slot);
        }
        if inst.volatile {
            self.record_volatile_load(slot);
        }
        slot
    }

    pub fn record_access(
        &mut self,
        resource: Resource,
        role: AccessRole,
        reason: LatencyReason,
        slot: SlotId,
    ) {
        if !resource.is_tracked() {
            return;
        }
        log::trace!("slot {}: {} {}", slot, role, resource);
        if resource == Resource::Flags {
            self.record_flags(role, reason, slot);
            return;
        }
        if role.reads() {
            if let Some(&producer) = self.producers.get(&resource) {
                let (reason, latency) = self.read_latency(producer, reason);
                self.edge(producer, slot, Hazard::Raw, reason, latency);
            }
            self.users.entry(resource).or_default().push(slot);
        }
        if role.writes() {
            let latency = self.latencies.get(reason);
            let users = self.users.remove(&resource).unwrap_or_default();
            for user in users {
                self.edge(user, slot, Hazard::War, reason, latency);
            }
            if let Some(producer) = self.producers.insert(resource, slot) {
                self.edge(producer, slot, Hazard::Waw, reason, latency);
            }
        }
    }

    /// Volatile loads become the producer of undisambiguated memory.
    pub fn record_volatile_load(&mut self, slot: SlotId) {
        self.record_access(
            Resource::UnknownMemory,
            AccessRole::UseDef,
            LatencyReason::None,
            slot,
        );
    }

    /// Orders flag writers that were never read so the last one stays live out.
    pub fn live_out_fixup(&mut self) {
        if let Some((&last, earlier)) = self.flag_writers.split_last() {
            let latency = self.latencies.get(LatencyReason::None);
            for &writer in earlier {
                self.graph
                    .add_edge(writer, last, Hazard::Waw, LatencyReason::None, latency);
            }
        }
        self.flag_writers.truncate(self.flag_writers.len().min(1));
    }

    /// Closes the block: live-out fixup, then successor lists.
    pub fn finish(mut self) -> DependencyGraph {
        self.live_out_fixup();
        self.graph.invert();
        self.graph
    }

    pub fn reset(&mut self) {
        self.graph.clear();
        self.producers.clear();
        self.users.clear();
        self.flag_writers.clear();
        self.flag_readers.clear();
        self.memory_loads.make_empty();
    }

    fn record_flags(&mut self, role: AccessRole, reason: LatencyReason, slot: SlotId) {
        let latency = self.latencies.get(reason);
        if role.reads() {
            if let Some((&last, earlier)) = self.flag_writers.split_last() {
                let earlier = earlier.to_vec();
                self.edge(last, slot, Hazard::Raw, reason, latency);
                for writer in earlier {
                    self.edge(writer, last, Hazard::Waw, reason, latency);
                }
                self.flag_writers.clear();
                self.flag_writers.push(last);
            }
            self.flag_readers.push(slot);
        }
        if role.writes() {
            let readers = std::mem::take(&mut self.flag_readers);
            for reader in readers {
                self.edge(reader, slot, Hazard::War, reason, latency);
            }
            self.flag_writers.push(slot);
        }
    }

    fn read_latency(&self, producer: SlotId, reason: LatencyReason) -> (LatencyReason, u32) {
        let latency = self.latencies.get(reason);
        let load = self.latencies.get(LatencyReason::MemoryLoad);
        if self.memory_loads.contains(producer.0) && load > latency {
            (LatencyReason::MemoryLoad, load)
        } else {
            (reason, latency)
        }
    }

    fn edge(
        &mut self,
        from: SlotId,
        to: SlotId,
        hazard: Hazard,
        reason: LatencyReason,
        latency: u32,
    ) {
        if from == to {
            return;
        }
        log::trace!("{} {} -> {} ({}, {})", hazard, from, to, reason, latency);
        self.graph.add_edge(from, to, hazard, reason, latency);
    }
}
