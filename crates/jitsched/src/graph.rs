use crate::instruction::SlotId;
use crate::resource::LatencyReason;
use smallvec::SmallVec;
use std::fmt;

mod builder;
mod critical_path;

pub use builder::DependencyBuilder;
pub use critical_path::{longest_paths, reverse_topological_order};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Hazard {
    Raw,
    Waw,
    War,
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Hazard::Raw => "RAW",
            Hazard::Waw => "WAW",
            Hazard::War => "WAR",
        };
        write!(f, "{}", s)
    }
}

/// One end of a hazard edge. `slot` is the other endpoint: the predecessor in a
/// predecessor list, the successor in a successor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub slot: SlotId,
    pub hazard: Hazard,
    pub reason: LatencyReason,
    pub latency: u32,
}

pub type Edges = SmallVec<[Dependency; 4]>;

/// Hazard DAG over the slots of one block.
///
/// Predecessor lists are filled while the block is built. Successor lists are
/// derived once by [`DependencyGraph::invert`].
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    preds: Vec<Edges>,
    succs: Vec<Edges>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.preds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }

    pub fn add_node(&mut self) -> SlotId {
        self.preds.push(Edges::new());
        self.succs.push(Edges::new());
        SlotId(self.preds.len() - 1)
    }

    pub fn add_edge(
        &mut self,
        from: SlotId,
        to: SlotId,
        hazard: Hazard,
        reason: LatencyReason,
        latency: u32,
    ) {
        self.preds[to.0].push(Dependency {
            slot: from,
            hazard,
            reason,
            latency,
        });
    }

    pub fn predecessors(&self, slot: SlotId) -> &[Dependency] {
        &self.preds[slot.0]
    }

    pub fn successors(&self, slot: SlotId) -> &[Dependency] {
        &self.succs[slot.0]
    }

    /// Rebuilds every successor list from the predecessor lists.
    pub fn invert(&mut self) {
        for succs in &mut self.succs {
            succs.clear();
        }
        for (to, preds) in self.preds.iter().enumerate() {
            for dep in preds {
                self.succs[dep.slot.0].push(Dependency {
                    slot: SlotId(to),
                    ..*dep
                });
            }
        }
    }

    /// Every edge as `(from, to, dependency)`, grouped by target slot.
    pub fn edges(&self) -> impl Iterator<Item = (SlotId, SlotId, &Dependency)> + '_ {
        self.preds
            .iter()
            .enumerate()
            .flat_map(|(to, preds)| preds.iter().map(move |dep| (dep.slot, SlotId(to), dep)))
    }

    pub fn has_edge(&self, from: SlotId, to: SlotId, hazard: Hazard) -> bool {
        self.preds
            .get(to.0)
            .is_some_and(|preds| preds.iter().any(|d| d.slot == from && d.hazard == hazard))
    }

    pub fn clear(&mut self) {
        self.preds.clear();
        self.succs.clear();
    }
}
