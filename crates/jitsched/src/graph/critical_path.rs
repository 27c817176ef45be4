use super::DependencyGraph;
use crate::instruction::SlotId;
use crate::scheduler::SchedulerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Slots ordered so that every slot comes after all of its successors.
///
/// Depth-first from each root in slot order, emitting a node once its
/// children are done. Requires successor lists.
pub fn reverse_topological_order(graph: &DependencyGraph) -> Result<Vec<SlotId>, SchedulerError> {
    let n = graph.len();
    let mut state = vec![Visit::Unvisited; n];
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if state[root] != Visit::Unvisited {
            continue;
        }
        state[root] = Visit::InProgress;
        stack.push((root, 0));
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            match graph.successors(SlotId(node)).get(next) {
                Some(edge) => {
                    top.1 += 1;
                    let target = edge.slot.0;
                    match state[target] {
                        Visit::Unvisited => {
                            state[target] = Visit::InProgress;
                            stack.push((target, 0));
                        }
                        Visit::InProgress => {
                            return Err(SchedulerError::DependencyCycle {
                                slot: SlotId(target),
                            });
                        }
                        Visit::Done => {}
                    }
                }
                None => {
                    state[node] = Visit::Done;
                    order.push(SlotId(node));
                    stack.pop();
                }
            }
        }
    }
    Ok(order)
}

/// Longest latency-weighted path from each slot to a terminal slot,
/// counting the slot's own latency.
pub fn longest_paths(graph: &DependencyGraph, latencies: &[u32]) -> Result<Vec<u32>, SchedulerError> {
    let order = reverse_topological_order(graph)?;
    let mut paths = vec![0u32; graph.len()];
    for slot in order {
        let tail = graph
            .successors(slot)
            .iter()
            .map(|edge| edge.latency + paths[edge.slot.0])
            .max()
            .unwrap_or(0);
        paths[slot.0] = latencies[slot.0] + tail;
    }
    Ok(paths)
}
