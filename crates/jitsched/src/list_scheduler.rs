use crate::graph::{DependencyGraph, Hazard};
use crate::instruction::{InstRecord, IssuePort, SlotId};
use crate::scheduler::SchedulerError;
use bit_set::BitSet;

/// Greedy dual-issue list scheduling over a closed block.
///
/// `records` must carry their longest paths and `graph` its successor lists.
/// Writes `ready_time` and `scheduled_time` into the records and returns the
/// issue order.
pub fn list_schedule(
    records: &mut [InstRecord],
    graph: &DependencyGraph,
) -> Result<Vec<SlotId>, SchedulerError> {
    let n = records.len();
    let mut ready = BitSet::with_capacity(n);
    let mut scheduled = BitSet::with_capacity(n);
    let mut order = Vec::with_capacity(n);
    let mut current_time = 0u32;

    for (slot, record) in records.iter_mut().enumerate() {
        if graph.predecessors(SlotId(slot)).is_empty() {
            record.ready_time = 0;
            ready.insert(slot);
        }
    }

    while order.len() < n {
        let mut candidates = collect_candidates(records, &ready, current_time);
        if candidates.is_empty() {
            let earliest = ready
                .iter()
                .filter(|&slot| !records[slot].inst.is_delimiter())
                .map(|slot| records[slot].ready_time)
                .min();
            if let Some(earliest) = earliest {
                current_time = current_time.max(earliest);
                candidates = collect_candidates(records, &ready, current_time);
            }
        }
        if candidates.is_empty() {
            // Only the block delimiter is left.
            let Some(delimiter) = ready.iter().find(|&slot| records[slot].inst.is_delimiter())
            else {
                return Err(SchedulerError::NoReadyInstruction { time: current_time });
            };
            current_time = current_time.max(records[delimiter].ready_time);
            candidates.push(delimiter);
        }

        let Some(primary) = pick(records, &candidates, |_| true) else {
            return Err(SchedulerError::NoReadyInstruction { time: current_time });
        };
        let primary_port = records[primary].port;
        let secondary = if primary_port == IssuePort::Both {
            None
        } else {
            pick(records, &candidates, |record| {
                record.slot.0 != primary && !primary_port.conflicts_with(record.port)
            })
        };

        let issued = [Some(primary), secondary];
        for slot in issued.into_iter().flatten() {
            records[slot].scheduled_time = Some(current_time);
            scheduled.insert(slot);
            ready.remove(slot);
            order.push(SlotId(slot));
        }
        for slot in issued.into_iter().flatten() {
            release_successors(records, graph, slot, &scheduled, &mut ready);
        }
        current_time += 1;
    }

    if order.len() != n {
        return Err(SchedulerError::ScheduleSizeMismatch {
            expected: n,
            actual: order.len(),
        });
    }
    if let (Some(input_last), Some(&output_last)) = (records.last(), order.last())
        && input_last.inst.is_delimiter()
        && output_last != input_last.slot
    {
        return Err(SchedulerError::DelimiterNotLast {
            slot: input_last.slot,
        });
    }
    Ok(order)
}

fn collect_candidates(records: &[InstRecord], ready: &BitSet, current_time: u32) -> Vec<usize> {
    ready
        .iter()
        .filter(|&slot| {
            let record = &records[slot];
            !record.inst.is_delimiter() && record.ready_time <= current_time
        })
        .collect()
}

/// Candidate with the longest critical path; the lowest slot wins ties.
fn pick(
    records: &[InstRecord],
    candidates: &[usize],
    accept: impl Fn(&InstRecord) -> bool,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for &slot in candidates {
        if !accept(&records[slot]) {
            continue;
        }
        let path = records[slot].longest_path.unwrap_or(0);
        if best.is_none_or(|b| path > records[b].longest_path.unwrap_or(0)) {
            best = Some(slot);
        }
    }
    best
}

fn release_successors(
    records: &mut [InstRecord],
    graph: &DependencyGraph,
    slot: usize,
    scheduled: &BitSet,
    ready: &mut BitSet,
) {
    for edge in graph.successors(SlotId(slot)) {
        let succ = edge.slot.0;
        if scheduled.contains(succ) || ready.contains(succ) {
            continue;
        }
        let preds = graph.predecessors(edge.slot);
        if !preds.iter().all(|pred| scheduled.contains(pred.slot.0)) {
            continue;
        }
        let ready_time = preds
            .iter()
            .map(|pred| {
                let producer = &records[pred.slot.0];
                let delay = match pred.hazard {
                    Hazard::Raw => producer.latency,
                    Hazard::Waw | Hazard::War => 1,
                };
                producer.scheduled_time.unwrap_or(0) + delay + pred.latency
            })
            .max()
            .unwrap_or(0);
        records[succ].ready_time = ready_time;
        ready.insert(succ);
    }
}
