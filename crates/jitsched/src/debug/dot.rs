use crate::scheduler::BlockSchedule;
use itertools::Itertools;
use std::fmt::Write;
use std::path::Path;

/// Renders the scheduled block as a Graphviz digraph named `BB<name>`.
///
/// One record node per instruction, in issue order, labelled with the
/// program-order slot, the instruction, its cycle, port, latency and longest path.
pub fn format_dot(name: &str, schedule: &BlockSchedule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph BB{} {{", name);
    let _ = writeln!(out, "forcelabels = true");
    for record in schedule.scheduled() {
        let time = record
            .scheduled_time
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        let path = record
            .longest_path
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        let _ = writeln!(
            out,
            "LIR{} [shape=record, label=\"{{{}: {} | ScheduledTime:{} | IssuePort:{} | Latency:{} | LongestPath:{}}}\"]",
            record.slot,
            record.slot,
            escape(&record.inst.to_string()),
            time,
            record.port,
            record.latency,
            path
        );
    }
    for record in schedule.scheduled() {
        if record.slot.0 >= schedule.graph.len() {
            continue;
        }
        let successors = schedule
            .graph
            .successors(record.slot)
            .iter()
            .map(|edge| edge.slot)
            .unique();
        for succ in successors {
            let _ = writeln!(out, "LIR{}->LIR{}", record.slot, succ);
        }
    }
    out.push_str("}\n");
    out
}

/// Writes `<dir>/<name>.dot`. Failures are logged and otherwise ignored.
pub fn dump_dot(dir: &Path, name: &str, schedule: &BlockSchedule) {
    let path = dir.join(format!("{}.dot", name));
    log::debug!("dumping dependency graph to {}", path.display());
    if let Err(err) = std::fs::write(&path, format_dot(name, schedule)) {
        log::warn!("could not write {}: {}", path.display(), err);
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
