use crate::instruction::SlotId;
use crate::scheduler::{BlockSchedule, SchedulerOptions};

mod dot;

pub use dot::{dump_dot, format_dot};

/// Hamming distance between program order and `order`, as a percentage of
/// the block size.
pub fn edit_distance(order: &[SlotId]) -> f64 {
    if order.is_empty() {
        return 0.0;
    }
    let moved = order
        .iter()
        .enumerate()
        .filter(|(position, slot)| slot.0 != *position)
        .count();
    moved as f64 * 100.0 / order.len() as f64
}

pub fn log_statistics(name: &str, schedule: &BlockSchedule) {
    log::debug!(
        "block {}: pre-schedule size {}, post-schedule size {}, {} cycles",
        name,
        schedule.len(),
        schedule.order.len(),
        schedule.cycles()
    );
    log::debug!(
        "block {}: edit distance {:.2}%",
        name,
        schedule.edit_distance()
    );
}

pub(crate) fn report_block(options: &SchedulerOptions, name: &str, schedule: &BlockSchedule) {
    if options.statistics {
        log_statistics(name, schedule);
    }
    if let Some(dir) = &options.dump_dir {
        dump_dot(dir, name, schedule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance(&[]), 0.0);
        assert_eq!(edit_distance(&[SlotId(0), SlotId(1)]), 0.0);
        assert_eq!(
            edit_distance(&[SlotId(1), SlotId(0), SlotId(2), SlotId(3)]),
            50.0
        );
    }
}
