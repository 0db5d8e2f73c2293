//! Plain-text views of the timer state for terminal front ends.

use crate::common::{PhaseKind, PhaseSnapshot, TimerStatus};
use std::time::Duration;

pub const INDICATOR_ON: &str = "●";
pub const INDICATOR_OFF: &str = "○";

/// Formats a duration as `M:SS`, or `H:MM:SS` from one hour up, rounding
/// partial seconds down.
pub fn format_remaining(remaining: Duration) -> String {
    let total_seconds = remaining.as_secs();
    let (hours, minutes, seconds) = (
        total_seconds / 3600,
        total_seconds / 60 % 60,
        total_seconds % 60,
    );
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

pub fn status_label(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Init => "ready",
        TimerStatus::Running => "running",
        TimerStatus::Paused => "paused",
        TimerStatus::Finished => "finished",
    }
}

/// Renders progress through the work phases, or the break number during a
/// break.
///
/// Completed work phases and the current one are lit; nothing is lit before
/// the timer starts.
pub fn phase_indicator(phase: &PhaseSnapshot, status: TimerStatus, work_phases: usize) -> String {
    if phase.kind == PhaseKind::Break {
        return format!("break {}", phase.human_index);
    }

    let count = work_phases.max(1);
    let lit = match status {
        TimerStatus::Init => 0,
        _ => phase.human_index.min(count),
    };
    (0..count)
        .map(|i| if i < lit { INDICATOR_ON } else { INDICATOR_OFF })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The commands that make sense in `status`.
pub fn hints(status: TimerStatus, kind: PhaseKind) -> Vec<&'static str> {
    let mut hints = Vec::with_capacity(3);
    match status {
        TimerStatus::Init => hints.push("start"),
        TimerStatus::Running => hints.push("pause"),
        TimerStatus::Paused => hints.push("resume"),
        TimerStatus::Finished => {}
    }
    if kind == PhaseKind::Break && status != TimerStatus::Finished {
        hints.push("skip");
    }
    hints.push("exit");
    hints
}

/// A one-line summary, e.g. `work 2/4  12:30  ● ● ○ ○  [running]`.
pub fn summary_line(phase: &PhaseSnapshot, status: TimerStatus, work_phases: usize) -> String {
    let label = match phase.kind {
        PhaseKind::Work => format!("work {}/{}", phase.human_index, work_phases),
        PhaseKind::Break => format!("break {}", phase.human_index),
    };
    format!(
        "{}  {}  {}  [{}]",
        label,
        format_remaining(phase.remaining),
        phase_indicator(phase, status, work_phases),
        status_label(status)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(human_index: usize, remaining_secs: u64) -> PhaseSnapshot {
        PhaseSnapshot {
            index: (human_index - 1) * 2,
            human_index,
            kind: PhaseKind::Work,
            duration: Duration::from_secs(25 * 60),
            remaining: Duration::from_secs(remaining_secs),
        }
    }

    #[test]
    fn remaining_is_minutes_and_seconds() {
        assert_eq!(format_remaining(Duration::from_secs(0)), "0:00");
        assert_eq!(format_remaining(Duration::from_millis(65_900)), "1:05");
        assert_eq!(format_remaining(Duration::from_secs(59 * 60 + 59)), "59:59");
    }

    #[test]
    fn long_durations_show_hours() {
        assert_eq!(format_remaining(Duration::from_secs(3600)), "1:00:00");
        assert_eq!(format_remaining(Duration::from_secs(90 * 60)), "1:30:00");
        assert_eq!(format_remaining(Duration::from_secs(10 * 3600 + 65)), "10:01:05");
    }

    #[test]
    fn indicator_lights_completed_and_current_work() {
        assert_eq!(phase_indicator(&work(1, 10), TimerStatus::Init, 4), "○ ○ ○ ○");
        assert_eq!(phase_indicator(&work(2, 10), TimerStatus::Running, 4), "● ● ○ ○");
        assert_eq!(phase_indicator(&work(1, 10), TimerStatus::Running, 0), "●");
    }

    #[test]
    fn break_indicator_names_the_break() {
        let phase = PhaseSnapshot {
            index: 3,
            human_index: 2,
            kind: PhaseKind::Break,
            duration: Duration::from_secs(300),
            remaining: Duration::from_secs(300),
        };
        assert_eq!(phase_indicator(&phase, TimerStatus::Paused, 4), "break 2");
        assert_eq!(hints(TimerStatus::Paused, phase.kind), vec!["resume", "skip", "exit"]);
    }

    #[test]
    fn summary_includes_everything() {
        assert_eq!(
            summary_line(&work(3, 754), TimerStatus::Paused, 4),
            "work 3/4  12:34  ● ● ● ○  [paused]"
        );
    }
}
