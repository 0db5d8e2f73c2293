//! Defines the public event type broadcast by the Cadence engine.
//!
//! Events are derived from state machine transitions and exist only as
//! messages on the broadcast path. Listeners match on them exhaustively.

use crate::common::{PhaseSnapshot, TimerStatus};
use crate::state::{StateSnapshot, Transition};
use serde::{Deserialize, Serialize};

/// An event emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// The timer state changed, or a snapshot was requested.
    StateChanged {
        phase: PhaseSnapshot,
        status: TimerStatus,
        /// The configured number of work phases.
        work_phases: usize,
    },
    /// A phase ran for its full duration.
    PhaseFinished { phase: PhaseSnapshot },
    /// The final phase ran out. No further events follow.
    TimerFinished,
}

impl From<StateSnapshot> for Event {
    fn from(snapshot: StateSnapshot) -> Self {
        Event::StateChanged {
            phase: snapshot.phase,
            status: snapshot.status,
            work_phases: snapshot.work_phases,
        }
    }
}

/// Builds the events for a transition.
///
/// Completed phases come first, oldest to newest, then `TimerFinished`, then
/// the new state. Listeners rely on seeing a phase finish before the state
/// that has moved past it.
pub fn events_from_transition(transition: &Transition) -> Vec<Event> {
    let mut events = Vec::with_capacity(transition.completions.len() + 2);
    events.extend(
        transition
            .completions
            .iter()
            .map(|completion| Event::PhaseFinished {
                phase: completion.phase,
            }),
    );
    if transition.finished {
        events.push(Event::TimerFinished);
    }
    if transition.emit_state {
        events.push(transition.to.into());
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimerConfig;
    use crate::state::{Command, PhaseProcessor, PhaseState};
    use crate::time::ManualClock;
    use std::time::Duration;

    #[test]
    fn completions_precede_finish_and_state() {
        let clock = ManualClock::new();
        let mut state = PhaseState::with_clock(
            TimerConfig {
                work_duration: Duration::from_secs(60),
                break_duration: Duration::from_secs(30),
                work_phases: 2,
            },
            clock.clone(),
        );
        state.apply(Command::Start);
        clock.advance(Duration::from_secs(3600));

        let events = events_from_transition(&state.tick());
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], Event::PhaseFinished { phase } if phase.index == 0));
        assert!(matches!(events[1], Event::PhaseFinished { phase } if phase.index == 1));
        assert_eq!(events[2], Event::TimerFinished);
        assert!(matches!(
            events[3],
            Event::StateChanged { status: TimerStatus::Finished, work_phases: 2, .. }
        ));
    }

    #[test]
    fn noop_transition_yields_nothing() {
        let mut state = PhaseState::with_clock(TimerConfig::default(), ManualClock::new());
        assert!(events_from_transition(&state.apply(Command::Resume)).is_empty());
        assert_eq!(events_from_transition(&state.apply(Command::GetState)).len(), 1);
    }
}
