//! The phase state machine.
//!
//! `PhaseState` owns the phase index, the time accumulated in the current
//! phase and the timer status. Every operation returns a [`Transition`]
//! describing what changed; the engine turns transitions into events. Commands
//! that do not apply to the current status are no-ops, never errors.

use crate::common::{human_index, PhaseKind, PhaseSnapshot, TimerStatus};
use crate::config::TimerConfig;
use crate::time::{elapsed_since_last_tick, Clock, SystemClock, Timestamp};
use std::time::Duration;
use tracing::{debug, trace};

/// A request issued to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    SkipBreak,
    GetState,
}

/// The full observable state of the timer at one moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub phase: PhaseSnapshot,
    pub status: TimerStatus,
    /// The configured number of work phases.
    pub work_phases: usize,
}

/// Evidence that a phase ran for its full duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCompletion {
    /// The completed phase, with `remaining` set to zero.
    pub phase: PhaseSnapshot,
}

/// The outcome of advancing the clock by some amount of time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceDelta {
    /// Completed phases, oldest first.
    pub completions: Vec<PhaseCompletion>,
    /// Whether the last phase was exhausted.
    pub finished: bool,
}

/// The result of applying one command or one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: StateSnapshot,
    pub to: StateSnapshot,
    pub completions: Vec<PhaseCompletion>,
    pub finished: bool,
    /// Whether listeners should receive the new state.
    pub emit_state: bool,
}

impl Transition {
    fn inert(snapshot: StateSnapshot) -> Self {
        Self {
            from: snapshot,
            to: snapshot,
            completions: Vec::new(),
            finished: false,
            emit_state: false,
        }
    }
}

/// Processes commands and ticks into transitions.
///
/// The engine is generic over this trait so a different phase progression
/// policy can be dropped in without touching the event loop.
pub trait PhaseProcessor: Send + 'static {
    fn apply(&mut self, command: Command) -> Transition;
    fn tick(&mut self) -> Transition;
    fn snapshot(&self) -> StateSnapshot;
}

/// The work/break phase state machine.
#[derive(Debug)]
pub struct PhaseState<C = SystemClock> {
    config: TimerConfig,
    phase_count: usize,
    phase_index: usize,
    phase_elapsed: Duration,
    last_tick: Option<Timestamp>,
    status: TimerStatus,
    clock: C,
}

impl PhaseState<SystemClock> {
    /// Creates a state machine driven by the system clocks.
    pub fn new(config: TimerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> PhaseState<C> {
    /// Creates a state machine that reads time from `clock`.
    pub fn with_clock(config: TimerConfig, clock: C) -> Self {
        let work_phases = config.work_phases.max(1);
        Self {
            config: TimerConfig {
                work_phases,
                ..config
            },
            phase_count: work_phases * 2 - 1,
            phase_index: 0,
            phase_elapsed: Duration::ZERO,
            last_tick: None,
            status: TimerStatus::Init,
            clock,
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    /// Time accumulated in the current phase.
    pub fn phase_elapsed(&self) -> Duration {
        self.phase_elapsed
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// The index of the final work phase.
    pub fn last_phase_index(&self) -> usize {
        self.phase_count - 1
    }

    /// Moves the timer forward by `elapsed`, crossing as many phase boundaries
    /// as needed.
    ///
    /// Stops early when the final phase is exhausted. In that case the final
    /// phase is not reported as a completion and any excess time is discarded.
    pub fn advance(&mut self, mut elapsed: Duration) -> AdvanceDelta {
        let mut delta = AdvanceDelta::default();
        while elapsed > Duration::ZERO {
            let duration = self.phase_duration();
            let remaining = duration.saturating_sub(self.phase_elapsed);
            if elapsed < remaining {
                self.phase_elapsed += elapsed;
                break;
            }

            elapsed -= remaining;
            let next_index = self.phase_index + 1;
            if next_index >= self.phase_count {
                self.status = TimerStatus::Finished;
                self.phase_elapsed = duration;
                delta.finished = true;
                debug!(phase = self.phase_index, "Final phase exhausted, timer finished.");
                return delta;
            }

            delta.completions.push(self.completion());
            self.phase_index = next_index;
            self.phase_elapsed = Duration::ZERO;
        }
        delta
    }

    /// Ends the current break early and moves to the next work phase.
    ///
    /// Returns the completion record of the skipped break, or `None` when the
    /// current phase is not a break.
    pub fn skip_break(&mut self) -> Option<PhaseCompletion> {
        if self.status == TimerStatus::Finished || self.phase_kind() != PhaseKind::Break {
            return None;
        }

        let completion = self.completion();
        self.phase_index += 1;
        self.phase_elapsed = Duration::ZERO;
        if self.status == TimerStatus::Running {
            self.stamp();
        }
        Some(completion)
    }

    fn start(&mut self) -> bool {
        if self.status != TimerStatus::Init {
            return false;
        }
        self.phase_elapsed = Duration::ZERO;
        self.stamp();
        self.status = TimerStatus::Running;
        true
    }

    fn pause(&mut self) -> (AdvanceDelta, bool) {
        if self.status != TimerStatus::Running {
            return (AdvanceDelta::default(), false);
        }

        let delta = match self.last_tick {
            Some(last) => self.advance(elapsed_since_last_tick(last, self.clock.now())),
            None => AdvanceDelta::default(),
        };
        if self.status == TimerStatus::Running {
            self.status = TimerStatus::Paused;
        }
        self.stamp();
        (delta, true)
    }

    fn resume(&mut self) -> bool {
        if self.status != TimerStatus::Paused {
            return false;
        }
        self.stamp();
        self.status = TimerStatus::Running;
        true
    }

    fn stamp(&mut self) {
        self.last_tick = Some(self.clock.now());
    }

    fn phase_kind(&self) -> PhaseKind {
        PhaseKind::for_index(self.phase_index)
    }

    fn phase_duration(&self) -> Duration {
        match self.phase_kind() {
            PhaseKind::Work => self.config.work_duration,
            PhaseKind::Break => self.config.break_duration,
        }
    }

    fn phase_snapshot(&self) -> PhaseSnapshot {
        let duration = self.phase_duration();
        PhaseSnapshot {
            index: self.phase_index,
            human_index: human_index(self.phase_index),
            kind: self.phase_kind(),
            duration,
            remaining: duration.saturating_sub(self.phase_elapsed),
        }
    }

    fn completion(&self) -> PhaseCompletion {
        PhaseCompletion {
            phase: PhaseSnapshot {
                remaining: Duration::ZERO,
                ..self.phase_snapshot()
            },
        }
    }
}

impl<C: Clock + 'static> PhaseProcessor for PhaseState<C> {
    fn apply(&mut self, command: Command) -> Transition {
        let from = self.snapshot();
        let mut delta = AdvanceDelta::default();

        let emit_state = match command {
            Command::Start => self.start(),
            Command::Pause => {
                let (advanced, paused) = self.pause();
                delta = advanced;
                paused
            }
            Command::Resume => self.resume(),
            Command::SkipBreak => match self.skip_break() {
                Some(completion) => {
                    delta.completions.push(completion);
                    true
                }
                None => false,
            },
            Command::GetState => true,
        };

        if !emit_state {
            trace!(?command, status = ?self.status, "Command has no effect in current status.");
        }

        Transition {
            from,
            to: self.snapshot(),
            completions: delta.completions,
            finished: delta.finished,
            emit_state,
        }
    }

    fn tick(&mut self) -> Transition {
        let from = self.snapshot();
        if self.status != TimerStatus::Running {
            return Transition::inert(from);
        }

        let now = self.clock.now();
        let elapsed = match self.last_tick {
            Some(last) => elapsed_since_last_tick(last, now),
            None => Duration::ZERO,
        };
        let delta = self.advance(elapsed);
        self.last_tick = Some(now);

        Transition {
            from,
            to: self.snapshot(),
            completions: delta.completions,
            finished: delta.finished,
            emit_state: true,
        }
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            phase: self.phase_snapshot(),
            status: self.status,
            work_phases: self.config.work_phases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use proptest::prelude::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn classic() -> TimerConfig {
        TimerConfig {
            work_duration: 25 * MINUTE,
            break_duration: 5 * MINUTE,
            work_phases: 4,
        }
    }

    fn started(config: TimerConfig) -> (PhaseState<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut state = PhaseState::with_clock(config, clock.clone());
        assert!(state.apply(Command::Start).emit_state);
        (state, clock)
    }

    #[test]
    fn advance_skips_phases_on_long_elapsed() {
        let (mut state, _) = started(classic());

        let delta = state.advance(90 * MINUTE);
        assert!(!delta.finished);
        assert_eq!(delta.completions.len(), 6);
        assert_eq!(delta.completions[0].phase.index, 0);
        assert_eq!(delta.completions[0].phase.kind, PhaseKind::Work);
        assert_eq!(delta.completions[5].phase.index, 5);
        assert_eq!(delta.completions[5].phase.kind, PhaseKind::Break);
        assert_eq!(state.phase_index(), 6);
        assert_eq!(state.phase_elapsed(), Duration::ZERO);
        assert_eq!(state.status(), TimerStatus::Running);
    }

    #[test]
    fn advance_finishes_on_very_long_elapsed() {
        let (mut state, _) = started(classic());

        let delta = state.advance(200 * MINUTE);
        assert!(delta.finished);
        assert_eq!(state.status(), TimerStatus::Finished);
        assert_eq!(state.phase_index(), 6);
        assert_eq!(state.phase_elapsed(), 25 * MINUTE);
        assert_eq!(delta.completions.len(), 6);
    }

    #[test]
    fn completions_report_zero_remaining() {
        let (mut state, _) = started(classic());
        let delta = state.advance(31 * MINUTE);

        assert_eq!(delta.completions.len(), 2);
        for completion in &delta.completions {
            assert_eq!(completion.phase.remaining, Duration::ZERO);
        }
        assert_eq!(delta.completions[1].phase.human_index, 1);
        assert_eq!(state.phase_index(), 2);
        assert_eq!(state.phase_elapsed(), MINUTE);
    }

    #[test]
    fn skip_break_moves_to_next_work_phase() {
        let (mut state, _) = started(classic());
        state.advance(25 * MINUTE);
        assert_eq!(state.phase_index(), 1);

        let skipped = state.skip_break().expect("break should be skippable");
        assert_eq!(skipped.phase.index, 1);
        assert_eq!(skipped.phase.kind, PhaseKind::Break);
        assert_eq!(state.phase_index(), 2);
        assert_eq!(state.phase_elapsed(), Duration::ZERO);
    }

    #[test]
    fn skip_break_during_work_is_noop() {
        let (mut state, _) = started(classic());
        state.advance(3 * MINUTE);

        assert!(state.skip_break().is_none());
        let transition = state.apply(Command::SkipBreak);
        assert!(!transition.emit_state);
        assert!(transition.completions.is_empty());
        assert_eq!(transition.from, transition.to);
        assert_eq!(state.phase_elapsed(), 3 * MINUTE);
    }

    #[test]
    fn skip_break_command_emits_completion() {
        let (mut state, _) = started(classic());
        state.advance(27 * MINUTE);

        let transition = state.apply(Command::SkipBreak);
        assert!(transition.emit_state);
        assert_eq!(transition.completions.len(), 1);
        assert_eq!(transition.completions[0].phase.index, 1);
        assert_eq!(transition.to.phase.index, 2);
        assert_eq!(transition.to.phase.remaining, 25 * MINUTE);
    }

    #[test]
    fn skip_break_while_paused_stays_paused() {
        let (mut state, clock) = started(classic());
        clock.advance(26 * MINUTE);
        state.apply(Command::Pause);
        assert_eq!(state.phase_index(), 1);

        let transition = state.apply(Command::SkipBreak);
        assert!(transition.emit_state);
        assert_eq!(transition.to.status, TimerStatus::Paused);
        assert_eq!(transition.to.phase.index, 2);
    }

    #[test]
    fn commands_outside_their_status_are_noops() {
        let clock = ManualClock::new();
        let mut state = PhaseState::with_clock(classic(), clock);

        assert!(!state.apply(Command::Pause).emit_state);
        assert!(!state.apply(Command::Resume).emit_state);
        assert!(state.apply(Command::Start).emit_state);
        assert!(!state.apply(Command::Start).emit_state);
        assert!(!state.apply(Command::Resume).emit_state);
        assert_eq!(state.status(), TimerStatus::Running);
    }

    #[test]
    fn get_state_is_idempotent() {
        let (mut state, clock) = started(classic());
        clock.advance(4 * MINUTE);
        state.tick();

        let first = state.apply(Command::GetState);
        let second = state.apply(Command::GetState);
        assert!(first.emit_state && second.emit_state);
        assert_eq!(first.to, second.to);
        assert_eq!(first.from, first.to);
    }

    #[test]
    fn tick_uses_clock_elapsed() {
        let (mut state, clock) = started(classic());
        clock.advance(10 * MINUTE);

        let transition = state.tick();
        assert!(transition.emit_state);
        assert_eq!(transition.to.phase.remaining, 15 * MINUTE);
        assert_eq!(transition.from.phase.remaining, 25 * MINUTE);
    }

    #[test]
    fn tick_after_suspend_fast_forwards() {
        let (mut state, clock) = started(classic());
        clock.advance(Duration::from_secs(1));
        clock.jump_wall(40 * MINUTE);

        let transition = state.tick();
        assert_eq!(transition.completions.len(), 2);
        assert_eq!(transition.to.phase.index, 2);
    }

    #[test]
    fn tick_is_inert_unless_running() {
        let clock = ManualClock::new();
        let mut state = PhaseState::with_clock(classic(), clock.clone());
        assert!(!state.tick().emit_state);

        state.apply(Command::Start);
        state.apply(Command::Pause);
        clock.advance(40 * MINUTE);
        let transition = state.tick();
        assert!(!transition.emit_state);
        assert_eq!(state.phase_index(), 0);
    }

    #[test]
    fn pause_accounts_for_time_since_last_tick() {
        let (mut state, clock) = started(classic());
        clock.advance(7 * MINUTE);

        let transition = state.apply(Command::Pause);
        assert!(transition.emit_state);
        assert_eq!(transition.to.status, TimerStatus::Paused);
        assert_eq!(state.phase_elapsed(), 7 * MINUTE);

        clock.advance(60 * MINUTE);
        state.apply(Command::Resume);
        assert_eq!(state.phase_elapsed(), 7 * MINUTE);
        clock.advance(MINUTE);
        state.tick();
        assert_eq!(state.phase_elapsed(), 8 * MINUTE);
    }

    #[test]
    fn pause_then_resume_without_delay_keeps_elapsed() {
        let (mut state, clock) = started(classic());
        clock.advance(2 * MINUTE);
        state.tick();
        let before = state.phase_elapsed();

        state.apply(Command::Pause);
        state.apply(Command::Resume);
        assert_eq!(state.phase_elapsed(), before);
        assert_eq!(state.status(), TimerStatus::Running);
    }

    #[test]
    fn pause_that_exhausts_final_phase_finishes() {
        let (mut state, clock) = started(classic());
        clock.advance(300 * MINUTE);

        let transition = state.apply(Command::Pause);
        assert!(transition.finished);
        assert!(transition.emit_state);
        assert_eq!(transition.completions.len(), 6);
        assert_eq!(transition.to.status, TimerStatus::Finished);
    }

    #[test]
    fn finished_state_only_answers_get_state() {
        let (mut state, _) = started(classic());
        state.advance(500 * MINUTE);

        for command in [Command::Start, Command::Pause, Command::Resume, Command::SkipBreak] {
            assert!(!state.apply(command).emit_state);
        }
        let snapshot = state.apply(Command::GetState).to;
        assert_eq!(snapshot.status, TimerStatus::Finished);
        assert_eq!(snapshot.phase.remaining, Duration::ZERO);
        assert!(!state.tick().emit_state);
    }

    #[test]
    fn single_work_phase_has_no_breaks() {
        let (mut state, _) = started(TimerConfig {
            work_phases: 1,
            ..classic()
        });
        assert_eq!(state.last_phase_index(), 0);

        let delta = state.advance(25 * MINUTE);
        assert!(delta.finished);
        assert!(delta.completions.is_empty());
    }

    proptest! {
        #[test]
        fn advance_conserves_elapsed(
            work_secs in 1u64..3_000,
            break_secs in 1u64..900,
            work_phases in 1usize..6,
            elapsed_secs in 0u64..40_000,
        ) {
            let config = TimerConfig {
                work_duration: Duration::from_secs(work_secs),
                break_duration: Duration::from_secs(break_secs),
                work_phases,
            };
            let (mut state, _) = started(config);
            let elapsed = Duration::from_secs(elapsed_secs);
            let delta = state.advance(elapsed);

            let completed: Duration = delta.completions.iter().map(|c| c.phase.duration).sum();
            for (position, completion) in delta.completions.iter().enumerate() {
                prop_assert_eq!(completion.phase.index, position);
            }

            if delta.finished {
                let total = config.work_duration * work_phases as u32
                    + config.break_duration * (work_phases as u32 - 1);
                prop_assert!(total <= elapsed);
                prop_assert_eq!(state.phase_index(), 2 * work_phases - 2);
                prop_assert_eq!(state.status(), TimerStatus::Finished);
                prop_assert_eq!(state.phase_elapsed(), config.work_duration);
            } else {
                prop_assert_eq!(completed + state.phase_elapsed(), elapsed);
                prop_assert!(state.phase_elapsed() < state.phase_snapshot().duration);
            }
        }

        #[test]
        fn terminal_phase_is_always_work(work_phases in 1usize..50) {
            let config = TimerConfig { work_phases, ..classic() };
            let state = PhaseState::with_clock(config, ManualClock::new());
            prop_assert_eq!(PhaseKind::for_index(state.last_phase_index()), PhaseKind::Work);
        }
    }
}
