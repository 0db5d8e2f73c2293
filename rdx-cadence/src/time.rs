//! Time sources and the sleep-aware elapsed-time estimator.
//!
//! The engine records a monotonic and a wall-clock reading together on every
//! tick. Monotonic time is immune to clock adjustments, but on some platforms
//! it stops advancing while the machine is suspended. Wall time keeps moving
//! across a suspend but jumps when the user changes the clock. Comparing the
//! two lets the estimator pick the reading that matches what really happened.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wall time running ahead of monotonic time by more than this means the
/// process was suspended.
pub const SLEEP_DRIFT_THRESHOLD: Duration = Duration::from_secs(5);

/// A monotonic and a wall-clock reading taken at the same moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub mono: Instant,
    pub wall: DateTime<Utc>,
}

/// A source of `Timestamp`s.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Reads the real monotonic and wall clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp {
            mono: Instant::now(),
            wall: Utc::now(),
        }
    }
}

/// A manually driven clock.
///
/// Clones share the same underlying time, so a handle kept by a test can move
/// the clock used by a running engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current real time.
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(SystemClock.now())),
        }
    }

    /// Moves both clocks forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        current.mono += by;
        current.wall += wall_delta(by);
    }

    /// Moves only the wall clock forward, as a system suspend would.
    pub fn jump_wall(&self, by: Duration) {
        let mut current = self.current.lock();
        current.wall += wall_delta(by);
    }

    /// Moves only the wall clock backward, as a manual clock change would.
    pub fn rewind_wall(&self, by: Duration) {
        let mut current = self.current.lock();
        current.wall -= wall_delta(by);
    }
}

fn wall_delta(by: Duration) -> chrono::Duration {
    chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero())
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}

/// Returns how much time genuinely passed between `last` and `now`.
///
/// Monotonic elapsed time is used unless the wall clock ran ahead of it by
/// more than [`SLEEP_DRIFT_THRESHOLD`], in which case the wall elapsed time is
/// used. Negative wall deltas count as zero.
pub fn elapsed_since_last_tick(last: Timestamp, now: Timestamp) -> Duration {
    let mono_elapsed = now.mono.saturating_duration_since(last.mono);
    let wall_elapsed = (now.wall - last.wall).to_std().unwrap_or(Duration::ZERO);

    let drift = wall_elapsed.saturating_sub(mono_elapsed);
    if drift > SLEEP_DRIFT_THRESHOLD {
        wall_elapsed
    } else {
        mono_elapsed
    }
}
