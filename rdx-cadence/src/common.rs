//! Contains common, primitive types shared by every part of the engine.
//!
//! This module defines the phase and status vocabulary of the timer, the
//! immutable `PhaseSnapshot` view handed to listeners, and the key type used
//! to identify subscribers. Using distinct types improves type safety and
//! code clarity.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;
use std::time::Duration;

new_key_type! {
    /// Uniquely and safely identifies a registered event subscriber.
    ///
    /// This key is returned with every new subscription. It is guaranteed to be
    /// unique and will not be reused, preventing stale ID bugs.
    pub struct SubscriberId;
}

/// The kind of a phase. Even phase indices are work, odd ones are breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    Work,
    Break,
}

impl PhaseKind {
    /// Returns the kind of the phase at `index`.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            PhaseKind::Work
        } else {
            PhaseKind::Break
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::Work => f.write_str("Work"),
            PhaseKind::Break => f.write_str("Break"),
        }
    }
}

/// The lifecycle status of the timer.
///
/// `Init -> Running <-> Paused -> Finished`. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerStatus {
    Init,
    Running,
    Paused,
    Finished,
}

/// Returns the 1-based display index for a zero-based phase index.
///
/// Work phase 1 is index 0, break phase 1 is index 1, work phase 2 is index 2.
pub fn human_index(index: usize) -> usize {
    index / 2 + 1
}

/// An immutable view of a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSnapshot {
    /// Zero-based position in the phase sequence.
    pub index: usize,
    /// 1-based index among phases of the same kind.
    pub human_index: usize,
    pub kind: PhaseKind,
    /// The configured length of the phase.
    pub duration: Duration,
    /// Time left in the phase. Zero for completed phases.
    pub remaining: Duration,
}

impl PhaseSnapshot {
    /// Time already spent in the phase.
    pub fn elapsed(&self) -> Duration {
        self.duration.saturating_sub(self.remaining)
    }
}
