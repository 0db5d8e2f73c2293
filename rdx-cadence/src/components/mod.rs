//! Contains the building blocks that sit on the consuming side of the engine.
//!
//! These components turn the raw event stream into something a person can
//! see: system-style notifications when a phase ends, and compact text views
//! of the timer state for terminal front ends.

pub mod display;
pub mod notifier;
