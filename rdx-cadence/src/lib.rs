//! # Cadence
//!
//! An event-driven work/break phase timer engine for Rust.
//!
//! Cadence provides the core engine for a productivity timer that alternates
//! work and break phases. It is designed to be a library that a front end
//! (a terminal display, a notifier) drives with commands and observes through
//! an event stream.
//!
//! ## Core Concepts
//!
//! - **Phase State**: A state machine that owns the current phase, the time
//!   spent in it and the timer status. A single tick can fast-forward through
//!   several phases when a large gap is observed, e.g. after the machine slept.
//! - **Sleep-aware time**: Elapsed time is measured on the monotonic clock
//!   unless the wall clock ran noticeably ahead, which signals a suspend.
//! - **Event-Driven**: One control loop applies commands and ticks, and fans
//!   the resulting `Event`s out to every subscriber. A slow subscriber loses
//!   events instead of stalling the timer.
//! - **Configuration-Driven**: Durations and phase count come from a
//!   `CadenceConfig`, usually loaded from a TOML file.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Create a default configuration.
//!     let config = CadenceConfig::default();
//!
//!     // 2. Create the machine.
//!     let machine = TimerMachine::new(config.timer_config(), config.tick_interval());
//!
//!     // 3. Subscribe before starting so no event is missed.
//!     let mut events = machine.subscribe();
//!
//!     // 4. Spawn the control loop and start the timer.
//!     let handle = machine.run()?;
//!     machine.start();
//!
//!     while let Some(event) = events.recv().await {
//!         println!("Received Event: {:?}", event);
//!         if event == Event::TimerFinished {
//!             break;
//!         }
//!     }
//!     handle.await?;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Cadence";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod broadcast;
pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod state;
pub mod time;

/// A prelude module for easy importing of the most common Cadence types.
pub mod prelude {
    pub use crate::broadcast::Subscription;
    pub use crate::common::{PhaseKind, PhaseSnapshot, SubscriberId, TimerStatus};
    pub use crate::config::{CadenceConfig, TimerConfig};
    pub use crate::engine::TimerMachine;
    pub use crate::error::{ConfigError, MachineError};
    pub use crate::events::Event;
    pub use crate::state::{Command, PhaseProcessor, PhaseState};
}
