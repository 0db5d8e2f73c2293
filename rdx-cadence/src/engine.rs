//! The core engine that drives the Cadence timer.

use crate::broadcast::{Broadcaster, Subscription};
use crate::common::TimerStatus;
use crate::config::TimerConfig;
use crate::error::MachineError;
use crate::events::events_from_transition;
use crate::state::{Command, PhaseProcessor, PhaseState, Transition};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// How often the clock is sampled while the timer runs.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Depth of the command queue.
pub const COMMAND_CAPACITY: usize = 10;

/// The pieces the control loop takes ownership of when it starts.
struct LoopParts {
    processor: Box<dyn PhaseProcessor>,
    commands: mpsc::Receiver<Command>,
}

/// The timer engine.
///
/// This struct is a cheap, clonable handle to a single timer. Commands are
/// queued and applied by one control loop, which is the only place the phase
/// state is ever mutated. Every resulting event is fanned out to all
/// subscribers. Machines are fully independent of each other.
#[derive(Clone)]
pub struct TimerMachine {
    command_sender: mpsc::Sender<Command>,
    broadcaster: Arc<Broadcaster>,
    tick_interval: Duration,
    loop_parts: Arc<Mutex<Option<LoopParts>>>,
}

// Construction and command queueing.
impl TimerMachine {
    /// Creates a machine for `config`, driven by the system clocks.
    pub fn new(config: TimerConfig, tick_interval: Duration) -> Self {
        Self::with_processor(PhaseState::new(config), tick_interval)
    }

    /// Creates a machine around any phase processor.
    pub fn with_processor(processor: impl PhaseProcessor, tick_interval: Duration) -> Self {
        let (command_sender, commands) = mpsc::channel(COMMAND_CAPACITY);
        Self {
            command_sender,
            broadcaster: Arc::new(Broadcaster::new()),
            tick_interval,
            loop_parts: Arc::new(Mutex::new(Some(LoopParts {
                processor: Box::new(processor),
                commands,
            }))),
        }
    }

    fn enqueue(&self, command: Command) {
        match self.command_sender.try_send(command) {
            Ok(()) => trace!(?command, "Command queued."),
            Err(TrySendError::Full(command)) => {
                warn!(?command, "Command queue is full, dropping command.");
            }
            Err(TrySendError::Closed(command)) => {
                debug!(?command, "TimerMachine has stopped, ignoring command.");
            }
        }
    }
}

// Public API implementation block.
impl TimerMachine {
    /// Spawns the control loop on the current tokio runtime.
    ///
    /// The returned handle completes when the timer finishes or when every
    /// handle to this machine has been dropped.
    pub fn run(&self) -> Result<JoinHandle<()>, MachineError> {
        let parts = self
            .loop_parts
            .lock()
            .take()
            .ok_or(MachineError::AlreadyRunning)?;
        let broadcaster = self.broadcaster.clone();
        let tick_interval = self.tick_interval;
        info!(?tick_interval, "TimerMachine starting up...");
        Ok(tokio::spawn(control_loop(parts, broadcaster, tick_interval)))
    }

    /// Starts the timer. Only has an effect before the first start.
    pub fn start(&self) {
        self.enqueue(Command::Start);
    }

    /// Pauses a running timer.
    pub fn pause(&self) {
        self.enqueue(Command::Pause);
    }

    /// Resumes a paused timer.
    pub fn resume(&self) {
        self.enqueue(Command::Resume);
    }

    /// Ends the current break early. Ignored during work phases.
    pub fn skip_break(&self) {
        self.enqueue(Command::SkipBreak);
    }

    /// Requests a `StateChanged` event carrying the current state.
    pub fn get_state(&self) {
        self.enqueue(Command::GetState);
    }

    /// Subscribes to the event stream.
    pub fn subscribe(&self) -> Subscription {
        self.broadcaster.subscribe()
    }

    /// Removes a subscriber registered with `subscribe`.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.broadcaster.unsubscribe(subscription.id())
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

async fn control_loop(parts: LoopParts, broadcaster: Arc<Broadcaster>, tick_interval: Duration) {
    let LoopParts {
        mut processor,
        mut commands,
    } = parts;
    let mut ticker: Option<Interval> = None;

    loop {
        let transition = tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("All TimerMachine handles dropped, stopping.");
                    break;
                };
                let transition = processor.apply(command);
                update_ticker(&mut ticker, &transition, tick_interval);
                transition
            }
            _ = next_tick(&mut ticker) => processor.tick(),
        };

        publish(&broadcaster, &transition);
        if transition.finished {
            info!("Timer finished, TimerMachine has shut down.");
            break;
        }
    }
}

/// A ticker exists exactly while the timer is running.
fn update_ticker(ticker: &mut Option<Interval>, transition: &Transition, period: Duration) {
    if transition.to.status != TimerStatus::Running {
        if ticker.take().is_some() {
            debug!(status = ?transition.to.status, "Ticker stopped.");
        }
        return;
    }
    if ticker.is_none() {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        *ticker = Some(interval);
        debug!(?period, "Ticker started.");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn publish(broadcaster: &Broadcaster, transition: &Transition) {
    for event in events_from_transition(transition) {
        broadcaster.broadcast(&event);
    }
}
