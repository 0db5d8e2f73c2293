use anyhow::Result;
use cadence::components::display::summary_line;
use cadence::components::notifier::{spawn_notifier, LogSink};
use cadence::prelude::*;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    // 2. A fast configuration so a full session fits in a few seconds.
    let config = TimerConfig {
        work_duration: Duration::from_secs(3),
        break_duration: Duration::from_secs(1),
        work_phases: 3,
    };

    // 3. Create the TimerMachine instance.
    let machine = TimerMachine::new(config, Duration::from_millis(100));

    // 4. Spawn concurrent tasks to listen to the event stream.
    spawn_event_listeners(&machine);
    let notifier = spawn_notifier(machine.subscribe(), LogSink);

    // 5. Run the machine and exercise its commands.
    let handle = machine.run()?;
    machine.get_state();
    machine.start();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    machine.pause();
    info!("[DEMO] Paused for one second, no time should accrue.");
    tokio::time::sleep(Duration::from_secs(1)).await;
    machine.resume();

    tokio::select! {
        result = handle => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("[DEMO] Interrupted.");
            return Ok(());
        }
    }
    let delivered = notifier.await?;
    info!("[DEMO] Done, {} notifications delivered.", delivered);

    Ok(())
}

/// Spawns a task that logs every status change reported by the machine.
fn spawn_event_listeners(machine: &TimerMachine) {
    let mut events = machine.subscribe();
    tokio::spawn(async move {
        let mut last_status = None;
        while let Some(event) = events.recv().await {
            match event {
                Event::StateChanged {
                    phase,
                    status,
                    work_phases,
                } => {
                    if last_status != Some(status) {
                        info!("[STATE] => {}", summary_line(&phase, status, work_phases));
                        last_status = Some(status);
                    }
                }
                Event::PhaseFinished { phase } => {
                    info!("[PHASE] => {} {} finished", phase.kind, phase.human_index);
                }
                Event::TimerFinished => info!("[TIMER] => finished"),
            }
        }
    });
}
