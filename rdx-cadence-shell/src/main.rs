use anyhow::Result;
use cadence::components::display::{format_remaining, hints, summary_line};
use cadence::components::notifier::{spawn_notifier, Notification};
use cadence::config::{self as settings, CadenceConfig, MAX_PHASE_MINUTES, MAX_WORK_PHASES};
use cadence::prelude::*;
use cadence::{ENGINE_NAME, VERSION as LIB_VERSION};
use clap::Parser;
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::fs::OpenOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Latest state reported by the machine: phase, status, work phase count.
type Latest = Option<(PhaseSnapshot, TimerStatus, usize)>;

#[derive(Parser)]
#[command(name = "cadence", version, about = "A work/break phase timer for the terminal")]
struct Cli {
    /// Enable debug logging to cadence.log in the temp directory
    #[arg(long)]
    debug: bool,

    /// Work phase length in minutes
    #[arg(long, default_value_t = 0)]
    work: i64,

    /// Break phase length in minutes
    #[arg(long = "break", default_value_t = 0)]
    break_minutes: i64,
}

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", "  ·  c a d e n c e  ·".cyan().bold());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!("{}", "-----------------------------------------------------------------".dimmed());
    println!("{}", version_string);
    println!("{}", "-----------------------------------------------------------------".dimmed());
}

/// Installs logging. Without `--debug` only warnings reach the terminal; with
/// it everything goes to a file so the prompt stays readable.
fn init_logging(debug: bool) -> Result<()> {
    if !debug {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_target(false)
            .init();
        return Ok(());
    }

    let path = env::temp_dir().join("cadence.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    info!(path = %path.display(), "Debug logging enabled.");
    Ok(())
}

/// Prints notifications as banners until the timer finishes.
fn spawn_notifications(machine: &TimerMachine) {
    spawn_notifier(machine.subscribe(), |notification: &Notification| {
        println!(
            "\n<-- [{}] {}\n>> ",
            notification.title.magenta().bold(),
            notification.body
        );
    });
}

/// Keeps the latest snapshot and reports status changes.
fn spawn_renderer(
    machine: &TimerMachine,
    latest: watch::Sender<Latest>,
    is_watching: Arc<AtomicBool>,
) {
    let mut events = machine.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                Event::StateChanged {
                    phase,
                    status,
                    work_phases,
                } => {
                    let previous = latest.send_replace(Some((phase, status, work_phases)));
                    let status_changed = previous.map(|(_, s, _)| s) != Some(status);
                    if status_changed || is_watching.load(Ordering::Relaxed) {
                        println!("<-- {}", summary_line(&phase, status, work_phases).cyan());
                    }
                }
                Event::PhaseFinished { phase } => {
                    println!(
                        "<-- {} {} done ({})",
                        phase.kind,
                        phase.human_index,
                        format_remaining(phase.duration).dimmed()
                    );
                }
                Event::TimerFinished => {
                    println!("<-- {}", "Nice job! All phases complete.".green().bold());
                }
            }
        }
    });
}

fn print_config(cfg: &CadenceConfig) {
    println!("Configuration:");
    println!("  work minutes      {}", cfg.work_minutes);
    println!("  break minutes     {}", cfg.break_minutes);
    println!("  work phases       {}", cfg.work_phases);
    println!("  tick interval ms  {}", cfg.tick_interval_ms);
}

fn print_help() {
    println!("Available commands:");
    println!("  start                 - Starts the timer.");
    println!("  pause                 - Pauses a running timer.");
    println!("  resume                - Resumes a paused timer.");
    println!("  skip                  - Ends the current break early.");
    println!("  status                - Shows the current phase and time left.");
    println!("  watch on|off          - Prints every state update while on.");
    println!("  config                - Shows the configuration.");
    println!("  set work|break|phases <N> - Edits the configuration.");
    println!("  save                  - Saves the configuration for the next session.");
    println!("  exit                  - Quits the shell.");
}

/// Applies a `set` command to the configuration being edited.
fn apply_setting(cfg: &mut CadenceConfig, field: &str, value: &str) -> Result<(), String> {
    let value: i64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a whole number.", value))?;
    let (slot, max) = match field {
        "work" => (&mut cfg.work_minutes, MAX_PHASE_MINUTES),
        "break" => (&mut cfg.break_minutes, MAX_PHASE_MINUTES),
        "phases" => (&mut cfg.work_phases, MAX_WORK_PHASES),
        other => return Err(format!("Unknown setting '{}'. Try work, break or phases.", other)),
    };
    if !(1..=max).contains(&value) {
        return Err(format!("'{}' must be between 1 and {}.", field, max));
    }
    *slot = value;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug)?;
    print_banner();

    let (cfg, load_error) = settings::load_with_overrides(cli.work, cli.break_minutes);
    if let Some(e) = load_error {
        warn!("Config load failed, using defaults: {}", e);
    }
    let mut edited = cfg.clone();

    let machine = TimerMachine::new(cfg.timer_config(), cfg.tick_interval());
    let (latest_tx, latest_rx) = watch::channel::<Latest>(None);
    let is_watching = Arc::new(AtomicBool::new(false));

    spawn_renderer(&machine, latest_tx, is_watching.clone());
    spawn_notifications(&machine);
    machine.run()?;
    machine.get_state();

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!("{} is ready. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => {
                println!("Exiting cadence...");
                break;
            }
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();

        match args.as_slice() {
            ["start"] => machine.start(),
            ["pause"] => machine.pause(),
            ["resume"] => machine.resume(),
            ["skip"] => machine.skip_break(),
            ["status"] => match *latest_rx.borrow() {
                Some((phase, status, work_phases)) => {
                    println!("{}", summary_line(&phase, status, work_phases));
                    println!("Try: {}", hints(status, phase.kind).join(", ").dimmed());
                }
                None => println!("No state received yet."),
            },
            ["watch", "on"] => {
                is_watching.store(true, Ordering::Relaxed);
                println!("--> Printing every state update.");
            }
            ["watch", "off"] => {
                is_watching.store(false, Ordering::Relaxed);
                println!("--> Printing status changes only.");
            }
            ["config"] => print_config(&edited),
            ["set", field, value] => match apply_setting(&mut edited, field, value) {
                Ok(()) => println!("--> Updated. Use 'save' to keep it for the next session."),
                Err(message) => println!("Error: {}", message),
            },
            ["save"] => match settings::save(&edited) {
                Ok(path) => println!("--> Saved to {}", path.display()),
                Err(e) => println!("Error: {}", e),
            },
            ["help"] => print_help(),
            ["exit"] => break,
            [] => {}
            _ => println!("Unknown command: '{}'. Type 'help'.", line.trim()),
        }
    }

    Ok(())
}
