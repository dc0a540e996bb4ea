use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use focusguard_core::{
    Config, HttpBackend, NotificationSound, Notifier, OfflineBackend, SessionBackend, SessionTimer,
    SessionType, TimerEventKind, TimerState,
};

use super::{open_store, print_json, CommandResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session (work, break or long-break)
    Start {
        #[arg(default_value = "work")]
        session_type: SessionType,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Stop the current session and return to idle
    Stop,
    /// Print current timer state as JSON
    Status,
    /// Count the current session down in the foreground
    Run {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
}

/// Notifier for an interactive terminal.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn play_sound(&mut self, sound: NotificationSound, volume: u8) {
        tracing::debug!(?sound, volume, "bell");
        let mut stderr = std::io::stderr();
        // Terminal bell; the sound choice has no terminal equivalent.
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }

    fn notify(&mut self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }
}

fn backend(config: &Config) -> Result<Box<dyn SessionBackend>, Box<dyn std::error::Error>> {
    match config.backend.base_url.as_deref() {
        Some(base_url) => {
            let timeout = Duration::from_secs(config.backend.timeout_secs);
            Ok(Box::new(HttpBackend::new(base_url, timeout)?))
        }
        None => Ok(Box::new(OfflineBackend)),
    }
}

pub fn run(action: TimerAction) -> CommandResult {
    let config = Config::load_or_default();
    let store = open_store(&config)?;
    let mut timer = SessionTimer::new(store, backend(&config)?, Box::new(TerminalNotifier))
        .with_defaults(config.defaults.clone());
    timer.restore();

    let event = match action {
        TimerAction::Start { session_type } => timer.start(session_type),
        TimerAction::Pause => timer.pause(),
        TimerAction::Resume => timer.resume(),
        TimerAction::Stop => timer.stop(),
        TimerAction::Status => None,
        TimerAction::Run { ticks } => return run_foreground(&mut timer, ticks),
    };

    match event {
        Some(event) => print_json(&event)?,
        None => print_json(&timer.snapshot())?,
    }
    Ok(())
}

fn run_foreground(timer: &mut SessionTimer, ticks: Option<u64>) -> CommandResult {
    let mut remaining = ticks;
    while timer.state() == TimerState::Running && remaining != Some(0) {
        std::thread::sleep(Duration::from_secs(1));
        if let Some(event) = timer.tick() {
            if event.kind != TimerEventKind::Tick {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        remaining = remaining.map(|n| n - 1);
    }
    print_json(&timer.snapshot())?;
    Ok(())
}
