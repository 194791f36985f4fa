use std::time::Duration;

use chrono::Utc;
use clap::{Args, Subcommand};
use fitpace_core::format::format_compact;
use fitpace_core::protocol::catalog;
use fitpace_core::storage::Database;
use fitpace_core::{
    BreathingPattern, Config, Event, NewSession, PhaseCycle, Protocol, ProtocolKind,
    SessionConfig, SessionOutcome, SimulatedClock, TimerDriver,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Which timer to run. With no selector the configured fasting protocol is used.
#[derive(Args, Clone, Debug)]
pub struct ProtocolArgs {
    /// Fasting protocol, e.g. "16:8", "omad", "custom:14"
    #[arg(long, conflicts_with_all = ["meditate", "breathing", "duration"])]
    fasting: Option<String>,
    /// Meditation length in minutes
    #[arg(long, conflicts_with = "duration")]
    meditate: Option<u64>,
    /// Breathing pattern for a meditation: box, 4-7-8, coherent, relax
    #[arg(long, conflicts_with = "duration")]
    breathing: Option<String>,
    /// Ad-hoc countdown length in seconds
    #[arg(long)]
    duration: Option<u64>,
    /// Ad-hoc phase cycle, e.g. "inhale:4,hold:4,exhale:4"
    #[arg(long, requires = "duration")]
    phases: Option<String>,
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a timer live, printing events as JSON lines.
    ///
    /// Type p, r or s followed by Enter to pause, resume or stop.
    /// Ctrl+C stops the run.
    Run {
        #[command(flatten)]
        protocol: ProtocolArgs,
        /// Do not record the run in history
        #[arg(long)]
        no_history: bool,
    },
    /// Replay a timer on a simulated clock and print the final snapshot
    Simulate {
        #[command(flatten)]
        protocol: ProtocolArgs,
        /// Simulated seconds to let pass
        #[arg(long)]
        seconds: u64,
        /// Pause after this many seconds
        #[arg(long, requires = "resume_at")]
        pause_at: Option<u64>,
        /// Resume after this many seconds
        #[arg(long, requires = "pause_at")]
        resume_at: Option<u64>,
        /// Also print every event as a JSON line before the snapshot
        #[arg(long)]
        events: bool,
    },
    /// List preset protocols
    Presets {
        /// Only show one kind: fasting, meditation, breathing
        #[arg(long)]
        kind: Option<String>,
    },
}

/// A resolved selector: what to store in history and what to run.
struct Plan {
    kind: ProtocolKind,
    label: String,
    config: SessionConfig,
}

impl ProtocolArgs {
    fn resolve(&self, defaults: &Config) -> CliResult<Plan> {
        if let Some(total) = self.duration {
            let config = match &self.phases {
                Some(list) => SessionConfig::with_cycle(total, PhaseCycle::parse(list)?)?,
                None => SessionConfig::new(total, None)?,
            };
            let label = match config.phase_cycle() {
                Some(cycle) => format!(
                    "custom {} {}",
                    format_compact(total),
                    cycle.names().join("/")
                ),
                None => format!("custom {}", format_compact(total)),
            };
            return Ok(Plan {
                kind: ProtocolKind::Custom,
                label,
                config,
            });
        }

        let protocol = match (&self.fasting, self.meditate, &self.breathing) {
            (Some(fast), _, _) => Protocol::Fasting(fast.parse()?),
            (None, None, None) => Protocol::Fasting(defaults.fasting_protocol()?),
            (None, minutes, breathing) => Protocol::Meditation {
                minutes: minutes.unwrap_or(defaults.timer.meditation_minutes),
                breathing: breathing
                    .as_deref()
                    .map(str::parse::<BreathingPattern>)
                    .transpose()?,
            },
        };
        Ok(Plan {
            kind: protocol.kind(),
            label: protocol.label(),
            config: protocol.to_config()?,
        })
    }
}

pub fn run(action: TimerAction) -> CliResult {
    match action {
        TimerAction::Run {
            protocol,
            no_history,
        } => {
            let config = Config::load()?;
            let plan = protocol.resolve(&config)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let finished = runtime.block_on(run_live(&plan, config.tick_interval()))?;
            if no_history {
                return Ok(());
            }
            let db = Database::open()?;
            db.record_session(&finished)?;
            info!(label = %finished.label, outcome = ?finished.outcome, "session recorded");
        }
        TimerAction::Simulate {
            protocol,
            seconds,
            pause_at,
            resume_at,
            events,
        } => {
            let config = Config::load()?;
            let plan = protocol.resolve(&config)?;
            let window = match (pause_at, resume_at) {
                (Some(pause), Some(resume)) if resume < pause => {
                    return Err(format!(
                        "--resume-at ({resume}) must not be before --pause-at ({pause})"
                    )
                    .into());
                }
                (Some(pause), Some(resume)) => Some((pause, resume)),
                _ => None,
            };

            let mut clock = SimulatedClock::new();
            let mut emitted = vec![clock.start(plan.config)];
            match window {
                Some((pause, resume)) => {
                    let pause = pause.min(seconds);
                    let resume = resume.min(seconds);
                    emitted.extend(clock.advance_secs(pause));
                    emitted.extend(clock.pause());
                    emitted.extend(clock.advance_secs(resume - pause));
                    emitted.extend(clock.resume());
                    emitted.extend(clock.advance_secs(seconds - resume));
                }
                None => emitted.extend(clock.advance_secs(seconds)),
            }

            if events {
                for event in &emitted {
                    println!("{}", serde_json::to_string(event)?);
                }
            }
            println!("{}", serde_json::to_string_pretty(&clock.session().snapshot())?);
        }
        TimerAction::Presets { kind } => {
            let kind = kind
                .as_deref()
                .map(str::parse::<ProtocolKind>)
                .transpose()?;
            let entries: Vec<_> = catalog()
                .into_iter()
                .filter(|entry| kind.map_or(true, |k| entry.kind == k))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

/// Drive one live run to completion or until the user stops it.
async fn run_live(plan: &Plan, tick_interval: Duration) -> CliResult<NewSession> {
    let driver = TimerDriver::with_tick_interval(tick_interval);
    let mut events = driver.subscribe();
    let started = driver.start_with(plan.config.clone());
    let session_id = match started {
        Event::SessionStarted { session_id, .. } => session_id,
        _ => return Err("timer did not start".into()),
    };
    let started_at = driver.started_at().unwrap_or_else(Utc::now);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    if matches!(event, Event::SessionCompleted { .. }) {
                        break SessionOutcome::Completed;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event output fell behind"),
                Err(RecvError::Closed) => break SessionOutcome::Stopped,
            },
            line = stdin.next_line(), if stdin_open => match line? {
                Some(command) => match command.trim() {
                    "p" | "pause" => {
                        driver.pause();
                    }
                    "r" | "resume" => {
                        driver.resume();
                    }
                    "s" | "stop" => break SessionOutcome::Stopped,
                    "" => {}
                    other => warn!(command = other, "unknown command; use p, r or s"),
                },
                None => stdin_open = false,
            },
            _ = &mut ctrl_c => break SessionOutcome::Stopped,
        }
    };

    let snapshot = driver.snapshot();
    if outcome == SessionOutcome::Stopped {
        if let Some(event) = driver.stop() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    Ok(NewSession {
        session_id,
        kind: plan.kind,
        label: plan.label.clone(),
        total_secs: snapshot.total_duration_secs,
        elapsed_secs: snapshot.elapsed_secs,
        outcome,
        started_at,
        ended_at: Utc::now(),
    })
}
