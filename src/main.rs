//! homectl-sim — host simulator for the control core.
//!
//! Runs one master and its consumers against the in-memory [`SimMaster`]
//! in virtual time, replays a script of operator commands and manual pin
//! changes, then prints the resulting status tree.
//!
//! ```text
//!   script ──▶ ControlService ──▶ SimMaster ──▶ level changes
//!                    ▲                               │
//!                    └──────── pin_changed ◀─────────┘
//! ```

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use homectl::adapters::sim_master::SimMaster;
use homectl::adapters::time::ManualClock;
use homectl::app::commands::BlindsCommand;
use homectl::app::ports::Clock;
use homectl::app::service::ControlService;
use homectl::config::ControlConfig;
use homectl::pins::{PinIndex, PinValue, Timestamp};

/// Upper bound on feedback rounds per step; the core never needs more
/// than a handful.
const MAX_SETTLE_ROUNDS: usize = 64;

/// Simulate a home-control master in virtual time
#[derive(Parser, Debug)]
#[command(name = "homectl-sim", version, long_about = None)]
struct Args {
    /// JSON control configuration (built-in demo config when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Script step: `AT_MS:BLINDS_ID:up|down|stop` or `AT_MS:pin:INDEX=VALUE`
    #[arg(short, long = "step")]
    steps: Vec<Step>,

    /// Virtual time to simulate (ms)
    #[arg(short, long, default_value_t = 10_000)]
    duration_ms: u64,

    /// Sample pollable pins before printing the status
    #[arg(long, default_value_t = false)]
    read_all: bool,

    /// Pretty-print the status JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Clone)]
enum Action {
    Move { id: String, command: BlindsCommand },
    Force { index: PinIndex, value: PinValue },
}

#[derive(Debug, Clone)]
struct Step {
    at: Timestamp,
    action: Action,
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(at), Some(target), Some(arg)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("'{s}': expected AT_MS:TARGET:ARG"));
        };
        let at = at
            .parse::<Timestamp>()
            .map_err(|e| format!("'{s}': bad time '{at}': {e}"))?;

        let action = if target == "pin" {
            let (index, value) = arg
                .split_once('=')
                .ok_or_else(|| format!("'{s}': expected INDEX=VALUE"))?;
            Action::Force {
                index: PinIndex(index.parse::<u16>().map_err(|e| format!("'{s}': {e}"))?),
                value: value.parse::<PinValue>().map_err(|e| format!("'{s}': {e}"))?,
            }
        } else {
            Action::Move {
                id: target.to_owned(),
                command: arg.parse::<BlindsCommand>().map_err(|e| format!("'{s}': {e}"))?,
            }
        };
        Ok(Self { at, action })
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ControlConfig> {
    let Some(path) = path else {
        info!("No config given, using built-in demo config");
        return Ok(ControlConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Feed master level changes back into the service until it goes quiet.
fn settle(service: &mut ControlService, master: &mut SimMaster, clock: &ManualClock) {
    for _ in 0..MAX_SETTLE_ROUNDS {
        if !master.has_changes() {
            return;
        }
        for change in master.take_changes() {
            service.pin_changed(change.index, change.value, master, clock);
        }
    }
    warn!("feedback did not settle at t={} ms", clock.now_ms());
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    info!("homectl-sim v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_ref())?;
    let mut service = ControlService::new(&config)?;
    let mut master = SimMaster::new();
    let clock = ManualClock::new(0);

    service.start(&mut master, &clock);
    settle(&mut service, &mut master, &clock);

    let mut steps = args.steps.clone();
    steps.sort_by_key(|s| s.at);
    let mut pending = steps.iter().peekable();
    let tick = u64::from(service.tick_interval_ms());

    while clock.now_ms() <= args.duration_ms {
        while let Some(step) = pending.next_if(|s| s.at <= clock.now_ms()) {
            match &step.action {
                Action::Move { id, command } => {
                    if let Err(e) = service.command(id, *command, &mut master, &clock) {
                        warn!("t={} ms: {e}", clock.now_ms());
                    }
                }
                Action::Force { index, value } => master.force(*index, *value),
            }
            settle(&mut service, &mut master, &clock);
        }

        service.tick(&mut master, &clock);
        settle(&mut service, &mut master, &clock);
        clock.advance(tick);
    }

    if args.read_all {
        service.read_all(&mut master);
        settle(&mut service, &mut master, &clock);
    }

    info!(
        "simulated {} ms, {} commands sent",
        args.duration_ms,
        master.commands.len()
    );

    let status = service.status();
    let out = if args.pretty {
        serde_json::to_string_pretty(&status)?
    } else {
        serde_json::to_string(&status)?
    };
    println!("{out}");
    Ok(())
}
