//! tilecore binary: drives the engine over a JSON-lines channel.
//!
//! The compositor adapter writes one serialized event per line on stdin and
//! reads one serialized command per line from stdout. A reader thread
//! funnels stdin into a single-consumer queue; the reactor loop below is the
//! only place engine state is touched. The chord timeout is the single
//! timed operation: armed when the dispatcher enters a chord, canceled when
//! it leaves.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use tilecore::config::Config;
use tilecore::engine::Engine;
use tilecore::event::{Command, Event};
use tilecore::spawn;

#[derive(Parser)]
#[command(
    name = "tilecore",
    version,
    about = "Compositor-agnostic tiling window manager core"
)]
struct Args {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from_path(path.clone());

    if args.check {
        let issues = config.validate();
        if issues.is_empty() {
            println!("config ok");
            return Ok(());
        }
        for issue in &issues {
            eprintln!("config issue: {}", issue);
        }
        anyhow::bail!("{} config issue(s) found", issues.len());
    }

    for issue in config.validate() {
        log::warn!("Config issue: {}", issue);
    }

    let mut engine = Engine::new(config, Some(path));
    run(&mut engine).context("event loop failed")
}

fn run(engine: &mut Engine) -> Result<()> {
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in BufReader::new(stdin.lock()).lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let stdout = std::io::stdout();
    let mut chord_deadline: Option<Instant> = None;

    log::info!("Entering event loop");
    while engine.is_running() {
        // arm or cancel the pending chord timer
        match engine.pending_chord_timeout() {
            Some(timeout) if chord_deadline.is_none() => {
                chord_deadline = Some(Instant::now() + timeout);
            }
            None => chord_deadline = None,
            _ => {}
        }

        let event = if let Some(deadline) = chord_deadline {
            let now = Instant::now();
            if now >= deadline {
                chord_deadline = None;
                Some(Event::ChordTimeout)
            } else {
                match rx.recv_timeout(deadline - now) {
                    Ok(line) => parse_event(&line),
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        chord_deadline = None;
                        Some(Event::ChordTimeout)
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        } else {
            match rx.recv() {
                Ok(line) => parse_event(&line),
                Err(_) => break,
            }
        };

        let Some(event) = event else { continue };
        for command in engine.handle_event(event) {
            match command {
                // spawns are fire-and-forget and never cross the channel
                Command::SpawnProcess { argv } => spawn::spawn(&argv),
                other => emit(&stdout, &other)?,
            }
        }
    }

    log::info!("Exiting window manager core");
    Ok(())
}

/// Parse one line off the channel. Malformed input is logged and dropped;
/// the reactor never halts on a single bad event.
fn parse_event(line: &str) -> Option<Event> {
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            log::warn!("Dropping malformed event: {} ({})", line, e);
            None
        }
    }
}

fn emit(stdout: &std::io::Stdout, command: &Command) -> Result<()> {
    let json = serde_json::to_string(command).context("serializing command")?;
    let mut lock = stdout.lock();
    writeln!(lock, "{}", json)?;
    lock.flush()?;
    Ok(())
}
