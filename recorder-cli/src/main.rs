//! pcm-recorder - capture mono 16-bit audio into a WAV file.

mod app_state;
mod cli;
mod commands;
mod input;
mod tone_source;

use std::io::{self, BufRead};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use log::info;

use app_state::{AppState, RecordingInfo};
use cli::{Args, Command};
use input::InputProvider;

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments and initialize logging
    let args = Args::parse();
    cli::init_logging(&args);

    match &args.command {
        Command::Record { seconds, json } => record(&args, *seconds, *json),
        Command::Interactive => interactive(&args),
    }
}

fn app_state(args: &Args) -> anyhow::Result<AppState> {
    let provider = InputProvider::from_kind(args.source)?;
    Ok(AppState::new(provider, args.recorder_config()))
}

fn record(args: &Args, seconds: Option<u64>, json: bool) -> anyhow::Result<()> {
    let state = app_state(args)?;
    let started = commands::start_recording(&state).map_err(anyhow::Error::msg)?;
    info!("Session {} recording to {}", started.session_id, args.output.display());

    match seconds {
        Some(secs) => wait_while_recording(&state, Duration::from_secs(secs)),
        None => {
            eprintln!("Recording to {}. Press Enter to stop.", args.output.display());
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).context("failed to read stdin")?;
        }
    }

    match commands::stop_recording(&state).map_err(anyhow::Error::msg)? {
        Some(recording) => print_recording(&recording, json),
        None => {
            let status = commands::get_status(&state).map_err(anyhow::Error::msg)?;
            bail!(
                "recording ended early: {}",
                status.last_error.unwrap_or_else(|| "unknown cause".into())
            )
        }
    }
}

/// Sleep up to `limit`, returning early if the session ends on its own.
fn wait_while_recording(state: &AppState, limit: Duration) {
    let status = state.controller.lock().status_handle();
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline && status.status().is_recording() {
        thread::sleep(Duration::from_millis(50));
    }
}

fn interactive(args: &Args) -> anyhow::Result<()> {
    let state = app_state(args)?;
    eprintln!("Commands: start, stop, status, quit");

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        match line.trim() {
            "" => continue,
            "start" => match commands::start_recording(&state) {
                Ok(started) if started.already_recording => {
                    eprintln!("Already recording (session {})", started.session_id)
                }
                Ok(started) => eprintln!("Recording session {}", started.session_id),
                Err(e) => eprintln!("error: {}", e),
            },
            "stop" => match commands::stop_recording(&state) {
                Ok(Some(recording)) => print_recording(&recording, false)?,
                Ok(None) => eprintln!("Not recording"),
                Err(e) => eprintln!("error: {}", e),
            },
            "status" => {
                let status = commands::get_status(&state).map_err(anyhow::Error::msg)?;
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            "quit" | "exit" => break,
            other => eprintln!("Unknown command '{}'. Commands: start, stop, status, quit", other),
        }
    }

    if let Some(recording) = commands::stop_recording(&state).map_err(anyhow::Error::msg)? {
        print_recording(&recording, false)?;
    }
    Ok(())
}

fn print_recording(recording: &RecordingInfo, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(recording)?);
    } else {
        println!(
            "Saved {} blocks ({:.2}s, {} bytes) to {}",
            recording.blocks_written, recording.duration_secs, recording.data_bytes, recording.file_path
        );
    }
    Ok(())
}
