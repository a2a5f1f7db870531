//! Serial console command adapter.
//!
//! Operators type one command per line on the UART console.  A reader
//! thread parses each line into an [`AppCommand`] and queues it; the
//! control loop drains the queue with [`try_recv_command`] between ticks,
//! so commands are applied on the control thread only.
//!
//! ```text
//! start                      StartManual
//! run <slot>                 StartScheduled
//! stop                       EmergencyStop
//! manual on|off              SetManualTrigger
//! sched on|off               SetSchedulerEnabled
//! slot <i> <hh:mm> <steps>   SetScheduleEntry
//! config <json>              UpdateConfig
//! save                       SaveConfig
//! ```
//!
//! Only the syntax is checked here.  Ranges (hour, step count, slot index)
//! are validated by the service when the command is handled.

use core::str::FromStr;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::commands::AppCommand;
use crate::config::FeederConfig;
use crate::error::{Error, Result};

/// Commands waiting for the control loop.
const CMD_DEPTH: usize = 4;

const READER_STACK_SIZE: usize = 8 * 1024;

/// Back-off while stdin has nothing buffered.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Inbound command channel: console reader → control loop.
static CMD_CHANNEL: Channel<CriticalSectionRawMutex, AppCommand, CMD_DEPTH> = Channel::new();

/// Parse one console line.
pub fn parse_command(line: &str) -> Result<AppCommand> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    let rest = rest.trim();

    if verb == "config" {
        let config: FeederConfig =
            serde_json::from_str(rest).map_err(|_| Error::Command("config <json>: malformed JSON"))?;
        return Ok(AppCommand::UpdateConfig(config));
    }

    let mut args = rest.split_ascii_whitespace();
    let cmd = match verb {
        "start" => AppCommand::StartManual,
        "stop" => AppCommand::EmergencyStop,
        "save" => AppCommand::SaveConfig,
        "run" => AppCommand::StartScheduled(number(args.next(), "run <slot>")?),
        "manual" => AppCommand::SetManualTrigger(on_off(args.next(), "manual on|off")?),
        "sched" => AppCommand::SetSchedulerEnabled(on_off(args.next(), "sched on|off")?),
        "slot" => {
            const USAGE: &str = "slot <i> <hh:mm> <steps>";
            let index = number(args.next(), USAGE)?;
            let (hour, minute) = args
                .next()
                .and_then(|t| t.split_once(':'))
                .ok_or(Error::Command(USAGE))?;
            AppCommand::SetScheduleEntry {
                index,
                hour: number(Some(hour), USAGE)?,
                minute: number(Some(minute), USAGE)?,
                steps: number(args.next(), USAGE)?,
            }
        }
        "" => return Err(Error::Command("empty line")),
        _ => return Err(Error::Command("unknown command")),
    };

    if args.next().is_some() {
        return Err(Error::Command("unexpected trailing arguments"));
    }
    Ok(cmd)
}

fn number<T: FromStr>(token: Option<&str>, usage: &'static str) -> Result<T> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or(Error::Command(usage))
}

fn on_off(token: Option<&str>, usage: &'static str) -> Result<bool> {
    match token {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err(Error::Command(usage)),
    }
}

/// Parse `line` and queue it for the control loop.  Returns `true` if a
/// command was queued.
pub fn submit_line(line: &str) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    match parse_command(line) {
        Ok(cmd) => {
            info!("Console: {:?}", cmd);
            if CMD_CHANNEL.try_send(cmd).is_err() {
                warn!("Console: command queue full, dropping line");
                return false;
            }
            true
        }
        Err(e) => {
            warn!("Console: {}", e);
            false
        }
    }
}

/// Take the next queued command, if any.
pub fn try_recv_command() -> Option<AppCommand> {
    CMD_CHANNEL.try_receive().ok()
}

/// Spawn the stdin reader thread.
pub fn spawn_reader() -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(READER_STACK_SIZE)
        .spawn(read_loop)
}

fn read_loop() {
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        // The ESP-IDF console is non-blocking: a read may return a partial
        // line or nothing at all.
        match stdin.read_line(&mut line) {
            Ok(n) if n > 0 && line.ends_with('\n') => {
                submit_line(&line);
                line.clear();
            }
            Ok(_) | Err(_) => std::thread::sleep(POLL_INTERVAL),
        }
    }
}
