//! Operator console: stdin lines mapped to events.
//!
//! | Input | Event |
//! |-------|-------|
//! | `y`, `yes` | `user-yes` |
//! | `n`, `no` | `user-no` |
//! | `pin`, `pin_entered` | `pin-entered` |
//! | `lock`, `device_locked` | `device-locked` |
//! | `q`, `quit`, `cancel` | `cancel` |

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::event::Event;
use crate::queue::EventSender;

/// Map one console line to an event.
pub fn parse_command(line: &str) -> Option<Event> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(Event::UserYes),
        "n" | "no" => Some(Event::UserNo),
        "pin" | "pin_entered" | "pin-entered" => Some(Event::PinEntered),
        "lock" | "device_locked" | "device-locked" => Some(Event::DeviceLocked),
        "q" | "quit" | "cancel" => Some(Event::Cancel),
        _ => None,
    }
}

/// Forward commands read from `input` until EOF or until the queue is gone.
pub fn forward_commands<R: BufRead>(input: R, sender: &EventSender) -> usize {
    let mut forwarded = 0;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Operator console read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let Some(event) = parse_command(&line) else {
            warn!("Unknown operator command '{}'", line.trim());
            continue;
        };
        debug!("Operator: {event}");
        if !sender.send(event) {
            break;
        }
        forwarded += 1;
    }
    forwarded
}

/// Spawn the stdin reader thread.
pub fn spawn_console(sender: EventSender) -> io::Result<JoinHandle<()>> {
    info!("Operator console ready: y/n, pin, lock, q");
    thread::Builder::new()
        .name("operator-console".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            forward_commands(stdin.lock(), &sender);
            debug!("Operator console closed");
        })
}
