use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use tracing::debug;

use crate::pipeline::Shared;

const USAGE: &str = "commands: filter, stats, dump, exit";

/// How long to wait for operator input before re-checking the running
/// flag, so a dead capture loop ends the console promptly.
const INPUT_POLL: Duration = Duration::from_millis(250);

/// Interactive command loop. Stdin is read on a helper thread and fed
/// through a channel; the loop itself never blocks past `INPUT_POLL`, so
/// it returns when the operator exits, stdin reaches EOF, or the capture
/// loop has shut down.
pub fn run(shared: &Shared) -> io::Result<()> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        // Dropping the sender signals EOF to the loop.
    });

    run_commands(shared, &rx)
}

fn run_commands(shared: &Shared, lines: &Receiver<String>) -> io::Result<()> {
    loop {
        prompt("> ")?;
        let line = match next_line(shared, lines) {
            Some(line) => line,
            None => break, // EOF or shutdown
        };

        match line.trim() {
            "filter" => {
                prompt("IP address (blank for any): ")?;
                let ip = next_line(shared, lines).unwrap_or_default();
                prompt("Port (blank or 0 for any): ")?;
                let port = next_line(shared, lines).unwrap_or_default();
                prompt("Protocol (blank for any): ")?;
                let proto = next_line(shared, lines).unwrap_or_default();

                match shared.filter.lock().set(&ip, &port, &proto) {
                    Ok(()) => println!("Filter updated."),
                    // Previous criteria stay in effect.
                    Err(e) => println!("Rejected: {}", e),
                }
            }
            "stats" => {
                let snapshot = shared.counters.lock().snapshot();
                println!("{}", snapshot.report());
            }
            "dump" => {
                let snapshot = shared.counters.lock().snapshot();
                match serde_json::to_string(&snapshot) {
                    Ok(json) => println!("{}", json),
                    Err(e) => println!("Rejected: {}", e),
                }
            }
            "exit" => break,
            "" => {}
            other => {
                debug!("unknown command {:?}", other);
                println!("{}", USAGE);
            }
        }
    }

    shared.shutdown();
    Ok(())
}

/// Waits for the next input line, waking every `INPUT_POLL` to check the
/// running flag. `None` means EOF or shutdown.
fn next_line(shared: &Shared, lines: &Receiver<String>) -> Option<String> {
    loop {
        if !shared.is_running() {
            return None;
        }
        match lines.recv_timeout(INPUT_POLL) {
            Ok(line) => return Some(line),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return None,
        }
    }
}

fn prompt(text: &str) -> io::Result<()> {
    print!("{}", text);
    io::stdout().flush()
}
