//! Minimal file-driven replay harness, provided as a test/demo binary
//! rather than part of the core crate's public contract. Each path is a
//! newline-delimited JSON log of `Event` values, replayed in file order,
//! then line order, on its own thread so the core loop only ever observes
//! events off the channel.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use quoter_core::events::Event;
use tracing::{debug, warn};

pub fn spawn(paths: Vec<String>, tx: Sender<Event>, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for path in paths {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            if let Err(err) = replay_file(&path, &tx, &shutdown) {
                warn!(path, error = %err, "replay file aborted");
            }
        }
        debug!("replay harness exhausted all event logs");
    })
}

fn replay_file(path: &str, tx: &Sender<Event>, shutdown: &AtomicBool) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening replay log {path}"))?;
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(());
        }
        let line = line.with_context(|| format!("reading {path}:{}", lineno + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(&line) {
            Ok(event) => {
                if tx.send(event).is_err() {
                    return Ok(());
                }
            }
            Err(err) => warn!(path, line = lineno + 1, error = %err, "skipping malformed event"),
        }
    }
    Ok(())
}
