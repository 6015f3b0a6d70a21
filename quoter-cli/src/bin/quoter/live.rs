//! Live-trading transport: one UNIX-domain socket per venue session,
//! newline-delimited JSON in both directions. This is the concrete
//! `Dispatcher` the binary uses outside simulation — the wire framing
//! itself is this crate's own choice rather than one the core prescribes.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use quoter_core::events::{Event, OutboundMessage};
use quoter_core::Dispatcher;
use tracing::{debug, warn};

/// Connects to every configured socket, spawning one reader thread per
/// connection that forwards parsed events onto `tx`. Returns the write
/// halves, one per socket, for `LiveDispatcher` to send through.
pub fn connect(
    paths: &[String],
    tx: Sender<Event>,
    shutdown: Arc<AtomicBool>,
) -> Result<Vec<Arc<Mutex<UnixStream>>>> {
    let mut writers = Vec::with_capacity(paths.len());
    for path in paths {
        let stream =
            UnixStream::connect(path).with_context(|| format!("connecting to venue socket {path}"))?;
        let reader_stream = stream.try_clone().with_context(|| format!("cloning socket {path}"))?;
        let writer = Arc::new(Mutex::new(stream));
        writers.push(writer);

        let tx = tx.clone();
        let shutdown = shutdown.clone();
        let path = path.clone();
        std::thread::spawn(move || {
            let mut lines = BufReader::new(reader_stream).lines();
            while !shutdown.load(Ordering::Relaxed) {
                let Some(line) = lines.next() else { break };
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(path, error = %err, "venue socket read failed, closing");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Event>(&line) {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(path, error = %err, "dropping malformed venue message"),
                }
            }
            debug!(path, "venue socket reader exiting");
        });
    }
    Ok(writers)
}

/// Serializes each outbound message as a JSON line to one venue socket
/// (account routing across multiple sockets is out of scope for this demo
/// binary — production deployments would key the socket by account/venue).
pub struct LiveDispatcher {
    sink: Arc<Mutex<UnixStream>>,
}

impl LiveDispatcher {
    pub fn new(sink: Arc<Mutex<UnixStream>>) -> Self {
        Self { sink }
    }
}

impl Dispatcher for LiveDispatcher {
    fn send(&mut self, message: OutboundMessage) {
        let line = match serde_json::to_string(&message) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "failed to serialize outbound message, dropping");
                return;
            }
        };
        let mut stream = self.sink.lock().unwrap();
        if let Err(err) = writeln!(stream, "{line}") {
            warn!(error = %err, "venue socket write failed");
        }
    }
}
