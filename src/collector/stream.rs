//! Line-delimited JSON input collection.
//!
//! The classifier, speech engine and light sampler run outside this crate.
//! Their outputs arrive as one JSON `InputEvent` per line on stdin or in a
//! recorded file; a reader thread parses them into a channel.

use crate::collector::types::InputEvent;
use crate::transparency::SharedTransparencyLog;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Where input lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

/// Configuration for the stream collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub source: InputSource,
    /// Events buffered between the reader thread and the engine
    pub channel_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            source: InputSource::Stdin,
            channel_capacity: 10_000,
        }
    }
}

/// Errors that can occur during input collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyStarted,
    Io(String),
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyStarted => write!(f, "Collector was already started"),
            CollectorError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CollectorError {}

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<InputEvent, serde_json::Error> {
    serde_json::from_str(line)
}

/// Reads input events on a background thread.
///
/// The receiver disconnects once the source is exhausted.
pub struct StreamCollector {
    config: CollectorConfig,
    sender: Option<Sender<InputEvent>>,
    receiver: Receiver<InputEvent>,
    running: Arc<AtomicBool>,
    log: Option<SharedTransparencyLog>,
}

impl StreamCollector {
    /// Create a new collector.
    pub fn new(config: CollectorConfig) -> Self {
        let (sender, receiver) = bounded(config.channel_capacity.max(1));
        Self {
            config,
            sender: Some(sender),
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            log: None,
        }
    }

    /// Count malformed lines in the given transparency log.
    pub fn with_log(mut self, log: SharedTransparencyLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Open the source and start the reader thread.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.sender.is_none() {
            return Err(CollectorError::AlreadyStarted);
        }

        let reader: Box<dyn BufRead + Send> = match &self.config.source {
            InputSource::Stdin => Box::new(std::io::BufReader::new(std::io::stdin())),
            InputSource::File(path) => {
                let file = std::fs::File::open(path)
                    .map_err(|e| CollectorError::Io(format!("{}: {e}", path.display())))?;
                Box::new(std::io::BufReader::new(file))
            }
        };

        let sender = self.sender.take().ok_or(CollectorError::AlreadyStarted)?;
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let log = self.log.clone();

        thread::spawn(move || {
            read_events(reader, &sender, &running, log.as_ref());
            running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    /// Stop forwarding events.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the reader thread is still forwarding events.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for input events.
    pub fn receiver(&self) -> &Receiver<InputEvent> {
        &self.receiver
    }
}

/// Forward parsed lines until the source ends, the receiver hangs up, or
/// `running` is cleared. Bad lines are skipped.
fn read_events(
    reader: impl BufRead,
    sender: &Sender<InputEvent>,
    running: &AtomicBool,
    log: Option<&SharedTransparencyLog>,
) {
    for (line_no, line) in reader.lines().enumerate() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("input read failed: {e}");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_line(trimmed) {
            Ok(event) => {
                if sender.send(event).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(line = line_no + 1, "skipping malformed input: {e}");
                if let Some(log) = log {
                    log.record_malformed_input();
                }
            }
        }
    }
}
