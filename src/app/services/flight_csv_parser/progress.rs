//! Progress reporting for ingestion
//!
//! Progress travels over an unbounded channel as ordered `(percent, message)`
//! events. The sink clamps percentages so the stream never goes backwards and
//! keeps working after the receiver has been dropped.

use crate::constants::progress::{COMPLETE, PROCESSING_END, PROCESSING_START};
use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

/// One progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// 0-100, non-decreasing within one ingestion
    pub percent: u8,
    pub message: String,
}

/// Sending half of the progress channel
#[derive(Debug, Default)]
pub struct ProgressSink {
    sender: Option<UnboundedSender<ProgressEvent>>,
    last_percent: u8,
    events_sent: usize,
}

impl ProgressSink {
    /// Create a sink connected to a new channel
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = unbounded_channel();
        (
            Self {
                sender: Some(sender),
                last_percent: 0,
                events_sent: 0,
            },
            receiver,
        )
    }

    /// Create a sink that discards every event
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Report progress; lower percentages than already reported are raised
    pub fn report(&mut self, percent: u8, message: impl Into<String>) {
        let percent = percent.min(COMPLETE).max(self.last_percent);
        self.last_percent = percent;

        let message = message.into();
        debug!("Progress {}%: {}", percent, message);

        if let Some(sender) = &self.sender {
            // A closed receiver means nobody is listening any more
            if sender.send(ProgressEvent { percent, message }).is_ok() {
                self.events_sent += 1;
            }
        }
    }

    /// Highest percentage reported so far
    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    /// Events delivered to a live receiver
    pub fn events_sent(&self) -> usize {
        self.events_sent
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }
}

/// Map bytes consumed onto the record processing range (60-99)
///
/// Without a known total the processing phase stays at its start.
pub fn processing_percent(bytes_consumed: u64, total_bytes: Option<u64>) -> u8 {
    let span = u64::from(PROCESSING_END - PROCESSING_START);
    match total_bytes {
        Some(total) if total > 0 => {
            let fraction = bytes_consumed.min(total) * span / total;
            PROCESSING_START + fraction as u8
        }
        _ => PROCESSING_START,
    }
}
