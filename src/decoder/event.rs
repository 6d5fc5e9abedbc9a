//! Events emitted by the decoder.

use std::fmt;
use std::ops::Range;

use super::channel_bank::ChannelSnapshot;

/// Recoverable or informational condition found while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// Note-off on a channel that was not sounding
    StopWithoutStart {
        /// Channel addressed by the note-off
        channel: u8,
        /// Offset of the note-off byte
        offset: usize,
    },
    /// Delay directly following another delay; the two could be one command
    MergeableDelay {
        /// Offset of the second delay
        offset: usize,
    },
    /// The buffer ended without an end-of-score command
    MissingEndMarker {
        /// Buffer length
        offset: usize,
    },
}

impl Anomaly {
    /// Offset of the command that raised the anomaly.
    pub fn offset(&self) -> usize {
        match *self {
            Anomaly::StopWithoutStart { offset, .. }
            | Anomaly::MergeableDelay { offset }
            | Anomaly::MissingEndMarker { offset } => offset,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::StopWithoutStart { channel, offset } => {
                write!(f, "gen{channel} stopped but not playing at {offset:04X}")
            }
            Anomaly::MergeableDelay { offset } => {
                write!(f, "delay at {offset:04X} could merge with the previous one")
            }
            Anomaly::MissingEndMarker { offset } => {
                write!(f, "no end-of-score command before {offset:04X}")
            }
        }
    }
}

/// Why an event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A delay command closed the frame
    Delay,
    /// End of score (or end of buffer)
    End,
}

/// Channel state for one stretch of time plus the bytes that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEvent {
    /// What closed this frame
    pub kind: EventKind,
    /// Time at which the frame starts, in milliseconds
    pub elapsed_time_ms: u64,
    /// Length of the frame in milliseconds (0 for the final event)
    pub delay_ms: u16,
    /// What was sounding during the frame
    pub channels: ChannelSnapshot,
    /// Buffer range of every command folded into this frame
    pub consumed_bytes: Range<usize>,
    /// Conditions found in this frame's commands, in stream order
    pub anomalies: Vec<Anomaly>,
}

impl RenderEvent {
    /// First anomaly of the frame, if any.
    pub fn anomaly(&self) -> Option<&Anomaly> {
        self.anomalies.first()
    }

    /// Whether this is the final event of the pass.
    pub fn is_end(&self) -> bool {
        self.kind == EventKind::End
    }

    /// Raw bytes of this frame within `buffer`.
    pub fn bytes<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        buffer.get(self.consumed_bytes.clone()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::channel_bank::{Channel, MAX_CHANNELS};

    #[test]
    fn test_anomaly_text() {
        let anomaly = Anomaly::StopWithoutStart {
            channel: 2,
            offset: 0x1F,
        };
        assert_eq!(anomaly.to_string(), "gen2 stopped but not playing at 001F");
        assert_eq!(anomaly.offset(), 0x1F);
    }

    #[test]
    fn test_event_bytes() {
        let buffer = [0x00, 0x10, 0x91, 0x3C];
        let event = RenderEvent {
            kind: EventKind::Delay,
            elapsed_time_ms: 0,
            delay_ms: 16,
            channels: [Channel::default(); MAX_CHANNELS],
            consumed_bytes: 0..2,
            anomalies: Vec::new(),
        };
        assert_eq!(event.bytes(&buffer), &[0x00, 0x10]);
        assert!(event.anomaly().is_none());
        assert!(!event.is_end());
    }
}
