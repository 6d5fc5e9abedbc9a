//! Command decoder
//!
//! Consumes the bytestream one command at a time and folds note and
//! instrument commands into the [`ChannelBank`]. Every delay closes a frame:
//! the decoder emits a [`RenderEvent`] holding the channel state that sounds
//! during the delay, then advances time. The end-of-score command closes the
//! final frame.
//!
//! State mutation and event emission happen together per command, so a caller
//! may stop iterating at any point.

use std::iter::FusedIterator;
use std::mem;

use tracing::{debug, trace, warn};

use super::channel_bank::{ChannelBank, InstrumentId, NoteId};
use super::event::{Anomaly, EventKind, RenderEvent};
use super::summary::{RunningStats, SummaryCollector};
use crate::bytestream::{ByteCursor, Command, FileHeader, FormatFlags, HeaderSniffer};
use crate::config::DecodeOptions;
use crate::error::DecodeError;

/// Decoder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Commands left to decode
    Running,
    /// End of score reached
    Ended,
    /// A fatal error stopped the pass
    Faulted,
}

/// Single-pass decoder over a Playtune bytestream.
///
/// Yields one `Result<RenderEvent, DecodeError>` per frame. After the final
/// event or the first error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct CommandDecoder<'a> {
    cursor: ByteCursor<'a>,
    header: Option<FileHeader>,
    format: FormatFlags,
    display_limit: u8,
    bank: ChannelBank,
    summary: SummaryCollector,
    state: DecoderState,
    elapsed_ms: u64,
    frame_start: usize,
    pending: Vec<Anomaly>,
    previous_was_delay: bool,
}

impl<'a> CommandDecoder<'a> {
    /// Sniff the header and position the decoder on the first command.
    ///
    /// Fails with `ConfigError` when `options` are out of range, so every
    /// entry point rejects the same inputs.
    pub fn new(buffer: &'a [u8], options: &DecodeOptions) -> crate::Result<Self> {
        options.validate()?;
        let header = HeaderSniffer::new().sniff(buffer);
        let format = options.resolve_format(header.as_ref());
        let display_limit = options.resolve_display_limit(header.as_ref());

        if let Some(header) = &header {
            if options.expect_volume != header.flags.volume_present() {
                debug!(
                    header_volume = header.flags.volume_present(),
                    "file header overrides the volume option"
                );
            }
        }

        let start = header.as_ref().map_or(0, FileHeader::body_offset);
        Ok(Self {
            cursor: ByteCursor::at(buffer, start),
            header,
            format,
            display_limit,
            bank: ChannelBank::new(),
            summary: SummaryCollector::new(display_limit),
            state: DecoderState::Running,
            elapsed_ms: 0,
            frame_start: start,
            pending: Vec::new(),
            previous_was_delay: false,
        })
    }

    /// Parsed file header, if the buffer had one.
    pub fn header(&self) -> Option<&FileHeader> {
        self.header.as_ref()
    }

    /// Format flags in effect for this pass.
    pub fn format(&self) -> FormatFlags {
        self.format
    }

    /// Number of channels the caller intends to display.
    pub fn display_limit(&self) -> u8 {
        self.display_limit
    }

    /// Offset of the first command byte.
    pub fn body_offset(&self) -> usize {
        self.header.as_ref().map_or(0, FileHeader::body_offset)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Milliseconds elapsed so far.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Live channel state.
    pub fn channels(&self) -> &ChannelBank {
        &self.bank
    }

    /// Counters so far.
    pub fn stats(&self) -> &RunningStats {
        self.summary.stats()
    }

    /// Final counters.
    pub fn into_stats(self) -> RunningStats {
        self.summary.finish()
    }

    /// Bytes after the end-of-score command (empty until the pass has ended).
    pub fn trailing_bytes(&self) -> &'a [u8] {
        match self.state {
            DecoderState::Ended => &self.cursor.buffer()[self.cursor.position()..],
            DecoderState::Running | DecoderState::Faulted => &[],
        }
    }

    /// Decode one command; returns an event when it closed a frame.
    fn step(&mut self) -> Result<Option<RenderEvent>, DecodeError> {
        let offset = self.cursor.position();
        if self.cursor.is_exhausted() {
            warn!(offset, "bytestream ended without an end-of-score command");
            self.pending.push(Anomaly::MissingEndMarker { offset });
            self.state = DecoderState::Ended;
            return Ok(Some(self.close_frame(EventKind::End, 0)));
        }

        let command = Command::read(&mut self.cursor, self.format)?;
        trace!(offset, ?command, "decoded command");
        if let Some(channel) = command.channel() {
            self.summary.record_channel(channel);
        }

        match command {
            Command::Delay { ms } => {
                if self.previous_was_delay {
                    self.pending.push(Anomaly::MergeableDelay { offset });
                }
                self.previous_was_delay = true;
                let event = self.close_frame(EventKind::Delay, ms);
                self.elapsed_ms += u64::from(ms);
                return Ok(Some(event));
            }
            Command::NoteOn {
                channel,
                note,
                volume,
            } => {
                let note = NoteId(note);
                if note.is_percussion() && !self.format.percussion_present() {
                    debug!(offset, note = note.0, "note above 127 without percussion encoding");
                }
                let instrument = self.bank.note_on(channel, note, volume);
                self.summary.record_note_on(channel, instrument, volume);
            }
            Command::NoteOff { channel } => {
                if !self.bank.note_off(channel) {
                    warn!(offset, channel, "note off on a channel that is not playing");
                    self.pending
                        .push(Anomaly::StopWithoutStart { channel, offset });
                }
            }
            Command::Instrument {
                channel,
                instrument,
            } => {
                self.bank
                    .set_instrument(channel, InstrumentId::new(instrument));
            }
            Command::Repeat => {
                debug!(offset, "skipping repeat marker");
                self.summary.record_repeat();
                return Ok(None);
            }
            Command::End => {
                self.state = DecoderState::Ended;
                let event = self.close_frame(EventKind::End, 0);
                let trailing = self.cursor.remaining();
                if trailing > 0 {
                    warn!(trailing, "ignoring bytes after the end-of-score command");
                }
                return Ok(Some(event));
            }
        }

        self.previous_was_delay = false;
        Ok(None)
    }

    /// Emit the frame that ends at the cursor and start a new one.
    fn close_frame(&mut self, kind: EventKind, delay_ms: u16) -> RenderEvent {
        let end = self.cursor.position();
        let event = RenderEvent {
            kind,
            elapsed_time_ms: self.elapsed_ms,
            delay_ms,
            channels: self.bank.snapshot(),
            consumed_bytes: self.frame_start..end,
            anomalies: mem::take(&mut self.pending),
        };
        self.frame_start = end;
        self.bank.end_frame();
        self.summary.record_event(&event);
        event
    }
}

impl Iterator for CommandDecoder<'_> {
    type Item = Result<RenderEvent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state == DecoderState::Running {
            match self.step() {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => {}
                Err(err) => {
                    self.state = DecoderState::Faulted;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

impl FusedIterator for CommandDecoder<'_> {}
