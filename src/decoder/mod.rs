//! Decode Engine
//!
//! Turns a Playtune bytestream into a sequence of [`RenderEvent`]s:
//! - [`ChannelBank`]: state of the 16 addressable tone generators
//! - [`CommandDecoder`]: the command state machine (an iterator of events)
//! - [`SummaryCollector`]: running statistics gathered in the same pass

pub mod channel_bank;
pub mod event;
pub mod state_machine;
pub mod summary;

pub use channel_bank::{
    Channel, ChannelBank, ChannelSnapshot, InstrumentId, NoteId, MAX_CHANNELS,
};
pub use event::{Anomaly, EventKind, RenderEvent};
pub use state_machine::{CommandDecoder, DecoderState};
pub use summary::{RunningStats, SummaryCollector};

use crate::bytestream::{FileHeader, FormatFlags};
use crate::config::DecodeOptions;

/// Everything produced by a complete pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedScore {
    /// File header, if present
    pub header: Option<FileHeader>,
    /// Format flags in effect
    pub format: FormatFlags,
    /// Channels intended for display
    pub display_limit: u8,
    /// Every emitted event, in order
    pub events: Vec<RenderEvent>,
    /// Final statistics
    pub stats: RunningStats,
}

/// Decode a whole buffer, stopping at the first fatal error.
///
/// Out-of-range options fail with `ConfigError` before any byte is read.
pub fn decode(buffer: &[u8], options: &DecodeOptions) -> crate::Result<DecodedScore> {
    let mut decoder = CommandDecoder::new(buffer, options)?;
    let header = decoder.header().copied();
    let format = decoder.format();
    let display_limit = decoder.display_limit();
    let events = decoder.by_ref().collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedScore {
        header,
        format,
        display_limit,
        events,
        stats: decoder.into_stats(),
    })
}
