//! Per-channel playback state.
//!
//! The bank holds one [`Channel`] for every tone generator a command byte can
//! address (its low nibble), independent of how many are displayed.

use crate::tables;

/// Number of channels addressable by the low nibble of a command byte.
pub const MAX_CHANNELS: usize = 16;

/// Note number as stored in the bytestream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(pub u8);

impl NoteId {
    /// Whether this note addresses the percussion table.
    pub fn is_percussion(self) -> bool {
        self.0 >= tables::PERCUSSION_BASE
    }

    /// Display name, if the note has one under the current encoding.
    pub fn label(self, percussion_enabled: bool) -> Option<&'static str> {
        tables::note_label(self.0, percussion_enabled)
    }
}

/// Instrument (program) number, always 0..=127.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstrumentId(u8);

impl InstrumentId {
    /// Wrap a raw byte, dropping bit 7.
    pub fn new(raw: u8) -> Self {
        InstrumentId(raw & 0x7F)
    }

    /// Numeric id.
    pub fn value(self) -> u8 {
        self.0
    }

    /// General MIDI program name.
    pub fn name(self) -> &'static str {
        tables::instrument_name(self.0).unwrap_or("?")
    }
}

/// State of one tone generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Channel {
    /// Sounding note, `None` when silent
    pub note: Option<NoteId>,
    /// Volume of the last note-on that carried one
    pub volume: Option<u8>,
    /// Current instrument
    pub instrument: InstrumentId,
    /// Instrument changed since the last emitted frame
    pub instrument_dirty: bool,
    /// Note was turned off since the last emitted frame
    pub just_stopped: bool,
}

impl Channel {
    /// Whether a note is currently sounding.
    pub fn is_sounding(&self) -> bool {
        self.note.is_some()
    }
}

/// Copy of every channel at one instant.
pub type ChannelSnapshot = [Channel; MAX_CHANNELS];

/// Fixed table of channel states for one decode pass.
#[derive(Debug, Clone)]
pub struct ChannelBank {
    channels: ChannelSnapshot,
}

impl ChannelBank {
    /// All channels silent, instrument 0.
    pub fn new() -> Self {
        Self {
            channels: [Channel::default(); MAX_CHANNELS],
        }
    }

    /// State of one channel.
    pub fn get(&self, channel: usize) -> Option<&Channel> {
        self.channels.get(channel)
    }

    /// All channels.
    pub fn channels(&self) -> &ChannelSnapshot {
        &self.channels
    }

    /// Owned copy of all channels.
    pub fn snapshot(&self) -> ChannelSnapshot {
        self.channels
    }

    /// Start `note` on `channel`. Returns the instrument it plays with.
    pub fn note_on(&mut self, channel: u8, note: NoteId, volume: Option<u8>) -> InstrumentId {
        let slot = self.slot(channel);
        slot.note = Some(note);
        slot.just_stopped = false;
        if volume.is_some() {
            slot.volume = volume;
        }
        slot.instrument
    }

    /// Silence `channel`. Returns `false` if it was already silent.
    pub fn note_off(&mut self, channel: u8) -> bool {
        let slot = self.slot(channel);
        if slot.note.take().is_some() {
            slot.just_stopped = true;
            true
        } else {
            false
        }
    }

    /// Switch the instrument of `channel`.
    pub fn set_instrument(&mut self, channel: u8, instrument: InstrumentId) {
        let slot = self.slot(channel);
        slot.instrument = instrument;
        slot.instrument_dirty = true;
    }

    /// Clear per-frame markers once a frame has been emitted.
    pub fn end_frame(&mut self) {
        for channel in &mut self.channels {
            channel.just_stopped = false;
            channel.instrument_dirty = false;
        }
    }

    fn slot(&mut self, channel: u8) -> &mut Channel {
        &mut self.channels[usize::from(channel & 0x0F)]
    }
}

impl Default for ChannelBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bank_is_silent() {
        let bank = ChannelBank::new();
        assert!(bank.channels().iter().all(|ch| !ch.is_sounding()));
        assert!(bank.channels().iter().all(|ch| ch.instrument.value() == 0));
        assert!(bank.get(MAX_CHANNELS).is_none());
    }

    #[test]
    fn test_note_on_off_cycle() {
        let mut bank = ChannelBank::new();
        bank.note_on(3, NoteId(60), Some(100));
        let ch = bank.get(3).unwrap();
        assert_eq!(ch.note, Some(NoteId(60)));
        assert_eq!(ch.volume, Some(100));

        assert!(bank.note_off(3));
        let ch = bank.get(3).unwrap();
        assert!(!ch.is_sounding());
        assert!(ch.just_stopped);

        // second note-off finds the channel silent
        assert!(!bank.note_off(3));
    }

    #[test]
    fn test_retrigger_clears_just_stopped() {
        let mut bank = ChannelBank::new();
        bank.note_on(0, NoteId(60), None);
        bank.note_off(0);
        bank.note_on(0, NoteId(62), None);
        let ch = bank.get(0).unwrap();
        assert_eq!(ch.note, Some(NoteId(62)));
        assert!(!ch.just_stopped);
    }

    #[test]
    fn test_volume_kept_when_absent() {
        let mut bank = ChannelBank::new();
        bank.note_on(1, NoteId(60), Some(40));
        bank.note_on(1, NoteId(61), None);
        assert_eq!(bank.get(1).unwrap().volume, Some(40));
    }

    #[test]
    fn test_instrument_change_and_frame_end() {
        let mut bank = ChannelBank::new();
        bank.set_instrument(5, InstrumentId::new(0x98));
        let ch = bank.get(5).unwrap();
        assert_eq!(ch.instrument.value(), 0x18);
        assert!(ch.instrument_dirty);
        assert_eq!(bank.note_on(5, NoteId(40), None).value(), 0x18);

        bank.end_frame();
        let ch = bank.get(5).unwrap();
        assert!(!ch.instrument_dirty);
        assert_eq!(ch.instrument.value(), 0x18);
    }

    #[test]
    fn test_snapshot_survives_mutation() {
        let mut bank = ChannelBank::new();
        bank.note_on(0, NoteId(60), None);
        let snapshot = bank.snapshot();
        bank.note_off(0);
        assert_eq!(snapshot[0].note, Some(NoteId(60)));
        assert!(!bank.get(0).unwrap().is_sounding());
    }

    #[test]
    fn test_note_labels() {
        assert_eq!(NoteId(60).label(false), Some("C4"));
        assert!(NoteId(164).is_percussion());
        assert_eq!(NoteId(164).label(true), Some("BassD"));
        assert_eq!(NoteId(164).label(false), None);
        assert_eq!(InstrumentId::new(0).name(), "Acoustic Grand Piano");
    }
}
