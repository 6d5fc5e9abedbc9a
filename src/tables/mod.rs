//! Name lookup tables
//!
//! Playtune note numbers below 128 are MIDI pitches. Numbers 128..=255 are
//! General MIDI percussion keys relocated by the encoder, and only mean
//! something when the score declares percussion-as-notes encoding.
//!
//! Every lookup is range-checked and returns `None` outside its table.

mod names;

use names::{INSTRUMENT_NAMES, PERCUSSION_NAMES, PITCH_NAMES};

/// First note number that addresses the percussion table.
pub const PERCUSSION_BASE: u8 = 128;

/// Name of a pitched note (0..=127), e.g. `"C4"` for 60.
pub fn pitch_name(note: u8) -> Option<&'static str> {
    PITCH_NAMES.get(usize::from(note)).copied()
}

/// Name of a relocated percussion voice (128..=255).
pub fn percussion_name(note: u8) -> Option<&'static str> {
    let index = note.checked_sub(PERCUSSION_BASE)?;
    PERCUSSION_NAMES.get(usize::from(index)).copied()
}

/// General MIDI program name for an instrument id (0..=127).
pub fn instrument_name(instrument: u8) -> Option<&'static str> {
    INSTRUMENT_NAMES.get(usize::from(instrument)).copied()
}

/// Display label for a note number.
///
/// Notes at or above [`PERCUSSION_BASE`] resolve through the percussion table
/// only when `percussion_enabled` is set; otherwise they have no label.
pub fn note_label(note: u8, percussion_enabled: bool) -> Option<&'static str> {
    if note < PERCUSSION_BASE {
        pitch_name(note)
    } else if percussion_enabled {
        percussion_name(note)
    } else {
        None
    }
}
