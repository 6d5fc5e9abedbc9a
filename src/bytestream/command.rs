//! Command classification
//!
//! ```text
//! 0x00-0x7F  delay, big-endian with the following byte (milliseconds)
//! 0x8n       note off, channel n
//! 0x9n       note on, channel n: note [volume]
//! 0xCn       instrument change, channel n: instrument (7 bits)
//! 0xE0       repeat marker
//! 0xF0       end of score
//! ```

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::cursor::ByteCursor;
use super::header::FormatFlags;
use crate::error::DecodeError;

/// Highest byte value that starts a delay command.
const DELAY_MAX: u8 = 0x7F;

/// High nibble of a non-delay leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
enum CommandFamily {
    NoteOff = 0x8,
    NoteOn = 0x9,
    Instrument = 0xC,
    Repeat = 0xE,
    End = 0xF,
}

/// One decoded bytestream command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Advance time
    Delay {
        /// Delay in milliseconds
        ms: u16,
    },
    /// Silence a channel
    NoteOff {
        /// Channel index (0-15)
        channel: u8,
    },
    /// Start a note on a channel
    NoteOn {
        /// Channel index (0-15)
        channel: u8,
        /// Note number (0-127 pitched, 128-255 percussion)
        note: u8,
        /// Volume byte, when the score carries volumes
        volume: Option<u8>,
    },
    /// Change the instrument of a channel
    Instrument {
        /// Channel index (0-15)
        channel: u8,
        /// Instrument id (0-127)
        instrument: u8,
    },
    /// Repeat marker (no effect on the decoded state)
    Repeat,
    /// End of score
    End,
}

impl Command {
    /// Read the command starting at the cursor position.
    ///
    /// On success the cursor sits on the first byte of the next command.
    pub fn read(cursor: &mut ByteCursor<'_>, flags: FormatFlags) -> Result<Command, DecodeError> {
        let offset = cursor.position();
        let leading = payload(cursor, offset)?;
        if leading <= DELAY_MAX {
            let low = payload(cursor, offset)?;
            return Ok(Command::Delay {
                ms: u16::from_be_bytes([leading, low]),
            });
        }

        let channel = leading & 0x0F;
        match CommandFamily::from_u8(leading >> 4) {
            Some(CommandFamily::NoteOff) => Ok(Command::NoteOff { channel }),
            Some(CommandFamily::NoteOn) => {
                let note = payload(cursor, offset)?;
                let volume = if flags.volume_present() {
                    Some(payload(cursor, offset)?)
                } else {
                    None
                };
                Ok(Command::NoteOn {
                    channel,
                    note,
                    volume,
                })
            }
            Some(CommandFamily::Instrument) => {
                let instrument = payload(cursor, offset)? & 0x7F;
                Ok(Command::Instrument {
                    channel,
                    instrument,
                })
            }
            Some(CommandFamily::Repeat) if channel == 0 => Ok(Command::Repeat),
            Some(CommandFamily::End) if channel == 0 => Ok(Command::End),
            _ => Err(DecodeError::UnknownCommand {
                offset,
                byte: leading,
                context: cursor.fault_context(offset),
            }),
        }
    }

    /// Channel addressed by this command, if any.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            Command::NoteOff { channel }
            | Command::NoteOn { channel, .. }
            | Command::Instrument { channel, .. } => Some(channel),
            Command::Delay { .. } | Command::Repeat | Command::End => None,
        }
    }
}

/// Pull one byte belonging to the command that starts at `offset`.
fn payload(cursor: &mut ByteCursor<'_>, offset: usize) -> Result<u8, DecodeError> {
    cursor.next().map_err(|_| DecodeError::UnexpectedEnd {
        offset,
        context: cursor.fault_context(offset),
    })
}
