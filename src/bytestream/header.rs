//! Optional self-describing file header
//!
//! Layout (all single bytes):
//! ```text
//! 'P' 't' header_length flags1 flags2 declared_channel_count [reserved...]
//! ```
//! `flags1` bit 7 = volume present, bit 6 = instruments present,
//! bit 5 = percussion encoded as notes 128..=255.
//!
//! The header is advisory. A buffer that starts with the magic but is too
//! short for the declared length is treated as headerless.

use bitflags::bitflags;
use nom::bytes::complete::tag;
use nom::number::complete::u8 as byte;
use nom::sequence::tuple;
use nom::IResult;
use tracing::debug;

/// Two-byte magic at offset 0.
pub const HEADER_MAGIC: &[u8] = b"Pt";

/// Smallest header that still carries every defined field.
pub const MIN_HEADER_LENGTH: usize = 6;

bitflags! {
    /// Encoding options that change how commands are decoded or displayed
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FormatFlags: u8 {
        /// Every note-on carries a volume byte
        const VOLUME = 0x80;
        /// The score contains instrument change commands
        const INSTRUMENTS = 0x40;
        /// Notes 128..=255 are percussion voices
        const PERCUSSION = 0x20;
    }
}

impl FormatFlags {
    /// Whether note-on commands carry a volume byte.
    pub fn volume_present(&self) -> bool {
        self.contains(FormatFlags::VOLUME)
    }

    /// Whether the score declares instrument changes.
    pub fn instruments_present(&self) -> bool {
        self.contains(FormatFlags::INSTRUMENTS)
    }

    /// Whether notes 128..=255 name percussion voices.
    pub fn percussion_present(&self) -> bool {
        self.contains(FormatFlags::PERCUSSION)
    }
}

impl Default for FormatFlags {
    fn default() -> Self {
        FormatFlags::empty()
    }
}

/// Parsed file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Length of the whole header, including magic and reserved bytes
    pub header_length: u8,
    /// Defined bits of `flags1`
    pub flags: FormatFlags,
    /// `flags1` exactly as stored
    pub raw_flags1: u8,
    /// Second flag byte (no bits defined yet)
    pub flags2: u8,
    /// Number of tone generators the encoder says it used
    pub declared_channel_count: u8,
}

impl FileHeader {
    /// Offset of the first command byte.
    pub fn body_offset(&self) -> usize {
        usize::from(self.header_length)
    }
}

/// Detects and parses the optional header.
pub struct HeaderSniffer;

impl HeaderSniffer {
    /// Create a new sniffer
    pub fn new() -> Self {
        HeaderSniffer
    }

    /// Parse the header at offset 0, if there is a well-formed one.
    pub fn sniff(&self, buffer: &[u8]) -> Option<FileHeader> {
        let (_, (header_length, flags1, flags2, channels)) = match header_fields(buffer) {
            Ok(parsed) => parsed,
            Err(_) => {
                if buffer.starts_with(HEADER_MAGIC) {
                    debug!("header magic present but fields truncated, decoding as headerless");
                }
                return None;
            }
        };

        let declared = usize::from(header_length);
        if declared < MIN_HEADER_LENGTH || declared > buffer.len() {
            debug!(
                header_length,
                buffer_len = buffer.len(),
                "header length out of range, decoding as headerless"
            );
            return None;
        }

        let header = FileHeader {
            header_length,
            flags: FormatFlags::from_bits_truncate(flags1),
            raw_flags1: flags1,
            flags2,
            declared_channel_count: channels,
        };
        debug!(?header, "found file header");
        Some(header)
    }
}

impl Default for HeaderSniffer {
    fn default() -> Self {
        Self::new()
    }
}

fn header_fields(input: &[u8]) -> IResult<&[u8], (u8, u8, u8, u8)> {
    let (input, _) = tag(HEADER_MAGIC)(input)?;
    tuple((byte, byte, byte, byte))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_magic() {
        let data = [0x00, 0x10, 0x90, 0x3C, 0xF0];
        assert_eq!(HeaderSniffer::new().sniff(&data), None);
    }

    #[test]
    fn test_full_header() {
        let data = [b'P', b't', 6, 0xE0, 0x00, 3, 0x90, 0x3C, 0x40, 0xF0];
        let header = HeaderSniffer::new().sniff(&data).unwrap();
        assert_eq!(header.header_length, 6);
        assert!(header.flags.volume_present());
        assert!(header.flags.instruments_present());
        assert!(header.flags.percussion_present());
        assert_eq!(header.declared_channel_count, 3);
        assert_eq!(header.body_offset(), 6);
    }

    #[test]
    fn test_reserved_bytes_are_skipped() {
        let data = [b'P', b't', 8, 0x80, 0x00, 2, 0xAA, 0xBB, 0xF0];
        let header = HeaderSniffer::new().sniff(&data).unwrap();
        assert_eq!(header.body_offset(), 8);
        assert_eq!(header.flags, FormatFlags::VOLUME);
    }

    #[test]
    fn test_undefined_flag_bits_are_dropped() {
        let data = [b'P', b't', 6, 0x9F, 0x00, 1];
        let header = HeaderSniffer::new().sniff(&data).unwrap();
        assert_eq!(header.flags, FormatFlags::VOLUME);
        assert_eq!(header.raw_flags1, 0x9F);
    }

    #[test]
    fn test_truncated_header_degrades() {
        let sniffer = HeaderSniffer::new();
        assert_eq!(sniffer.sniff(&[b'P', b't', 6, 0x80]), None);
        // declared length longer than the buffer
        assert_eq!(sniffer.sniff(&[b'P', b't', 12, 0x80, 0x00, 2, 0xF0]), None);
        // declared length too short to hold the fields
        assert_eq!(sniffer.sniff(&[b'P', b't', 3, 0x80, 0x00, 2, 0xF0]), None);
    }
}
