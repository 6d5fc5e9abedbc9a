//! Fatal decode errors
//!
//! Anything that leaves the byte alignment of the stream untrustworthy ends
//! the pass. Recoverable conditions are reported as
//! [`Anomaly`](crate::decoder::Anomaly) values instead.

use std::fmt;

/// Number of bytes shown on each side of a fault.
pub const FAULT_WINDOW_RADIUS: usize = 16;

/// Bytes surrounding a fault, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultContext {
    /// Buffer offset of the first byte in `bytes`
    pub start: usize,
    /// Buffer offset of the offending byte
    pub fault: usize,
    /// Window of raw bytes (may be shorter near either end of the buffer)
    pub bytes: Vec<u8>,
}

impl FaultContext {
    /// Capture up to [`FAULT_WINDOW_RADIUS`] bytes either side of `fault`.
    pub fn capture(buffer: &[u8], fault: usize) -> Self {
        let start = fault.saturating_sub(FAULT_WINDOW_RADIUS).min(buffer.len());
        let end = fault
            .saturating_add(FAULT_WINDOW_RADIUS + 1)
            .min(buffer.len());
        Self {
            start,
            fault,
            bytes: buffer[start..end].to_vec(),
        }
    }
}

impl fmt::Display for FaultContext {
    /// Hex dump with the offending byte bracketed: `81 00 [D5]  00 05`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if self.start + i == self.fault {
                write!(f, " [{byte:02X}]  ")?;
            } else {
                write!(f, "{byte:02X} ")?;
            }
        }
        Ok(())
    }
}

/// Unrecoverable bytestream errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended in the middle of a command
    #[error("bytestream ends inside the command at position {offset:04X} ({offset})")]
    UnexpectedEnd {
        /// Offset of the truncated command's leading byte
        offset: usize,
        /// Bytes around the truncated command
        context: FaultContext,
    },

    /// The leading byte does not belong to any command family
    #[error("unknown command 0x{byte:02X} at position {offset:04X} ({offset})")]
    UnknownCommand {
        /// Offset of the offending byte
        offset: usize,
        /// The offending byte
        byte: u8,
        /// Bytes around the offending byte
        context: FaultContext,
    },
}

impl DecodeError {
    /// Offset of the byte that caused the failure.
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::UnexpectedEnd { offset, .. }
            | DecodeError::UnknownCommand { offset, .. } => *offset,
        }
    }

    /// Surrounding bytes for a diagnostic dump.
    pub fn context(&self) -> &FaultContext {
        match self {
            DecodeError::UnexpectedEnd { context, .. }
            | DecodeError::UnknownCommand { context, .. } => context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_brackets_fault() {
        let buffer = [0x00, 0x10, 0xD5, 0x00, 0x05];
        let context = FaultContext::capture(&buffer, 2);
        assert_eq!(context.start, 0);
        assert_eq!(context.bytes, buffer.to_vec());
        assert_eq!(context.to_string(), "00 10  [D5]  00 05 ");
    }

    #[test]
    fn test_context_clamps_window() {
        let buffer: Vec<u8> = (0..64).collect();
        let context = FaultContext::capture(&buffer, 40);
        assert_eq!(context.start, 24);
        assert_eq!(context.bytes.len(), 33);
        assert_eq!(context.bytes.first(), Some(&24));
        assert_eq!(context.bytes.last(), Some(&56));
    }

    #[test]
    fn test_context_past_end() {
        let buffer = [0x90, 0x3C];
        let context = FaultContext::capture(&buffer, 2);
        assert_eq!(context.bytes, vec![0x90, 0x3C]);
    }

    #[test]
    fn test_error_message_has_hex_and_decimal_offset() {
        let buffer = [0u8; 40];
        let err = DecodeError::UnknownCommand {
            offset: 26,
            byte: 0xD5,
            context: FaultContext::capture(&buffer, 26),
        };
        assert_eq!(
            err.to_string(),
            "unknown command 0xD5 at position 001A (26)"
        );
        assert_eq!(err.offset(), 26);
    }
}
