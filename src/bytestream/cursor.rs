//! Forward-only reader over an in-memory bytestream.

use crate::error::FaultContext;

/// A read went past the end of the buffer.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("read past end of buffer at offset {offset}")]
pub struct EndOfBuffer {
    /// Offset the read was attempted at
    pub offset: usize,
}

/// Read-only cursor with position tracking.
///
/// The buffer stays borrowed from the caller for the whole pass; the cursor
/// never copies or mutates it.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    /// Start reading at offset 0.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::at(buffer, 0)
    }

    /// Start reading at `offset` (clamped to the buffer length).
    pub fn at(buffer: &'a [u8], offset: usize) -> Self {
        Self {
            buffer,
            position: offset.min(buffer.len()),
        }
    }

    /// Next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.buffer.get(self.position).copied()
    }

    /// Consume one byte.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<u8, EndOfBuffer> {
        let byte = self.peek().ok_or(EndOfBuffer {
            offset: self.position,
        })?;
        self.position += 1;
        Ok(byte)
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Whether every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// The whole underlying buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Up to `radius` bytes either side of the current position, inclusive.
    pub fn take_window(&self, radius: usize) -> &'a [u8] {
        self.window_at(self.position, radius).1
    }

    /// Up to `radius` bytes either side of `offset`, with the window's start offset.
    pub fn window_at(&self, offset: usize, radius: usize) -> (usize, &'a [u8]) {
        let start = offset.saturating_sub(radius).min(self.buffer.len());
        let end = offset
            .saturating_add(radius)
            .saturating_add(1)
            .min(self.buffer.len());
        (start, &self.buffer[start..end])
    }

    /// Diagnostic snapshot around `offset`.
    pub fn fault_context(&self, offset: usize) -> FaultContext {
        FaultContext::capture(self.buffer, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_advance_position() {
        let data = [0x90, 0x3C, 0xF0];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.peek(), Some(0x90));
        assert_eq!(cursor.next(), Ok(0x90));
        assert_eq!(cursor.next(), Ok(0x3C));
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_read_past_end_reports_offset() {
        let data = [0x91];
        let mut cursor = ByteCursor::new(&data);
        cursor.next().unwrap();
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.next(), Err(EndOfBuffer { offset: 1 }));
        // a failed read does not move the cursor
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_start_offset_is_clamped() {
        let data = [1, 2, 3];
        let cursor = ByteCursor::at(&data, 10);
        assert_eq!(cursor.position(), 3);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_window_near_edges() {
        let data: Vec<u8> = (0..10).collect();
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.take_window(2), &[0, 1, 2]);
        for _ in 0..9 {
            cursor.next().unwrap();
        }
        assert_eq!(cursor.take_window(2), &[7, 8, 9]);
        assert_eq!(cursor.window_at(5, 1), (4, &data[4..7]));
    }
}
