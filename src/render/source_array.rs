//! Source-array output
//!
//! Re-emits the bytestream as an array initializer that can be pasted back
//! into a sketch. Each row keeps the scroll columns inside a comment so the
//! array stays readable.

use std::fmt::Write as _;
use std::io::{self, Write};

use super::cells::CellLayout;
use super::{RenderContext, ScoreRenderer};
use crate::decoder::{RenderEvent, RunningStats};

const END_OF_SCORE: u8 = 0xF0;

/// Writes the bytestream as a `const byte PROGMEM score [] = { ... };` array.
///
/// The array holds the header, every command up to the end-of-score command,
/// and a closing `0xf0` (added when the file lacks one). Bytes after the
/// end-of-score command are left out; the footer byte count covers only what
/// the array holds and a separate footer line reports the skipped bytes.
pub struct SourceArrayRenderer<W: Write> {
    out: W,
    layout: Option<CellLayout>,
    emitted: usize,
    trailing: usize,
}

impl<W: Write> SourceArrayRenderer<W> {
    /// Create a renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            layout: None,
            emitted: 0,
            trailing: 0,
        }
    }

    /// Recover the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Bytes written into the array so far.
    pub fn emitted_bytes(&self) -> usize {
        self.emitted
    }

    /// Bytes after the end-of-score command that the array leaves out.
    pub fn skipped_trailing_bytes(&self) -> usize {
        self.trailing
    }

    fn layout(&mut self, ctx: &RenderContext<'_>) -> CellLayout {
        *self.layout.get_or_insert_with(|| CellLayout::new(ctx))
    }
}

fn push_bytes(line: &mut String, bytes: &[u8]) {
    for byte in bytes {
        let _ = write!(line, "0x{byte:02X},");
    }
}

impl<W: Write> ScoreRenderer for SourceArrayRenderer<W> {
    fn write_preamble(&mut self, ctx: &RenderContext<'_>) -> io::Result<()> {
        writeln!(
            self.out,
            "// Playtune bytestream for file \"{}\" created by playtune-scroll V{}",
            ctx.source_name,
            crate::VERSION
        )?;
        writeln!(self.out, "const byte PROGMEM score [] = {{")?;

        let header = ctx.header_bytes();
        if let Some(magic) = header.get(..2) {
            let mut line = String::new();
            for &byte in magic {
                let _ = write!(line, "'{}',", char::from(byte));
            }
            let _ = write!(line, "{},", header.get(2).copied().unwrap_or_default());
            push_bytes(&mut line, header.get(3..).unwrap_or(&[]));
            writeln!(self.out, "{line} // Playtune file header")?;
            self.emitted += header.len();
        }

        let layout = self.layout(ctx);
        writeln!(self.out, "//{}", layout.title())
    }

    fn write_event(&mut self, ctx: &RenderContext<'_>, event: &RenderEvent) -> io::Result<()> {
        let layout = self.layout(ctx);
        let mut bytes = event.bytes(ctx.buffer);
        if event.is_end() {
            if let Some((&last, rest)) = bytes.split_last() {
                if last == END_OF_SCORE {
                    bytes = rest;
                }
            }
        }

        let mut line = format!("/*{}", layout.status(event));
        let _ = write!(line, "   {:04X}: */ ", event.consumed_bytes.start);
        push_bytes(&mut line, bytes);
        for anomaly in &event.anomalies {
            let _ = write!(line, " // {anomaly}");
        }
        writeln!(self.out, "{}", line.trim_end())?;
        self.emitted += bytes.len();

        if event.is_end() {
            writeln!(self.out, " 0x{END_OF_SCORE:02x}}};")?;
            self.emitted += 1;
            self.trailing = ctx.buffer.len().saturating_sub(event.consumed_bytes.end);
        }
        Ok(())
    }

    fn write_epilogue(
        &mut self,
        _ctx: &RenderContext<'_>,
        stats: &RunningStats,
    ) -> io::Result<()> {
        let channels = stats.channels_used_count();
        writeln!(
            self.out,
            "// This score contains {} bytes, and {} tone generator{} used.",
            self.emitted,
            channels,
            if channels == 1 { " is" } else { "s are" }
        )?;
        if self.trailing > 0 {
            writeln!(
                self.out,
                "// {} byte{} after the end-of-score command {} not included.",
                self.trailing,
                if self.trailing == 1 { "" } else { "s" },
                if self.trailing == 1 { "was" } else { "were" }
            )?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrollConfig;
    use crate::render::render_score;

    fn render(bytes: &[u8]) -> (String, usize) {
        let mut renderer = SourceArrayRenderer::new(Vec::new());
        render_score(bytes, "tune.bin", &ScrollConfig::default(), &mut renderer).unwrap();
        let emitted = renderer.emitted_bytes();
        (String::from_utf8(renderer.into_inner()).unwrap(), emitted)
    }

    #[test]
    fn test_array_layout() {
        let bytes = [0x90, 0x3C, 0x00, 0x10, 0x80, 0xF0];
        let (text, emitted) = render(&bytes);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("// Playtune bytestream for file \"tune.bin\""));
        assert_eq!(lines[1], "const byte PROGMEM score [] = {");
        assert!(lines[2].starts_with("//duration"));
        assert!(lines[3].starts_with("/*"));
        assert!(lines[3].ends_with("0000: */ 0x90,0x3C,0x00,0x10,"), "{:?}", lines[3]);
        assert!(lines[4].ends_with("0004: */ 0x80,"), "{:?}", lines[4]);
        assert_eq!(lines[5], " 0xf0};");
        assert_eq!(
            lines[6],
            "// This score contains 6 bytes, and 1 tone generator is used."
        );
        assert_eq!(emitted, bytes.len());
    }

    #[test]
    fn test_header_row_and_missing_end_marker() {
        let bytes = [b'P', b't', 6, 0x20, 0x00, 2, 0x91, 0x3C, 0x00, 0x10];
        let (text, emitted) = render(&bytes);
        assert!(text.contains("'P','t',6,0x20,0x00,0x02, // Playtune file header"));
        assert!(text.contains("no end-of-score command before 000A"));
        assert!(text.contains(" 0xf0};"));
        assert!(text.contains("and 1 tone generator is used."));
        // the array gains the end marker the file lacked
        assert_eq!(emitted, bytes.len() + 1);
    }

    #[test]
    fn test_footer_counts_generators_that_played() {
        // only gen3 plays, so one generator is in use despite index 3
        let bytes = [0x93, 0x3C, 0x00, 0x10, 0x83, 0xF0];
        let (text, _) = render(&bytes);
        assert_eq!(
            text.lines().last(),
            Some("// This score contains 6 bytes, and 1 tone generator is used.")
        );

        // a stray note-off raises the highest index but plays nothing
        let bytes = [0x90, 0x3C, 0x00, 0x10, 0x85, 0x80, 0xF0];
        let (text, _) = render(&bytes);
        assert!(text.contains("and 1 tone generator is used."));
    }

    #[test]
    fn test_trailing_bytes_reported_in_footer() {
        let bytes = [0x90, 0x3C, 0x00, 0x10, 0x80, 0xF0, 0x12, 0x34];
        let mut renderer = SourceArrayRenderer::new(Vec::new());
        render_score(&bytes, "tune.bin", &ScrollConfig::default(), &mut renderer).unwrap();
        assert_eq!(renderer.emitted_bytes(), 6);
        assert_eq!(renderer.skipped_trailing_bytes(), 2);

        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(!text.contains("0x12"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[lines.len() - 2],
            "// This score contains 6 bytes, and 1 tone generator is used."
        );
        assert_eq!(
            lines[lines.len() - 1],
            "// 2 bytes after the end-of-score command were not included."
        );
    }
}
