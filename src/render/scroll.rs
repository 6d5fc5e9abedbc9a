//! Human-readable scroll
//!
//! One row per event: the frame's duration, the time at which it starts,
//! a cell for every displayed channel, then the bytes that produced it.

use std::fmt::Write as _;
use std::io::{self, Write};

use super::cells::CellLayout;
use super::{RenderContext, ScoreRenderer};
use crate::decoder::{RenderEvent, RunningStats};

/// Writes the scroll to any [`Write`] sink.
pub struct ScrollRenderer<W: Write> {
    out: W,
    layout: Option<CellLayout>,
}

impl<W: Write> ScrollRenderer<W> {
    /// Create a renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out, layout: None }
    }

    /// Recover the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn layout(&mut self, ctx: &RenderContext<'_>) -> CellLayout {
        *self.layout.get_or_insert_with(|| CellLayout::new(ctx))
    }
}

impl<W: Write> ScoreRenderer for ScrollRenderer<W> {
    fn write_preamble(&mut self, ctx: &RenderContext<'_>) -> io::Result<()> {
        if let Some(header) = ctx.header {
            writeln!(
                self.out,
                "Playtune file header: {} bytes, flags {:02X} {:02X}, {} tone generator{} declared",
                header.header_length,
                header.raw_flags1,
                header.flags2,
                header.declared_channel_count,
                if header.declared_channel_count == 1 { "" } else { "s" },
            )?;
        }
        let layout = self.layout(ctx);
        writeln!(self.out)?;
        writeln!(self.out, "{}", layout.title())
    }

    fn write_event(&mut self, ctx: &RenderContext<'_>, event: &RenderEvent) -> io::Result<()> {
        let layout = self.layout(ctx);
        let mut line = layout.status(event);
        let _ = write!(line, "   {:04X}: ", event.consumed_bytes.start);
        if ctx.options.show_raw_bytes {
            for byte in event.bytes(ctx.buffer) {
                let _ = write!(line, "{byte:02X} ");
            }
        }
        for anomaly in &event.anomalies {
            let _ = write!(line, " ; {anomaly}");
        }
        writeln!(self.out, "{}", line.trim_end())
    }

    fn write_epilogue(
        &mut self,
        _ctx: &RenderContext<'_>,
        _stats: &RunningStats,
    ) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RenderOptions, ScrollConfig};
    use crate::render::render_score;
    use crate::PlaytuneError;

    fn render(bytes: &[u8], config: &ScrollConfig) -> (String, crate::Result<RunningStats>) {
        let mut renderer = ScrollRenderer::new(Vec::new());
        let result = render_score(bytes, "test.bin", config, &mut renderer);
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        (text, result)
    }

    #[test]
    fn test_scroll_rows() {
        let bytes = [0x90, 0x3C, 0x00, 0x10, 0x80, 0x00, 0x05, 0xF0];
        let (text, result) = render(&bytes, &ScrollConfig::default());
        let stats = result.unwrap();
        assert_eq!(stats.frames, 3);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "");
        assert!(lines[1].starts_with("duration"));
        assert!(lines[2].contains("    C4"));
        assert!(lines[2].ends_with("0000: 90 3C 00 10"), "{:?}", lines[2]);
        assert!(lines[3].contains("     -"));
        assert!(lines[3].ends_with("0004: 80 00 05"), "{:?}", lines[3]);
        assert!(lines[4].ends_with("0007: F0"), "{:?}", lines[4]);
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_anomaly_notes_and_hidden_bytes() {
        let bytes = [0x81, 0x00, 0x10, 0xF0];
        let config = ScrollConfig {
            render: RenderOptions {
                show_raw_bytes: false,
                ..RenderOptions::default()
            },
            ..ScrollConfig::default()
        };
        let (text, result) = render(&bytes, &config);
        assert_eq!(result.unwrap().redundant_note_offs, 1);
        let row = text.lines().nth(2).unwrap();
        assert!(
            row.ends_with("0000:  ; gen1 stopped but not playing at 0000"),
            "{row:?}"
        );
    }

    #[test]
    fn test_header_banner() {
        let bytes = [b'P', b't', 6, 0x80, 0x00, 3, 0x90, 0x3C, 0x7F, 0x00, 0x10, 0xF0];
        let (text, result) = render(&bytes, &ScrollConfig::default());
        result.unwrap();
        assert!(text.starts_with(
            "Playtune file header: 6 bytes, flags 80 00, 3 tone generators declared"
        ));
        assert!(text.contains(" v127"));
    }

    #[test]
    fn test_rows_flushed_before_fault() {
        let bytes = [0x90, 0x3C, 0x00, 0x10, 0xD5];
        let (text, result) = render(&bytes, &ScrollConfig::default());
        assert!(matches!(result, Err(PlaytuneError::Decode(_))));
        assert!(text.contains("0000: 90 3C 00 10"));
    }
}
