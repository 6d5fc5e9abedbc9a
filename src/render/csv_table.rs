//! CSV export, one record per decoded event.

use std::io::{self, Write};

use super::cells::CellLayout;
use super::{RenderContext, ScoreRenderer};
use crate::decoder::{RenderEvent, RunningStats};

/// Writes events as CSV records.
pub struct CsvRenderer<W: Write> {
    writer: csv::Writer<W>,
    layout: Option<CellLayout>,
}

impl<W: Write> CsvRenderer<W> {
    /// Create a renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            layout: None,
        }
    }

    /// Flush and recover the sink.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write> ScoreRenderer for CsvRenderer<W> {
    fn write_preamble(&mut self, ctx: &RenderContext<'_>) -> io::Result<()> {
        self.layout = Some(CellLayout::new(ctx));
        let mut record = vec![
            "elapsed_ms".to_string(),
            "delay_ms".to_string(),
            "offset".to_string(),
            "bytes".to_string(),
        ];
        record.extend((0..ctx.display_limit).map(|channel| format!("gen{channel}")));
        record.push("anomalies".to_string());
        self.writer.write_record(&record)?;
        Ok(())
    }

    fn write_event(&mut self, ctx: &RenderContext<'_>, event: &RenderEvent) -> io::Result<()> {
        let layout = *self.layout.get_or_insert_with(|| CellLayout::new(ctx));
        let bytes = event
            .bytes(ctx.buffer)
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");

        let mut record = vec![
            event.elapsed_time_ms.to_string(),
            event.delay_ms.to_string(),
            event.consumed_bytes.start.to_string(),
            bytes,
        ];
        for channel in event.channels.iter().take(usize::from(ctx.display_limit)) {
            let mut cell = layout.note_text(channel);
            match channel.volume {
                Some(volume) if ctx.show_volume() && channel.is_sounding() => {
                    cell.push_str(&format!(" v{volume}"));
                }
                _ => {}
            }
            record.push(cell);
        }
        record.push(
            event
                .anomalies
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        );
        self.writer.write_record(&record)?;
        Ok(())
    }

    fn write_epilogue(
        &mut self,
        _ctx: &RenderContext<'_>,
        _stats: &RunningStats,
    ) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrollConfig;
    use crate::render::render_score;

    #[test]
    fn test_csv_records() {
        let bytes = [0x90, 0x3C, 0x00, 0x10, 0x80, 0x00, 0x05, 0x80, 0xF0];
        let config = ScrollConfig {
            decode: crate::config::DecodeOptions {
                display_limit: Some(2),
                ..Default::default()
            },
            ..ScrollConfig::default()
        };
        let mut renderer = CsvRenderer::new(Vec::new());
        render_score(&bytes, "t.bin", &config, &mut renderer).unwrap();
        let text = String::from_utf8(renderer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "elapsed_ms,delay_ms,offset,bytes,gen0,gen1,anomalies");
        assert_eq!(lines[1], "0,16,0,90 3C 00 10,C4,,");
        assert_eq!(lines[2], "16,5,4,80 00 05,-,,");
        assert_eq!(lines[3], "21,0,7,80 F0,,,gen0 stopped but not playing at 0007");
        assert_eq!(lines.len(), 4);
    }
}
