//! Output Rendering
//!
//! Renderers consume [`RenderEvent`]s as the decoder produces them:
//! - Scroll: human-readable piano roll with non-uniform time
//! - Source array: the bytestream as an annotated array literal
//! - CSV: one record per event (feature `csv-export`)
//!
//! [`render_score`] drives decoder and renderer in a single pass.

mod cells;
#[cfg(feature = "csv-export")]
pub mod csv_table;
pub mod report;
pub mod scroll;
pub mod source_array;

#[cfg(feature = "csv-export")]
pub use csv_table::CsvRenderer;
pub use report::write_summary;
pub use scroll::ScrollRenderer;
pub use source_array::SourceArrayRenderer;

use std::io;

use crate::bytestream::{FileHeader, FormatFlags};
use crate::config::{RenderOptions, ScrollConfig};
use crate::decoder::{CommandDecoder, RenderEvent, RunningStats};
use crate::Result;

/// What a renderer knows about the score besides its events.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Name of the input, for banners
    pub source_name: &'a str,
    /// The complete input buffer
    pub buffer: &'a [u8],
    /// File header, if present
    pub header: Option<FileHeader>,
    /// Format flags in effect
    pub format: FormatFlags,
    /// Number of channel columns
    pub display_limit: u8,
    /// Presentation options
    pub options: RenderOptions,
}

impl RenderContext<'_> {
    /// Whether volume columns are shown.
    pub fn show_volume(&self) -> bool {
        self.format.volume_present() && !self.options.ignore_volume
    }

    /// Whether instrument columns are shown.
    pub fn show_instruments(&self) -> bool {
        self.format.instruments_present()
    }

    /// Header bytes at the start of the buffer.
    pub fn header_bytes(&self) -> &[u8] {
        let len = self.header.map_or(0, |h| h.body_offset());
        self.buffer.get(..len).unwrap_or(&[])
    }
}

/// Trait for turning decoded events into some output format
pub trait ScoreRenderer {
    /// Banner and column titles.
    fn write_preamble(&mut self, ctx: &RenderContext<'_>) -> io::Result<()>;

    /// One decoded frame.
    fn write_event(&mut self, ctx: &RenderContext<'_>, event: &RenderEvent) -> io::Result<()>;

    /// Closing lines once the pass completed.
    fn write_epilogue(&mut self, ctx: &RenderContext<'_>, stats: &RunningStats)
        -> io::Result<()>;

    /// Flush buffered output.
    fn flush(&mut self) -> io::Result<()>;
}

/// Decode `buffer` and feed every event to `renderer`.
///
/// On a fatal decode error the rows produced so far are flushed before the
/// error is returned.
pub fn render_score<R: ScoreRenderer + ?Sized>(
    buffer: &[u8],
    source_name: &str,
    config: &ScrollConfig,
    renderer: &mut R,
) -> Result<RunningStats> {
    let mut decoder = CommandDecoder::new(buffer, &config.decode)?;
    let ctx = RenderContext {
        source_name,
        buffer,
        header: decoder.header().copied(),
        format: decoder.format(),
        display_limit: decoder.display_limit(),
        options: config.render,
    };

    renderer.write_preamble(&ctx)?;
    for event in decoder.by_ref() {
        match event {
            Ok(event) => renderer.write_event(&ctx, &event)?,
            Err(err) => {
                renderer.flush()?;
                return Err(err.into());
            }
        }
    }

    let stats = decoder.into_stats();
    renderer.write_epilogue(&ctx, &stats)?;
    renderer.flush()?;
    Ok(stats)
}
