//! Row formatting shared by the scroll and source-array renderers.

use std::fmt::Write as _;

use super::RenderContext;
use crate::decoder::{Channel, RenderEvent};

/// Width of the note part of a channel cell.
const NOTE_WIDTH: usize = 6;
/// Width of the optional volume part.
const VOLUME_WIDTH: usize = 5;
/// Width of the optional instrument part.
const INSTRUMENT_WIDTH: usize = 6;

/// How each channel cell is laid out for one pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CellLayout {
    volume: bool,
    instruments: bool,
    hex: bool,
    percussion: bool,
    columns: usize,
}

impl CellLayout {
    pub(crate) fn new(ctx: &RenderContext<'_>) -> Self {
        Self {
            volume: ctx.show_volume(),
            instruments: ctx.show_instruments(),
            hex: ctx.options.show_hex,
            percussion: ctx.format.percussion_present(),
            columns: usize::from(ctx.display_limit),
        }
    }

    fn width(&self) -> usize {
        let mut width = NOTE_WIDTH;
        if self.volume {
            width += VOLUME_WIDTH;
        }
        if self.instruments {
            width += INSTRUMENT_WIDTH;
        }
        width
    }

    /// `duration        time  gen0  gen1 ...`
    pub(crate) fn title(&self) -> String {
        let mut line = format!("{:>8} {:>11} ", "duration", "time");
        for column in 0..self.columns {
            let _ = write!(line, " {:<w$}", format!("gen{column}"), w = self.width() - 1);
        }
        line.push_str("        bytestream code");
        line
    }

    /// Delay, elapsed time and every displayed channel.
    pub(crate) fn status(&self, event: &RenderEvent) -> String {
        let mut line = format!(
            "{:>8} {:>7}.{:03} ",
            event.delay_ms,
            event.elapsed_time_ms / 1000,
            event.elapsed_time_ms % 1000
        );
        for channel in event.channels.iter().take(self.columns) {
            self.push_cell(&mut line, channel);
        }
        line
    }

    /// Text for the note of one channel (empty when silent).
    pub(crate) fn note_text(&self, channel: &Channel) -> String {
        match channel.note {
            Some(note) if self.hex => format!("{:02X}", note.0),
            Some(note) => note.label(self.percussion).unwrap_or("?").to_string(),
            None if channel.just_stopped => "-".to_string(),
            None => String::new(),
        }
    }

    fn push_cell(&self, line: &mut String, channel: &Channel) {
        let _ = write!(line, "{:>w$}", self.note_text(channel), w = NOTE_WIDTH);
        if self.volume {
            match (channel.note, channel.volume) {
                (Some(_), Some(volume)) => {
                    let _ = write!(line, " v{volume:<3}");
                }
                _ => line.push_str(&" ".repeat(VOLUME_WIDTH)),
            }
        }
        if self.instruments {
            if channel.is_sounding() || channel.instrument_dirty {
                let marker = if channel.instrument_dirty { '*' } else { ' ' };
                let _ = write!(line, " i{:<3}{marker}", channel.instrument.value());
            } else {
                line.push_str(&" ".repeat(INSTRUMENT_WIDTH));
            }
        }
    }
}
