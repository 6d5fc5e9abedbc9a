//! End-of-run summary printed after the scroll.

use std::io::{self, Write};

use crate::bytestream::FormatFlags;
use crate::decoder::RunningStats;

fn plural(count: u64, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Write the human-readable summary of a completed pass.
pub fn write_summary<W: Write + ?Sized>(
    out: &mut W,
    stats: &RunningStats,
    display_limit: u8,
    format: FormatFlags,
) -> io::Result<()> {
    let seconds = stats.total_duration_ms / 1000;
    let millis = stats.total_duration_ms % 1000;
    writeln!(
        out,
        "Duration {seconds}.{millis:03} seconds, {}, {}.",
        plural(u64::from(stats.frames), "row", "rows"),
        plural(u64::from(stats.notes_played), "note", "notes"),
    )?;

    let required = stats.channels_required() as u64;
    writeln!(
        out,
        "At most {} used.",
        plural(required, "tone generator was", "tone generators were")
    )?;

    if stats.notes_skipped_beyond_display_limit > 0 {
        writeln!(
            out,
            "{} not displayed because we were told to show only {}.",
            plural(
                u64::from(stats.notes_skipped_beyond_display_limit),
                "note was",
                "notes were"
            ),
            plural(u64::from(display_limit), "generator", "generators"),
        )?;
    }
    if stats.redundant_note_offs > 0 {
        writeln!(
            out,
            "{} for generators that were not playing.",
            plural(u64::from(stats.redundant_note_offs), "stop was issued", "stops were issued"),
        )?;
    }
    if stats.mergeable_consecutive_delays > 0 {
        writeln!(
            out,
            "{} could have been merged with the one before.",
            plural(u64::from(stats.mergeable_consecutive_delays), "delay", "delays"),
        )?;
    }
    if stats.repeat_markers > 0 {
        writeln!(
            out,
            "{} skipped.",
            plural(u64::from(stats.repeat_markers), "repeat marker was", "repeat markers were"),
        )?;
    }
    if format.volume_present() {
        if let (Some(min), Some(max)) = (stats.volume_min, stats.volume_max) {
            writeln!(out, "Volumes range from {min} to {max}.")?;
        }
    }
    if format.instruments_present() {
        for (instrument, count) in stats.instruments_used() {
            writeln!(
                out,
                "  instrument {:3} {:<28} {}",
                instrument.value(),
                instrument.name(),
                plural(u64::from(count), "note", "notes")
            )?;
        }
    }
    if stats.missing_end_marker {
        writeln!(out, "The bytestream has no end-of-score command.")?;
    }
    Ok(())
}
