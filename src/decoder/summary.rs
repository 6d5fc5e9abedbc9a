//! Running statistics for one decode pass.

use serde::{Serialize, Serializer};

use super::channel_bank::{InstrumentId, MAX_CHANNELS};
use super::event::{Anomaly, RenderEvent};

/// Number of entries in the instrument histogram.
pub const INSTRUMENT_COUNT: usize = 128;

/// Counters collected over a whole pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunningStats {
    /// Highest channel index referenced by any command
    pub max_channel_seen: Option<u8>,
    /// Note-ons on channels at or above the display limit
    pub notes_skipped_beyond_display_limit: u32,
    /// Note-offs on channels that were already silent
    pub redundant_note_offs: u32,
    /// Delays directly following another delay
    pub mergeable_consecutive_delays: u32,
    /// Note-ons per instrument
    #[serde(serialize_with = "serialize_histogram")]
    pub instrument_use_count: [u32; INSTRUMENT_COUNT],
    /// Lowest note-on volume
    pub volume_min: Option<u8>,
    /// Highest note-on volume
    pub volume_max: Option<u8>,
    /// Bitmap of channels that played at least one note
    pub channels_used: u16,
    /// Total note-on commands
    pub notes_played: u32,
    /// Repeat markers skipped
    pub repeat_markers: u32,
    /// Events emitted, including the final one
    pub frames: u32,
    /// Sum of all delays in milliseconds
    pub total_duration_ms: u64,
    /// The score ended without an end-of-score command
    pub missing_end_marker: bool,
}

impl RunningStats {
    /// Tone generators a player needs for this score (highest index + 1).
    pub fn channels_required(&self) -> usize {
        self.max_channel_seen.map_or(0, |max| usize::from(max) + 1)
    }

    /// Number of distinct channels that played a note.
    pub fn channels_used_count(&self) -> u32 {
        self.channels_used.count_ones()
    }

    /// Instruments with at least one note, with their note counts.
    pub fn instruments_used(&self) -> impl Iterator<Item = (InstrumentId, u32)> + '_ {
        self.instrument_use_count
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(id, &count)| (InstrumentId::new(id as u8), count))
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for RunningStats {
    fn default() -> Self {
        Self {
            max_channel_seen: None,
            notes_skipped_beyond_display_limit: 0,
            redundant_note_offs: 0,
            mergeable_consecutive_delays: 0,
            instrument_use_count: [0; INSTRUMENT_COUNT],
            volume_min: None,
            volume_max: None,
            channels_used: 0,
            notes_played: 0,
            repeat_markers: 0,
            frames: 0,
            total_duration_ms: 0,
            missing_end_marker: false,
        }
    }
}

fn serialize_histogram<S: Serializer>(
    counts: &[u32; INSTRUMENT_COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(counts.iter())
}

/// Accumulates [`RunningStats`] from decoder callbacks and emitted events.
#[derive(Debug, Clone)]
pub struct SummaryCollector {
    stats: RunningStats,
    display_limit: usize,
}

impl SummaryCollector {
    /// Collector for a pass that displays `display_limit` channels.
    pub fn new(display_limit: u8) -> Self {
        Self {
            stats: RunningStats::default(),
            display_limit: usize::from(display_limit).min(MAX_CHANNELS),
        }
    }

    /// A note or instrument command addressed `channel`.
    pub fn record_channel(&mut self, channel: u8) {
        let max = self.stats.max_channel_seen.get_or_insert(channel);
        *max = (*max).max(channel);
    }

    /// A note started.
    pub fn record_note_on(&mut self, channel: u8, instrument: InstrumentId, volume: Option<u8>) {
        let stats = &mut self.stats;
        stats.notes_played += 1;
        stats.channels_used |= 1u16 << (channel & 0x0F);
        if let Some(count) = stats
            .instrument_use_count
            .get_mut(usize::from(instrument.value()))
        {
            *count += 1;
        }
        if let Some(volume) = volume {
            stats.volume_min = Some(stats.volume_min.map_or(volume, |v| v.min(volume)));
            stats.volume_max = Some(stats.volume_max.map_or(volume, |v| v.max(volume)));
        }
        if usize::from(channel) >= self.display_limit {
            stats.notes_skipped_beyond_display_limit += 1;
        }
    }

    /// A repeat marker was skipped.
    pub fn record_repeat(&mut self) {
        self.stats.repeat_markers += 1;
    }

    /// An event was emitted.
    pub fn record_event(&mut self, event: &RenderEvent) {
        let stats = &mut self.stats;
        stats.frames += 1;
        stats.total_duration_ms += u64::from(event.delay_ms);
        for anomaly in &event.anomalies {
            match anomaly {
                Anomaly::StopWithoutStart { .. } => stats.redundant_note_offs += 1,
                Anomaly::MergeableDelay { .. } => stats.mergeable_consecutive_delays += 1,
                Anomaly::MissingEndMarker { .. } => stats.missing_end_marker = true,
            }
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    /// Final counters.
    pub fn finish(self) -> RunningStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::channel_bank::Channel;
    use crate::decoder::event::EventKind;

    fn event(delay_ms: u16, anomalies: Vec<Anomaly>) -> RenderEvent {
        RenderEvent {
            kind: EventKind::Delay,
            elapsed_time_ms: 0,
            delay_ms,
            channels: [Channel::default(); MAX_CHANNELS],
            consumed_bytes: 0..2,
            anomalies,
        }
    }

    #[test]
    fn test_max_channel_tracks_highest() {
        let mut collector = SummaryCollector::new(6);
        assert_eq!(collector.stats().channels_required(), 0);
        collector.record_channel(3);
        collector.record_channel(9);
        collector.record_channel(1);
        assert_eq!(collector.stats().max_channel_seen, Some(9));
        assert_eq!(collector.stats().channels_required(), 10);
    }

    #[test]
    fn test_note_on_counters() {
        let mut collector = SummaryCollector::new(2);
        collector.record_note_on(0, InstrumentId::new(5), Some(80));
        collector.record_note_on(1, InstrumentId::new(5), Some(20));
        collector.record_note_on(4, InstrumentId::new(0), Some(127));
        let stats = collector.finish();
        assert_eq!(stats.notes_played, 3);
        assert_eq!(stats.notes_skipped_beyond_display_limit, 1);
        assert_eq!(stats.channels_used, 0b10011);
        assert_eq!(stats.channels_used_count(), 3);
        assert_eq!(stats.volume_min, Some(20));
        assert_eq!(stats.volume_max, Some(127));
        let used: Vec<_> = stats.instruments_used().map(|(id, n)| (id.value(), n)).collect();
        assert_eq!(used, vec![(0, 1), (5, 2)]);
    }

    #[test]
    fn test_events_aggregate_anomalies() {
        let mut collector = SummaryCollector::new(6);
        collector.record_event(&event(10, vec![]));
        collector.record_event(&event(
            5,
            vec![
                Anomaly::MergeableDelay { offset: 2 },
                Anomaly::StopWithoutStart {
                    channel: 0,
                    offset: 1,
                },
            ],
        ));
        let stats = collector.finish();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.total_duration_ms, 15);
        assert_eq!(stats.mergeable_consecutive_delays, 1);
        assert_eq!(stats.redundant_note_offs, 1);
        assert!(!stats.missing_end_marker);
    }

    #[test]
    fn test_json_has_full_histogram() {
        let stats = RunningStats::default();
        let value: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
        assert_eq!(value["instrument_use_count"].as_array().unwrap().len(), 128);
        assert!(value["max_channel_seen"].is_null());
    }
}
