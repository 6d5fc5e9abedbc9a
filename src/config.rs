//! Decode and render options
//!
//! Options can come from a JSON file and are then overridden by command line
//! flags. Every field has a default so partial files are accepted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bytestream::{FileHeader, FormatFlags};
use crate::decoder::MAX_CHANNELS;
use crate::{PlaytuneError, Result};

/// Channels displayed when neither the caller nor the header says otherwise.
pub const DEFAULT_DISPLAY_LIMIT: u8 = 6;

/// Options that affect how the bytestream is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Number of channels to display (1..=16); `None` defers to the header
    pub display_limit: Option<u8>,
    /// Note-on commands carry a volume byte (headerless files only)
    pub expect_volume: bool,
    /// Notes 128..=255 are percussion (headerless files only)
    pub percussion: bool,
    /// The score uses instrument changes (headerless files only)
    pub expect_instruments: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            display_limit: None,
            expect_volume: false,
            percussion: true,
            expect_instruments: false,
        }
    }
}

impl DecodeOptions {
    /// Format flags in effect: the header's when present, else these options.
    pub fn resolve_format(&self, header: Option<&FileHeader>) -> FormatFlags {
        if let Some(header) = header {
            return header.flags;
        }
        let mut flags = FormatFlags::empty();
        flags.set(FormatFlags::VOLUME, self.expect_volume);
        flags.set(FormatFlags::PERCUSSION, self.percussion);
        flags.set(FormatFlags::INSTRUMENTS, self.expect_instruments);
        flags
    }

    /// Channels to display: explicit option, then header hint, then the default.
    pub fn resolve_display_limit(&self, header: Option<&FileHeader>) -> u8 {
        let hinted = header
            .map(|h| h.declared_channel_count)
            .filter(|&count| count >= 1);
        self.display_limit
            .or(hinted)
            .unwrap_or(DEFAULT_DISPLAY_LIMIT)
            .clamp(1, MAX_CHANNELS as u8)
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.display_limit {
            if limit == 0 || usize::from(limit) > MAX_CHANNELS {
                return Err(PlaytuneError::ConfigError(format!(
                    "display limit {limit} is outside 1..={MAX_CHANNELS}"
                )));
            }
        }
        Ok(())
    }
}

/// Output flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable scroll
    #[default]
    Scroll,
    /// Annotated source-code array
    SourceArray,
    /// One CSV record per event
    Csv,
}

/// Options that only affect presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Hide volumes even when the score has them
    pub ignore_volume: bool,
    /// Show note numbers in hex instead of names
    pub show_hex: bool,
    /// Include the raw bytestream column
    pub show_raw_bytes: bool,
    /// Output flavour
    pub format: OutputFormat,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ignore_volume: false,
            show_hex: false,
            show_raw_bytes: true,
            format: OutputFormat::Scroll,
        }
    }
}

impl RenderOptions {
    /// Whether the output is a source array.
    pub fn emit_as_source_array(&self) -> bool {
        self.format == OutputFormat::SourceArray
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Decoding options
    pub decode: DecodeOptions,
    /// Presentation options
    pub render: RenderOptions,
}

impl ScrollConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ScrollConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            PlaytuneError::ConfigError(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        self.decode.validate()
    }
}
