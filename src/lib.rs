//! Playtune Bytestream Decoder
//!
//! Decodes the compact command stream produced by the miditones MIDI
//! converter for the Arduino Playtune library, and renders it as a
//! human-readable "scroll": one row per delay, showing what every tone
//! generator plays during that stretch of time.
//!
//! # Features
//! - Optional `Pt` file header with volume, instrument and percussion flags
//! - Note names, General MIDI percussion and instrument names
//! - Recoverable anomalies (redundant note-offs, mergeable delays) reported
//!   inline, fatal errors with a hex dump around the offending byte
//! - Scroll, source-array and CSV renderers
//! - Running statistics, exportable as JSON
//!
//! # Crate feature flags
//! - `cli` (default): the `playtune-scroll` command line tool
//! - `csv-export` (default): CSV renderer (enables the optional `csv` dep)
//!
//! # Quick start
//! ```no_run
//! use playtune::{decode, DecodeOptions};
//! let data = std::fs::read("tune.bin").unwrap();
//! let score = decode(&data, &DecodeOptions::default()).unwrap();
//! for event in &score.events {
//!     println!("{} ms: {:?}", event.elapsed_time_ms, event.channels[0].note);
//! }
//! println!("{} tone generators needed", score.stats.channels_required());
//! ```
//!
//! ## Rendering a scroll
//! ```no_run
//! use playtune::render::{render_score, ScrollRenderer};
//! use playtune::ScrollConfig;
//! let data = std::fs::read("tune.bin").unwrap();
//! let mut renderer = ScrollRenderer::new(std::io::stdout());
//! render_score(&data, "tune.bin", &ScrollConfig::default(), &mut renderer).unwrap();
//! ```

#![warn(missing_docs)]

pub mod bytestream; // Wire Format
pub mod config; // Options
pub mod decoder; // Decode Engine
pub mod error; // Decode Faults
pub mod loader; // File I/O
pub mod render; // Output
pub mod tables; // Name Tables

/// Crate version, shown in generated banners.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for Playtune decoding and rendering
#[derive(thiserror::Error, Debug)]
pub enum PlaytuneError {
    /// Fatal fault in the bytestream
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// IO error from filesystem or output sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer failure
    #[cfg(feature = "csv-export")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl PlaytuneError {
    /// The decode fault behind this error, if any.
    pub fn as_decode(&self) -> Option<&DecodeError> {
        match self {
            PlaytuneError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<String> for PlaytuneError {
    /// Converts a String into `PlaytuneError::Other`.
    ///
    /// Prefer `ConfigError` where the kind of failure is known.
    fn from(msg: String) -> Self {
        PlaytuneError::Other(msg)
    }
}

impl From<&str> for PlaytuneError {
    /// Converts a string slice into `PlaytuneError::Other`.
    fn from(msg: &str) -> Self {
        PlaytuneError::Other(msg.to_string())
    }
}

/// Result type for decoding and rendering
pub type Result<T> = std::result::Result<T, PlaytuneError>;

// Public API exports
pub use bytestream::{Command, FileHeader, FormatFlags, HeaderSniffer};
pub use config::{DecodeOptions, OutputFormat, RenderOptions, ScrollConfig};
pub use decoder::{
    decode, Anomaly, Channel, CommandDecoder, DecodedScore, EventKind, RenderEvent,
    RunningStats,
};
pub use error::{DecodeError, FaultContext};
pub use loader::{load_file, ScoreLoader};
pub use render::{render_score, ScoreRenderer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_converts() {
        let err = decode(&[0xD5], &DecodeOptions::default()).unwrap_err();
        assert_eq!(err.as_decode().map(DecodeError::offset), Some(0));
        assert!(err.to_string().starts_with("unknown command 0xD5"));
    }

    #[test]
    fn test_string_conversions() {
        let err: PlaytuneError = "boom".into();
        assert!(matches!(err, PlaytuneError::Other(ref m) if m == "boom"));
        assert!(PlaytuneError::from(String::from("x")).as_decode().is_none());
    }
}
