//! Playtune Bytestream Format
//!
//! Low-level reading of the Playtune encoding:
//! - Byte cursor with exact offsets for diagnostics
//! - Optional `Pt` file header and its format flags
//! - Command classification by leading byte

pub mod command;
pub mod cursor;
pub mod header;

pub use command::Command;
pub use cursor::{ByteCursor, EndOfBuffer};
pub use header::{FileHeader, FormatFlags, HeaderSniffer, HEADER_MAGIC};
