//! Score File Loader
//!
//! Reads a bytestream file from disk. A path without an extension that does
//! not exist is retried with `.bin` appended, which is what miditones writes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::Result;

/// Extension used by the converter for binary bytestream files.
pub const DEFAULT_EXTENSION: &str = "bin";

/// A bytestream read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedScore {
    /// Path that was actually read
    pub path: PathBuf,
    /// Raw file contents
    pub data: Vec<u8>,
}

impl LoadedScore {
    /// File name for banners, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Loads bytestream files from disk
pub struct ScoreLoader;

impl ScoreLoader {
    /// Load a bytestream file, trying `<path>.bin` when `path` has no extension.
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedScore> {
        let path = Self::resolve(path.as_ref());
        let data = fs::read(&path)
            .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;
        debug!(path = %path.display(), bytes = data.len(), "loaded bytestream");
        Ok(LoadedScore { path, data })
    }

    /// The path that [`ScoreLoader::load`] will read.
    pub fn resolve(path: &Path) -> PathBuf {
        if path.extension().is_none() && !path.exists() {
            let fallback = path.with_extension(DEFAULT_EXTENSION);
            if fallback.exists() {
                return fallback;
            }
        }
        path.to_path_buf()
    }
}

/// Convenience function to load a bytestream file from disk
pub fn load_file(path: impl AsRef<Path>) -> Result<LoadedScore> {
    ScoreLoader::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlaytuneError;

    #[test]
    fn test_load_with_bin_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tune.bin");
        fs::write(&file, [0x90, 0x3C, 0xF0]).unwrap();

        let loaded = ScoreLoader::load(dir.path().join("tune")).unwrap();
        assert_eq!(loaded.path, file);
        assert_eq!(loaded.data, vec![0x90, 0x3C, 0xF0]);
        assert_eq!(loaded.display_name(), "tune.bin");
    }

    #[test]
    fn test_exact_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("tune");
        fs::write(&bare, [0xF0]).unwrap();
        fs::write(dir.path().join("tune.bin"), [0x00, 0x01, 0xF0]).unwrap();

        assert_eq!(load_file(&bare).unwrap().data, vec![0xF0]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScoreLoader::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, PlaytuneError::Other(ref m) if m.starts_with("Failed to read file")));
    }
}
