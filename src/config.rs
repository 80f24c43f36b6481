use crate::error::{EngineError, Result};
use crate::streaming_parser::StreamingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_BATCH_CHUNK_SIZE: usize = 10_000;
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 2_500;
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Tunables for the file drivers.
///
/// None of these change which records are produced, only how the work is cut up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lines per internal chunk in the full-file loader
    pub batch_chunk_size: usize,
    /// Records per callback in the streaming driver
    pub stream_chunk_size: usize,
    /// Read buffer size in bytes
    pub read_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_chunk_size: DEFAULT_BATCH_CHUNK_SIZE,
            stream_chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        let config: EngineConfig =
            serde_json::from_str(&text).map_err(|e| EngineError::config(path, e.to_string()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let checks = [
            ("batch_chunk_size", self.batch_chunk_size),
            ("stream_chunk_size", self.stream_chunk_size),
            ("read_buffer_size", self.read_buffer_size),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(EngineError::config(path, format!("{} must be at least 1", name)));
            }
        }
        Ok(())
    }

    /// Streaming settings derived from this config
    pub fn streaming_config(&self) -> StreamingConfig {
        StreamingConfig {
            chunk_size: self.stream_chunk_size,
            buffer_size: self.read_buffer_size,
            ..StreamingConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stream_chunk_size": 500}}"#).unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.stream_chunk_size, 500);
        assert_eq!(config.batch_chunk_size, DEFAULT_BATCH_CHUNK_SIZE);
        assert_eq!(config.streaming_config().chunk_size, 500);
    }

    #[test]
    fn test_zero_chunk_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"batch_chunk_size": 0}}"#).unwrap();

        let err = EngineConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "chunk = 3").unwrap();

        let err = EngineConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::from_json_file("/nonexistent/logcat-engine.json").unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
