//! Packing options, optionally loaded from a TOML file.
//!
//! ```toml
//! # mseed-pack.toml
//! format_version = "v3"
//! mode = "append"
//! flush = false
//! verbosity = 1
//! ```
//!
//! Missing keys keep their defaults: miniSEED v2, overwrite, flush, quiet.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::types::FormatVersion;
use crate::writer::{WriteMode, WriterOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackOptions {
    /// Wire format of the records written. v2 start times keep microseconds
    /// (blockette 1001); only v3 keeps nanoseconds.
    pub format_version: FormatVersion,
    pub mode: WriteMode,
    /// Sync the output file before returning.
    pub flush: bool,
    pub verbosity: u8,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            format_version: FormatVersion::V2,
            mode: WriteMode::Overwrite,
            flush: true,
            verbosity: 0,
        }
    }
}

impl PackOptions {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            flush: self.flush,
            verbosity: self.verbosity,
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            format_version = "v3"
            mode = "append"
            flush = false
            verbosity = 2
        "#;
        let options = PackOptions::from_toml_str(toml).unwrap();
        assert_eq!(options.format_version, FormatVersion::V3);
        assert_eq!(options.mode, WriteMode::Append);
        assert!(!options.flush);
        assert_eq!(options.verbosity, 2);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let options = PackOptions::from_toml_str("").unwrap();
        assert_eq!(options, PackOptions::default());
        assert_eq!(options.writer_options(), WriterOptions::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            PackOptions::from_toml_str("compression = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(PackOptions::from_toml_str(r#"format_version = "v4""#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mseed-pack.toml");
        std::fs::write(&path, "verbosity = 1\n").unwrap();
        assert_eq!(PackOptions::from_file(&path).unwrap().verbosity, 1);

        let missing = dir.path().join("missing.toml");
        let err = PackOptions::from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }
}
