//! Runtime configuration via `factgraph.toml`
//!
//! The config file selects an optional recording to replay and optional
//! upstream settings that are handed through to resources. Both sections may
//! be omitted; an empty file is a valid config.

use crate::recording::RecordingStore;
use factgraph_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "factgraph.toml";

/// Recording to replay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingConfig {
    /// Path of the recording JSON file
    pub path: PathBuf,
    /// Asset to replay; the first asset when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

/// Upstream platform settings passed to resources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpstreamConfig {
    /// API endpoint
    pub api_endpoint: String,
    /// Space the scan reports into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_mrn: Option<String>,
    /// Do not report results upstream
    #[serde(default)]
    pub incognito: bool,
}

/// Configuration loaded from `factgraph.toml`.
///
/// # Example
///
/// ```toml
/// [recording]
/// path = "recording.json"
/// asset = "//assets/web01"
///
/// [upstream]
/// api_endpoint = "https://api.example.com"
/// incognito = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GraphConfig {
    /// Recording to replay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<RecordingConfig>,
    /// Upstream settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<UpstreamConfig>,
}

impl GraphConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# factgraph runtime configuration
#
# Replay a recording instead of (or before) computing live.
# Recorded fields always win over live computation; anything the
# recording does not hold is computed through the connection.
# [recording]
# path = "recording.json"
# asset = "//assets/web01"     # optional, default: first asset

# Upstream settings handed through to resources.
# [upstream]
# api_endpoint = "https://api.example.com"
# space_mrn = "//spaces/example"  # optional
# incognito = false
"#
    }

    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {e}")))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Load the configured recording, if any.
    ///
    /// A relative recording path is taken as is, i.e. relative to the
    /// working directory.
    pub fn recording_store(&self) -> Result<Option<RecordingStore>> {
        match &self.recording {
            Some(rec) => RecordingStore::from_file(&rec.path, rec.asset.as_deref()).map(Some),
            None => Ok(None),
        }
    }
}
