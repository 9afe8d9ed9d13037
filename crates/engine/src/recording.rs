//! Recordings: read-only snapshots of previously gathered resources
//!
//! A recording file holds, per asset, every resource that was touched during a
//! previous scan with the fields that were computed for it:
//!
//! ```json
//! {
//!   "assets": [{
//!     "asset": {"id": "//assets/web01", "name": "web01"},
//!     "connections": [{"url": "local://", "provider": "network", "connector": "local"}],
//!     "resources": [
//!       {"Resource": "url", "ID": "https://example.com:443/", "Fields": {
//!         "host": {"type": "string", "value": "example.com"}
//!       }}
//!     ]
//!   }]
//! }
//! ```
//!
//! [`RecordingStore`] indexes one asset of such a file by `(type, id)`. It is
//! loaded once and never written; producing recordings is not this crate's job.

use crate::resource::Args;
use factgraph_core::{Error, RawData, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

/// On-disk recording
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingFile {
    /// Recorded assets
    #[serde(default)]
    pub assets: Vec<AssetRecording>,
}

/// Everything recorded for one asset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRecording {
    /// Asset identity
    pub asset: AssetInfo,
    /// Connections used to scan the asset
    #[serde(default)]
    pub connections: Vec<ConnectionInfo>,
    /// Recorded resources
    #[serde(default)]
    pub resources: Vec<ResourceRecording>,
}

/// Asset identity in a recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Asset ID
    #[serde(default)]
    pub id: String,
    /// Platform IDs of the asset
    #[serde(rename = "platformIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub platform_ids: Vec<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Platform labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Connection used during recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Target URL
    #[serde(default)]
    pub url: String,
    /// Provider that served the connection
    #[serde(rename = "provider", default)]
    pub provider_id: String,
    /// Connector name
    #[serde(default)]
    pub connector: String,
    /// Provider version
    #[serde(default)]
    pub version: String,
}

/// One recorded resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecording {
    /// Type name
    #[serde(rename = "Resource")]
    pub resource: String,
    /// Resource ID
    #[serde(rename = "ID")]
    pub id: String,
    /// Recorded fields
    #[serde(rename = "Fields", default)]
    pub fields: BTreeMap<String, RawData>,
}

impl RecordingFile {
    /// Load a recording file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Recording(format!(
                    "failed to load recording: '{}' does not exist",
                    path.display()
                ))
            } else {
                Error::Recording(format!(
                    "failed to access recording in '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;
        Self::from_json(&content).map_err(|e| match e {
            Error::Recording(msg) => Error::Recording(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse a recording from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Recording(format!("failed to parse recording: {e}")))
    }

    /// Find an asset by ID, or the first asset when `id` is `None`
    pub fn asset(&self, id: Option<&str>) -> Option<&AssetRecording> {
        match id {
            Some(id) => self
                .assets
                .iter()
                .find(|a| a.asset.id == id || a.asset.platform_ids.iter().any(|p| p == id)),
            None => self.assets.first(),
        }
    }
}

/// Indexed, read-only view of one recorded asset
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    asset: AssetInfo,
    resources: HashMap<(String, String), Args>,
}

impl RecordingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one asset of a recording
    pub fn from_asset(recording: &AssetRecording) -> Self {
        let mut store = RecordingStore {
            asset: recording.asset.clone(),
            resources: HashMap::with_capacity(recording.resources.len()),
        };
        for entry in &recording.resources {
            store
                .resources
                .entry((entry.resource.clone(), entry.id.clone()))
                .or_default()
                .extend(entry.fields.clone());
        }
        store
    }

    /// Load a recording file and index the requested asset.
    ///
    /// With `asset_id` set to `None`, the first asset is used.
    pub fn from_file(path: &Path, asset_id: Option<&str>) -> Result<Self> {
        let file = RecordingFile::load(path)?;
        let asset = file.asset(asset_id).ok_or_else(|| match asset_id {
            Some(id) => Error::Recording(format!(
                "asset '{}' not found in recording '{}'",
                id,
                path.display()
            )),
            None => Error::Recording(format!("recording '{}' has no assets", path.display())),
        })?;
        let store = Self::from_asset(asset);
        info!(
            target: "factgraph::recording",
            path = %path.display(),
            asset = %store.asset.id,
            resources = store.len(),
            "Recording loaded"
        );
        Ok(store)
    }

    /// Record a field value (builder style, for tests and fixtures)
    pub fn with_field(
        mut self,
        resource: impl Into<String>,
        id: impl Into<String>,
        field: impl Into<String>,
        value: RawData,
    ) -> Self {
        self.resources
            .entry((resource.into(), id.into()))
            .or_default()
            .insert(field.into(), value);
        self
    }

    /// Record a resource with no fields (builder style)
    pub fn with_resource(mut self, resource: impl Into<String>, id: impl Into<String>) -> Self {
        self.resources
            .entry((resource.into(), id.into()))
            .or_default();
        self
    }

    /// Recorded asset
    pub fn asset(&self) -> &AssetInfo {
        &self.asset
    }

    /// Recorded value of `resource.field` for `id`.
    ///
    /// A recorded resource without an `id` field answers `id` with its ID.
    pub fn field(&self, resource: &str, id: &str, field: &str) -> Option<RawData> {
        let fields = self.resource(resource, id)?;
        match fields.get(field) {
            Some(raw) => Some(raw.clone()),
            None if field == "id" => Some(RawData::string(id)),
            None => None,
        }
    }

    /// Full recorded argument set of `(resource, id)`
    pub fn resource(&self, resource: &str, id: &str) -> Option<&Args> {
        self.resources.get(&(resource.to_string(), id.to_string()))
    }

    /// Number of recorded resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing is recorded
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
