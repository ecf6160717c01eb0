//! Node Configuration
//!
//! Loaded once at startup from a JSON file and immutable afterwards.
//! Partition detection defaults to disabled.
//!
//! ```json
//! {
//!   "host_id": 0,
//!   "partition_detection": {
//!     "enabled": true,
//!     "snapshot_path": "/var/faultline/partition",
//!     "snapshot_prefix": "partition_detection"
//!   }
//! }
//! ```

mod errors;

pub use errors::{ConfigError, ConfigErrorKind, ConfigResult};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::membership::HostId;

/// Partition detection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionDetectionConfig {
    /// Whether the partition policy is applied at all
    #[serde(default)]
    pub enabled: bool,

    /// Directory receiving the snapshot taken on the losing side of a split
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// File name prefix of that snapshot
    #[serde(default = "default_snapshot_prefix")]
    pub snapshot_prefix: String,
}

fn default_snapshot_prefix() -> String {
    "partition_detection".to_string()
}

impl Default for PartitionDetectionConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl PartitionDetectionConfig {
    /// Partition detection off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            snapshot_path: None,
            snapshot_prefix: default_snapshot_prefix(),
        }
    }

    /// Partition detection on, snapshotting into `snapshot_path`.
    pub fn enabled(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            snapshot_path: Some(snapshot_path.into()),
            snapshot_prefix: default_snapshot_prefix(),
        }
    }

    /// Validate the settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.snapshot_prefix.trim().is_empty() {
            return Err(ConfigError::invalid(
                "partition_detection.snapshot_prefix must not be empty",
            ));
        }
        if !self.enabled {
            return Ok(());
        }
        match &self.snapshot_path {
            Some(path) if !path.as_os_str().is_empty() => Ok(()),
            _ => Err(ConfigError::invalid(
                "partition_detection.snapshot_path is required when partition detection is enabled",
            )),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultConfig {
    /// Id of the local host, used in logs
    #[serde(default)]
    pub host_id: Option<HostId>,

    /// Partition detection settings
    #[serde(default)]
    pub partition_detection: PartitionDetectionConfig,
}

impl FaultConfig {
    /// Load and validate configuration from `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::unreadable(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: FaultConfig = serde_json::from_str(content)
            .map_err(|e| ConfigError::malformed(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.partition_detection.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_is_disabled() {
        let config = FaultConfig::from_json("{}").unwrap();
        assert!(!config.partition_detection.enabled);
        assert_eq!(config.partition_detection.snapshot_prefix, "partition_detection");
        assert_eq!(config.host_id, None);
    }

    #[test]
    fn test_full_config() {
        let config = FaultConfig::from_json(
            r#"{
                "host_id": 3,
                "partition_detection": {
                    "enabled": true,
                    "snapshot_path": "/var/faultline/ppd",
                    "snapshot_prefix": "ppd"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.host_id, Some(HostId(3)));
        assert!(config.partition_detection.enabled);
        assert_eq!(
            config.partition_detection.snapshot_path.as_deref(),
            Some(Path::new("/var/faultline/ppd"))
        );
        assert_eq!(config.partition_detection.snapshot_prefix, "ppd");
    }

    #[test]
    fn test_enabled_requires_snapshot_path() {
        let err = FaultConfig::from_json(r#"{"partition_detection": {"enabled": true}}"#)
            .unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::Invalid);
        assert!(err.to_string().starts_with("FAULTLINE_CONFIG_INVALID"));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let err = FaultConfig::from_json(
            r#"{"partition_detection": {"enabled": false, "snapshot_prefix": " "}}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::Invalid);
    }

    #[test]
    fn test_malformed_json() {
        let err = FaultConfig::from_json("{ host_id: ").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::Malformed);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faultline.json");
        fs::write(&path, r#"{"host_id": 1}"#).unwrap();

        let config = FaultConfig::load(&path).unwrap();
        assert_eq!(config.host_id, Some(HostId(1)));

        let err = FaultConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::Unreadable);
    }

    #[test]
    fn test_constructors_validate() {
        assert!(PartitionDetectionConfig::disabled().validate().is_ok());
        assert!(PartitionDetectionConfig::enabled("/tmp/ppd").validate().is_ok());
    }
}
