//! Run configuration.
//!
//! Settings come from an optional YAML file and from the command line, the
//! latter taking precedence. Both are collected as [`BackupConfigLayer`]s,
//! merged, and turned into one validated, immutable [`BackupConfig`].

use bon::Builder;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fs::File;
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

use crate::backup::generation::DEFAULT_NAME_WIDTH;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::validate::validate_index_fits_width;

fn default_name_width() -> u8 {
    DEFAULT_NAME_WIDTH
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters, CopyGetters)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = validate_retention_fits_width))]
pub struct BackupConfig {
    /// Directory to back up
    #[builder(into)]
    #[getset(get = "pub")]
    source: PathBuf,
    /// Backup root holding the generation directories
    #[builder(into)]
    #[getset(get = "pub")]
    destination: PathBuf,
    /// Number of generations to keep, the new one included
    #[validate(range(min = 1))]
    #[getset(get_copy = "pub")]
    retention_count: u32,
    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    dry_run: bool,
    /// Digits in the generation suffix
    #[serde(default = "default_name_width")]
    #[builder(default = DEFAULT_NAME_WIDTH)]
    #[validate(range(min = 1, max = 9))]
    #[getset(get_copy = "pub")]
    name_width: u8,
    /// Sync executable, `rsync` from `PATH` when unset
    #[builder(into)]
    #[getset(get = "pub")]
    sync_binary: Option<PathBuf>,
}

fn validate_retention_fits_width(
    config: &BackupConfig,
) -> std::result::Result<(), ValidationError> {
    validate_index_fits_width(config.retention_count, config.name_width)
}

/// One source of settings, every field optional.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, Builder, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BackupConfigLayer {
    #[builder(into)]
    pub source: Option<PathBuf>,
    #[builder(into)]
    pub destination: Option<PathBuf>,
    pub retention_count: Option<u32>,
    pub dry_run: Option<bool>,
    pub name_width: Option<u8>,
    #[builder(into)]
    pub sync_binary: Option<PathBuf>,
}

impl BackupConfigLayer {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        File::open(path)
            .map_err(Error::from)
            .and_then(|f| serde_yml::from_reader::<_, Self>(f).map_err(Error::from))
            .with_msg(format!("Parse YAML config failed: {:?}", path))
    }

    /// Values set in `other` win over values set in `self`.
    pub fn merge(self, other: BackupConfigLayer) -> BackupConfigLayer {
        BackupConfigLayer {
            source: other.source.or(self.source),
            destination: other.destination.or(self.destination),
            retention_count: other.retention_count.or(self.retention_count),
            dry_run: other.dry_run.or(self.dry_run),
            name_width: other.name_width.or(self.name_width),
            sync_binary: other.sync_binary.or(self.sync_binary),
        }
    }

    pub fn into_config(self) -> Result<BackupConfig> {
        let config = BackupConfig::builder()
            .source(self.source.ok_or(Error::MissingSetting("source"))?)
            .destination(self.destination.ok_or(Error::MissingSetting("destination"))?)
            .retention_count(
                self.retention_count
                    .ok_or(Error::MissingSetting("retention_count"))?,
            )
            .dry_run(self.dry_run.unwrap_or_default())
            .name_width(self.name_width.unwrap_or(DEFAULT_NAME_WIDTH))
            .maybe_sync_binary(self.sync_binary)
            .build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layer() -> BackupConfigLayer {
        BackupConfigLayer::builder()
            .source("/data/src")
            .destination("/backup")
            .retention_count(3)
            .build()
    }

    #[test]
    fn test_into_config_applies_defaults() {
        let config = layer().into_config().unwrap();
        assert_eq!(config.source(), &PathBuf::from("/data/src"));
        assert_eq!(config.retention_count(), 3);
        assert!(!config.dry_run());
        assert_eq!(config.name_width(), 3);
        assert_eq!(config.sync_binary(), &None);
    }

    #[test]
    fn test_missing_required_setting() {
        let layer = BackupConfigLayer {
            destination: None,
            ..layer()
        };
        match layer.into_config() {
            Err(Error::MissingSetting(name)) => assert_eq!(name, "destination"),
            other => panic!("Expected MissingSetting, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_retention_rejected() {
        let layer = BackupConfigLayer {
            retention_count: Some(0),
            ..layer()
        };
        assert!(matches!(
            layer.into_config(),
            Err(Error::ValidationError(_))
        ));
    }

    #[test]
    fn test_retention_must_fit_name_width() {
        let too_big = BackupConfigLayer {
            retention_count: Some(10),
            name_width: Some(1),
            ..layer()
        };
        assert!(matches!(
            too_big.into_config(),
            Err(Error::ValidationError(_))
        ));

        let fits = BackupConfigLayer {
            retention_count: Some(9),
            name_width: Some(1),
            ..layer()
        };
        assert!(fits.into_config().is_ok());
    }

    #[test]
    fn test_merge_prefers_later_layer() {
        let file = layer();
        let cli = BackupConfigLayer::builder()
            .retention_count(7)
            .dry_run(true)
            .build();

        let merged = file.merge(cli);
        assert_eq!(merged.retention_count, Some(7));
        assert_eq!(merged.dry_run, Some(true));
        assert_eq!(merged.source, Some(PathBuf::from("/data/src")));
    }

    #[test]
    fn test_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        std::fs::write(
            &path,
            "source: /data/src\ndestination: /backup\nretention_count: 5\nsync_binary: /usr/bin/rsync\n",
        )
        .unwrap();

        let layer = BackupConfigLayer::from_yaml_file(&path).unwrap();
        assert_eq!(layer.retention_count, Some(5));
        assert_eq!(layer.sync_binary, Some(PathBuf::from("/usr/bin/rsync")));
        assert_eq!(layer.dry_run, None);
    }

    #[test]
    fn test_from_yaml_file_rejects_unknown_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        std::fs::write(&path, "source: /data/src\ncompressor: xz\n").unwrap();

        let err = BackupConfigLayer::from_yaml_file(&path).unwrap_err();
        assert!(err.to_string().contains("Parse YAML config failed"));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: BackupConfig = serde_yml::from_str(
            "source: /data/src\ndestination: /backup\nretention_count: 2\n",
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.name_width(), DEFAULT_NAME_WIDTH);
    }
}
