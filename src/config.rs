//! Storage configuration for the summarizer.
//!
//! Values are layered: built-in defaults, an optional JSON file, then
//! `NMI_*` environment variables. The CLI applies its own flags on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BUCKET: &str = "asb.cloud";
pub const DEFAULT_FOLDER: &str = "nmi/";
pub const DEFAULT_REGION: &str = "us-east-2";
pub const DEFAULT_ENDPOINT: &str = "https://s3.us-east-2.amazonaws.com";
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";

/// Where meter files live and where they are staged before parsing.
///
/// Stored on disk as a JSON object; every field is optional:
/// ```json
/// {
///   "bucket": "asb.cloud",
///   "folder": "nmi/",
///   "region": "us-east-2",
///   "endpoint": "https://s3.us-east-2.amazonaws.com",
///   "scratch_dir": "/tmp"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,
    pub folder: String,
    pub region: String,
    pub endpoint: String,
    pub scratch_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            folder: DEFAULT_FOLDER.to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
        }
    }
}

impl StorageConfig {
    /// Loads the config from a JSON file at `path`. Missing fields keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read storage config '{path}'"))?;
        let config: StorageConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid storage config '{path}'"))?;
        Ok(config)
    }

    /// Overrides fields from `NMI_BUCKET`, `NMI_FOLDER`, `NMI_REGION`,
    /// `NMI_ENDPOINT` and `NMI_SCRATCH_DIR` when they are set.
    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("NMI_BUCKET") {
            self.bucket = v;
        }
        if let Some(v) = lookup("NMI_FOLDER") {
            self.folder = v;
        }
        if let Some(v) = lookup("NMI_REGION") {
            self.region = v;
        }
        if let Some(v) = lookup("NMI_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = lookup("NMI_SCRATCH_DIR") {
            self.scratch_dir = PathBuf::from(v);
        }
        self
    }

    /// Object key for a file identifier: the folder prefix followed by the identifier.
    pub fn object_key(&self, file: &str) -> String {
        format!("{}{}", self.folder, file)
    }

    /// Local path the fetched object is written to before parsing.
    ///
    /// Only the final path component of `file` is used, so identifiers such as
    /// `../etc/passwd` stay inside the scratch directory.
    pub fn staging_path(&self, file: &str) -> PathBuf {
        let name = Path::new(file)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "staged.csv".into());
        self.scratch_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;
    use std::fs;

    #[test]
    fn test_defaults_match_deployment() {
        let config = StorageConfig::default();
        assert_eq!(config.bucket, "asb.cloud");
        assert_eq!(config.folder, "nmi/");
        assert_eq!(config.region, "us-east-2");
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_object_key_concatenates_folder() {
        let config = StorageConfig::default();
        assert_eq!(config.object_key("6001234567.csv"), "nmi/6001234567.csv");
    }

    #[test]
    fn test_staging_path_uses_basename() {
        let config = StorageConfig::default();
        assert_eq!(
            config.staging_path("../../etc/meter.csv"),
            PathBuf::from("/tmp/meter.csv")
        );
        assert_eq!(config.staging_path(".."), PathBuf::from("/tmp/staged.csv"));
    }

    #[test]
    fn test_overrides_replace_only_set_fields() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("NMI_BUCKET", "other-bucket"), ("NMI_SCRATCH_DIR", "/var/tmp")]);
        let config = StorageConfig::default()
            .with_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.bucket, "other-bucket");
        assert_eq!(config.scratch_dir, PathBuf::from("/var/tmp"));
        assert_eq!(config.folder, DEFAULT_FOLDER);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_load_partial_json() {
        let path = format!("{}/nmi_summarizer_config_test.json", env::temp_dir().display());
        fs::write(&path, r#"{"folder": "meters/", "region": "ap-southeast-2"}"#).unwrap();

        let config = StorageConfig::load(&path).unwrap();
        assert_eq!(config.folder, "meters/");
        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.bucket, DEFAULT_BUCKET);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(StorageConfig::load("/nonexistent/nmi_config.json").is_err());
    }
}
