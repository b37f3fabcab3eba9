// Merge and import settings
// Loaded from ~/.config/gridmerge/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use gridmerge_engine::{MaterializeOptions, DEFAULT_TABLE_NAME};
use gridmerge_io::filename::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE_BYTES};
use gridmerge_io::ImportOptions;

const DEFAULT_MAX_NAME_RETRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    // Merge
    #[serde(rename = "merge.defaultTableName")]
    pub default_table_name: String,

    #[serde(rename = "merge.maxNameRetries")]
    pub max_name_retries: usize,

    #[serde(rename = "merge.navigateAfterCreate")]
    pub navigate_after_create: bool,

    #[serde(rename = "merge.stagedCreate")]
    pub staged_create: bool,

    // Import
    #[serde(rename = "import.maxFileSizeBytes")]
    pub max_file_size_bytes: u64,

    #[serde(rename = "import.allowedExtensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            default_table_name: DEFAULT_TABLE_NAME.to_string(),
            max_name_retries: DEFAULT_MAX_NAME_RETRIES,
            navigate_after_create: true,
            staged_create: true,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl MergeSettings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gridmerge");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, writing a commented default
    /// file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            if let Err(e) = Self::create_default_file(&path) {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "could not write default settings"
                );
            }
            return Self::default();
        }

        Self::load_from(&path)
    }

    /// Load settings from `path`, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "error parsing settings, using defaults"
                    );
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "error reading settings, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring `//` comment lines
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Self = serde_json::from_str(&cleaned).map_err(|e| e.to_string())?;
        Ok(settings.sanitized())
    }

    /// Clamp values the engine cannot work with
    fn sanitized(mut self) -> Self {
        if self.max_name_retries == 0 {
            tracing::warn!("merge.maxNameRetries must be at least 1, using 1");
            self.max_name_retries = 1;
        }
        if self.default_table_name.trim().is_empty() {
            self.default_table_name = DEFAULT_TABLE_NAME.to_string();
        }
        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Save current settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    /// Write the default settings file with comments
    pub fn create_default_file(path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let default_config = r#"{
    // Name suggested for the merged table
    "merge.defaultTableName": "Merged_Selections",

    // How many candidate names (base, base_1, ...) to try before giving up
    "merge.maxNameRetries": 10,

    // Open the new table after it is created
    "merge.navigateAfterCreate": true,

    // Create the table and its rows in one step when the document supports it
    "merge.stagedCreate": true,

    // Import limits (50 MiB)
    "import.maxFileSizeBytes": 52428800,
    "import.allowedExtensions": ["csv", "tsv", "txt", "xlsx", "xlsm", "xls", "ods"]
}
"#;

        fs::write(path, default_config).map_err(|e| e.to_string())
    }

    pub fn materialize_options(&self) -> MaterializeOptions {
        MaterializeOptions {
            max_retries: self.max_name_retries,
            navigate: self.navigate_after_create,
            staged_create: self.staged_create,
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            max_file_size_bytes: self.max_file_size_bytes,
            allowed_extensions: self.allowed_extensions.clone(),
            ..ImportOptions::default()
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_file_parses_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        MergeSettings::create_default_file(&path).unwrap();

        assert_eq!(MergeSettings::load_from(&path), MergeSettings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let settings = MergeSettings::parse(
            r#"{
    // only one key
    "merge.defaultTableName": "Combined"
}"#,
        )
        .unwrap();
        assert_eq!(settings.default_table_name, "Combined");
        assert_eq!(settings.max_name_retries, 10);
        assert!(settings.staged_create);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(MergeSettings::load_from(&path), MergeSettings::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempdir().unwrap();
        let settings = MergeSettings::load_from(&dir.path().join("absent.json"));
        assert_eq!(settings, MergeSettings::default());
    }

    #[test]
    fn test_values_are_sanitized() {
        let settings = MergeSettings::parse(
            r#"{ "merge.maxNameRetries": 0, "import.allowedExtensions": [".CSV", " "] }"#,
        )
        .unwrap();
        assert_eq!(settings.max_name_retries, 1);
        assert_eq!(settings.allowed_extensions, vec!["csv"]);
    }

    #[test]
    fn test_option_mapping() {
        let settings = MergeSettings {
            max_name_retries: 3,
            navigate_after_create: false,
            max_file_size_bytes: 1024,
            ..Default::default()
        };
        let materialize = settings.materialize_options();
        assert_eq!(materialize.max_retries, 3);
        assert!(!materialize.navigate);
        assert!(materialize.staged_create);

        let import = settings.import_options();
        assert_eq!(import.max_file_size_bytes, 1024);
        assert!(import.allows_extension("xlsx"));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = MergeSettings {
            default_table_name: "Combined".into(),
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(MergeSettings::load_from(&path), settings);
    }
}
