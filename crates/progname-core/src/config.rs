//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Header macro holding the device model
pub const DEFAULT_MODEL_MACRO: &str = "CUSTOM_APP_MODEL";
/// Header macro holding the firmware version
pub const DEFAULT_VERSION_MACRO: &str = "VERSION_NUMBER";
/// Build option naming the target platform
pub const DEFAULT_PLATFORM_OPTION: &str = "platform";

/// progname configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Header containing the naming macros, relative to the project dir
    pub header: PathBuf,

    /// Naming rules
    pub naming: NamingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header: PathBuf::from("src/Main.h"),
            naming: NamingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file, chosen by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::from_io(e, path))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            _ => Err(Error::Config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }
}

/// Output naming rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Macro holding the model identifier
    pub model_macro: String,

    /// Macro holding the version number
    pub version_macro: String,

    /// Build option to read the platform from
    pub platform_option: String,

    /// Suffix appended to the model for an exact platform match
    pub platform_suffixes: BTreeMap<String, String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        let mut platform_suffixes = BTreeMap::new();
        platform_suffixes.insert("espressif32".to_string(), ".esp32".to_string());

        Self {
            model_macro: DEFAULT_MODEL_MACRO.into(),
            version_macro: DEFAULT_VERSION_MACRO.into(),
            platform_option: DEFAULT_PLATFORM_OPTION.into(),
            platform_suffixes,
        }
    }
}

impl NamingConfig {
    /// Suffix for a platform, empty when the platform has no entry
    pub fn suffix_for(&self, platform: &str) -> &str {
        self.platform_suffixes
            .get(platform)
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_suffixes() {
        let naming = NamingConfig::default();
        assert_eq!(naming.suffix_for("espressif32"), ".esp32");
        assert_eq!(naming.suffix_for("espressif8266"), "");
        assert_eq!(naming.suffix_for("native"), "");
        // Exact match only
        assert_eq!(naming.suffix_for("Espressif32"), "");
    }

    #[test]
    fn test_load_yaml_partial() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progname.yaml");
        fs::write(
            &path,
            "header: include/App.h\nnaming:\n  version_macro: FW_VERSION\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.header, PathBuf::from("include/App.h"));
        assert_eq!(config.naming.version_macro, "FW_VERSION");
        // Unset fields keep their defaults
        assert_eq!(config.naming.model_macro, DEFAULT_MODEL_MACRO);
        assert_eq!(config.naming.suffix_for("espressif32"), ".esp32");
    }

    #[test]
    fn test_load_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progname.json");
        fs::write(
            &path,
            r#"{"naming": {"platform_suffixes": {"nordicnrf52": ".nrf52"}}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.header, PathBuf::from("src/Main.h"));
        assert_eq!(config.naming.suffix_for("nordicnrf52"), ".nrf52");
        assert_eq!(config.naming.suffix_for("espressif32"), "");
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progname.toml");
        fs::write(&path, "header = 'x'").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.yaml");
        assert!(matches!(Config::load(&path), Err(Error::FileNotFound(_))));
    }
}
