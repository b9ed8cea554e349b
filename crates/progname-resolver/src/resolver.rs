//! Output Name Resolver
//!
//! Composes `{model}{suffix}.{version}` from the naming macros of one header
//! and the target platform.

use std::fmt;
use std::path::{Path, PathBuf};

use progname_core::{Error, NamingConfig, Result};
use progname_parser::extract_macro_value;
use serde::Serialize;
use tracing::{debug, info};

use crate::env::BuildEnvironment;

/// A resolved output name and the parts it was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputName {
    pub model: String,
    pub suffix: String,
    pub version: String,
    pub platform: String,
}

impl OutputName {
    /// The output base name handed to the build tool
    pub fn base_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}.{}", self.model, self.suffix, self.version)
    }
}

/// Resolves output names for one header
#[derive(Debug, Clone)]
pub struct OutputNameResolver {
    header: PathBuf,
    naming: NamingConfig,
}

impl OutputNameResolver {
    /// Resolver with the default naming macros and platform suffixes
    pub fn new(header: impl Into<PathBuf>) -> Self {
        Self::with_naming(header, NamingConfig::default())
    }

    pub fn with_naming(header: impl Into<PathBuf>, naming: NamingConfig) -> Self {
        Self {
            header: header.into(),
            naming,
        }
    }

    pub fn header(&self) -> &Path {
        &self.header
    }

    pub fn naming(&self) -> &NamingConfig {
        &self.naming
    }

    /// Resolve from already-read header text
    pub fn resolve_text(&self, text: &str, platform: &str) -> Result<OutputName> {
        let source = self.header.display().to_string();
        let relabel = |e: Error| match e {
            Error::MacroNotFound { macro_name, .. } => Error::MacroNotFound {
                macro_name,
                source_name: source.clone(),
            },
            other => other,
        };

        let model = extract_macro_value(text, &self.naming.model_macro).map_err(relabel)?;
        let version = extract_macro_value(text, &self.naming.version_macro).map_err(relabel)?;
        let suffix = self.naming.suffix_for(platform).to_string();

        debug!(
            "model={} version={} platform={} suffix={:?}",
            model, version, platform, suffix
        );

        Ok(OutputName {
            model,
            suffix,
            version,
            platform: platform.to_string(),
        })
    }

    /// Read the header and resolve the name for `platform`
    pub fn resolve(&self, platform: &str) -> Result<OutputName> {
        let text =
            std::fs::read_to_string(&self.header).map_err(|e| Error::from_io(e, &self.header))?;
        self.resolve_text(&text, platform)
    }

    /// Pre-build hook: read the platform from `env`, then set its program name.
    ///
    /// `env` is written exactly once, and only when resolution succeeds.
    pub fn apply(&self, env: &mut dyn BuildEnvironment) -> Result<OutputName> {
        let platform = env.project_option(&self.naming.platform_option)?;
        let name = self.resolve(&platform)?;

        info!("Program name: {}", name);
        env.set_program_name(name.base_name());
        Ok(name)
    }
}

/// Output base name for `header_path` and `platform_option` using the default naming rules
pub fn resolve_output_name(header_path: &Path, platform_option: &str) -> Result<String> {
    OutputNameResolver::new(header_path)
        .resolve(platform_option)
        .map(|name| name.base_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::StaticEnvironment;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "#define CUSTOM_APP_MODEL \"MyDevice\"\n#define VERSION_NUMBER 1.4.0\n";

    #[test]
    fn test_esp32_suffix() {
        let resolver = OutputNameResolver::new("src/Main.h");
        assert_eq!(resolver.header(), Path::new("src/Main.h"));

        let name = resolver.resolve_text(HEADER, "espressif32").unwrap();
        assert_eq!(name.base_name(), "MyDevice.esp32.1.4.0");
        assert_eq!(name.suffix, ".esp32");
        assert_eq!(name.platform, "espressif32");
    }

    #[test]
    fn test_no_suffix_for_other_platforms() {
        let resolver = OutputNameResolver::new("src/Main.h");
        for platform in ["native", "espressif8266", "", "espressif32 "] {
            let name = resolver.resolve_text(HEADER, platform).unwrap();
            assert_eq!(name.base_name(), "MyDevice.1.4.0");
            assert!(!name.base_name().contains(".esp32."));
        }
    }

    #[test]
    fn test_deterministic() {
        let resolver = OutputNameResolver::new("src/Main.h");
        let a = resolver.resolve_text(HEADER, "espressif32").unwrap();
        let b = resolver.resolve_text(HEADER, "espressif32").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_version_names_header() {
        let resolver = OutputNameResolver::new("src/Main.h");
        let err = resolver
            .resolve_text("#define CUSTOM_APP_MODEL \"MyDevice\"\n", "native")
            .unwrap_err();
        assert_eq!(err.to_string(), "VERSION_NUMBER not found in src/Main.h");
    }

    #[test]
    fn test_custom_naming() {
        let mut naming = NamingConfig::default();
        naming.version_macro = "FW_VERSION".into();
        naming
            .platform_suffixes
            .insert("nordicnrf52".into(), ".nrf52".into());

        let resolver = OutputNameResolver::with_naming("app.h", naming);
        let name = resolver
            .resolve_text("#define CUSTOM_APP_MODEL Sensor\n#define FW_VERSION 7\n", "nordicnrf52")
            .unwrap();
        assert_eq!(name.base_name(), "Sensor.nrf52.7");
    }

    #[test]
    fn test_apply_without_platform_leaves_env_untouched() {
        let resolver = OutputNameResolver::new("does/not/matter.h");
        let mut env = StaticEnvironment::new();

        assert!(matches!(
            resolver.apply(&mut env),
            Err(Error::OptionNotFound { .. })
        ));
        assert_eq!(env.program_name(), None);
    }
}
