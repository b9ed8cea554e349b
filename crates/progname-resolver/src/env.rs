//! Build Environment
//!
//! The resolver only needs two things from the surrounding build tool: read
//! a project option and set the output program name.

use std::collections::HashMap;

use progname_core::{Error, Result};
use progname_parser::ProjectConfig;
use tracing::debug;

/// Narrow view of the host build tool
pub trait BuildEnvironment {
    /// Read a project option for the current build target
    fn project_option(&self, name: &str) -> Result<String>;

    /// Replace the output program name
    fn set_program_name(&mut self, name: String);
}

/// Options supplied up front, e.g. from the command line
#[derive(Debug, Default, Clone)]
pub struct StaticEnvironment {
    options: HashMap<String, String>,
    program_name: Option<String>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style option setter
    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_string(), value.to_string());
        self
    }

    /// Name set by the last resolver run, if any
    pub fn program_name(&self) -> Option<&str> {
        self.program_name.as_deref()
    }
}

impl BuildEnvironment for StaticEnvironment {
    fn project_option(&self, name: &str) -> Result<String> {
        self.options
            .get(name)
            .cloned()
            .ok_or_else(|| Error::OptionNotFound {
                option: name.to_string(),
                section: "static".to_string(),
            })
    }

    fn set_program_name(&mut self, name: String) {
        self.program_name = Some(name);
    }
}

/// One `[env:NAME]` of a `platformio.ini`
#[derive(Debug, Clone)]
pub struct ProjectEnvironment {
    project: ProjectConfig,
    env: String,
    program_name: Option<String>,
}

impl ProjectEnvironment {
    /// Bind to an environment, which must exist in `project`
    pub fn new(project: ProjectConfig, env: &str) -> Result<Self> {
        if !project.has_env(env) {
            return Err(Error::Project(format!("unknown environment '{}'", env)));
        }
        Ok(Self {
            project,
            env: env.to_string(),
            program_name: None,
        })
    }

    pub fn env_name(&self) -> &str {
        &self.env
    }

    pub fn program_name(&self) -> Option<&str> {
        self.program_name.as_deref()
    }
}

impl BuildEnvironment for ProjectEnvironment {
    fn project_option(&self, name: &str) -> Result<String> {
        match self.project.env_option(&self.env, name)? {
            Some(value) => {
                debug!("[env:{}] {} = {}", self.env, name, value);
                Ok(value)
            }
            None => Err(Error::OptionNotFound {
                option: name.to_string(),
                section: format!("env:{}", self.env),
            }),
        }
    }

    fn set_program_name(&mut self, name: String) {
        self.program_name = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_environment() {
        let mut env = StaticEnvironment::new().with_option("platform", "native");
        assert_eq!(env.project_option("platform").unwrap(), "native");
        assert!(matches!(
            env.project_option("board"),
            Err(Error::OptionNotFound { .. })
        ));

        assert_eq!(env.program_name(), None);
        env.set_program_name("first".into());
        env.set_program_name("second".into());
        assert_eq!(env.program_name(), Some("second"));
    }

    #[test]
    fn test_project_environment() {
        let project =
            ProjectConfig::parse("[env]\nframework = arduino\n[env:esp32dev]\nplatform = espressif32\n")
                .unwrap();
        let env = ProjectEnvironment::new(project.clone(), "esp32dev").unwrap();
        assert_eq!(env.env_name(), "esp32dev");

        assert_eq!(env.project_option("platform").unwrap(), "espressif32");
        assert_eq!(env.project_option("framework").unwrap(), "arduino");

        let err = env.project_option("board").unwrap_err();
        assert_eq!(err.to_string(), "Option 'board' not found in [env:esp32dev]");

        assert!(ProjectEnvironment::new(project, "uno").is_err());
    }
}
