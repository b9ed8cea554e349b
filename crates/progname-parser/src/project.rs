//! Project Configuration
//!
//! Reads build options from a PlatformIO `platformio.ini`. Only what is
//! needed to answer "what is option X for environment Y" is supported:
//! sections, options, comments, continuation lines, `extends` and
//! `${section.option}` interpolation.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use progname_core::{Error, Result};
use regex::Regex;
use tracing::debug;

/// Prefix of per-environment section names
const ENV_PREFIX: &str = "env:";
/// Section shared by every environment
const COMMON_ENV_SECTION: &str = "env";
/// Interpolation section naming the environment being resolved
const THIS_SECTION: &str = "this";
/// Interpolation section reading process environment variables
const SYSENV_SECTION: &str = "sysenv";

/// One `[section]` with its options in file order
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    options: Vec<(String, String)>,
}

impl Section {
    fn get(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, key: String, value: String) {
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.options.push((key, value)),
        }
    }
}

/// Parsed `platformio.ini`
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    sections: Vec<Section>,
}

impl ProjectConfig {
    /// Load a project file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::from_io(e, path))?;
        Self::parse(&content).map_err(|e| match e {
            Error::Project(msg) => Error::Project(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse project file content
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();
        // Repeated headers merge into the first section of that name
        let mut current: Option<usize> = None;
        // Option a continuation line extends
        let mut last_key: Option<String> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            // Skip comments and empty lines
            if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
                continue;
            }

            let indented = raw.starts_with(' ') || raw.starts_with('\t');
            if let (true, Some(section_idx), Some(key)) = (indented, current, &last_key) {
                let extra = strip_inline_comment(trimmed);
                if !extra.is_empty() {
                    let section = &mut config.sections[section_idx];
                    let value = match section.get(key) {
                        Some(prev) if !prev.is_empty() => format!("{}\n{}", prev, extra),
                        _ => extra.to_string(),
                    };
                    section.set(key.clone(), value);
                }
                continue;
            }

            if let Some(name) = trimmed
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                let name = name.trim();
                let section_idx = match config.sections.iter().position(|s| s.name == name) {
                    Some(existing) => existing,
                    None => {
                        config.sections.push(Section {
                            name: name.to_string(),
                            options: Vec::new(),
                        });
                        config.sections.len() - 1
                    }
                };
                current = Some(section_idx);
                last_key = None;
                continue;
            }

            if let Some((key, value)) = trimmed.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    return Err(Error::Project(format!("line {}: empty option name", line_no)));
                }
                let Some(section_idx) = current else {
                    return Err(Error::Project(format!(
                        "line {}: option '{}' outside of any section",
                        line_no, key
                    )));
                };
                let value = strip_inline_comment(value.trim()).to_string();
                config.sections[section_idx].set(key.to_string(), value);
                last_key = Some(key.to_string());
                continue;
            }

            return Err(Error::Project(format!("line {}: cannot parse '{}'", line_no, trimmed)));
        }

        debug!("Parsed project with {} sections", config.sections.len());
        Ok(config)
    }

    /// Names of all `[env:NAME]` sections in file order
    pub fn environments(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter_map(|s| s.name.strip_prefix(ENV_PREFIX))
            .collect()
    }

    /// Environments listed in `[platformio] default_envs`
    pub fn default_envs(&self) -> Vec<&str> {
        self.get("platformio", "default_envs")
            .map(|v| {
                v.split([',', '\n'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Raw option lookup in one section
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Check that `[env:NAME]` exists
    pub fn has_env(&self, env: &str) -> bool {
        self.section(&format!("{}{}", ENV_PREFIX, env)).is_some()
    }

    /// Option value as seen by environment `env`.
    ///
    /// Looks in `[env:NAME]`, then the sections named by its `extends`
    /// (first hit wins, followed transitively), then the common `[env]`.
    /// `${section.option}` references in the value are expanded; a reference
    /// that cannot be resolved, or that refers back to itself, is an error.
    pub fn env_option(&self, env: &str, option: &str) -> Result<Option<String>> {
        let section_name = format!("{}{}", ENV_PREFIX, env);
        if self.section(&section_name).is_none() {
            return Err(Error::Project(format!("unknown environment '{}'", env)));
        }

        match self.raw_env_option(&section_name, option) {
            Some(raw) => {
                let mut stack = vec![(section_name.clone(), option.to_string())];
                self.expand(raw, &section_name, &mut stack).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Uninterpolated lookup for an `[env:NAME]` section
    fn raw_env_option(&self, section_name: &str, option: &str) -> Option<&str> {
        let mut visited = HashSet::new();
        self.lookup_extended(section_name, option, &mut visited)
            .or_else(|| self.get(COMMON_ENV_SECTION, option))
    }

    fn lookup_extended<'a>(
        &'a self,
        section_name: &str,
        option: &str,
        visited: &mut HashSet<String>,
    ) -> Option<&'a str> {
        if !visited.insert(section_name.to_string()) {
            return None;
        }
        let section = self.section(section_name)?;
        if let Some(value) = section.get(option) {
            return Some(value);
        }

        let extends = section.get("extends")?;
        extends
            .split([',', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .find_map(|base| self.lookup_extended(base, option, visited))
    }

    /// Expand `${section.option}` references in `value`.
    ///
    /// `this` is the env section being resolved; `stack` holds the
    /// (section, option) pairs currently being expanded.
    fn expand(
        &self,
        value: &str,
        this: &str,
        stack: &mut Vec<(String, String)>,
    ) -> Result<String> {
        if !value.contains("${") {
            return Ok(value.to_string());
        }

        let reference =
            Regex::new(r"\$\{([^.}()]+)\.([^}]+)\}").expect("static interpolation pattern");

        if reference.replace_all(value, "").contains("${") {
            return Err(Error::Project(format!("malformed interpolation in '{}'", value)));
        }

        let mut expanded = String::with_capacity(value.len());
        let mut last = 0;
        for caps in reference.captures_iter(value) {
            let (Some(whole), Some(section), Some(key)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            expanded.push_str(&value[last..whole.start()]);
            expanded.push_str(&self.resolve_reference(section.as_str(), key.as_str(), this, stack)?);
            last = whole.end();
        }
        expanded.push_str(&value[last..]);

        Ok(expanded)
    }

    fn resolve_reference(
        &self,
        section: &str,
        key: &str,
        this: &str,
        stack: &mut Vec<(String, String)>,
    ) -> Result<String> {
        if section == SYSENV_SECTION {
            return std::env::var(key).map_err(|_| {
                Error::Project(format!("environment variable '{}' is not set", key))
            });
        }

        let section_name = if section == THIS_SECTION { this } else { section };
        let frame = (section_name.to_string(), key.to_string());
        if stack.contains(&frame) {
            return Err(Error::Project(format!(
                "circular reference to ${{{}.{}}}",
                section, key
            )));
        }

        let raw = if section_name.starts_with(ENV_PREFIX) {
            self.raw_env_option(section_name, key)
        } else {
            self.get(section_name, key)
        };
        let raw = raw.ok_or_else(|| {
            Error::Project(format!("unresolved reference ${{{}.{}}}", section, key))
        })?;

        stack.push(frame);
        let value = self.expand(raw, this, stack);
        stack.pop();
        value
    }

    /// Pick the environment to build.
    ///
    /// An explicit request must exist; otherwise the first `default_envs`
    /// entry, then the first `[env:NAME]` section.
    pub fn select_env(&self, requested: Option<&str>) -> Result<String> {
        if let Some(env) = requested {
            if self.has_env(env) {
                return Ok(env.to_string());
            }
            return Err(Error::Project(format!("unknown environment '{}'", env)));
        }

        if let Some(env) = self.default_envs().into_iter().next() {
            return Ok(env.to_string());
        }

        self.environments()
            .into_iter()
            .next()
            .map(str::to_string)
            .ok_or_else(|| Error::Project("no [env:NAME] sections defined".to_string()))
    }
}

/// Drop a `;` or `#` comment that follows whitespace, or a value that is only a comment
fn strip_inline_comment(value: &str) -> &str {
    if value.starts_with(';') || value.starts_with('#') {
        return "";
    }
    let bytes = value.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if (*b == b';' || *b == b'#') && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return value[..i].trim_end();
        }
    }
    value
}
