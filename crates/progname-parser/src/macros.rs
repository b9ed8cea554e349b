//! Header Macro Extraction
//!
//! Pulls `#define NAME value` bindings out of C/C++ header text. This is a
//! targeted text scan, not a preprocessor: conditionals, includes and
//! macro expansion are not evaluated.

use std::collections::HashSet;
use std::path::Path;

use progname_core::{Error, Result};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Label used for text that did not come from a file
const TEXT_SOURCE: &str = "header text";

/// A macro definition found in a header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroDefinition {
    pub name: String,
    /// Value [`extract_macro_value`] returns for this name, `None` when it fails
    pub value: Option<String>,
}

/// Build the value pattern for one macro name.
///
/// The value is the run of non-whitespace, non-quote characters after the
/// name, optionally wrapped in double quotes. `\s` also matches newlines, so
/// the scan is not bound to a single line.
fn value_pattern(macro_name: &str) -> Result<Regex> {
    if macro_name.is_empty() || macro_name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidMacroName(macro_name.to_string()));
    }

    let pattern = format!(r#"#define\s+{}\s+"?([^"\s]+)"?"#, regex::escape(macro_name));
    Regex::new(&pattern).map_err(|_| Error::InvalidMacroName(macro_name.to_string()))
}

fn find_value(text: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_labelled(text: &str, macro_name: &str, source_name: &str) -> Result<String> {
    let pattern = value_pattern(macro_name)?;

    match find_value(text, &pattern) {
        Some(value) => {
            debug!("{} = {} ({})", macro_name, value, source_name);
            Ok(value)
        }
        None => Err(Error::MacroNotFound {
            macro_name: macro_name.to_string(),
            source_name: source_name.to_string(),
        }),
    }
}

/// Extract the value bound to `macro_name` from header text.
///
/// The first definition in document order wins. Enclosing double quotes are
/// stripped, and the value stops at the first whitespace even inside quotes.
pub fn extract_macro_value(text: &str, macro_name: &str) -> Result<String> {
    extract_labelled(text, macro_name, TEXT_SOURCE)
}

/// Read `path` and extract the value bound to `macro_name`
pub fn extract_macro_value_from_file(path: &Path, macro_name: &str) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::from_io(e, path))?;
    extract_labelled(&text, macro_name, &path.display().to_string())
}

/// Object-like macros defined in a header
#[derive(Debug, Default, Clone)]
pub struct HeaderMacros {
    macros: Vec<MacroDefinition>,
}

impl HeaderMacros {
    /// Scan header text for `#define` directives.
    ///
    /// One entry per distinct name, in order of first definition.
    /// Function-like macros are skipped. Names and values are found the same
    /// way [`extract_macro_value`] finds them: anywhere in the text, first
    /// match wins. So a commented-out `// #define` shadows a later live one,
    /// and a bare define such as an include guard picks up the next token.
    pub fn scan(text: &str) -> Self {
        let directive = Regex::new(r"#define\s+([A-Za-z_][A-Za-z0-9_]*)(\()?")
            .expect("static define pattern");

        let mut seen = HashSet::new();
        let mut macros = Vec::new();

        for caps in directive.captures_iter(text) {
            if caps.get(2).is_some() {
                continue;
            }
            let Some(name) = caps.get(1) else {
                continue;
            };
            let name = name.as_str();
            if !seen.insert(name.to_string()) {
                continue;
            }

            let value = value_pattern(name)
                .ok()
                .and_then(|pattern| find_value(text, &pattern));

            macros.push(MacroDefinition {
                name: name.to_string(),
                value,
            });
        }

        debug!("Found {} macro definitions", macros.len());
        Self { macros }
    }

    /// Read and scan a header file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::from_io(e, path))?;
        Ok(Self::scan(&text))
    }

    /// All definitions in document order
    pub fn definitions(&self) -> &[MacroDefinition] {
        &self.macros
    }

    pub fn get(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}
