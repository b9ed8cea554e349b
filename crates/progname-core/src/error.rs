//! Error types for progname

use thiserror::Error;

/// progname error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A required `#define` is missing from the header
    #[error("{macro_name} not found in {source_name}")]
    MacroNotFound {
        macro_name: String,
        source_name: String,
    },

    #[error("Invalid macro name: {0:?}")]
    InvalidMacroName(String),

    #[error("Option '{option}' not found in [{section}]")]
    OptionNotFound { option: String, section: String },

    #[error("Project configuration error: {0}")]
    Project(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Map an IO error on `path`, turning `NotFound` into [`Error::FileNotFound`]
    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.display().to_string())
        } else {
            Error::Io(err)
        }
    }
}

/// Result type alias for progname
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_macro_not_found_message() {
        let err = Error::MacroNotFound {
            macro_name: "VERSION_NUMBER".into(),
            source_name: "./src/Main.h".into(),
        };
        assert_eq!(err.to_string(), "VERSION_NUMBER not found in ./src/Main.h");
    }

    #[test]
    fn test_from_io_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::from_io(io, Path::new("src/Main.h"));
        assert!(matches!(err, Error::FileNotFound(ref p) if p == "src/Main.h"));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(Error::from_io(io, Path::new("x")), Error::Io(_)));
    }
}
