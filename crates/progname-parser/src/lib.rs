//! progname Parser
//!
//! Targeted text extraction for the build inputs progname reads.
//!
//! ## Modules
//!
//! - `macros` - `#define` value extraction from C headers
//! - `project` - `platformio.ini` environment options

pub mod macros;
pub mod project;

pub use macros::{
    extract_macro_value, extract_macro_value_from_file, HeaderMacros, MacroDefinition,
};
pub use project::ProjectConfig;
