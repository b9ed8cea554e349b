//! progname Core
//!
//! Shared error type and resolver configuration for the progname crates.

pub mod config;
pub mod error;

pub use config::{Config, NamingConfig};
pub use error::{Error, Result};
