//! progname Resolver
//!
//! Computes the firmware output base name `{model}{suffix}.{version}` from
//! header macros and the target platform, and hands it to the build
//! environment.
//!
//! ## Modules
//!
//! - `env` - the narrow build-environment interface and its implementations
//! - `resolver` - output name composition

pub mod env;
pub mod resolver;

pub use env::{BuildEnvironment, ProjectEnvironment, StaticEnvironment};
pub use resolver::{resolve_output_name, OutputName, OutputNameResolver};
