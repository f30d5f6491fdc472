//! Configuration module for projpack
//!
//! This module provides configuration management including:
//! - Base directory resolution
//! - Named backup profiles and command-line overrides

pub mod paths;
pub mod profiles;

pub use paths::PackPaths;
pub use profiles::{Profile, ProfileOverrides, ProfileStore};
