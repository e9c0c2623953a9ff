//! idepack Core - Core types and utilities for the IDE pack manager
//!
//! This crate provides the leaf building blocks used throughout idepack:
//! - `PackageMetadata`: the package descriptor and registry entry model
//! - `placeholder`: `{{path:-default}}` template substitution
//! - `PathLayout` / `Settings`: on-disk layout and user settings
//! - `ProjectConfig`: per-project enabled packages and variables
//! - `archive`: deterministic packing and traversal-safe extraction

pub mod archive;
pub mod error;
pub mod layout;
pub mod pack;
pub mod placeholder;
pub mod platform;
pub mod project;
pub mod settings;
pub mod values;

pub use archive::{ArchiveInfo, create_archive, digest_matches, extract_archive, sha256_file};
pub use error::{CoreError, IoContext, Result};
pub use layout::PathLayout;
pub use pack::{
    ConfigField, DESCRIPTOR_FILE, Dist, McpLaunch, PackKind, PackageMetadata, validate_name,
    validate_version,
};
pub use placeholder::Placeholder;
pub use platform::{ExecutableSpec, Platform, strip_platform_suffix};
pub use project::{ConfigItem, ProjectConfig};
pub use settings::Settings;
pub use values::Values;
