//! OS/architecture detection and platform-keyed executable selection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CoreError, Result};

const KNOWN_OS: &[&str] = &["darwin", "linux", "windows", "freebsd"];
const KNOWN_ARCH: &[&str] = &["amd64", "arm64", "386", "arm"];

/// A normalized `<os>-<arch>` pair such as `darwin-arm64`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: normalize_os(os),
            arch: normalize_arch(arch),
        }
    }

    /// The platform this binary was compiled for
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Canonical map key, e.g. `linux-amd64`
    pub fn key(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }

    /// Parse a descriptor key like `darwin-arm64` or `macos_aarch64`
    pub fn parse_key(key: &str) -> Option<Self> {
        let (os, arch) = key.split_once(['-', '_', '/'])?;
        Some(Self::new(os, arch))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

fn normalize_os(os: &str) -> String {
    match os.to_ascii_lowercase().as_str() {
        "macos" | "darwin" | "osx" | "mac" => "darwin".to_string(),
        "windows" | "win32" | "win" => "windows".to_string(),
        other => other.to_string(),
    }
}

fn normalize_arch(arch: &str) -> String {
    match arch.to_ascii_lowercase().as_str() {
        "x86_64" | "amd64" | "x64" => "amd64".to_string(),
        "aarch64" | "arm64" => "arm64".to_string(),
        "x86" | "i386" | "i686" | "386" => "386".to_string(),
        other => other.to_string(),
    }
}

/// Executable declared by a package
///
/// Either a single path used everywhere, or a map from platform key to the
/// path of the binary built for that platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutableSpec {
    Simple(String),
    PerPlatform(BTreeMap<String, String>),
}

impl ExecutableSpec {
    /// Pick the executable for `platform`
    ///
    /// Map keys are normalized before comparison so `macos-aarch64` matches
    /// `darwin-arm64`.
    pub fn select(&self, platform: &Platform) -> Result<&str> {
        match self {
            ExecutableSpec::Simple(path) => Ok(path),
            ExecutableSpec::PerPlatform(map) => map
                .iter()
                .find(|(key, _)| Platform::parse_key(key).as_ref() == Some(platform))
                .map(|(_, path)| path.as_str())
                .ok_or_else(|| CoreError::UnsupportedPlatform {
                    current: platform.key(),
                    supported: map.keys().cloned().collect(),
                }),
        }
    }
}

/// Turn a platform-specific binary file name into the name exposed on PATH
///
/// `mytool-darwin-arm64` and `mytool_linux_amd64.exe` both become `mytool`.
pub fn strip_platform_suffix(file_name: &str) -> String {
    let mut name = file_name;
    if let Some(stripped) = name.strip_suffix(".exe") {
        name = stripped;
    }
    name = strip_known_suffix(name, KNOWN_ARCH, &["x86_64", "aarch64", "x64", "i386", "i686"]);
    name = strip_known_suffix(name, KNOWN_OS, &["macos", "osx", "win32"]);
    name.to_string()
}

fn strip_known_suffix<'a>(name: &'a str, canonical: &[&str], aliases: &[&str]) -> &'a str {
    let lower = name.to_ascii_lowercase();
    for suffix in canonical.iter().chain(aliases) {
        for sep in ['-', '_', '.'] {
            let tail = format!("{sep}{suffix}");
            if lower.ends_with(&tail) && name.len() > tail.len() {
                return &name[..name.len() - tail.len()];
            }
        }
    }
    name
}
