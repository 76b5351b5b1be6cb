//! Minecraft version inference
//!
//! Mod loaders encode the Minecraft version they target in their own
//! version numbers. These functions recover it so a publication can carry
//! the matching `minecraft-X-Y` tag without the user spelling it out.

use crate::core::model::VersionTag;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref PLAIN_VERSION: Regex =
        Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?$").expect("valid regex");
    static ref FORGE_GRADLE_VERSION: Regex =
        Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?-").expect("valid regex");
    static ref NEOFORGE_VERSION: Regex =
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-[0-9A-Za-z.+-]+)?$").expect("valid regex");
}

/// A Minecraft release version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinecraftVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl MinecraftVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `major.minor[.patch]`
    pub fn parse(input: &str) -> Option<Self> {
        let (major, minor, patch) = capture_triple(&PLAIN_VERSION, input.trim())?;
        Some(Self::new(major, minor, patch))
    }

    /// The CurseForge tag for this version.
    ///
    /// Type slugs are per minor line (`minecraft-1-20`); the patch component
    /// is only part of the version slug when non-zero (`1-20-2`, `1-20`).
    pub fn version_tag(&self) -> VersionTag {
        let kind = format!("minecraft-{}-{}", self.major, self.minor);
        let version = if self.patch == 0 {
            format!("{}-{}", self.major, self.minor)
        } else {
            format!("{}-{}-{}", self.major, self.minor, self.patch)
        };
        VersionTag::new(kind, version)
    }
}

impl fmt::Display for MinecraftVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

/// Fabric Loom's configured Minecraft version, `major.minor[.patch]`.
pub fn extract_fabric_loom_version(version: &str) -> Option<(u32, u32, u32)> {
    capture_triple(&PLAIN_VERSION, version)
}

/// ForgeGradle versions are `<minecraft>-<forge>`, e.g. `1.20.2-46.0.3`.
pub fn extract_forge_gradle_version(version: &str) -> Option<(u32, u32, u32)> {
    capture_triple(&FORGE_GRADLE_VERSION, version)
}

/// NeoForge versions drop the leading `1.`: `20.2.86` targets 1.20.2.
pub fn extract_neoforge_version(version: &str) -> Option<(u32, u32, u32)> {
    let (minor, patch, _build) = capture_triple(&NEOFORGE_VERSION, version)?;
    Some((1, minor, patch))
}

fn capture_triple(pattern: &Regex, input: &str) -> Option<(u32, u32, u32)> {
    let captures = pattern.captures(input)?;
    let major = captures.get(1)?.as_str().parse().ok()?;
    let minor = captures.get(2)?.as_str().parse().ok()?;
    let patch = match captures.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some((major, minor, patch))
}
