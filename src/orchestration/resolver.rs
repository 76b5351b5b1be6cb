//! Resolution of version tags against CurseForge reference data

use crate::core::model::{GameVersion, GameVersionType, VersionTag};
use crate::core::report::TagMiss;
use std::collections::BTreeSet;

/// Outcome of resolving a publication's version tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagResolution {
    /// Remote ids of every tag that resolved, in tag order
    pub ids: Vec<u64>,
    /// Tags that did not resolve; publishing proceeds without them
    pub misses: Vec<TagMiss>,
}

/// Resolve each tag to a [`GameVersion::id`].
///
/// A tag whose type slug is unknown, or whose version slug is not among the
/// versions of that type, is logged and recorded as a miss.
pub fn resolve_version_tags(
    tags: &BTreeSet<VersionTag>,
    types: &[GameVersionType],
    versions: &[GameVersion],
) -> TagResolution {
    let mut resolution = TagResolution::default();

    for tag in tags {
        let Some(version_type) = types.iter().find(|t| t.slug == tag.kind) else {
            tracing::warn!(
                tag = %tag,
                "Unknown CurseForge game version type '{}'; skipping tag",
                tag.kind
            );
            resolution.misses.push(TagMiss::UnknownType { tag: tag.clone() });
            continue;
        };

        let candidates: Vec<&GameVersion> = versions
            .iter()
            .filter(|v| v.game_version_type_id == version_type.id)
            .collect();

        match candidates.iter().find(|v| v.slug == tag.version) {
            Some(version) => {
                tracing::debug!(tag = %tag, id = version.id, "Resolved version tag");
                resolution.ids.push(version.id);
            }
            None => {
                let available: Vec<String> = candidates.iter().map(|v| v.slug.clone()).collect();
                tracing::warn!(
                    tag = %tag,
                    "Unknown version '{}' for CurseForge game version type '{}'; skipping tag. Available versions: {}",
                    tag.version,
                    tag.kind,
                    available.join(", ")
                );
                resolution.misses.push(TagMiss::UnknownVersion {
                    tag: tag.clone(),
                    available,
                });
            }
        }
    }

    resolution
}
