//! Configuration structures for curseforge-publish
//!
//! This module provides the serde model of `.curseforge-publish.yaml`.

use crate::core::model::{ChangelogFormat, Relation, ReleaseType, VersionTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurseForgeConfig {
    /// Schema version (required)
    pub version: String,

    /// Remote repository settings (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryConfig>,

    /// Publications keyed by name
    #[serde(default)]
    pub publications: BTreeMap<String, PublicationConfig>,
}

/// Remote repository settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RepositoryConfig {
    /// API base URL (default: production endpoint)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// API token, usually `${CURSEFORGE_API_TOKEN}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "connectTimeoutSecs")]
    pub connect_timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "readTimeoutSecs")]
    pub read_timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "poolIdleTimeoutSecs")]
    pub pool_idle_timeout_secs: Option<u64>,
}

/// A single publication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PublicationConfig {
    /// CurseForge project id (required)
    #[serde(skip_serializing_if = "Option::is_none", rename = "projectId")]
    pub project_id: Option<String>,

    /// Explicit version tags
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "gameVersions")]
    pub game_versions: Vec<VersionTag>,

    /// Java major versions, each becoming a `java`/`java-N` tag
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "javaVersions")]
    pub java_versions: Vec<u32>,

    /// Plain Minecraft version, e.g. `1.20.2`
    #[serde(skip_serializing_if = "Option::is_none", rename = "minecraftVersion")]
    pub minecraft_version: Option<String>,

    /// Mod loaders, each becoming a `modloader` tag
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loaders: Vec<String>,

    /// ForgeGradle version (`<minecraft>-<forge>`); implies the forge loader
    #[serde(skip_serializing_if = "Option::is_none", rename = "forgeVersion")]
    pub forge_version: Option<String>,

    /// NeoForge version; implies the neoforge loader
    #[serde(skip_serializing_if = "Option::is_none", rename = "neoforgeVersion")]
    pub neoforge_version: Option<String>,

    /// Fabric Loom version; implies the fabric loader
    #[serde(skip_serializing_if = "Option::is_none", rename = "fabricLoomVersion")]
    pub fabric_loom_version: Option<String>,

    /// Primary artifact (required)
    #[serde(skip_serializing_if = "Option::is_none", rename = "mainArtifact")]
    pub main_artifact: Option<ArtifactConfig>,

    /// Secondary artifacts, uploaded in this order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactConfig>,
}

/// A file to upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ArtifactConfig {
    /// Artifact name (default: `main` for the primary, the file stem otherwise)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Path to the file, relative to the project directory
    pub file: String,

    #[serde(skip_serializing_if = "Option::is_none", rename = "displayName")]
    pub display_name: Option<String>,

    /// Release channel (default: "release")
    #[serde(skip_serializing_if = "Option::is_none", rename = "releaseType")]
    pub release_type: Option<ReleaseType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<ChangelogConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,
}

/// Changelog given inline or read from a file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChangelogConfig {
    /// Markup (default: "text")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ChangelogFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Path to a changelog file, relative to the project directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for CurseForgeConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            repository: None,
            publications: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::RelationType;

    #[test]
    fn test_default_config() {
        let config = CurseForgeConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.repository.is_none());
        assert!(config.publications.is_empty());
    }

    #[test]
    fn test_deserialize_full_config() {
        let yaml = r#"
version: "1.0"
repository:
  url: https://example.com
  token: ${CURSEFORGE_API_TOKEN}
  connectTimeoutSecs: 5
publications:
  fabric:
    projectId: "12345"
    gameVersions:
      - { type: modloader, version: quilt }
    javaVersions: [17, 21]
    minecraftVersion: "1.20.2"
    loaders: [fabric]
    mainArtifact:
      file: build/libs/mod.jar
      displayName: My Mod 1.0
      releaseType: beta
      changelog:
        format: markdown
        file: CHANGELOG.md
      relations:
        - { slug: fabric-api, type: requiredDependency }
    artifacts:
      - name: sources
        file: build/libs/mod-sources.jar
"#;
        let config: CurseForgeConfig = serde_yaml::from_str(yaml).unwrap();

        let repository = config.repository.unwrap();
        assert_eq!(repository.url.as_deref(), Some("https://example.com"));
        assert_eq!(repository.connect_timeout_secs, Some(5));
        assert_eq!(repository.read_timeout_secs, None);

        let publication = &config.publications["fabric"];
        assert_eq!(publication.project_id.as_deref(), Some("12345"));
        assert_eq!(publication.game_versions, vec![VersionTag::new("modloader", "quilt")]);
        assert_eq!(publication.java_versions, vec![17, 21]);

        let main = publication.main_artifact.as_ref().unwrap();
        assert_eq!(main.release_type, Some(ReleaseType::Beta));
        assert_eq!(
            main.changelog.as_ref().unwrap().format,
            Some(ChangelogFormat::Markdown)
        );
        assert_eq!(
            main.relations,
            vec![Relation::new("fabric-api", RelationType::RequiredDependency)]
        );
        assert_eq!(publication.artifacts[0].name.as_deref(), Some("sources"));
    }

    #[test]
    fn test_deserialize_toml_config() {
        let source = r#"
version = "1.0"

[publications.forge]
projectId = "42"
forgeVersion = "1.20.2-46.0.3"

[publications.forge.mainArtifact]
file = "build/libs/mod.jar"
"#;
        let config: CurseForgeConfig = toml::from_str(source).unwrap();
        let publication = &config.publications["forge"];
        assert_eq!(publication.forge_version.as_deref(), Some("1.20.2-46.0.3"));
        assert_eq!(
            publication.main_artifact.as_ref().unwrap().file,
            "build/libs/mod.jar"
        );
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let mut config = CurseForgeConfig::default();
        config.publications.insert(
            "main".to_string(),
            PublicationConfig {
                project_id: Some("1".to_string()),
                ..Default::default()
            },
        );

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("projectId: '1'"));
        assert!(!yaml.contains("gameVersions"));
        assert!(!yaml.contains("repository"));
    }
}
