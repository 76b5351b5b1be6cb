//! Configuration file loader for curseforge-publish
//!
//! This module provides configuration loading, validation, and conversion of
//! configured publications into fully resolved [`Publication`] values.

use super::config::*;
use crate::api::{ApiClientConfig, DEFAULT_BASE_URL};
use crate::core::error::PublishError;
use crate::core::minecraft::{
    MinecraftVersion, extract_fabric_loom_version, extract_forge_gradle_version,
    extract_neoforge_version,
};
use crate::core::model::{Artifact, MAIN_ARTIFACT_NAME, Publication, VersionTag};
use crate::security::URL_ENV_VAR;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".curseforge-publish.yaml";

/// Only supported schema version
const SUPPORTED_VERSION: &str = "1.0";

lazy_static! {
    /// Environment variable pattern (${VAR_NAME})
    static ref ENV_VAR_PATTERN: Regex =
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid regex");
}

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path; relative paths in the config resolve against it
    pub project_path: PathBuf,

    /// Explicit config file (default: `<project_path>/.curseforge-publish.yaml`)
    pub config_path: Option<PathBuf>,

    /// Environment variables used for `${VAR}` expansion
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            config_path: None,
            env: HashMap::new(),
        }
    }
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    /// Is configuration valid?
    pub valid: bool,

    /// Validation errors
    pub errors: Vec<ConfigValidationError>,

    /// Validation warnings
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "publications.fabric.projectId")
    pub field: String,

    /// Error message
    pub message: String,

    /// Expected type/value
    pub expected: Option<String>,

    /// Actual type/value
    pub actual: Option<String>,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    /// Field path
    pub field: String,

    /// Warning message
    pub message: String,

    /// Suggestion
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the configuration file.
    ///
    /// A missing default config file yields the default configuration; a
    /// missing explicit `config_path` is an error. `${VAR}` references in
    /// the repository URL and token are expanded from `options.env`.
    pub async fn load(options: &ConfigLoadOptions) -> Result<CurseForgeConfig, PublishError> {
        let config = match &options.config_path {
            Some(path) => {
                let path = options.project_path.join(path);
                Self::load_config_file(&path).await?.ok_or_else(|| {
                    PublishError::ConfigError(format!(
                        "Config file not found: {}",
                        path.display()
                    ))
                })?
            }
            None => Self::load_config_file(&options.project_path.join(CONFIG_FILENAME))
                .await?
                .unwrap_or_default(),
        };

        Ok(Self::expand_env_vars(config, &options.env))
    }

    /// Load configuration from a YAML or TOML file, chosen by extension
    async fn load_config_file(file_path: &Path) -> Result<Option<CurseForgeConfig>, PublishError> {
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            PublishError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let is_toml = file_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config = if is_toml {
            toml::from_str(&content).map_err(|e| {
                PublishError::ConfigError(format!("Failed to parse TOML config: {}", e))
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                PublishError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?
        };

        tracing::debug!(path = %file_path.display(), "Loaded configuration");
        Ok(Some(config))
    }

    /// Expand environment variables in the repository settings
    fn expand_env_vars(
        mut config: CurseForgeConfig,
        env: &HashMap<String, String>,
    ) -> CurseForgeConfig {
        if let Some(repository) = &mut config.repository {
            if let Some(url) = &repository.url {
                repository.url = Some(Self::expand_string(url, env));
            }
            if let Some(token) = &repository.token {
                let expanded = Self::expand_string(token, env);
                // An unexpanded placeholder counts as no token
                repository.token = if ENV_VAR_PATTERN.is_match(&expanded) {
                    tracing::warn!(
                        "Ignoring repository token with unresolved environment variables"
                    );
                    None
                } else {
                    Some(expanded)
                };
            }
        }

        config
    }

    /// Expand environment variables in a single string. Unset variables are
    /// left in place.
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        ENV_VAR_PATTERN
            .replace_all(input, |caps: &regex::Captures<'_>| {
                let var_name = &caps[1];
                match env.get(var_name) {
                    Some(value) => value.clone(),
                    None => {
                        tracing::warn!(variable = var_name, "Environment variable not found");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Resolve transport settings.
    ///
    /// Priority (high to low):
    /// 1. CLI `--url`
    /// 2. `CURSEFORGE_API_URL`
    /// 3. `repository` section of the config file
    /// 4. Default values
    pub fn client_config(
        config: &CurseForgeConfig,
        cli_url: Option<&str>,
        env: &HashMap<String, String>,
    ) -> ApiClientConfig {
        let defaults = ApiClientConfig::default();
        let repository = config.repository.clone().unwrap_or_default();

        let base_url = cli_url
            .map(str::to_owned)
            .or_else(|| env.get(URL_ENV_VAR).filter(|v| !v.is_empty()).cloned())
            .or(repository.url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let secs = |value: Option<u64>, default: Duration| {
            value.map(Duration::from_secs).unwrap_or(default)
        };

        ApiClientConfig {
            base_url,
            connect_timeout: secs(repository.connect_timeout_secs, defaults.connect_timeout),
            read_timeout: secs(repository.read_timeout_secs, defaults.read_timeout),
            pool_idle_timeout: secs(
                repository.pool_idle_timeout_secs,
                defaults.pool_idle_timeout,
            ),
            max_redirects: defaults.max_redirects,
        }
    }

    /// Validate configuration
    pub fn validate(config: &CurseForgeConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Check version (required)
        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
                expected: Some("string (e.g., \"1.0\")".to_string()),
                actual: Some("empty".to_string()),
            });
        } else if config.version != SUPPORTED_VERSION {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some("Currently supported version is \"1.0\" only".to_string()),
            });
        }

        if config.publications.is_empty() {
            warnings.push(ConfigValidationWarning {
                field: "publications".to_string(),
                message: "No publications configured".to_string(),
                suggestion: Some("Add a publication with a projectId and mainArtifact".to_string()),
            });
        }

        // 2. Validate publications
        for (name, publication) in &config.publications {
            Self::validate_publication(name, publication, &mut errors, &mut warnings);
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn validate_publication(
        name: &str,
        publication: &PublicationConfig,
        errors: &mut Vec<ConfigValidationError>,
        warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        let prefix = format!("publications.{}", name);

        if publication
            .project_id
            .as_deref()
            .is_none_or(|id| id.trim().is_empty())
        {
            errors.push(ConfigValidationError {
                field: format!("{}.projectId", prefix),
                message: "projectId is required".to_string(),
                expected: Some("CurseForge project id".to_string()),
                actual: Some("missing".to_string()),
            });
        }

        match &publication.main_artifact {
            None => errors.push(ConfigValidationError {
                field: format!("{}.mainArtifact", prefix),
                message: "mainArtifact is required".to_string(),
                expected: Some("artifact with a file".to_string()),
                actual: Some("missing".to_string()),
            }),
            Some(artifact) => {
                Self::validate_artifact(&format!("{}.mainArtifact", prefix), artifact, errors)
            }
        }

        let mut seen = HashSet::new();
        if publication.main_artifact.is_some() {
            seen.insert(MAIN_ARTIFACT_NAME.to_string());
        }
        for (i, artifact) in publication.artifacts.iter().enumerate() {
            let field = format!("{}.artifacts[{}]", prefix, i);
            Self::validate_artifact(&field, artifact, errors);

            let artifact_name = secondary_artifact_name(artifact);
            if !seen.insert(artifact_name.clone()) {
                errors.push(ConfigValidationError {
                    field: format!("{}.name", field),
                    message: format!("Duplicate artifact name '{}'", artifact_name),
                    expected: Some("unique name per publication".to_string()),
                    actual: Some(artifact_name),
                });
            }
        }

        if let Some(version) = &publication.minecraft_version
            && MinecraftVersion::parse(version).is_none()
        {
            warnings.push(ConfigValidationWarning {
                field: format!("{}.minecraftVersion", prefix),
                message: format!("Cannot parse Minecraft version '{}'", version),
                suggestion: Some("Use major.minor[.patch], e.g. \"1.20.2\"".to_string()),
            });
        }
    }

    fn validate_artifact(
        field: &str,
        artifact: &ArtifactConfig,
        errors: &mut Vec<ConfigValidationError>,
    ) {
        if artifact.file.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: format!("{}.file", field),
                message: "file is required".to_string(),
                expected: Some("non-empty path".to_string()),
                actual: Some("empty".to_string()),
            });
        }

        if let Some(changelog) = &artifact.changelog
            && changelog.content.is_some()
            && changelog.file.is_some()
        {
            errors.push(ConfigValidationError {
                field: format!("{}.changelog", field),
                message: "content and file are mutually exclusive".to_string(),
                expected: Some("either content or file".to_string()),
                actual: Some("both".to_string()),
            });
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
                if let (Some(expected), Some(actual)) = (&error.expected, &error.actual) {
                    lines.push(format!("    Expected: {}", expected));
                    lines.push(format!("    Actual: {}", actual));
                }
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }

    /// Convert the selected publications (all when `selected` is empty)
    pub async fn build_publications(
        config: &CurseForgeConfig,
        project_path: &Path,
        selected: &[String],
    ) -> Result<Vec<Publication>, PublishError> {
        if let Some(unknown) = selected
            .iter()
            .find(|name| !config.publications.contains_key(*name))
        {
            return Err(PublishError::ConfigError(format!(
                "Unknown publication '{}'",
                unknown
            )));
        }

        let mut publications = Vec::new();
        for (name, publication) in &config.publications {
            if selected.is_empty() || selected.contains(name) {
                publications.push(Self::build_publication(name, publication, project_path).await?);
            }
        }

        Ok(publications)
    }

    /// Convert one configured publication into a resolved [`Publication`]
    pub async fn build_publication(
        name: &str,
        config: &PublicationConfig,
        project_path: &Path,
    ) -> Result<Publication, PublishError> {
        let project_id = config
            .project_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                PublishError::ConfigError(format!("Publication '{}' has no projectId", name))
            })?;

        let mut publication = Publication::new(name, project_id);
        publication.version_tags = Self::version_tags(name, config);
        publication.java_versions = config.java_versions.iter().copied().collect();

        if let Some(main) = &config.main_artifact {
            let artifact =
                Self::build_artifact(MAIN_ARTIFACT_NAME.to_string(), main, project_path).await?;
            publication.main_artifact = Some(artifact);
        }

        for artifact in &config.artifacts {
            let artifact_name = secondary_artifact_name(artifact);
            publication
                .secondary_artifacts
                .push(Self::build_artifact(artifact_name, artifact, project_path).await?);
        }

        Ok(publication)
    }

    /// Explicit tags plus the loader and Minecraft tags inferred from
    /// loader versions.
    fn version_tags(name: &str, config: &PublicationConfig) -> BTreeSet<VersionTag> {
        let mut tags: BTreeSet<VersionTag> = config.game_versions.iter().cloned().collect();
        tags.extend(config.loaders.iter().map(VersionTag::loader));

        let mut inferred: Option<(u32, u32, u32)> = None;

        if let Some(version) = &config.forge_version {
            tags.insert(VersionTag::loader("forge"));
            let parsed = extract_forge_gradle_version(version);
            inferred = inferred.or(warn_unparsable(name, "forgeVersion", version, parsed));
        }
        if let Some(version) = &config.neoforge_version {
            tags.insert(VersionTag::loader("neoforge"));
            let parsed = extract_neoforge_version(version);
            inferred = inferred.or(warn_unparsable(name, "neoforgeVersion", version, parsed));
        }
        // Loom's own version says nothing about Minecraft; it only implies fabric
        if let Some(version) = &config.fabric_loom_version {
            tags.insert(VersionTag::loader("fabric"));
            let parsed = extract_fabric_loom_version(version);
            warn_unparsable(name, "fabricLoomVersion", version, parsed);
        }

        let minecraft = match &config.minecraft_version {
            Some(version) => {
                let parsed = MinecraftVersion::parse(version);
                if parsed.is_none() {
                    tracing::warn!(
                        publication = name,
                        "Failed to parse Minecraft version string '{}'. The publication cannot infer the required Minecraft version.",
                        version
                    );
                }
                parsed
            }
            None => inferred.map(|(major, minor, patch)| {
                MinecraftVersion::new(major, minor, patch)
            }),
        };

        if let Some(minecraft) = minecraft {
            let tag = minecraft.version_tag();
            tracing::debug!(publication = name, %tag, "Inferred Minecraft version tag");
            tags.insert(tag);
        }

        tags
    }

    async fn build_artifact(
        name: String,
        config: &ArtifactConfig,
        project_path: &Path,
    ) -> Result<Artifact, PublishError> {
        let mut artifact = Artifact::new(name, project_path.join(&config.file));
        artifact.display_name = config.display_name.clone();
        artifact.release_type = config.release_type.unwrap_or_default();
        artifact.relations = config.relations.iter().cloned().collect();

        if let Some(changelog) = &config.changelog {
            let content = match (&changelog.content, &changelog.file) {
                (Some(content), _) => content.clone(),
                (None, Some(file)) => {
                    let path = project_path.join(file);
                    fs::read_to_string(&path)
                        .await
                        .map_err(|source| PublishError::Io { path, source })?
                }
                (None, None) => String::new(),
            };
            artifact = artifact.with_changelog(changelog.format.unwrap_or_default(), content);
        }

        Ok(artifact)
    }
}

fn secondary_artifact_name(artifact: &ArtifactConfig) -> String {
    artifact.name.clone().unwrap_or_else(|| {
        Path::new(&artifact.file)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| artifact.file.clone())
    })
}

fn warn_unparsable(
    publication: &str,
    field: &str,
    value: &str,
    parsed: Option<(u32, u32, u32)>,
) -> Option<(u32, u32, u32)> {
    if parsed.is_none() {
        tracing::warn!(publication, field, "Failed to parse version string '{}'", value);
    }
    parsed
}
