//! CurseForge Publisher CLI
//!
//! Uploads the publications declared in `.curseforge-publish.yaml`

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use curseforge_publisher::orchestration::generate_metadata_files;
use curseforge_publisher::{
    ApiClient, BatchPublishOptions, BatchPublisher, ConfigLoadOptions, ConfigLoader,
    CurseForgeConfig, CurseForgePublisher, Publication, SecureTokenManager, TagMiss,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Publish mod files to CurseForge
#[derive(Parser)]
#[command(name = "curseforge-publish")]
#[command(version)]
#[command(about = "Publish mod files to CurseForge", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProjectArgs {
    /// Project path (defaults to current directory)
    #[arg(value_name = "PROJECT_PATH")]
    project_path: Option<PathBuf>,

    /// Config file (defaults to PROJECT_PATH/.curseforge-publish.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Publication to process (repeatable, defaults to all)
    #[arg(short, long = "publication")]
    publications: Vec<String>,
}

#[derive(Args)]
struct RepositoryArgs {
    /// API token (overrides CURSEFORGE_API_TOKEN and the config file)
    #[arg(long)]
    token: Option<String>,

    /// API base URL (overrides CURSEFORGE_API_URL and the config file)
    #[arg(long)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish publications to CurseForge
    Publish {
        #[command(flatten)]
        project: ProjectArgs,

        #[command(flatten)]
        repository: RepositoryArgs,

        /// Publish publications one after another
        #[arg(long)]
        sequential: bool,

        /// Maximum concurrent publications
        #[arg(long, default_value = "3")]
        max_concurrency: usize,

        /// Stop after the first failed publication (sequential mode)
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate configuration and resolve version tags without uploading
    Check {
        #[command(flatten)]
        project: ProjectArgs,

        #[command(flatten)]
        repository: RepositoryArgs,
    },

    /// Write upload metadata files next to every artifact
    Metadata {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Publish {
            project,
            repository,
            sequential,
            max_concurrency,
            fail_fast,
        } => {
            let options = BatchPublishOptions {
                sequential,
                fail_fast,
                max_concurrency,
            };
            publish_command(project, repository, options).await
        }
        Commands::Check {
            project,
            repository,
        } => check_command(project, repository).await,
        Commands::Metadata { project } => metadata_command(project).await,
    }
}

/// Configuration and resolved publications of one CLI invocation
struct Loaded {
    config: CurseForgeConfig,
    publications: Vec<Publication>,
    env: HashMap<String, String>,
}

async fn load(project: &ProjectArgs) -> Result<Option<Loaded>> {
    let project_path = project
        .project_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let env: HashMap<String, String> = std::env::vars().collect();

    let options = ConfigLoadOptions {
        project_path: project_path.clone(),
        config_path: project.config.clone(),
        env: env.clone(),
    };
    let config = ConfigLoader::load(&options).await?;

    let validation = ConfigLoader::validate(&config);
    if !validation.valid || !validation.warnings.is_empty() {
        println!("{}\n", ConfigLoader::format_validation_result(&validation));
    }
    if !validation.valid {
        return Ok(None);
    }

    let publications =
        ConfigLoader::build_publications(&config, &project_path, &project.publications).await?;

    Ok(Some(Loaded {
        config,
        publications,
        env,
    }))
}

fn build_client(loaded: &Loaded, repository: &RepositoryArgs) -> Result<ApiClient> {
    let configured_token = loaded
        .config
        .repository
        .as_ref()
        .and_then(|r| r.token.as_deref());
    let token = SecureTokenManager::new().resolve(repository.token.as_deref(), configured_token)?;

    let client_config =
        ConfigLoader::client_config(&loaded.config, repository.url.as_deref(), &loaded.env);
    let client = ApiClient::with_config(token, client_config)?;
    tracing::debug!(base_url = %client.base_url(), "Using CurseForge API");

    Ok(client)
}

async fn publish_command(
    project: ProjectArgs,
    repository: RepositoryArgs,
    options: BatchPublishOptions,
) -> Result<i32> {
    println!("\n📦 curseforge-publish\n");

    let Some(loaded) = load(&project).await? else {
        return Ok(1);
    };
    let client = Arc::new(build_client(&loaded, &repository)?);

    let result = BatchPublisher::new(client)
        .publish_all(loaded.publications, &options)
        .await?;

    println!("{}", result.format_summary());

    if result.success {
        println!("\n✅ Publishing completed successfully!");
        Ok(0)
    } else {
        println!("\n❌ Publishing completed with errors");
        Ok(1)
    }
}

async fn check_command(project: ProjectArgs, repository: RepositoryArgs) -> Result<i32> {
    println!("\n🔍 Publication Check\n");

    let Some(loaded) = load(&project).await? else {
        return Ok(1);
    };
    let publisher = CurseForgePublisher::new(Arc::new(build_client(&loaded, &repository)?));

    let mut exit_code = 0;
    for publication in &loaded.publications {
        println!("📦 {} (project {}):", publication.name, publication.project_id);

        for artifact in publication.artifacts() {
            if artifact.file.is_file() {
                println!("  ✅ {}: {}", artifact.name, artifact.file.display());
            } else {
                println!("  ❌ {}: {} does not exist", artifact.name, artifact.file.display());
                exit_code = 1;
            }
        }

        match publisher.resolve(publication).await {
            Ok(resolution) => {
                println!("  Resolved game version ids: {:?}", resolution.ids);
                for miss in &resolution.misses {
                    match miss {
                        TagMiss::UnknownType { tag } => {
                            println!("  ⚠️  {}: unknown version type", tag)
                        }
                        TagMiss::UnknownVersion { tag, available } => println!(
                            "  ⚠️  {}: unknown version (available: {})",
                            tag,
                            available.join(", ")
                        ),
                    }
                }
            }
            Err(e) => {
                println!("  ❌ {}", e);
                for action in e.suggested_actions() {
                    println!("     → {}", action);
                }
                exit_code = 1;
            }
        }
        println!();
    }

    Ok(exit_code)
}

async fn metadata_command(project: ProjectArgs) -> Result<i32> {
    let Some(loaded) = load(&project).await? else {
        return Ok(1);
    };

    for publication in &loaded.publications {
        for path in generate_metadata_files(publication).await? {
            println!("📝 {}", path.display());
        }
    }

    Ok(0)
}
