//! `hyperlabel`: command-line front end for the annotation store.
//!
//! Every command prints its result as pretty JSON on stdout; logs go to
//! stderr.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hyperlabel_core::annotation::ReplaceAnnotations;
use hyperlabel_core::datasource::DataSourceRoot;
use hyperlabel_core::project::{NewProject, ProjectChanges, ProjectListQuery, ProjectPriority};
use hyperlabel_core::sample::{SampleStatus, SampleStatusUpdate};
use hyperlabel_core::types::DbId;
use hyperlabel_db::repositories::DisplayAlgorithmRepo;
use hyperlabel_db::DbPool;
use hyperlabel_pipeline::export::ExportOptions;
use hyperlabel_pipeline::{annotations, export, projects, resolver, samples, statistics};
use hyperlabel_pipeline::PipelineError;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::CliConfig;

const DEFAULT_LOG_FILTER: &str = "hyperlabel=info,hyperlabel_pipeline=info,sqlx=warn";

#[derive(Parser, Debug)]
#[command(name = "hyperlabel")]
#[command(about = "Annotation project management for image and hyperspectral samples")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// PostgreSQL connection string (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Data-source root directory (overrides HYPERLABEL_DATA_ROOT)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Maximum pooled connections (overrides DB_MAX_CONNECTIONS)
    #[arg(long, global = true)]
    max_connections: Option<u32>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations
    Migrate,

    /// List the seeded display algorithms
    Algorithms,

    /// Show which display algorithm a gain-algorithm code resolves to
    ResolveAlgorithm {
        /// Code to resolve; omit for the default
        code: Option<String>,
    },

    /// List data-source folders with file and sample estimates
    DataSources,

    /// Create a project by scanning a data-source folder
    CreateProject {
        name: String,
        /// Data-source folder name under the root
        #[arg(long)]
        folder: String,
        #[arg(long, default_value = "normal", value_parser = parse_priority)]
        priority: ProjectPriority,
        #[arg(long)]
        actor: Option<DbId>,
    },

    /// List projects, newest first
    ListProjects {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = hyperlabel_core::project::DEFAULT_PAGE_SIZE)]
        page_size: i64,
        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        archived: Option<bool>,
    },

    GetProject {
        id: DbId,
    },

    /// Rename or re-prioritise a project
    UpdateProject {
        id: DbId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<ProjectPriority>,
        #[arg(long)]
        actor: Option<DbId>,
    },

    /// Archive a project (resets priority to normal)
    Archive {
        id: DbId,
    },

    /// Restore an archived project
    Restore {
        id: DbId,
    },

    /// Permanently delete a project and everything under it
    DeleteProject {
        id: DbId,
    },

    /// List a project's samples
    ListSamples {
        project_id: DbId,
    },

    /// Show a sample with its annotations
    GetSample {
        id: DbId,
    },

    /// Set a sample's status, optionally overriding its annotated flag
    SetStatus {
        id: DbId,
        #[arg(value_parser = parse_status)]
        status: SampleStatus,
        #[arg(long)]
        annotated: Option<bool>,
    },

    /// Recompute a project's derived statistics
    Recompute {
        project_id: DbId,
    },

    /// Replace every annotation of a sample from a JSON payload
    Replace {
        sample_id: DbId,
        /// Payload file, or `-` for stdin
        #[arg(long)]
        payload: PathBuf,
        #[arg(long)]
        actor: Option<DbId>,
    },

    /// Export a project as a nested JSON document
    Export {
        project_id: DbId,
        #[arg(long)]
        no_project_meta: bool,
        #[arg(long)]
        no_sample_meta: bool,
        #[arg(long)]
        no_annotations: bool,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve one of a sample's source files to an absolute path
    ResolveAsset {
        sample_id: DbId,
        relative: String,
    },
}

fn parse_priority(s: &str) -> Result<ProjectPriority, String> {
    ProjectPriority::from_str(s).map_err(|e| e.to_string())
}

fn parse_status(s: &str) -> Result<SampleStatus, String> {
    SampleStatus::from_str(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.global.log_json);

    let config = CliConfig::load(
        cli.global.database_url.clone(),
        cli.global.data_root.clone(),
        cli.global.max_connections,
    )?;

    run(cli.command, &config).await.inspect_err(|err| {
        if let Some(pipeline) = err.downcast_ref::<PipelineError>() {
            tracing::error!(kind = pipeline.kind().as_str(), error = %pipeline, "Command failed");
        }
    })
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn connect(config: &CliConfig) -> Result<DbPool> {
    let pool = hyperlabel_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    hyperlabel_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::debug!(max_connections = config.max_connections, "Database pool ready");
    Ok(pool)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, config: &CliConfig) -> Result<()> {
    let data_sources = DataSourceRoot::new(&config.data_root);

    // Listing folders needs no database.
    if let Command::DataSources = command {
        return list_data_sources(&data_sources).await;
    }

    let pool = connect(config).await?;

    match command {
        Command::DataSources => list_data_sources(&data_sources).await?,
        Command::Migrate => {
            hyperlabel_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }
        Command::Algorithms => print_json(&DisplayAlgorithmRepo::list(&pool).await?)?,
        Command::ResolveAlgorithm { code } => {
            let mut conn = pool.acquire().await?;
            let algorithm = resolver::resolve_algorithm(&mut conn, code.as_deref()).await?;
            print_json(&algorithm)?;
        }
        Command::CreateProject {
            name,
            folder,
            priority,
            actor,
        } => {
            let input = NewProject {
                name,
                priority,
                data_source_folder: folder,
            };
            let project = projects::create_project(&pool, &data_sources, &input, actor).await?;
            print_json(&project)?;
        }
        Command::ListProjects {
            page,
            page_size,
            search,
            archived,
        } => {
            let query = ProjectListQuery {
                page,
                page_size,
                search,
                archived,
            };
            print_json(&projects::list_projects(&pool, &query).await?)?;
        }
        Command::GetProject { id } => print_json(&projects::get_project(&pool, id).await?)?,
        Command::UpdateProject {
            id,
            name,
            priority,
            actor,
        } => {
            let changes = ProjectChanges { name, priority };
            print_json(&projects::update_project(&pool, id, &changes, actor).await?)?;
        }
        Command::Archive { id } => print_json(&projects::archive_project(&pool, id).await?)?,
        Command::Restore { id } => print_json(&projects::restore_project(&pool, id).await?)?,
        Command::DeleteProject { id } => {
            projects::delete_project(&pool, id).await?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        Command::ListSamples { project_id } => {
            print_json(&samples::list_samples(&pool, project_id).await?)?
        }
        Command::GetSample { id } => print_json(&samples::get_sample(&pool, id).await?)?,
        Command::SetStatus {
            id,
            status,
            annotated,
        } => {
            let update = SampleStatusUpdate {
                status,
                is_annotated: annotated,
            };
            print_json(&samples::update_sample_status(&pool, id, &update).await?)?;
        }
        Command::Recompute { project_id } => {
            let stats = statistics::recompute_project(&pool, project_id)
                .await?
                .ok_or_else(|| PipelineError::not_found("Project", project_id))?;
            print_json(&stats)?;
        }
        Command::Replace {
            sample_id,
            payload,
            actor,
        } => {
            let payload = read_payload(&payload).await?;
            let sample = annotations::replace_annotations(&pool, sample_id, &payload, actor).await?;
            print_json(&sample)?;
        }
        Command::Export {
            project_id,
            no_project_meta,
            no_sample_meta,
            no_annotations,
            output,
        } => {
            let options = ExportOptions {
                include_project_meta: !no_project_meta,
                include_sample_meta: !no_sample_meta,
                include_annotation_bundle: !no_annotations,
            };
            let document = export::export_project(&pool, project_id, options).await?;
            match output {
                Some(path) => {
                    let body = serde_json::to_vec_pretty(&document)?;
                    tokio::fs::write(&path, body)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "Export written");
                }
                None => print_json(&document)?,
            }
        }
        Command::ResolveAsset {
            sample_id,
            relative,
        } => {
            let sample = samples::get_sample(&pool, sample_id).await?.sample;
            let path = data_sources
                .resolve_asset(sample.id, &relative, &sample.source_files)
                .await?;
            print_json(&path)?;
        }
    }

    Ok(())
}

async fn list_data_sources(data_sources: &DataSourceRoot) -> Result<()> {
    data_sources.ensure_exists().await?;
    print_json(&data_sources.list().await?)
}

async fn read_payload(path: &Path) -> Result<ReplaceAnnotations> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).context("Payload is not a valid replace request")
}
