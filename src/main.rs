use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use boardlens::api::start_api_server;
use boardlens::config::{AppConfig, ConfigError, APP_VERSION, CONFIG_ENV};
use boardlens::db::{Database, DatabaseError};
use boardlens::models::FindingFilter;
use boardlens::pipeline::collaborators::{
    AccessControl, DocumentError, DocumentLibrary, StaticAccessPolicy,
};
use boardlens::pipeline::generation::{GenerationError, Generator, OllamaGenerator, TimeoutGenerator};
use boardlens::pipeline::{Orchestrator, PipelineError};

#[derive(Debug, Parser)]
#[command(name = "boardlens", version, about = "Evidence-linked analysis of board governance documents")]
struct Cli {
    /// Config file. Falls back to $BOARDLENS_CONFIG, then built-in defaults.
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Serve the HTTP API over a directory of documents")]
    Serve {
        #[arg(long, default_value = "127.0.0.1:8787")]
        bind: SocketAddr,
        /// Every regular file in this directory is loaded as a document.
        #[arg(long)]
        documents: Option<PathBuf>,
    },
    #[command(about = "Run one job over the given files and print the findings as JSON")]
    Analyze {
        #[arg(long, default_value = "cli")]
        user: String,
        /// Order is the meeting order used by cross-document analysis.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("{e}");
        eprintln!("boardlens: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::resolve(cli.config.as_deref())?;
    boardlens::init_tracing(config.log_filter());
    tracing::info!("BoardLens starting v{APP_VERSION}");

    let generator: Arc<dyn Generator> = Arc::new(TimeoutGenerator::new(
        OllamaGenerator::from_config(&config.generation)?,
        Duration::from_secs(config.generation.timeout_secs),
    ));
    let library = Arc::new(DocumentLibrary::new());

    match cli.command {
        Command::Serve { bind, documents } => {
            if let Some(dir) = &documents {
                let loaded = library.load_dir(dir)?;
                tracing::info!(loaded, dir = %dir.display(), "Document library ready");
            } else {
                tracing::warn!("No --documents directory given; every job will fail document lookup");
            }

            let db = Database::open(&config.database_path)?;
            let access = Arc::new(StaticAccessPolicy::from_config(&config.users));
            let orchestrator = Arc::new(Orchestrator::new(db, library, access, generator, &config.pipeline));

            let mut server = start_api_server(orchestrator, bind).await?;
            tokio::signal::ctrl_c().await?;
            server.shutdown();
            server.stopped().await;
            Ok(())
        }
        Command::Analyze { user, files } => {
            let ids = files
                .iter()
                .map(|path| library.ingest_file(path).map(|doc| doc.id))
                .collect::<Result<Vec<_>, _>>()?;

            let db = Database::open(&config.database_path)?;
            let access = Arc::new(StaticAccessPolicy::single_user(&user));
            let acting = access.resolve(&user).ok_or_else(|| PipelineError::PermissionDenied {
                user: user.clone(),
                action: "run analysis",
            })?;
            let orchestrator = Orchestrator::new(db, library, access, generator, &config.pipeline);

            let job = orchestrator.create_job(&acting, &ids)?;
            let outcome = orchestrator.run_job(&job.id).await;

            let report = orchestrator.get_job_status(&acting, &job.id)?;
            let findings = orchestrator.list_findings(&acting, &FindingFilter::for_job(&job.id))?;
            let out = serde_json::json!({ "job": report, "findings": findings });
            println!("{}", serde_json::to_string_pretty(&out)?);

            outcome?;
            Ok(())
        }
    }
}
