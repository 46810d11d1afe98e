//! Labstore CLI — attach files to experiments and items from the command line.
//!
//! Reads configuration from the environment (and `.env`). `import` and `upload` need
//! DATABASE_URL; they connect to the database and apply migrations first. `digest` runs
//! offline.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use labstore_cli::{build_pipeline, describe_digest, init_tracing};
use labstore_core::{Config, ErrorMetadata, PayloadDescriptor, PrincipalId, UploadOutcome};
use labstore_db::setup_database;
use labstore_storage::IntegrityHasher;
use labstore_upload::UploadPipeline;

#[derive(Parser)]
#[command(name = "labstore", about = "Labstore file intake CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a file already on this host (e.g. extracted from an archive)
    Import {
        /// experiments or items
        #[arg(long)]
        entity_type: String,
        #[arg(long)]
        entity_id: i64,
        /// User id the file is attributed to
        #[arg(long)]
        principal: i64,
        /// File to import; its name becomes the display name
        path: PathBuf,
    },
    /// Store a spooled transfer file under the name the client sent
    Upload {
        /// experiments or items
        #[arg(long)]
        entity_type: String,
        #[arg(long)]
        entity_id: i64,
        /// User id the file is attributed to
        #[arg(long)]
        principal: i64,
        /// Original file name as sent by the client
        #[arg(long)]
        name: String,
        /// Temporary file holding the transferred bytes
        temp_path: PathBuf,
    },
    /// Print the integrity digest a file would get
    Digest {
        path: PathBuf,
    },
}

fn print_json(outcome: &UploadOutcome) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(outcome).context("Serialize upload outcome")?;
    println!("{}", out);
    Ok(())
}

async fn pipeline(config: &Config) -> anyhow::Result<UploadPipeline> {
    let pool = setup_database(config).await?;
    build_pipeline(config, pool).await
}

/// Turn a pipeline failure into a CLI error carrying its code and caller-facing message.
fn report(err: labstore_core::UploadError) -> anyhow::Error {
    anyhow::anyhow!(
        "[{}] {} ({})",
        err.error_code(),
        err.client_message(),
        err
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.is_production());

    match cli.command {
        Commands::Import {
            entity_type,
            entity_id,
            principal,
            path,
        } => {
            let principal = PrincipalId::new(principal).map_err(report)?;
            let outcome = pipeline(&config)
                .await?
                .upload_local_file(principal, &entity_type, entity_id, &path)
                .await
                .map_err(report)?;
            print_json(&outcome)?;
        }
        Commands::Upload {
            entity_type,
            entity_id,
            principal,
            name,
            temp_path,
        } => {
            let principal = PrincipalId::new(principal).map_err(report)?;
            let payload = PayloadDescriptor::new(name, temp_path);
            let outcome = pipeline(&config)
                .await?
                .upload_file(principal, &entity_type, entity_id, Some(payload))
                .await
                .map_err(report)?;
            print_json(&outcome)?;
        }
        Commands::Digest { path } => {
            let hasher = IntegrityHasher::from_config(&config);
            let digest = hasher
                .digest(&path)
                .await
                .with_context(|| format!("Failed to hash {}", path.display()))?;
            println!("{}", describe_digest(digest.as_ref()));
        }
    }

    Ok(())
}
