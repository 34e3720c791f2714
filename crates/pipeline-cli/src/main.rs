mod cancel_cmd;
mod collaborators;
mod config;
mod replay_cmd;
mod run_step_cmd;
mod validate_cmd;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use config::PipelineConfig;
use pipeline_db::pool;

#[derive(Parser)]
#[command(name = "pipeline", about = "Pipeline execution core CLI")]
struct Cli {
    /// Database URL (overrides PIPELINE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a pipeline config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/pipeline")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the pipeline database: create it and run migrations
    DbInit,
    /// Check whether a task's tenant can afford the full pipeline
    Validate {
        /// Task ID to validate
        task_id: Uuid,
        /// Tenant ID the task belongs to
        #[arg(long)]
        tenant_id: Uuid,
    },
    /// Advance a task's pipeline by one step
    RunStep {
        /// Task ID to run a step for
        task_id: Uuid,
        /// Tenant ID the task belongs to
        #[arg(long)]
        tenant_id: Uuid,
    },
    /// Cancel an in-flight pipeline run
    Cancel {
        /// Pipeline run ID to cancel
        pipeline_run_id: Uuid,
        /// Tenant ID the run belongs to
        #[arg(long)]
        tenant_id: Uuid,
        /// User performing the cancellation
        #[arg(long)]
        user_id: Option<Uuid>,
        /// Free-text reason recorded in the audit event
        #[arg(long)]
        reason: Option<String>,
    },
    /// Start a fresh run for a task, optionally resuming from a step
    Replay {
        /// Pipeline run ID to replay
        pipeline_run_id: Uuid,
        /// Tenant ID the run belongs to
        #[arg(long)]
        tenant_id: Uuid,
        /// Step ID to resume from (defaults to step 1)
        #[arg(long)]
        from_step_id: Option<Uuid>,
        /// Do not preserve already-approved artifacts
        #[arg(long)]
        discard_approved_artifacts: bool,
    },
}

/// Execute the `pipeline init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
    };
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Next: run `pipeline db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `pipeline db-init` command: create database and run
/// migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = PipelineConfig::resolve(cli_db_url)?;

    println!("Initializing pipeline database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    let migrations_path = pool::default_migrations_path();
    pool::run_migrations(&db_pool, migrations_path).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("pipeline db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Validate { task_id, tenant_id } => {
            let resolved = PipelineConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = validate_cmd::run_validate(&db_pool, task_id, tenant_id).await;
            db_pool.close().await;
            result.context("validate failed")?;
        }
        Commands::RunStep { task_id, tenant_id } => {
            let resolved = PipelineConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = run_step_cmd::run_run_step(&db_pool, task_id, tenant_id).await;
            db_pool.close().await;
            result.context("run-step failed")?;
        }
        Commands::Cancel {
            pipeline_run_id,
            tenant_id,
            user_id,
            reason,
        } => {
            let resolved = PipelineConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                cancel_cmd::run_cancel(&db_pool, pipeline_run_id, tenant_id, user_id, reason)
                    .await;
            db_pool.close().await;
            result.context("cancel failed")?;
        }
        Commands::Replay {
            pipeline_run_id,
            tenant_id,
            from_step_id,
            discard_approved_artifacts,
        } => {
            let resolved = PipelineConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = replay_cmd::run_replay(
                &db_pool,
                pipeline_run_id,
                tenant_id,
                from_step_id,
                !discard_approved_artifacts,
            )
            .await;
            db_pool.close().await;
            result.context("replay failed")?;
        }
    }

    Ok(())
}
