//! oxide-sqlgraph-migrate CLI
//!
//! Applies, diffs and inspects schemas described as JSON table lists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_sqlgraph_migrate::prelude::*;

/// Schema migrations for oxide-sqlgraph.
#[derive(Parser)]
#[command(name = "oxide-sqlgraph-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the database in line with a schema file.
    Apply {
        /// JSON file holding the desired tables.
        schema: PathBuf,

        /// Print the statements instead of executing them.
        #[arg(long)]
        dry_run: bool,

        /// Give each table its own id range.
        #[arg(long)]
        global_unique_id: bool,

        /// Drop columns missing from the schema file.
        #[arg(long)]
        drop_column: bool,

        /// Drop indexes missing from the schema file.
        #[arg(long)]
        drop_index: bool,
    },

    /// Write the pending changes to a migration file.
    Diff {
        /// JSON file holding the desired tables.
        schema: PathBuf,

        /// Migrations directory.
        #[arg(long, default_value = "migrations")]
        dir: PathBuf,

        /// Migration name.
        #[arg(short, long, default_value = "changes")]
        name: String,

        /// Give each table its own id range.
        #[arg(long)]
        global_unique_id: bool,
    },

    /// Print the live schema as JSON.
    Inspect,
}

fn load_tables(path: &Path) -> anyhow::Result<Vec<Table>> {
    let raw = std::fs::read_to_string(path)?;
    let tables: Vec<Table> = serde_json::from_str(&raw)?;
    Ok(tables)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let sqlite = SqliteDriver::connect(&cli.database).await?;
    let driver: Arc<dyn Driver> = Arc::new(DebugDriver::new(Arc::new(sqlite)));

    match cli.command {
        Commands::Apply {
            schema,
            dry_run,
            global_unique_id,
            drop_column,
            drop_index,
        } => {
            let tables = load_tables(&schema)?;
            let options = MigrateOptions::new()
                .global_unique_id(global_unique_id)
                .drop_column(drop_column)
                .drop_index(drop_index);
            let target: Arc<dyn Driver> = if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
                Arc::new(WriteDriver::new(driver.dialect(), std::io::stdout()).with_inner(Arc::clone(&driver)))
            } else {
                Arc::clone(&driver)
            };
            Migrate::new(target, options).create(&tables).await?;
            info!(tables = tables.len(), "Schema applied");
        }

        Commands::Diff {
            schema,
            dir,
            name,
            global_unique_id,
        } => {
            let tables = load_tables(&schema)?;
            std::fs::create_dir_all(&dir)?;
            let options = MigrateOptions::new()
                .global_unique_id(global_unique_id)
                .dir(dir);
            match Migrate::new(Arc::clone(&driver), options).diff(&name, &tables).await? {
                Some(path) => info!("Created migration: {}", path.display()),
                None => info!("No changes detected."),
            }
        }

        Commands::Inspect => {
            let tables = Inspector::new(Arc::clone(&driver), None).tables().await?;
            println!("{}", serde_json::to_string_pretty(&tables)?);
        }
    }

    driver.close().await?;
    Ok(())
}
