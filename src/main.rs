mod config;
mod db;
mod error;
mod forms;
mod invoice_gen;
mod mailer;
mod models;
mod money;
mod pdf;
mod salary;
mod web;
mod work_log;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::invoice_gen::InvoiceGenerator;
use crate::mailer::Mailer;
use crate::web::AppState;

/// Back office for a painting contractor
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Do not apply pending migrations on start
        #[arg(long)]
        skip_migrations: bool,
    },
    /// Apply pending migrations and exit
    Migrate,
    /// Fill an empty database with demo data
    Seed,
}

fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}

async fn serve(config: &config::Config, db: db::Database) -> Result<()> {
    let mailer = Mailer::from_config(config).context("invalid mail configuration")?;
    let generator = InvoiceGenerator::new(config.company());
    let app = web::router(AppState::new(db, mailer, generator));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("could not bind {}", config.bind_addr))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init()?;
    init_logger();

    // Initialize database connection
    let db = db::init(&config).await?;

    match cli.command.unwrap_or(Command::Serve { skip_migrations: false }) {
        Command::Serve { skip_migrations } => {
            if !skip_migrations {
                db.migrate().await?;
            }
            serve(&config, db).await?;
        }
        Command::Migrate => {
            db.migrate().await?;
            tracing::info!("migrations applied");
        }
        Command::Seed => {
            db.migrate().await?;
            let report = db.seed(web::today()).await?;
            println!(
                "Seeded {} customers, {} workers, {} projects, {} invoices and {} work entries.",
                report.customers, report.workers, report.projects, report.invoices, report.work_entries
            );
        }
    }

    Ok(())
}
