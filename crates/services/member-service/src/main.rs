//! Member Service - maintenance CLI for member data.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use member_service_lib::{EntityKind, ListFilter, MaintenanceAction};

#[derive(Parser)]
#[command(name = "member-service")]
#[command(about = "Member data maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check database connectivity
    CheckDb,
    /// Print the number of stored rows
    Count {
        #[arg(value_enum)]
        entity: EntityArg,
    },
    /// Walk a table in chunks
    Scan {
        #[arg(value_enum)]
        entity: EntityArg,
        /// Rows per chunk (defaults to REPOSITORY_CHUNK_SIZE)
        #[arg(long)]
        chunk_size: Option<u64>,
    },
    /// Print rows as JSON lines
    List {
        #[arg(value_enum)]
        entity: EntityArg,
        /// Only soft-deleted rows
        #[arg(long, conflicts_with = "all")]
        deleted: bool,
        /// Active and soft-deleted rows
        #[arg(long)]
        all: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EntityArg {
    User,
    Booking,
    Email,
}

impl From<EntityArg> for EntityKind {
    fn from(arg: EntityArg) -> Self {
        match arg {
            EntityArg::User => EntityKind::User,
            EntityArg::Booking => EntityKind::Booking,
            EntityArg::Email => EntityKind::Email,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CheckDb => {
            member_service_lib::check_database().await?;
        }
        Commands::Count { entity } => {
            member_service_lib::run_maintenance(entity.into(), MaintenanceAction::Count).await?;
        }
        Commands::Scan { entity, chunk_size } => {
            member_service_lib::run_maintenance(entity.into(), MaintenanceAction::Scan { chunk_size })
                .await?;
        }
        Commands::List {
            entity,
            deleted,
            all,
        } => {
            let filter = if all {
                ListFilter::All
            } else if deleted {
                ListFilter::Deleted
            } else {
                ListFilter::Active
            };
            member_service_lib::run_maintenance(entity.into(), MaintenanceAction::List { filter })
                .await?;
        }
    }

    Ok(())
}
