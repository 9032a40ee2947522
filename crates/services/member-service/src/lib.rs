//! Member Service Library
//!
//! Generic entity repositories over SeaORM or in-memory stores, plus login
//! lockout tracking. The binary exposes read-only maintenance commands.

pub mod config;
pub mod infra;
pub mod lockout;
pub mod repository;
pub mod service;

use serde::Serialize;
use tracing::info;

use common::AppResult;
use domain::Entity;

use crate::config::MemberServiceConfig;
use crate::infra::Database;
use crate::repository::{
    BookingRepository, BookingStore, EmailRepository, EmailStore, EntityRepository, EntityStore,
    UserRepository, UserStore,
};

/// Entity types reachable from the maintenance commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Booking,
    Email,
}

/// Which rows a listing includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFilter {
    #[default]
    Active,
    Deleted,
    All,
}

/// Maintenance action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceAction {
    /// Print the row count
    Count,
    /// Walk the table in chunks, printing the size of each chunk
    Scan { chunk_size: Option<u64> },
    /// Print rows as JSON lines
    List { filter: ListFilter },
}

/// Connect to the configured database and ping it.
pub async fn check_database() -> Result<(), Box<dyn std::error::Error>> {
    let config = MemberServiceConfig::from_env();
    let db = Database::connect(&config.database).await?;

    db.ping().await?;
    info!("Database is reachable");
    println!("ok");

    Ok(())
}

/// Run a maintenance action against one entity table.
pub async fn run_maintenance(
    kind: EntityKind,
    action: MaintenanceAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = MemberServiceConfig::from_env();
    let db = Database::connect(&config.database).await?;
    let conn = db.get_connection();
    let chunk_size = config.repository.default_chunk_size;

    match kind {
        EntityKind::User => {
            let users = UserRepository::new(UserStore::new(conn));
            maintain(users.inner(), action, chunk_size).await?;
        }
        EntityKind::Booking => {
            let bookings = BookingRepository::new(BookingStore::new(conn));
            maintain(bookings.inner(), action, chunk_size).await?;
        }
        EntityKind::Email => {
            let emails = EmailRepository::new(EmailStore::new(conn));
            maintain(emails.inner(), action, chunk_size).await?;
        }
    }

    Ok(())
}

/// Execute `action` through any repository, writing results to stdout.
pub async fn maintain<E, S>(
    repository: &EntityRepository<E, S>,
    action: MaintenanceAction,
    default_chunk_size: u64,
) -> AppResult<()>
where
    E: Entity + Serialize,
    S: EntityStore<E>,
{
    match action {
        MaintenanceAction::Count => {
            println!("{}", repository.count().await);
        }
        MaintenanceAction::Scan { chunk_size } => {
            let chunk_size = chunk_size.unwrap_or(default_chunk_size);
            let mut index = 0u64;
            let chunks = repository
                .process_in_chunks(chunk_size, |rows| {
                    println!("chunk {}: {} rows", index, rows.len());
                    index += 1;
                    Ok(())
                })
                .await?;
            info!(entity = repository.entity_name(), chunks, "Scan finished");
        }
        MaintenanceAction::List { filter } => {
            let rows = match filter {
                ListFilter::Active => repository.find_active().await?,
                ListFilter::Deleted => repository.find_deleted().await?,
                ListFilter::All => repository.find_with_deleted().await?,
            };
            for row in rows {
                let line = serde_json::to_string(&row)
                    .map_err(|e| common::AppError::internal(e.to_string()))?;
                println!("{}", line);
            }
        }
    }

    Ok(())
}
