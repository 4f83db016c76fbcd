//! Connection pool creation and configuration.

use std::sync::atomic::{AtomicU64, Ordering};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;

/// Path that selects an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Distinguishes in-memory databases opened by separate pools.
static MEMORY_DB_SEQ: AtomicU64 = AtomicU64::new(0);

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

/// Pool of SQLite connections shared by all request handlers.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when creating the database pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Where a pool's connections point.
enum Target {
    File(String),
    /// A named shared-cache in-memory database, private to one pool.
    Memory(String),
}

impl Target {
    fn resolve(db_path: &str) -> Self {
        if db_path == IN_MEMORY_PATH {
            let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);
            Target::Memory(format!(
                "file:procure-mem-{}-{seq}?mode=memory&cache=shared",
                std::process::id()
            ))
        } else {
            Target::File(db_path.to_string())
        }
    }

    fn location(&self) -> &str {
        match self {
            Target::File(path) | Target::Memory(path) => path,
        }
    }
}

/// Opens a pool of SQLite connections for the vendor and purchase order
/// tables.
///
/// A file path gets WAL journaling. [`IN_MEMORY_PATH`] opens a shared-cache
/// in-memory database that every connection of this pool sees, and that no
/// other pool sees. It lives as long as the pool holds a connection, so
/// in-memory pools keep their connections for their whole lifetime. Every
/// connection has foreign keys enabled and the configured busy timeout.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if the initial connections cannot be opened
/// or initialized.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let target = Target::resolve(db_path);
    let in_memory = matches!(target, Target::Memory(_));

    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    if in_memory {
        flags |= OpenFlags::SQLITE_OPEN_URI;
    }

    let manager = SqliteConnectionManager::file(target.location())
        .with_flags(flags)
        .with_init(move |conn| {
            if !in_memory {
                let journal_mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
                if journal_mode != "wal" {
                    return Err(rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                        Some(format!("unexpected journal mode: {journal_mode}")),
                    ));
                }
            }
            conn.execute_batch(&format!(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = {};",
                settings.busy_timeout_ms
            ))
        });

    let mut builder = Pool::builder().max_size(settings.pool_max_size);
    if in_memory {
        builder = builder
            .min_idle(Some(settings.pool_max_size))
            .max_lifetime(None)
            .idle_timeout(None);
    }
    let pool = builder.build(manager)?;

    tracing::debug!(
        path = db_path,
        location = target.location(),
        max_size = settings.pool_max_size,
        "database pool ready"
    );

    Ok(pool)
}
