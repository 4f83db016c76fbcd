//! Storage layer for the procurement API.
//!
//! Owns the SQLite connection pool and the schema initializer. The two
//! resource tables (`vendors` and `purchase_orders`) are created and patched
//! exclusively through the versioned migration list in this crate, which is
//! run once at process start before any request is served.
//!
//! Databases created by earlier releases may carry a legacy order-number
//! column (`number`) and vendor foreign-key columns (`vendor_id` or
//! `vendorid`). The migration list renames, back-fills, and drops those so
//! that every boot converges on the same shape.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError, IN_MEMORY_PATH};
