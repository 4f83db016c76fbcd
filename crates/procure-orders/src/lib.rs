//! Purchase order persistence.
//!
//! Orders are listed newest first. `status` is the only field with
//! partial-update semantics: creation falls back to [`STATUS_OPEN`] and a
//! revision keeps the stored status when the payload carries none.
//! Archiving forces [`STATUS_ARCHIVED`] and is idempotent.
//!
//! There is no coordination between statements. A revision racing an
//! archive of the same order resolves to whichever statement the store
//! applies last.

mod error;
mod store;

pub use error::OrderError;
pub use procure_types::{PurchaseOrder, STATUS_ARCHIVED, STATUS_OPEN};
pub use store::{archive_order, create_order, delete_order, list_orders, revise_order};
