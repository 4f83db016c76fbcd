//! Vendor persistence.
//!
//! Each operation is a single parameterized statement against the `vendors`
//! table. Updates and deletes address rows by identity only and do not check
//! that the row exists; touching zero rows is not an error.

mod error;
mod store;

pub use error::VendorError;
pub use procure_types::Vendor;
pub use store::{create_vendor, delete_vendor, list_vendors, update_vendor};
